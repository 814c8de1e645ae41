//! Stats counter and BTreeMap-based reporting.
//!
//! Mirrors the teacher crate's `metrics` module: a plain counter struct
//! plus a `BTreeMap<String, f64>` dump for anything that wants a stable,
//! sorted snapshot (reproducible simulation output, dump files). A
//! `BTreeMap` is used instead of a `HashMap` for the same reason the
//! teacher uses one: iteration order must be deterministic so two runs of
//! the same trace against the same policy produce byte-identical dump
//! files.

use crate::collections::{BTreeMap, String};

/// Running counters accumulated by a policy across a trace (spec §2, §8
/// invariants 1, 3, 8).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    /// Total non-warmup accesses seen.
    pub accesses: u64,
    /// Total hits (any tier).
    pub hits: u64,
    /// Hits served from the DRAM tier.
    pub hits_dram: u64,
    /// Hits served from the Flash tier.
    pub hits_flash: u64,
    /// Number of times an item was migrated DRAM -> Flash.
    pub writes_flash: u64,
    /// Bytes nominally written to flash (may double-count block padding;
    /// see `RamShield::allocate_flash_block`, which the source charges a
    /// full `block_size` per allocation regardless of the bytes actually
    /// moved).
    pub flash_bytes_written: u64,
    /// Count of credit-gate stalls (FlashCache family): the flash-write
    /// budget was insufficient and DRAM was evicted instead.
    pub credit_limit: u64,
    /// Total items evicted (any tier, any cause).
    pub evicted_items: u64,
    /// Total bytes evicted. Monotonically non-decreasing (invariant 8).
    pub evicted_bytes: u64,
    /// Current live byte total (DRAM tier, or the whole cache for
    /// untiered policies).
    pub bytes_cached: u64,
}

impl Stats {
    /// A zeroed counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a hit; `tier_dram` classifies it for `hits_dram`/`hits_flash`.
    pub fn record_hit(&mut self, tier_dram: Option<bool>) {
        self.accesses += 1;
        self.hits += 1;
        match tier_dram {
            Some(true) => self.hits_dram += 1,
            Some(false) => self.hits_flash += 1,
            None => {}
        }
    }

    /// Records a miss.
    pub fn record_miss(&mut self) {
        self.accesses += 1;
    }

    /// Records an eviction of `bytes` (one item, or one whole block).
    pub fn record_eviction(&mut self, bytes: u64) {
        self.evicted_items += 1;
        self.evicted_bytes += bytes;
    }

    /// Records a DRAM -> Flash migration of `bytes`.
    pub fn record_flash_write(&mut self, bytes: u64) {
        self.writes_flash += 1;
        self.flash_bytes_written += bytes;
    }

    /// Overall hit rate, `hits / accesses`, `0.0` when there have been no
    /// accesses yet.
    pub fn hit_rate(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.hits as f64 / self.accesses as f64
        }
    }

    /// Sorted `key value` snapshot suitable for a dump file or comparison
    /// across runs.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut m = BTreeMap::new();
        m.insert("accesses".into(), self.accesses as f64);
        m.insert("hits".into(), self.hits as f64);
        m.insert("hits_dram".into(), self.hits_dram as f64);
        m.insert("hits_flash".into(), self.hits_flash as f64);
        m.insert("writes_flash".into(), self.writes_flash as f64);
        m.insert(
            "flash_bytes_written".into(),
            self.flash_bytes_written as f64,
        );
        m.insert("credit_limit".into(), self.credit_limit as f64);
        m.insert("evicted_items".into(), self.evicted_items as f64);
        m.insert("evicted_bytes".into(), self.evicted_bytes as f64);
        m.insert("bytes_cached".into(), self.bytes_cached as f64);
        m.insert("hit_rate".into(), self.hit_rate());
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_zero_before_any_access() {
        let s = Stats::new();
        assert_eq!(s.hit_rate(), 0.0);
    }

    #[test]
    fn record_hit_and_miss_track_accesses() {
        let mut s = Stats::new();
        s.record_hit(Some(true));
        s.record_miss();
        assert_eq!(s.accesses, 2);
        assert_eq!(s.hits, 1);
        assert_eq!(s.hits_dram, 1);
        assert!((s.hit_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn evicted_bytes_monotonic_across_calls() {
        let mut s = Stats::new();
        s.record_eviction(10);
        let after_first = s.evicted_bytes;
        s.record_eviction(5);
        assert!(s.evicted_bytes >= after_first);
    }
}
