//! Slab-class-rounded LRU, its multi-tenant variant, and a hash-sharded
//! LRU farm (spec §4.12).
//!
//! Grounded on `original_source/src/slab_multi.h` and `mc.cpp`'s class
//! table. Each class is just a [`crate::lru::Lru`] sized to the class's
//! nominal object size — a slab cache is, structurally, a bank of plain
//! LRUs plus a classifier in front of them, so the per-class state reuses
//! `Lru` directly rather than reimplementing eviction.

use crate::collections::{HashMap, Vec};
use crate::config::{PartitionedLruConfig, SlabConfig, SlabMultiConfig};
use crate::config::lru::LruConfig;
use crate::error::PolicyError;
use crate::hashing::sha1_shard;
use crate::lru::Lru;
use crate::policy::{Outcome, Policy};
use crate::request::Request;
use crate::slabclass::SlabClassTable;
use crate::stats::Stats;

const SLAB_SIZE: u64 = 1024 * 1024;

/// Single-tenant slab-class cache (spec §4.12).
#[derive(Debug)]
pub struct Slab {
    config: SlabConfig,
    table: SlabClassTable,
    classes: HashMap<u32, Lru>,
    kid_class: HashMap<u32, u32>,
    global_allocated: u64,
    frag_bytes: u64,
    stats: Stats,
}

impl Slab {
    /// Builds a slab cache using the memcached geometric class table at
    /// `config.growth_factor`.
    pub fn new(config: SlabConfig) -> Self {
        let table = SlabClassTable::memcached(config.growth_factor);
        Self {
            config,
            table,
            classes: HashMap::default(),
            kid_class: HashMap::default(),
            global_allocated: 0,
            frag_bytes: 0,
            stats: Stats::new(),
        }
    }

    /// Total rounding waste accumulated across every admission.
    pub fn fragmentation_bytes(&self) -> u64 {
        self.frag_bytes
    }

    fn grow_class(&mut self, class_id: u32, needed: u64) {
        let class = self
            .classes
            .entry(class_id)
            .or_insert_with(|| Lru::new(LruConfig::new(0)));
        while class.would_cause_eviction(needed) && self.global_allocated + SLAB_SIZE <= self.config.global_mem {
            class.expand(SLAB_SIZE);
            self.global_allocated += SLAB_SIZE;
        }
    }
}

impl Policy for Slab {
    fn process_request(&mut self, req: &Request, warmup: bool) -> Result<Outcome, PolicyError> {
        let Some(class) = self.table.classify(req.size()) else {
            if !warmup {
                self.stats.record_miss();
            }
            return Ok(Outcome::Miss);
        };

        if let Some(&old_class) = self.kid_class.get(&req.kid) {
            if old_class != class.id {
                if let Some(old) = self.classes.get_mut(&old_class) {
                    old.remove(req.kid);
                }
                self.kid_class.remove(&req.kid);
            }
        }

        self.grow_class(class.id, class.size);
        let rounded = Request::new(req.time, req.app_id, req.kind, 0, class.size as u32, req.kid);
        let was_cached = self
            .classes
            .get(&class.id)
            .is_some_and(|c| c.would_hit(req.kid));
        let engine = self.classes.entry(class.id).or_insert_with(|| Lru::new(LruConfig::new(0)));
        let outcome = engine.process_request(&rounded, warmup)?;

        if !was_cached {
            self.kid_class.insert(req.kid, class.id);
            self.frag_bytes += class.size.saturating_sub(req.size());
        }
        if !warmup {
            if outcome.is_hit() {
                self.stats.record_hit(None);
            } else {
                self.stats.record_miss();
            }
        }
        self.stats.bytes_cached = self.bytes_cached();
        Ok(outcome)
    }

    fn bytes_cached(&self) -> u64 {
        self.classes.values().map(Lru::bytes_cached).sum()
    }

    fn name(&self) -> &'static str {
        "slab"
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

#[derive(Debug, Clone, Copy)]
struct AppAccount {
    target_mem: u64,
    min_mem: u64,
    /// Signed so a donor's stolen-from balance can go negative: stealing is
    /// zero-sum, the donor's real usable budget shrinks by exactly what the
    /// borrower gains (`original_source/src/slab_multi.h`'s `ssize_t`).
    credit_bytes: i64,
}

impl AppAccount {
    fn bytes_limit(&self) -> u64 {
        (self.target_mem as i64 + self.credit_bytes).max(0) as u64
    }
}

/// Multi-tenant slab cache: one independent class bank per `app_id`, each
/// accounted against a per-tenant memory budget with credit stealing
/// (spec §4.12).
#[derive(Debug)]
pub struct SlabMulti {
    config: SlabMultiConfig,
    tenants: HashMap<u64, Slab>,
    accounts: HashMap<u64, AppAccount>,
    stats: Stats,
}

impl SlabMulti {
    /// Builds a multi-tenant cache from the configured app list.
    pub fn new(config: SlabMultiConfig) -> Self {
        let mut accounts = HashMap::default();
        for app in &config.apps {
            accounts.insert(
                app.app_id,
                AppAccount {
                    target_mem: app.target_mem,
                    min_mem: app.target_mem * app.min_mem_pct / 100,
                    credit_bytes: 0,
                },
            );
        }
        Self {
            config,
            tenants: HashMap::default(),
            accounts,
            stats: Stats::new(),
        }
    }

    /// Attempts to borrow `n` bytes of credit from `other`'s budget.
    /// Succeeds iff `other.bytes_limit() - n >= other.min_mem`. The donor's
    /// `credit_bytes` is debited by the full `n`, genuinely going negative
    /// if `other` had no surplus credit of its own to give up, so the
    /// donor's own `bytes_limit()` shrinks by exactly what the borrower
    /// gains — stealing is zero-sum, not free headroom.
    fn try_steal_from(&mut self, other_app: u64, n: u64) -> bool {
        let Some(other) = self.accounts.get(&other_app) else {
            return false;
        };
        if other.bytes_limit() < n || other.bytes_limit() - n < other.min_mem {
            return false;
        }
        self.accounts.get_mut(&other_app).expect("checked above").credit_bytes -= n as i64;
        true
    }

    fn ensure_budget(&mut self, app_id: u64, needed: u64) {
        let Some(&account) = self.accounts.get(&app_id) else {
            return;
        };
        if needed <= account.bytes_limit() {
            return;
        }
        let shortfall = needed - account.bytes_limit();
        let donors: Vec<u64> = self.accounts.keys().filter(|&&id| id != app_id).copied().collect();
        for donor in donors {
            if self.try_steal_from(donor, shortfall) {
                self.accounts.get_mut(&app_id).expect("checked above").credit_bytes += shortfall as i64;
                break;
            }
        }
    }
}

impl Policy for SlabMulti {
    fn process_request(&mut self, req: &Request, warmup: bool) -> Result<Outcome, PolicyError> {
        self.ensure_budget(req.app_id, req.size());
        let base = SlabConfig {
            global_mem: self
                .accounts
                .get(&req.app_id)
                .map_or(self.config.base.global_mem, AppAccount::bytes_limit),
            growth_factor: self.config.base.growth_factor,
        };
        let tenant = self.tenants.entry(req.app_id).or_insert_with(|| Slab::new(base));
        let outcome = tenant.process_request(req, warmup)?;
        if !warmup {
            if outcome.is_hit() {
                self.stats.record_hit(None);
            } else {
                self.stats.record_miss();
            }
        }
        self.stats.bytes_cached = self.bytes_cached();
        Ok(outcome)
    }

    fn bytes_cached(&self) -> u64 {
        self.tenants.values().map(Policy::bytes_cached).sum()
    }

    fn name(&self) -> &'static str {
        "slab_multi"
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

/// Hash-sharded LRU farm: `hash(kid) mod partitions` picks an independent
/// LRU per request (spec §4.12).
#[derive(Debug)]
pub struct PartitionedLru {
    config: PartitionedLruConfig,
    partitions: Vec<Lru>,
    stats: Stats,
}

impl PartitionedLru {
    /// Builds `config.partitions` independent LRUs, each
    /// `config.partition_bytes` large.
    pub fn new(config: PartitionedLruConfig) -> Self {
        let partitions = (0..config.partitions)
            .map(|_| Lru::new(LruConfig::new(config.partition_bytes)))
            .collect();
        Self {
            config,
            partitions,
            stats: Stats::new(),
        }
    }

    fn partition_of(&self, kid: u32) -> usize {
        sha1_shard(kid, u64::from(self.config.partitions)) as usize
    }

    /// Current byte total held by partition `p`.
    pub fn partition_bytes(&self, p: usize) -> u64 {
        self.partitions[p].bytes_cached()
    }
}

impl Policy for PartitionedLru {
    fn process_request(&mut self, req: &Request, warmup: bool) -> Result<Outcome, PolicyError> {
        let p = self.partition_of(req.kid);
        let outcome = self.partitions[p].process_request(req, warmup)?;
        if !warmup {
            if outcome.is_hit() {
                self.stats.record_hit(None);
            } else {
                self.stats.record_miss();
            }
        }
        self.stats.bytes_cached = self.bytes_cached();
        Ok(outcome)
    }

    fn bytes_cached(&self) -> u64 {
        self.partitions.iter().map(Lru::bytes_cached).sum()
    }

    fn name(&self) -> &'static str {
        "partitioned_lru"
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::slab::SlabMultiAppConfig;

    fn req(kid: u32, size: u32) -> Request {
        Request::new(0.0, 0, 0, 0, size, kid)
    }

    #[test]
    fn oversize_object_is_a_compulsory_miss() {
        let mut c = Slab::new(SlabConfig::new(SLAB_SIZE * 4));
        let outcome = c.process_request(&req(1, 2_000_000), false).unwrap();
        assert_eq!(outcome, Outcome::Miss);
    }

    #[test]
    fn e7_partitioned_lru_keeps_partitions_independent() {
        // spec E7: 4 partitions of 10 B each.
        let config = PartitionedLruConfig::even_split(40, 4);
        let mut c = PartitionedLru::new(config);
        for kid in 0..200u32 {
            c.process_request(&req(kid, 1), false).unwrap();
            for p in 0..4 {
                assert!(c.partition_bytes(p) <= 10);
            }
        }
    }

    #[test]
    fn slab_multi_tracks_hits_across_tenants() {
        let config = SlabMultiConfig {
            base: SlabConfig::new(SLAB_SIZE * 8),
            apps: crate::collections::vec![
                SlabMultiAppConfig { app_id: 1, min_mem_pct: 10, target_mem: SLAB_SIZE * 4 },
                SlabMultiAppConfig { app_id: 2, min_mem_pct: 10, target_mem: SLAB_SIZE * 4 },
            ],
        };
        let mut c = SlabMulti::new(config);
        c.process_request(&req(1, 100), false).unwrap();
        let hit = c.process_request(&req(1, 100), false).unwrap();
        assert_eq!(hit, Outcome::hit());
    }
}
