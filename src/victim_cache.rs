//! Two cascading LRUs: DRAM backed by a Flash victim cache (spec §4.11).
//!
//! Grounded on `original_source/src/victim_cache.cpp`. Simplest of the
//! tiered engines: no flashiness scoring, no credits, no blocks — an item
//! evicted from DRAM always lands at the front of Flash, and a hit in
//! either tier lifts the item back to DRAM front, cascading the same
//! DRAM-overflow-into-Flash rule recursively (here, iteratively).

use crate::collections::HashMap;
use crate::config::VictimCacheConfig;
use crate::error::PolicyError;
use crate::list::IdList;
use crate::policy::{Outcome, Policy};
use crate::request::Request;
use crate::stats::Stats;

#[derive(Debug, Clone, Copy)]
struct Item {
    size: u64,
    in_dram: bool,
}

/// DRAM LRU backed by a Flash LRU victim cache.
#[derive(Debug)]
pub struct VictimCache {
    config: VictimCacheConfig,
    items: HashMap<u32, Item>,
    dram: IdList,
    flash: IdList,
    dram_bytes: u64,
    flash_bytes: u64,
    stats: Stats,
}

impl VictimCache {
    /// Builds an empty victim cache with the given configuration.
    pub fn new(config: VictimCacheConfig) -> Self {
        Self {
            config,
            items: HashMap::default(),
            dram: IdList::new(),
            flash: IdList::new(),
            dram_bytes: 0,
            flash_bytes: 0,
            stats: Stats::new(),
        }
    }

    fn evict_flash_tail(&mut self) {
        if let Some(victim) = self.flash.pop_back() {
            let item = self.items.remove(&victim).expect("flash/index desync");
            self.flash_bytes -= item.size;
            self.stats.record_eviction(item.size);
        }
    }

    /// Pushes `kid` to Flash front, cascading an eviction if Flash
    /// overflows.
    fn push_flash(&mut self, kid: u32, size: u64) {
        while self.flash_bytes + size > self.config.flash_size {
            if self.flash.is_empty() {
                break;
            }
            self.evict_flash_tail();
        }
        self.flash.push_front(kid);
        self.flash_bytes += size;
        self.items.insert(kid, Item { size, in_dram: false });
        self.stats.record_flash_write(size);
    }

    /// Pushes `kid` to DRAM front, cascading any overflowing tail item
    /// down into Flash (which may itself cascade an eviction).
    fn push_dram(&mut self, kid: u32, size: u64) {
        while self.dram_bytes + size > self.config.dram_size {
            let Some(victim) = self.dram.pop_back() else {
                break;
            };
            let item = self.items.remove(&victim).expect("dram/index desync");
            self.dram_bytes -= item.size;
            self.push_flash(victim, item.size);
        }
        self.dram.push_front(kid);
        self.dram_bytes += size;
        self.items.insert(kid, Item { size, in_dram: true });
    }
}

impl Policy for VictimCache {
    fn process_request(&mut self, req: &Request, warmup: bool) -> Result<Outcome, PolicyError> {
        let size = req.size();
        if size > self.config.dram_size {
            return Err(PolicyError::RequestTooLarge {
                kid: req.kid,
                size,
                limit: self.config.dram_size,
            });
        }

        if let Some(item) = self.items.get(&req.kid).copied() {
            if item.size == size {
                let tier_dram = item.in_dram;
                if item.in_dram {
                    self.dram.move_to_front(req.kid);
                } else {
                    self.flash.remove(req.kid);
                    self.flash_bytes -= item.size;
                    self.items.remove(&req.kid);
                    self.push_dram(req.kid, size);
                }
                if !warmup {
                    self.stats.record_hit(Some(tier_dram));
                }
                self.stats.bytes_cached = self.dram_bytes;
                return Ok(Outcome::hit());
            }
            if item.in_dram {
                self.dram.remove(req.kid);
                self.dram_bytes -= item.size;
            } else {
                self.flash.remove(req.kid);
                self.flash_bytes -= item.size;
            }
            self.items.remove(&req.kid);
        }

        self.push_dram(req.kid, size);
        self.stats.bytes_cached = self.dram_bytes;
        if !warmup {
            self.stats.record_miss();
        }
        Ok(Outcome::Miss)
    }

    fn bytes_cached(&self) -> u64 {
        self.dram_bytes + self.flash_bytes
    }

    fn name(&self) -> &'static str {
        "victim_cache"
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(kid: u32, size: u32) -> Request {
        Request::new(0.0, 0, 0, 0, size, kid)
    }

    #[test]
    fn dram_overflow_cascades_into_flash() {
        let mut c = VictimCache::new(VictimCacheConfig::new(2, 2));
        c.process_request(&req(1, 1), false).unwrap();
        c.process_request(&req(2, 1), false).unwrap();
        c.process_request(&req(3, 1), false).unwrap();
        // 1 should have cascaded out of DRAM into Flash.
        assert!(!c.items[&1].in_dram);
        assert_eq!(c.bytes_cached(), 3);
    }

    #[test]
    fn flash_hit_lifts_item_back_to_dram() {
        let mut c = VictimCache::new(VictimCacheConfig::new(2, 2));
        c.process_request(&req(1, 1), false).unwrap();
        c.process_request(&req(2, 1), false).unwrap();
        c.process_request(&req(3, 1), false).unwrap();
        assert!(!c.items[&1].in_dram);
        let outcome = c.process_request(&req(1, 1), false).unwrap();
        assert_eq!(outcome, Outcome::hit());
        assert!(c.items[&1].in_dram);
    }

    #[test]
    fn total_bytes_never_exceed_dram_plus_flash() {
        let mut c = VictimCache::new(VictimCacheConfig::new(5, 5));
        for kid in 0..50u32 {
            c.process_request(&req(kid, 1), false).unwrap();
            assert!(c.bytes_cached() <= 10);
        }
    }
}
