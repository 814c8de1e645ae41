//! Single-queue byte-bounded LRU (spec §4.1).
//!
//! One hash index plus one recency list. Grounded on
//! `original_source/src/lru.cpp`: same-size hit splices to front; a
//! size-changed hit erases the old record and falls through to the miss
//! path (not counted as a hit); a miss evicts from the tail until there is
//! room, then inserts at the front.

use crate::collections::HashMap;
use crate::config::LruConfig;
use crate::error::PolicyError;
use crate::list::IdList;
use crate::policy::{Outcome, Policy};
use crate::request::Request;
use crate::stats::Stats;

#[derive(Debug)]
struct Item {
    size: u64,
}

/// Byte-bounded single-queue LRU.
#[derive(Debug)]
pub struct Lru {
    config: LruConfig,
    index: HashMap<u32, Item>,
    order: IdList,
    bytes_cached: u64,
    stats: Stats,
}

impl Lru {
    /// Builds an empty LRU with the given configuration.
    pub fn new(config: LruConfig) -> Self {
        Self {
            config,
            index: HashMap::default(),
            order: IdList::new(),
            bytes_cached: 0,
            stats: Stats::new(),
        }
    }

    /// Capacity in bytes.
    pub fn capacity(&self) -> u64 {
        self.config.capacity
    }

    /// Whether admitting `size` more bytes (on top of whatever is already
    /// cached) would require at least one eviction.
    pub fn would_cause_eviction(&self, size: u64) -> bool {
        self.bytes_cached + size > self.config.capacity
    }

    /// Whether `kid` is currently cached.
    pub fn would_hit(&self, kid: u32) -> bool {
        self.index.contains_key(&kid)
    }

    /// Raises capacity by `bytes`. Never evicts (capacity only grows).
    pub fn expand(&mut self, bytes: u64) {
        self.config.capacity += bytes;
    }

    /// Inserts `kid`/`size` at the tail without evicting; fails (returns
    /// `false`, no state change) if there isn't room.
    pub fn try_add_tail(&mut self, kid: u32, size: u64) -> bool {
        if self.index.contains_key(&kid) || self.bytes_cached + size > self.config.capacity {
            return false;
        }
        self.index.insert(kid, Item { size });
        self.order.push_back(kid);
        self.bytes_cached += size;
        self.stats.bytes_cached = self.bytes_cached;
        true
    }

    /// Removes `kid` from the cache, returning the byte-weighted stack
    /// distance (sum of sizes of items strictly in front of it), or
    /// `None` if not cached.
    pub fn remove(&mut self, kid: u32) -> Option<u64> {
        if !self.index.contains_key(&kid) {
            return None;
        }
        let mut distance = 0u64;
        for id in self.order.iter() {
            if id == kid {
                break;
            }
            distance += self.index[&id].size;
        }
        let item = self.index.remove(&kid).expect("checked above");
        self.order.remove(kid);
        self.bytes_cached -= item.size;
        self.stats.bytes_cached = self.bytes_cached;
        Some(distance)
    }

    fn evict_until_fits(&mut self, incoming: u64) {
        while self.bytes_cached + incoming > self.config.capacity {
            let Some(victim) = self.order.pop_back() else {
                break;
            };
            let item = self.index.remove(&victim).expect("index/order desynced");
            self.bytes_cached -= item.size;
            self.stats.record_eviction(item.size);
        }
        self.stats.bytes_cached = self.bytes_cached;
    }
}

impl Policy for Lru {
    fn process_request(&mut self, req: &Request, warmup: bool) -> Result<Outcome, PolicyError> {
        let size = req.size();
        if let Some(item) = self.index.get(&req.kid) {
            if item.size == size {
                self.order.move_to_front(req.kid);
                if !warmup {
                    self.stats.record_hit(None);
                }
                return Ok(Outcome::hit());
            }
            // Size changed: erase then fall through to the miss path.
            let old = self.index.remove(&req.kid).expect("checked above");
            self.order.remove(req.kid);
            self.bytes_cached -= old.size;
        }

        if size > self.config.capacity {
            return Err(PolicyError::RequestTooLarge {
                kid: req.kid,
                size,
                limit: self.config.capacity,
            });
        }

        self.evict_until_fits(size);
        self.index.insert(req.kid, Item { size });
        self.order.push_front(req.kid);
        self.bytes_cached += size;
        self.stats.bytes_cached = self.bytes_cached;
        if !warmup {
            self.stats.record_miss();
        }
        Ok(Outcome::Miss)
    }

    fn bytes_cached(&self) -> u64 {
        self.bytes_cached
    }

    fn name(&self) -> &'static str {
        "lru"
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
    fn e1_lru_basic_eviction_and_rehit() {
        // spec E1: capacity 100, inserts (1,40)(2,40)(3,40).
        let mut c = Lru::new(LruConfig::new(100));
        c.process_request(&req(1, 40), false).unwrap();
        c.process_request(&req(2, 40), false).unwrap();
        c.process_request(&req(3, 40), false).unwrap();
        assert_eq!(c.bytes_cached(), 80);
        assert!(!c.would_hit(1));
        assert_eq!(
            c.process_request(&req(2, 40), false).unwrap(),
            Outcome::hit()
        );
        assert_eq!(c.process_request(&req(1, 40), false).unwrap(), Outcome::Miss);
        assert!(c.would_hit(3));
    }

    #[test]
    fn repeated_same_size_access_is_hit_after_first() {
        // spec property 9/10.
        let mut c = Lru::new(LruConfig::new(100));
        c.process_request(&req(1, 10), false).unwrap();
        for _ in 0..5 {
            assert_eq!(
                c.process_request(&req(1, 10), false).unwrap(),
                Outcome::hit()
            );
        }
        assert_eq!(c.stats().hits, 5);
        assert_eq!(c.stats().evicted_items, 0);
    }

    #[test]
    fn size_changed_access_is_not_a_hit() {
        let mut c = Lru::new(LruConfig::new(100));
        c.process_request(&req(1, 10), false).unwrap();
        let outcome = c.process_request(&req(1, 20), false).unwrap();
        assert_eq!(outcome, Outcome::Miss);
        assert_eq!(c.bytes_cached(), 20);
    }

    #[test]
    fn remove_reports_stack_distance() {
        let mut c = Lru::new(LruConfig::new(100));
        c.process_request(&req(1, 10), false).unwrap();
        c.process_request(&req(2, 10), false).unwrap();
        c.process_request(&req(3, 10), false).unwrap();
        // order front-to-back: 3, 2, 1
        assert_eq!(c.remove(1), Some(20));
    }

    #[test]
    fn oversize_request_is_rejected() {
        let mut c = Lru::new(LruConfig::new(10));
        let err = c.process_request(&req(1, 20), false).unwrap_err();
        assert!(matches!(err, PolicyError::RequestTooLarge { .. }));
    }
}
