//! Second-chance CLOCK with a per-item counter (spec §4.2).
//!
//! Grounded on `original_source/src/clock.cpp`. The source keeps one
//! `std::list<(kid, counter)>` plus a persistent iterator (`clockIt`, "the
//! hand") that survives across calls and is carefully kept valid through
//! every insert/erase. A `Vec<u32>` with an index-based hand reproduces
//! that exactly (STL `list::insert(it, v)` inserting before an iterator
//! without invalidating it corresponds to `Vec::insert` at the hand's
//! index, followed by bumping the hand index by one to track the same
//! logical element) — the general-purpose [`crate::list::IdList`] doesn't
//! fit here because CLOCK needs "insert before an arbitrary position,
//! keep a live cursor into the middle of the structure", which `IdList`
//! deliberately does not support (it is O(1)-at-the-ends only).

use crate::collections::HashMap;
use crate::config::ClockConfig;
use crate::error::PolicyError;
use crate::policy::{Outcome, Policy};
use crate::request::Request;
use crate::stats::Stats;

#[derive(Debug, Clone, Copy)]
struct ClockItem {
    size: u64,
    counter: u8,
}

/// Second-chance CLOCK cache.
#[derive(Debug)]
pub struct Clock {
    config: ClockConfig,
    items: HashMap<u32, ClockItem>,
    ring: crate::collections::Vec<u32>,
    hand: usize,
    ever_evicted: bool,
    no_zeros: u64,
    bytes_cached: u64,
    stats: Stats,
}

impl Clock {
    /// Builds an empty CLOCK cache with the given configuration.
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config,
            items: HashMap::default(),
            ring: crate::collections::Vec::new(),
            hand: 0,
            ever_evicted: false,
            no_zeros: 0,
            bytes_cached: 0,
            stats: Stats::new(),
        }
    }

    /// Number of times a full sweep found no zero counter and was forced
    /// to evict at the hand anyway.
    pub fn no_zeros(&self) -> u64 {
        self.no_zeros
    }

    fn ring_pos(&self, id: u32) -> usize {
        self.ring
            .iter()
            .position(|&x| x == id)
            .expect("id must be linked")
    }

    /// Removes `id` wherever it sits in the ring, correctly maintaining
    /// the hand so it still refers to the same logical successor
    /// afterwards.
    fn remove_existing(&mut self, id: u32) -> u64 {
        let idx = self.ring_pos(id);
        self.ring.remove(idx);
        let item = self.items.remove(&id).expect("checked by caller");
        self.bytes_cached -= item.size;
        if self.ring.is_empty() {
            self.hand = 0;
        } else if idx < self.hand {
            self.hand -= 1;
        } else if idx == self.hand && self.hand >= self.ring.len() {
            self.hand = 0;
        }
        item.size
    }

    fn insert_new(&mut self, id: u32, size: u64) {
        let counter = if self.ever_evicted {
            self.config.clock_max
        } else {
            0
        };
        if self.ring.is_empty() {
            self.ring.push(id);
            self.hand = 0;
        } else {
            self.ring.insert(self.hand, id);
            self.hand += 1;
        }
        self.items.insert(id, ClockItem { size, counter });
        self.bytes_cached += size;
    }

    fn evict_until_fits(&mut self, incoming: u64) {
        while self.bytes_cached + incoming > self.config.capacity {
            if self.ring.is_empty() {
                break;
            }
            self.ever_evicted = true;
            let start = self.hand;
            let mut evicted = None;

            while self.hand < self.ring.len() {
                let id = self.ring[self.hand];
                if self.items[&id].counter == 0 {
                    evicted = Some(self.evict_at_hand());
                    break;
                }
                self.items.get_mut(&id).expect("ring/index desync").counter -= 1;
                self.hand += 1;
            }

            if evicted.is_none() {
                self.hand = 0;
                while self.hand < start.min(self.ring.len()) {
                    let id = self.ring[self.hand];
                    if self.items[&id].counter == 0 {
                        evicted = Some(self.evict_at_hand());
                        break;
                    }
                    self.items.get_mut(&id).expect("ring/index desync").counter -= 1;
                    self.hand += 1;
                }
            }

            let evicted_bytes = evicted.unwrap_or_else(|| {
                self.no_zeros += 1;
                self.evict_at_hand()
            });
            self.stats.record_eviction(evicted_bytes);
        }
        self.stats.bytes_cached = self.bytes_cached;
    }

    fn evict_at_hand(&mut self) -> u64 {
        let id = self.ring[self.hand];
        let item = self.items.remove(&id).expect("ring/index desync");
        self.ring.remove(self.hand);
        self.bytes_cached -= item.size;
        if self.ring.is_empty() || self.hand >= self.ring.len() {
            self.hand = 0;
        }
        item.size
    }
}

impl Policy for Clock {
    fn process_request(&mut self, req: &Request, warmup: bool) -> Result<Outcome, PolicyError> {
        let size = req.size();
        if let Some(item) = self.items.get_mut(&req.kid) {
            if item.size == size {
                item.counter = self.config.clock_max;
                if !warmup {
                    self.stats.record_hit(None);
                }
                return Ok(Outcome::hit());
            }
            self.remove_existing(req.kid);
        }

        if size > self.config.capacity {
            return Err(PolicyError::RequestTooLarge {
                kid: req.kid,
                size,
                limit: self.config.capacity,
            });
        }

        self.evict_until_fits(size);
        self.insert_new(req.kid, size);
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
        "clock"
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
    fn e2_clock_second_chance_sweep() {
        // spec E2: capacity 3 items of 1B, CLOCK_MAX=1, sequence 1,2,3,1,4.
        let mut cfg = ClockConfig::new(3);
        cfg.clock_max = 1;
        let mut c = Clock::new(cfg);
        for kid in [1u32, 2, 3] {
            c.process_request(&req(kid, 1), false).unwrap();
        }
        assert_eq!(
            c.process_request(&req(1, 1), false).unwrap(),
            Outcome::hit()
        );
        c.process_request(&req(4, 1), false).unwrap();

        assert!(c.items.contains_key(&1));
        assert!(!c.items.contains_key(&2));
        assert!(c.items.contains_key(&3));
        assert!(c.items.contains_key(&4));
        assert_eq!(c.bytes_cached(), 3);
    }

    #[test]
    fn every_counter_stays_within_clock_max() {
        let mut c = Clock::new(ClockConfig::new(5));
        for kid in 0..20u32 {
            c.process_request(&req(kid, 1), false).unwrap();
            for item in c.items.values() {
                assert!(item.counter <= c.config.clock_max);
            }
        }
    }
}
