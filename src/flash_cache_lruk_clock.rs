//! FlashCache-LRUK with a global second-chance CLOCK driving eviction
//! instead of a plain global-LRU tail (spec §4.6).
//!
//! The DRAM tier keeps the same cascading LRU-K queues as
//! [`crate::flash_cache_lruk`]; what changes is victim selection once
//! flash is also full: a CLOCK ring (same `Vec<u32>` + index-hand shape as
//! [`crate::clock::Clock`]) spans every cached item, both tiers, and is
//! swept exactly like plain CLOCK.

use crate::collections::{HashMap, Vec};
use crate::config::FlashCacheLrukClockConfig;
use crate::error::PolicyError;
use crate::list::IdList;
use crate::policy::{Outcome, Policy};
use crate::request::Request;
use crate::stats::Stats;

#[derive(Debug, Clone, Copy)]
struct Item {
    size: u64,
    in_dram: bool,
    queue: usize,
    clock: u8,
}

/// FlashCache-LRUK with global-clock eviction.
#[derive(Debug)]
pub struct FlashCacheLrukClock {
    config: FlashCacheLrukClockConfig,
    items: HashMap<u32, Item>,
    queues: Vec<IdList>,
    queue_bytes: Vec<u64>,
    flash: IdList,
    ring: Vec<u32>,
    hand: usize,
    dram_bytes: u64,
    flash_bytes: u64,
    stats: Stats,
}

impl FlashCacheLrukClock {
    /// Builds an empty engine with `config.base.k()` DRAM queues.
    pub fn new(config: FlashCacheLrukClockConfig) -> Self {
        let k = config.base.k();
        Self {
            config,
            items: HashMap::default(),
            queues: (0..k).map(|_| IdList::new()).collect(),
            queue_bytes: crate::collections::vec![0; k],
            flash: IdList::new(),
            ring: Vec::new(),
            hand: 0,
            dram_bytes: 0,
            flash_bytes: 0,
            stats: Stats::new(),
        }
    }

    fn ring_insert(&mut self, kid: u32) {
        if self.ring.is_empty() {
            self.ring.push(kid);
            self.hand = 0;
        } else {
            self.ring.insert(self.hand, kid);
            self.hand += 1;
        }
    }

    fn ring_remove(&mut self, kid: u32) {
        let Some(idx) = self.ring.iter().position(|&x| x == kid) else {
            return;
        };
        self.ring.remove(idx);
        if self.ring.is_empty() {
            self.hand = 0;
        } else if idx < self.hand {
            self.hand -= 1;
        } else if idx == self.hand && self.hand >= self.ring.len() {
            self.hand = 0;
        }
    }

    fn evict_at_hand(&mut self) -> (u32, u64) {
        let kid = self.ring[self.hand];
        let item = self.items.remove(&kid).expect("ring/index desync");
        self.ring.remove(self.hand);
        if self.ring.is_empty() || self.hand >= self.ring.len() {
            self.hand = 0;
        }
        if item.in_dram {
            self.queues[item.queue].remove(kid);
            self.queue_bytes[item.queue] -= item.size;
            self.dram_bytes -= item.size;
        } else {
            self.flash.remove(kid);
            self.flash_bytes -= item.size;
        }
        (kid, item.size)
    }

    /// A second-chance sweep over the whole ring (both tiers). Always
    /// finds a victim if the ring is non-empty.
    fn clock_evict(&mut self) -> Option<u64> {
        if self.ring.is_empty() {
            return None;
        }
        let start = self.hand;
        loop {
            let kid = self.ring[self.hand];
            if self.items[&kid].counter_is_zero() {
                let (_, size) = self.evict_at_hand();
                self.stats.record_eviction(size);
                return Some(size);
            }
            self.items.get_mut(&kid).expect("ring/index desync").clock -= 1;
            self.hand = (self.hand + 1) % self.ring.len();
            if self.hand == start {
                // Full sweep found no zero; evict here anyway.
                let (_, size) = self.evict_at_hand();
                self.stats.record_eviction(size);
                return Some(size);
            }
        }
    }

    fn admit_dram(&mut self, kid: u32, size: u64, mut q: usize) {
        let mut incoming = crate::collections::vec![(kid, size)];
        loop {
            let incoming_sum: u64 = incoming.iter().map(|&(_, s)| s).sum();
            let cap = self.config.base.queue_sizes[q];
            let mut cascade = Vec::new();

            while self.queue_bytes[q] + incoming_sum > cap {
                let Some(victim) = self.queues[q].pop_back() else {
                    break;
                };
                if q > 0 {
                    let size = self.items[&victim].size;
                    self.queue_bytes[q] -= size;
                    cascade.push((victim, size));
                } else {
                    let item = self.items.remove(&victim).expect("queue/index desync");
                    self.queue_bytes[q] -= item.size;
                    self.dram_bytes -= item.size;
                    self.ring_remove(victim);
                    self.stats.record_eviction(item.size);
                }
            }

            for &(id, sz) in &incoming {
                self.queues[q].push_front(id);
                if let Some(existing) = self.items.get_mut(&id) {
                    existing.queue = q;
                } else {
                    self.items.insert(
                        id,
                        Item {
                            size: sz,
                            in_dram: true,
                            queue: q,
                            clock: self.config.clock_start,
                        },
                    );
                    self.ring_insert(id);
                }
                self.queue_bytes[q] += sz;
            }

            if q > 0 && !cascade.is_empty() {
                incoming = cascade;
                q -= 1;
                continue;
            }
            break;
        }
    }

    /// Highest non-empty queue at or above the flash-eligibility floor.
    fn flash_candidate(&self) -> Option<u32> {
        self.queues
            .iter()
            .enumerate()
            .rev()
            .filter(|&(q, _)| q >= self.config.min_queue_to_move_to_flash)
            .find_map(|(_, q)| q.front())
    }

    fn admit_miss(&mut self, kid: u32, size: u64) {
        loop {
            if self.dram_bytes + size <= self.config.base.base.dram_size {
                self.dram_bytes += size;
                self.admit_dram(kid, size, 0);
                return;
            }

            match self.flash_candidate() {
                None => {
                    let lowest = self.queues.iter().position(|q| !q.is_empty());
                    if let Some(q) = lowest {
                        if let Some(victim) = self.queues[q].pop_back() {
                            let item = self.items.remove(&victim).expect("queue/index desync");
                            self.queue_bytes[q] -= item.size;
                            self.dram_bytes -= item.size;
                            self.ring_remove(victim);
                            self.stats.record_eviction(item.size);
                            continue;
                        }
                    }
                    if self.clock_evict().is_none() {
                        return;
                    }
                }
                Some(candidate) => {
                    let cand_size = self.items[&candidate].size;
                    let cand_queue = self.items[&candidate].queue;
                    if self.flash_bytes + cand_size <= self.config.base.base.flash_size {
                        self.queues[cand_queue].remove(candidate);
                        self.queue_bytes[cand_queue] -= cand_size;
                        self.dram_bytes -= cand_size;
                        self.flash.push_front(candidate);
                        self.flash_bytes += cand_size;
                        self.items.get_mut(&candidate).expect("checked above").in_dram = false;
                        self.stats.record_flash_write(cand_size);
                        continue;
                    }
                    if self.clock_evict().is_none() {
                        return;
                    }
                }
            }
        }
    }
}

impl Item {
    fn counter_is_zero(&self) -> bool {
        self.clock == 0
    }
}

impl Policy for FlashCacheLrukClock {
    fn process_request(&mut self, req: &Request, warmup: bool) -> Result<Outcome, PolicyError> {
        let size = req.size();
        if size > self.config.base.base.dram_size {
            return Err(PolicyError::RequestTooLarge {
                kid: req.kid,
                size,
                limit: self.config.base.base.dram_size,
            });
        }

        if let Some(item) = self.items.get(&req.kid).copied() {
            if item.size == size {
                let tier_dram = item.in_dram;
                let new_clock = item.clock.saturating_add(self.config.clock_jump).min(self.config.clock_max);
                self.items.get_mut(&req.kid).expect("checked above").clock = new_clock;
                if tier_dram {
                    self.queues[item.queue].remove(req.kid);
                    self.queue_bytes[item.queue] -= item.size;
                    let target = (item.queue + 1).min(self.config.base.k() - 1);
                    self.admit_dram(req.kid, item.size, target);
                }
                if !warmup {
                    self.stats.record_hit(Some(tier_dram));
                }
                self.stats.bytes_cached = self.dram_bytes;
                return Ok(Outcome::hit());
            }
            if item.in_dram {
                self.queues[item.queue].remove(req.kid);
                self.queue_bytes[item.queue] -= item.size;
                self.dram_bytes -= item.size;
            } else {
                self.flash.remove(req.kid);
                self.flash_bytes -= item.size;
            }
            self.ring_remove(req.kid);
            self.items.remove(&req.kid);
        }

        self.admit_miss(req.kid, size);
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
        "flash_cache_lruk_clock"
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
    fn hit_bumps_clock_and_promotes_queue() {
        let config = FlashCacheLrukClockConfig::new(10, 10, 2);
        let mut c = FlashCacheLrukClock::new(config);
        c.process_request(&req(1, 1), false).unwrap();
        assert_eq!(c.items[&1].clock, 3);
        c.process_request(&req(1, 1), false).unwrap();
        assert!(c.items[&1].clock >= 3);
        assert_eq!(c.items[&1].queue, 1);
    }

    #[test]
    fn clock_values_never_exceed_max() {
        let config = FlashCacheLrukClockConfig::new(10, 10, 2);
        let mut c = FlashCacheLrukClock::new(config);
        c.process_request(&req(1, 1), false).unwrap();
        for _ in 0..20 {
            c.process_request(&req(1, 1), false).unwrap();
            assert!(c.items[&1].clock <= c.config.clock_max);
        }
    }

    #[test]
    fn bytes_never_exceed_tier_budgets() {
        let config = FlashCacheLrukClockConfig::new(20, 20, 3);
        let mut c = FlashCacheLrukClock::new(config);
        for kid in 0..60u32 {
            c.process_request(&req(kid, 3), false).unwrap();
            assert!(c.dram_bytes <= 20);
            assert!(c.flash_bytes <= 20);
        }
    }
}
