//! `K` stacked LRU queues with promotion/demotion cascade (spec §4.3).
//!
//! Grounded on `original_source/src/lruk.cpp`. New items enter queue 0.
//! A hit promotes the item to the next queue up (capped at `K-1`, where it
//! just moves to the front of the same queue instead). Inserting into a
//! queue `q > 0` may overflow it; the overflowing tail items cascade down
//! into queue `q-1` (recursively — modeled here as a loop rather than
//! recursion to keep stack depth bounded by `K`, not by trace length).
//! Queue 0's tail, when it overflows, is expelled from the cache entirely.

use crate::collections::{HashMap, Vec};
use crate::config::LruKConfig;
use crate::error::PolicyError;
use crate::list::IdList;
use crate::policy::{Outcome, Policy};
use crate::request::Request;
use crate::stats::Stats;

#[derive(Debug, Clone, Copy)]
struct ItemMeta {
    size: u64,
    queue: usize,
}

/// K-level LRU-K cache.
#[derive(Debug)]
pub struct LruK {
    config: LruKConfig,
    queues: Vec<IdList>,
    queue_bytes: Vec<u64>,
    index: HashMap<u32, ItemMeta>,
    bytes_cached: u64,
    stats: Stats,
}

impl LruK {
    /// Builds an empty LRU-K cache with `config.k()` queues.
    pub fn new(config: LruKConfig) -> Self {
        let k = config.k();
        Self {
            config,
            queues: (0..k).map(|_| IdList::new()).collect(),
            queue_bytes: crate::collections::vec![0; k],
            index: HashMap::default(),
            bytes_cached: 0,
            stats: Stats::new(),
        }
    }

    /// Total bytes resident in queue `q`.
    pub fn queue_bytes(&self, q: usize) -> u64 {
        self.queue_bytes[q]
    }

    /// Which queue `kid` currently sits in, if cached.
    pub fn queue_of(&self, kid: u32) -> Option<usize> {
        self.index.get(&kid).map(|m| m.queue)
    }

    fn admit(&mut self, mut objects: Vec<(u32, u64)>, mut q: usize) {
        loop {
            let incoming_sum: u64 = objects.iter().map(|&(_, s)| s).sum();
            let cap = self.config.queue_sizes[q];
            let mut cascade = Vec::new();

            while self.queue_bytes[q] + incoming_sum > cap {
                let Some(victim) = self.queues[q].pop_back() else {
                    break;
                };
                let meta = self.index.remove(&victim).expect("queue/index desync");
                self.queue_bytes[q] -= meta.size;
                if q > 0 {
                    cascade.push((victim, meta.size));
                } else {
                    self.bytes_cached -= meta.size;
                    self.stats.record_eviction(meta.size);
                }
            }

            for &(kid, size) in &objects {
                self.queues[q].push_front(kid);
                self.index.insert(kid, ItemMeta { size, queue: q });
                self.queue_bytes[q] += size;
            }

            if q > 0 && !cascade.is_empty() {
                objects = cascade;
                q -= 1;
                continue;
            }
            break;
        }
    }
}

impl Policy for LruK {
    fn process_request(&mut self, req: &Request, warmup: bool) -> Result<Outcome, PolicyError> {
        let size = req.size();
        if let Some(meta) = self.index.get(&req.kid).copied() {
            if meta.size == size {
                self.queues[meta.queue].remove(req.kid);
                self.queue_bytes[meta.queue] -= meta.size;
                let target = if meta.queue + 1 < self.config.k() {
                    meta.queue + 1
                } else {
                    meta.queue
                };
                self.admit(crate::collections::vec![(req.kid, size)], target);
                if !warmup {
                    self.stats.record_hit(None);
                }
                self.stats.bytes_cached = self.bytes_cached;
                return Ok(Outcome::hit());
            }
            self.queues[meta.queue].remove(req.kid);
            self.queue_bytes[meta.queue] -= meta.size;
            self.index.remove(&req.kid);
            self.bytes_cached -= meta.size;
        }

        if size > self.config.queue_sizes[0] {
            return Err(PolicyError::RequestTooLarge {
                kid: req.kid,
                size,
                limit: self.config.queue_sizes[0],
            });
        }

        self.bytes_cached += size;
        self.admit(crate::collections::vec![(req.kid, size)], 0);
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
        "lruk"
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
    fn e3_lruk_promotion() {
        // spec E3: K=2, queue_size=2B, items of size 1. Sequence a,b,a,b,c.
        let config = LruKConfig::uniform(2, 2);
        let mut c = LruK::new(config);
        c.process_request(&req(1, 1), false).unwrap(); // a miss -> q0
        c.process_request(&req(2, 1), false).unwrap(); // b miss -> q0
        c.process_request(&req(1, 1), false).unwrap(); // a hit -> q1
        c.process_request(&req(2, 1), false).unwrap(); // b hit -> q1
        c.process_request(&req(3, 1), false).unwrap(); // c miss -> q0

        assert_eq!(c.queue_of(1), Some(1));
        assert_eq!(c.queue_of(2), Some(1));
        assert_eq!(c.queue_of(3), Some(0));
        assert_eq!(c.bytes_cached(), 3);
    }

    #[test]
    fn queue_byte_caps_never_exceeded() {
        let config = LruKConfig::uniform(3, 5);
        let mut c = LruK::new(config);
        for kid in 0..50u32 {
            c.process_request(&req(kid, 1), false).unwrap();
            c.process_request(&req(kid, 1), false).unwrap();
            for q in 0..3 {
                assert!(c.queue_bytes(q) <= 5);
            }
        }
    }
}
