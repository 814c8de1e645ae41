//! FlashCache with a `K`-queue LRU-K DRAM tier instead of a single LRU
//! (spec §4.5).
//!
//! Reuses [`crate::flash_cache::FlashCache`]'s outer miss-path loop
//! (admit-to-DRAM / credit-gate / migrate-to-flash / evict-global-LRU) and
//! [`crate::lruk::LruK`]'s cascading queue-promotion admit, composed rather
//! than duplicated logic-by-logic: the DRAM tier here is structurally the
//! same `Vec<IdList>` of queues as `LruK`, just wired into the FlashCache
//! credit/flash machinery instead of standing alone.

use crate::collections::{HashMap, Vec};
use crate::config::FlashCacheLrukConfig;
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
}

/// FlashCache with a multi-queue (LRU-K) DRAM tier.
#[derive(Debug)]
pub struct FlashCacheLruk {
    config: FlashCacheLrukConfig,
    items: HashMap<u32, Item>,
    queues: Vec<IdList>,
    queue_bytes: Vec<u64>,
    flash: IdList,
    global_lru: IdList,
    dram_bytes: u64,
    flash_bytes: u64,
    credits: f64,
    last_request_time: f64,
    stats: Stats,
}

impl FlashCacheLruk {
    /// Builds an empty engine with `config.k()` DRAM queues.
    pub fn new(config: FlashCacheLrukConfig) -> Self {
        let k = config.k();
        Self {
            config,
            items: HashMap::default(),
            queues: (0..k).map(|_| IdList::new()).collect(),
            queue_bytes: crate::collections::vec![0; k],
            flash: IdList::new(),
            global_lru: IdList::new(),
            dram_bytes: 0,
            flash_bytes: 0,
            credits: 0.0,
            last_request_time: 0.0,
            stats: Stats::new(),
        }
    }

    fn accrue_credits(&mut self, now: f64) {
        let dt = (now - self.last_request_time).max(0.0);
        self.credits += dt * self.config.base.flash_rate;
        self.last_request_time = now;
    }

    /// Highest non-empty queue's head item: the flash-admission candidate.
    fn mfu(&self) -> Option<u32> {
        self.queues.iter().rev().find_map(|q| q.front())
    }

    /// Admits `(kid, size)` into queue `q`, cascading overflow down
    /// through lower queues; overflow out of queue 0 leaves DRAM (and the
    /// global LRU) outright, the same terminal case as plain `LruK`.
    fn admit_dram(&mut self, kid: u32, size: u64, mut q: usize) {
        let mut incoming = crate::collections::vec![(kid, size)];
        loop {
            let incoming_sum: u64 = incoming.iter().map(|&(_, s)| s).sum();
            let cap = self.config.queue_sizes[q];
            let mut cascade = Vec::new();

            while self.queue_bytes[q] + incoming_sum > cap {
                let Some(victim) = self.queues[q].pop_back() else {
                    break;
                };
                let meta = self.items.remove(&victim).expect("queue/index desync");
                self.queue_bytes[q] -= meta.size;
                if q > 0 {
                    cascade.push((victim, meta.size));
                } else {
                    self.global_lru.remove(victim);
                    self.dram_bytes -= meta.size;
                    self.stats.record_eviction(meta.size);
                }
            }

            for &(id, sz) in &incoming {
                self.queues[q].push_front(id);
                self.items.insert(id, Item { size: sz, in_dram: true, queue: q });
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

    fn admit_miss(&mut self, kid: u32, size: u64) {
        loop {
            if self.dram_bytes + size <= self.config.base.dram_size {
                self.dram_bytes += size;
                self.global_lru.push_front(kid);
                self.admit_dram(kid, size, 0);
                return;
            }

            let mfu = self.mfu().expect("dram full but every queue empty");
            let mfu_size = self.items[&mfu].size;
            let mfu_queue = self.items[&mfu].queue;

            if self.config.credit_gated && self.credits < mfu_size as f64 {
                self.stats.credit_limit += 1;
                while self.dram_bytes + size > self.config.base.dram_size {
                    let mut evicted = false;
                    for q in &mut self.queues {
                        if let Some(victim) = q.pop_back() {
                            let meta = self.items.remove(&victim).expect("queue/index desync");
                            self.queue_bytes[meta.queue] -= meta.size;
                            self.global_lru.remove(victim);
                            self.dram_bytes -= meta.size;
                            self.stats.record_eviction(meta.size);
                            evicted = true;
                            break;
                        }
                    }
                    if !evicted {
                        break;
                    }
                }
                continue;
            }

            if self.flash_bytes + mfu_size <= self.config.base.flash_size {
                self.queues[mfu_queue].remove(mfu);
                self.queue_bytes[mfu_queue] -= mfu_size;
                self.dram_bytes -= mfu_size;
                self.flash.push_front(mfu);
                self.flash_bytes += mfu_size;
                self.credits = (self.credits - mfu_size as f64).max(0.0);
                self.items.get_mut(&mfu).expect("checked above").in_dram = false;
                self.stats.record_flash_write(mfu_size);
                continue;
            }

            let Some(victim) = self.global_lru.pop_back() else {
                return;
            };
            let item = self.items.remove(&victim).expect("global_lru/index desync");
            if item.in_dram {
                self.queues[item.queue].remove(victim);
                self.queue_bytes[item.queue] -= item.size;
                self.dram_bytes -= item.size;
            } else {
                self.flash.remove(victim);
                self.flash_bytes -= item.size;
            }
            self.stats.record_eviction(item.size);
        }
    }
}

impl Policy for FlashCacheLruk {
    fn process_request(&mut self, req: &Request, warmup: bool) -> Result<Outcome, PolicyError> {
        let size = req.size();
        if size > self.config.base.dram_size {
            return Err(PolicyError::RequestTooLarge {
                kid: req.kid,
                size,
                limit: self.config.base.dram_size,
            });
        }

        self.accrue_credits(req.time);

        if let Some(item) = self.items.get(&req.kid).copied() {
            if item.size == size {
                self.global_lru.move_to_front(req.kid);
                if item.in_dram {
                    self.queues[item.queue].remove(req.kid);
                    self.queue_bytes[item.queue] -= item.size;
                    self.items.remove(&req.kid);
                    let target = (item.queue + 1).min(self.config.k() - 1);
                    self.admit_dram(req.kid, item.size, target);
                }
                if !warmup {
                    self.stats.record_hit(Some(item.in_dram));
                }
                self.stats.bytes_cached = self.dram_bytes;
                return Ok(Outcome::hit());
            }
            self.global_lru.remove(req.kid);
            if item.in_dram {
                self.queues[item.queue].remove(req.kid);
                self.queue_bytes[item.queue] -= item.size;
                self.dram_bytes -= item.size;
            } else {
                self.flash.remove(req.kid);
                self.flash_bytes -= item.size;
            }
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
        "flash_cache_lruk"
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(time: f64, kid: u32, size: u32) -> Request {
        Request::new(time, 0, 0, 0, size, kid)
    }

    #[test]
    fn hit_promotes_to_next_queue() {
        let config = FlashCacheLrukConfig::new(10, 10, 2);
        let mut c = FlashCacheLruk::new(config);
        c.process_request(&req(0.0, 1, 1), false).unwrap();
        assert_eq!(c.items[&1].queue, 0);
        c.process_request(&req(1.0, 1, 1), false).unwrap();
        assert_eq!(c.items[&1].queue, 1);
    }

    #[test]
    fn dram_plus_flash_bytes_stay_within_budget() {
        let config = FlashCacheLrukConfig::new(20, 20, 3);
        let mut c = FlashCacheLruk::new(config);
        for kid in 0..60u32 {
            c.process_request(&req(kid as f64 * 10.0, kid, 3), false).unwrap();
            assert!(c.dram_bytes <= 20);
            assert!(c.flash_bytes <= 20);
        }
    }
}
