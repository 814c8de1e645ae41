//! DRAM + flashiness-ordered queue + Flash FIFO + global LRU, with a
//! credit-limited DRAM -> Flash admission channel (spec §4.4).
//!
//! Grounded on `original_source/src/flash_cache.h`/`.cpp`. The source's
//! `COMPARE_TIME`/`RELATIVE` preprocessor flags become
//! [`crate::config::DecayMode`]/[`crate::config::Placement`] runtime
//! fields per spec §9's design note.

use crate::collections::HashMap;
use crate::config::{DecayMode, FlashCacheConfig, Placement};
use crate::error::PolicyError;
use crate::list::{IdList, SortedIdList};
use crate::policy::{Outcome, Policy};
use crate::request::Request;
use crate::stats::Stats;

#[derive(Debug, Clone, Copy)]
struct Item {
    size: u64,
    in_dram: bool,
    last_access_counter: u64,
    last_access_time: f64,
}

/// DRAM+Flash cache with credit-gated, flashiness-ranked migration.
#[derive(Debug)]
pub struct FlashCache {
    config: FlashCacheConfig,
    items: HashMap<u32, Item>,
    dram_lru: IdList,
    dram_flashy: SortedIdList,
    flash: IdList,
    global_lru: IdList,
    dram_bytes: u64,
    flash_bytes: u64,
    credits: f64,
    counter: u64,
    last_request_time: f64,
    stats: Stats,
}

impl FlashCache {
    /// Builds an empty FlashCache with the given configuration.
    pub fn new(config: FlashCacheConfig) -> Self {
        Self {
            config,
            items: HashMap::default(),
            dram_lru: IdList::new(),
            dram_flashy: SortedIdList::new(),
            flash: IdList::new(),
            global_lru: IdList::new(),
            dram_bytes: 0,
            flash_bytes: 0,
            credits: 0.0,
            counter: 0,
            last_request_time: 0.0,
            stats: Stats::new(),
        }
    }

    /// Current flash write credit balance.
    pub fn credits(&self) -> f64 {
        self.credits
    }

    fn accrue_credits(&mut self, now: f64) {
        let dt = (now - self.last_request_time).max(0.0);
        self.credits += dt * self.config.flash_rate;
        self.last_request_time = now;
    }

    fn decay_flashiness(&mut self, dt: f64) {
        let factor = match self.config.decay_mode {
            DecayMode::Place => libm_exp(-1.0 / self.config.k),
            DecayMode::Time => libm_exp(-dt / self.config.k),
        };
        self.dram_flashy.decay_all(factor);
    }

    fn hit_gain(&self, item: &Item, now_counter: u64, now_time: f64) -> f64 {
        let delta = match self.config.decay_mode {
            DecayMode::Place => (now_counter.saturating_sub(item.last_access_counter)).max(1) as f64,
            DecayMode::Time => (now_time - item.last_access_time).max(1e-9),
        };
        (1.0 - libm_exp(-delta / self.config.k)) * (self.config.l_fc / delta)
    }

    fn admit_to_dram(&mut self, kid: u32, size: u64) {
        self.dram_lru.push_front(kid);
        self.global_lru.push_front(kid);
        self.dram_bytes += size;
        match self.config.placement {
            Placement::Absolute => self.dram_flashy.insert(kid, self.config.initial_credit),
            Placement::Relative => {
                let rank = (self.dram_flashy.len() as f64 * self.config.p_fc).ceil() as usize;
                self.dram_flashy
                    .insert_at_rank(kid, self.config.initial_credit, rank);
            }
        }
        self.items.insert(
            kid,
            Item {
                size,
                in_dram: true,
                last_access_counter: self.counter,
                last_access_time: self.last_request_time,
            },
        );
        self.stats.bytes_cached = self.dram_bytes;
    }

    fn evict_global_lru_tail(&mut self) {
        let Some(victim) = self.global_lru.pop_back() else {
            return;
        };
        let item = self.items.remove(&victim).expect("global_lru/index desync");
        if item.in_dram {
            self.dram_lru.remove(victim);
            self.dram_flashy.remove(victim);
            self.dram_bytes -= item.size;
        } else {
            self.flash.remove(victim);
            self.flash_bytes -= item.size;
        }
        self.stats.record_eviction(item.size);
    }

    fn admit_miss(&mut self, kid: u32, size: u64) {
        loop {
            if self.dram_bytes + size <= self.config.dram_size {
                self.admit_to_dram(kid, size);
                return;
            }

            let mfu = self.dram_flashy.max().expect("dram full but flashy empty");
            let mfu_size = self.items[&mfu].size;

            if self.credits < mfu_size as f64 {
                self.stats.credit_limit += 1;
                while self.dram_bytes + size > self.config.dram_size {
                    let Some(victim) = self.dram_lru.pop_back() else {
                        break;
                    };
                    let item = self.items.remove(&victim).expect("dram_lru/index desync");
                    self.dram_flashy.remove(victim);
                    self.global_lru.remove(victim);
                    self.dram_bytes -= item.size;
                    self.stats.record_eviction(item.size);
                }
                continue;
            }

            if self.flash_bytes + mfu_size <= self.config.flash_size {
                self.dram_lru.remove(mfu);
                self.dram_flashy.remove(mfu);
                self.dram_bytes -= mfu_size;
                self.flash.push_front(mfu);
                self.flash_bytes += mfu_size;
                self.credits -= mfu_size as f64;
                self.items.get_mut(&mfu).expect("checked above").in_dram = false;
                self.stats.record_flash_write(mfu_size);
                continue;
            }

            self.evict_global_lru_tail();
        }
    }
}

impl Policy for FlashCache {
    fn process_request(&mut self, req: &Request, warmup: bool) -> Result<Outcome, PolicyError> {
        let size = req.size();
        if size > self.config.dram_size {
            return Err(PolicyError::RequestTooLarge {
                kid: req.kid,
                size,
                limit: self.config.dram_size,
            });
        }

        let dt = (req.time - self.last_request_time).max(0.0);
        self.accrue_credits(req.time);
        self.decay_flashiness(dt);
        self.counter += 1;

        if let Some(item) = self.items.get(&req.kid).copied() {
            if item.size == size {
                self.global_lru.move_to_front(req.kid);
                let tier_dram = item.in_dram;
                if tier_dram {
                    let gain = self.hit_gain(&item, self.counter, req.time);
                    let old_score = self.dram_flashy.score(req.kid).unwrap_or(0.0);
                    self.dram_flashy.remove(req.kid);
                    self.dram_flashy.insert(req.kid, old_score + gain);
                    self.dram_lru.move_to_front(req.kid);
                }
                let item = self.items.get_mut(&req.kid).expect("checked above");
                item.last_access_counter = self.counter;
                item.last_access_time = req.time;
                if !warmup {
                    self.stats.record_hit(Some(tier_dram));
                }
                return Ok(Outcome::hit());
            }
            // Size changed: full erase, fall through as a fresh admission.
            self.global_lru.remove(req.kid);
            if item.in_dram {
                self.dram_lru.remove(req.kid);
                self.dram_flashy.remove(req.kid);
                self.dram_bytes -= item.size;
            } else {
                self.flash.remove(req.kid);
                self.flash_bytes -= item.size;
            }
            self.items.remove(&req.kid);
        }

        self.admit_miss(req.kid, size);
        if !warmup {
            self.stats.record_miss();
        }
        Ok(Outcome::Miss)
    }

    fn bytes_cached(&self) -> u64 {
        self.dram_bytes + self.flash_bytes
    }

    fn name(&self) -> &'static str {
        "flash_cache"
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

/// `exp` via `std` when available; a 30-term Taylor series otherwise, to
/// avoid pulling in `libm` as a hard dependency for `#[no_std]` builds.
/// Flashiness decay only needs enough precision to rank items, not to
/// reproduce a particular floating-point bit pattern.
#[cfg(feature = "std")]
fn libm_exp(x: f64) -> f64 {
    x.exp()
}

#[cfg(not(feature = "std"))]
fn libm_exp(x: f64) -> f64 {
    let mut sum = 1.0;
    let mut term = 1.0;
    for i in 1..30 {
        term *= x / (i as f64);
        sum += term;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(time: f64, kid: u32, size: u32) -> Request {
        Request::new(time, 0, 0, 0, size, kid)
    }

    #[test]
    fn e4_credit_gate_blocks_flash_write_when_rate_is_zero() {
        // spec E4: DRAM=2, FLASH=2, FLASH_RATE=0, INITIAL_CREDIT=1.
        let mut cfg = FlashCacheConfig::new(2, 2);
        cfg.flash_rate = 0.0;
        cfg.initial_credit = 1.0;
        let mut c = FlashCache::new(cfg);

        c.process_request(&req(0.0, 1, 1), false).unwrap();
        c.process_request(&req(100.0, 2, 1), false).unwrap();
        // DRAM is now full (2 bytes). A third insertion must evict from
        // DRAM directly (credits are 0, so flash migration is blocked).
        c.process_request(&req(200.0, 3, 1), false).unwrap();

        assert_eq!(c.stats().writes_flash, 0);
        assert!(c.stats().credit_limit >= 1);
    }

    #[test]
    fn same_size_rehit_does_not_evict_or_write_flash() {
        let cfg = FlashCacheConfig::new(10, 10);
        let mut c = FlashCache::new(cfg);
        c.process_request(&req(0.0, 1, 1), false).unwrap();
        let before = c.stats().evicted_items;
        let outcome = c.process_request(&req(1.0, 1, 1), false).unwrap();
        assert_eq!(outcome, Outcome::hit());
        assert_eq!(c.stats().evicted_items, before);
        assert_eq!(c.stats().writes_flash, 0);
    }

    #[test]
    fn bytes_cached_never_exceeds_tier_budgets() {
        let cfg = FlashCacheConfig::new(20, 20);
        let mut c = FlashCache::new(cfg);
        for kid in 0..100u32 {
            c.process_request(&req(kid as f64, kid, 3), false).unwrap();
            assert!(c.dram_bytes <= 20);
            assert!(c.flash_bytes <= 20);
        }
    }
}
