//! Configuration for [`crate::flash_cache_lruk::FlashCacheLruk`].

use super::flash_cache::FlashCacheConfig;
use crate::collections::Vec;

/// FlashCache-LRUK configuration (spec §4.5, §6).
#[derive(Debug, Clone, PartialEq)]
pub struct FlashCacheLrukConfig {
    /// Flash tier sizing and credit tuning, shared with plain FlashCache.
    pub base: FlashCacheConfig,
    /// DRAM queue byte caps, index 0 the entry queue. `FC_K_LRU` default 8.
    pub queue_sizes: Vec<u64>,
    /// Whether flash admission is credit-gated. The original source has
    /// this path commented out; default `false` (evict via global LRU
    /// instead of stalling on credits), matching the observed behavior.
    pub credit_gated: bool,
}

impl FlashCacheLrukConfig {
    /// Builds a `k`-queue config splitting `dram_size` evenly across
    /// queues (`KLRU_QUEUE_SIZE` default), credit gating off.
    pub fn new(dram_size: u64, flash_size: u64, k: usize) -> Self {
        let queue_size = dram_size / k as u64;
        Self {
            base: FlashCacheConfig::new(dram_size, flash_size),
            queue_sizes: core::iter::repeat(queue_size).take(k).collect(),
            credit_gated: false,
        }
    }

    /// Number of DRAM queues.
    pub fn k(&self) -> usize {
        self.queue_sizes.len()
    }
}
