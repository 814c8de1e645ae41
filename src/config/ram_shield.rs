//! Configuration for the [`crate::ram_shield`] family.

use super::flash_cache::FlashCacheConfig;

/// RamShield configuration: a [`FlashCacheConfig`] plus the block-level
/// knobs spec §4.7/§4.8 and §6 describe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RamShieldConfig {
    /// Underlying DRAM/flash sizing and flashiness tuning.
    pub base: FlashCacheConfig,
    /// Fixed flash block size in bytes. Default 1 MiB.
    pub block_size: u64,
    /// Live-byte ratio below which a block is GC-eligible.
    pub threshold: f64,
    /// Utilization above which `allocate_flash_block` stops pulling more
    /// items into a new block. Default 1.0.
    pub allocation_threshold: f64,
}

impl RamShieldConfig {
    /// Builds a config with the spec's default block size (1 MiB) and
    /// `allocation_threshold` (1.0); `threshold` is policy-set (spec §6),
    /// so callers must supply it.
    pub fn new(dram_size: u64, flash_size: u64, threshold: f64) -> Self {
        Self {
            base: FlashCacheConfig::new(dram_size, flash_size),
            block_size: 1024 * 1024,
            threshold,
            allocation_threshold: 1.0,
        }
    }

    /// Maximum number of flash blocks resident at once.
    pub fn max_blocks(&self) -> u64 {
        self.base.flash_size / self.block_size
    }
}
