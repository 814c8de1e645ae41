//! Configuration for
//! [`crate::flash_cache_lruk_clock::FlashCacheLrukClock`].

use super::flash_cache_lruk::FlashCacheLrukConfig;

/// FlashCache-LRUK-Clock configuration (spec §4.6, §6).
#[derive(Debug, Clone, PartialEq)]
pub struct FlashCacheLrukClockConfig {
    /// DRAM queue structure and flash/credit tuning.
    pub base: FlashCacheLrukConfig,
    /// Per-hit clock increment. Default 2.
    pub clock_jump: u8,
    /// Value written on admission. Default 3.
    pub clock_start: u8,
    /// Ceiling the clock saturates at.
    pub clock_max: u8,
    /// Minimum DRAM queue index eligible for flash admission. Default 6.
    pub min_queue_to_move_to_flash: usize,
}

impl FlashCacheLrukClockConfig {
    /// Builds a config with the spec's default clock tuning.
    pub fn new(dram_size: u64, flash_size: u64, k: usize) -> Self {
        Self {
            base: FlashCacheLrukConfig::new(dram_size, flash_size, k),
            clock_jump: 2,
            clock_start: 3,
            clock_max: 15,
            min_queue_to_move_to_flash: 6,
        }
    }
}
