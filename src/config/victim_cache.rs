//! Configuration for [`crate::victim_cache::VictimCache`].

/// DRAM+Flash victim-cache configuration (spec §4.11).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VictimCacheConfig {
    /// DRAM tier capacity in bytes.
    pub dram_size: u64,
    /// Flash tier capacity in bytes.
    pub flash_size: u64,
}

impl VictimCacheConfig {
    /// Builds a config from the two tier capacities.
    pub fn new(dram_size: u64, flash_size: u64) -> Self {
        Self {
            dram_size,
            flash_size,
        }
    }
}
