//! Configuration for [`crate::clock::Clock`].

/// CLOCK (second-chance) configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockConfig {
    /// Maximum total bytes the cache may hold.
    pub capacity: u64,
    /// Ceiling every per-item counter saturates at. Default 15
    /// (spec §6 `CLOCK_MAX_VALUE`).
    pub clock_max: u8,
}

impl ClockConfig {
    /// Builds a config with the given byte capacity and default
    /// `clock_max` of 15.
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            clock_max: 15,
        }
    }
}
