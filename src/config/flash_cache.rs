//! Configuration for [`crate::flash_cache::FlashCache`] and the engines
//! that build on its core (`FlashCache-LRUK`, `FlashCache-LRUK-Clock`,
//! [`crate::ram_shield`], [`crate::victim_cache::VictimCache`]).

/// Flashiness decay clock. Replaces the source's `COMPARE_TIME`
/// preprocessor flag (spec §9 design note: "re-architect as a runtime
/// configuration variant").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecayMode {
    /// Decay/gain measured in logical access-index steps.
    #[default]
    Place,
    /// Decay/gain measured in wall-clock seconds from the trace.
    Time,
}

/// New-item flashiness placement. Replaces the source's `RELATIVE`
/// preprocessor flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// New items enter with a fixed `initial_credit` score.
    #[default]
    Absolute,
    /// New items enter at a rank computed from `p_fc * dram.len()`.
    Relative,
}

/// FlashCache configuration (spec §4.4, §6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlashCacheConfig {
    /// DRAM tier capacity in bytes. Default 51_209_600.
    pub dram_size: u64,
    /// Flash tier capacity in bytes. Default 51_209_600.
    pub flash_size: u64,
    /// Flash write credit accrual rate, bytes/second. Default 1 MiB/s.
    pub flash_rate: f64,
    /// Flashiness score assigned to a freshly admitted item. Default 1.0.
    pub initial_credit: f64,
    /// Flashiness decay time constant. Default 1.0.
    pub k: f64,
    /// Hit-credit scale factor. Default 1.0.
    pub l_fc: f64,
    /// Relative-insertion rank fraction, used when `placement ==
    /// Relative`. Default 0.3.
    pub p_fc: f64,
    /// Decay/gain clock.
    pub decay_mode: DecayMode,
    /// New-item placement rule.
    pub placement: Placement,
}

impl FlashCacheConfig {
    /// Default tuning from spec §6's configuration-knob table.
    pub fn new(dram_size: u64, flash_size: u64) -> Self {
        Self {
            dram_size,
            flash_size,
            flash_rate: 1024.0 * 1024.0,
            initial_credit: 1.0,
            k: 1.0,
            l_fc: 1.0,
            p_fc: 0.3,
            decay_mode: DecayMode::Place,
            placement: Placement::Absolute,
        }
    }
}
