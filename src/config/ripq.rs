//! Configuration for [`crate::ripq::Ripq`] and [`crate::ripq_shield::RipqShield`].

/// RIPQ configuration (spec §4.9, §6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RipqConfig {
    /// Total flash size in bytes.
    pub flash_size: u64,
    /// Number of sections; `section_size = flash_size / num_sections`.
    pub num_sections: u32,
    /// Fixed block size in bytes. Default 1 MiB.
    pub block_size: u64,
}

impl RipqConfig {
    /// Builds a config with the spec's default block size (1 MiB).
    pub fn new(flash_size: u64, num_sections: u32) -> Self {
        Self {
            flash_size,
            num_sections,
            block_size: 1024 * 1024,
        }
    }

    /// Byte budget per section.
    pub fn section_size(&self) -> u64 {
        self.flash_size / u64::from(self.num_sections)
    }
}

/// RIPQ-Shield configuration: a RIPQ flash tier plus a sectioned DRAM
/// tier (spec §4.10).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RipqShieldConfig {
    /// Flash tier configuration.
    pub flash: RipqConfig,
    /// Total DRAM size in bytes.
    pub dram_size: u64,
    /// Number of DRAM sections.
    pub num_dsections: u32,
}

impl RipqShieldConfig {
    /// Byte budget per DRAM section.
    pub fn dsection_size(&self) -> u64 {
        self.dram_size / u64::from(self.num_dsections)
    }
}
