//! Configuration for [`crate::slab::Slab`], [`crate::slab::SlabMulti`] and
//! [`crate::slab::PartitionedLru`].

/// Single-tenant slab cache configuration (spec §4.12).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlabConfig {
    /// Total memory budget in bytes, grown in `SLABSIZE` (1 MiB)
    /// increments per class as needed.
    pub global_mem: u64,
    /// Memcached growth factor for the class table. Default 1.25.
    pub growth_factor: f64,
}

impl SlabConfig {
    /// Builds a config with the memcached default growth factor.
    pub fn new(global_mem: u64) -> Self {
        Self {
            global_mem,
            growth_factor: 1.25,
        }
    }
}

/// Per-application accounting parameters for [`crate::slab::SlabMulti`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlabMultiAppConfig {
    /// Tenant identifier.
    pub app_id: u64,
    /// Minimum memory share as a percentage of `global_mem` (0-100).
    pub min_mem_pct: u64,
    /// Target memory budget in bytes before credit stealing.
    pub target_mem: u64,
}

/// Multi-tenant slab cache configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SlabMultiConfig {
    /// Shared class-table / memory-growth configuration.
    pub base: SlabConfig,
    /// Registered tenants.
    pub apps: crate::collections::Vec<SlabMultiAppConfig>,
}

/// Hash-sharded LRU farm configuration (spec §4.12).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionedLruConfig {
    /// Number of partitions.
    pub partitions: u32,
    /// Per-partition byte budget.
    pub partition_bytes: u64,
}

impl PartitionedLruConfig {
    /// Builds a config splitting `global_mem` evenly across `partitions`.
    pub fn even_split(global_mem: u64, partitions: u32) -> Self {
        Self {
            partitions,
            partition_bytes: global_mem / u64::from(partitions),
        }
    }
}
