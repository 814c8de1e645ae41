//! Per-engine configuration structs.
//!
//! One flat, all-public-fields struct per policy, matching the teacher's
//! `src/config/*.rs` layout (`LruCacheConfig`, `SlruCacheConfig`, ...): no
//! builder boilerplate, no hidden global state. Every global tunable in
//! spec §6's table is a field on exactly one of these structs, constructed
//! once by the caller and passed into the engine's constructor — this is
//! the re-architecture spec §9 calls for in place of the source's
//! process-global constants.

pub mod clock;
pub mod flash_cache;
pub mod flash_cache_lruk;
pub mod flash_cache_lruk_clock;
pub mod lru;
pub mod lruk;
pub mod ram_shield;
pub mod ripq;
pub mod slab;
pub mod victim_cache;

pub use clock::ClockConfig;
pub use flash_cache::{DecayMode, FlashCacheConfig, Placement};
pub use flash_cache_lruk::FlashCacheLrukConfig;
pub use flash_cache_lruk_clock::FlashCacheLrukClockConfig;
pub use lru::LruConfig;
pub use lruk::LruKConfig;
pub use ram_shield::RamShieldConfig;
pub use ripq::{RipqConfig, RipqShieldConfig};
pub use slab::{PartitionedLruConfig, SlabConfig, SlabMultiConfig};
pub use victim_cache::VictimCacheConfig;
