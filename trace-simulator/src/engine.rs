//! Enum dispatch across every policy engine.
//!
//! `Policy::dump_stats` is generic over its writer, which makes the trait
//! object-unsafe — there is no single `Box<dyn Policy>` to hold. Grounded on
//! `cache-simulator/src/runner.rs`'s `CacheWrapper`, which solves the exact
//! same problem (many concrete cache types, one driver loop) the same way:
//! one enum with a variant per concrete engine, `match`-dispatched.

use cache_policy_core::config::{
    ClockConfig, FlashCacheConfig, FlashCacheLrukClockConfig, FlashCacheLrukConfig, LruConfig,
    LruKConfig, PartitionedLruConfig, RamShieldConfig, RipqConfig, RipqShieldConfig, SlabConfig,
    SlabMultiConfig, VictimCacheConfig,
};
use cache_policy_core::{
    Clock, FlashCache, FlashCacheLruk, FlashCacheLrukClock, Lru, LruK, PartSlab, PartitionedLru,
    PolicyError, RamShield, RamShieldFifo, RamShieldSel, Request, Ripq, RipqShield, ShadowLru,
    ShadowSlab, Slab, SlabMulti, Stats, VictimCache,
};
use cache_policy_core::policy::Outcome;

/// Every engine the driver knows how to build and run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyKind {
    Lru,
    Clock,
    LruK,
    FlashCache,
    FlashCacheLruk,
    FlashCacheLrukClock,
    RamShield,
    RamShieldSel,
    RamShieldFifo,
    Ripq,
    RipqShield,
    VictimCache,
    Slab,
    SlabMulti,
    PartitionedLru,
    ShadowLru,
    ShadowSlab,
    PartSlab,
}

impl PolicyKind {
    pub fn all() -> &'static [PolicyKind] {
        use PolicyKind::*;
        &[
            Lru,
            Clock,
            LruK,
            FlashCache,
            FlashCacheLruk,
            FlashCacheLrukClock,
            RamShield,
            RamShieldSel,
            RamShieldFifo,
            Ripq,
            RipqShield,
            VictimCache,
            Slab,
            SlabMulti,
            PartitionedLru,
            ShadowLru,
            ShadowSlab,
            PartSlab,
        ]
    }
}

/// Sizing knobs shared across every engine; each variant's constructor
/// picks whichever of these it needs and leaves the engine-specific
/// tuning at the `*Config` default spec §6 documents.
#[derive(Debug, Clone, Copy)]
pub struct EngineSizing {
    pub dram_size: u64,
    pub flash_size: u64,
    pub num_queues: usize,
    pub num_sections: u32,
    pub partitions: u32,
}

impl Default for EngineSizing {
    fn default() -> Self {
        Self {
            dram_size: 51_209_600,
            flash_size: 51_209_600,
            num_queues: 8,
            num_sections: 4,
            partitions: 8,
        }
    }
}

/// One concrete engine, behind a single dispatch surface.
#[derive(Debug)]
pub enum Engine {
    Lru(Lru),
    Clock(Clock),
    LruK(LruK),
    FlashCache(FlashCache),
    FlashCacheLruk(FlashCacheLruk),
    FlashCacheLrukClock(FlashCacheLrukClock),
    RamShield(RamShield),
    RamShieldSel(RamShieldSel),
    RamShieldFifo(RamShieldFifo),
    Ripq(Ripq),
    RipqShield(RipqShield),
    VictimCache(VictimCache),
    Slab(Slab),
    SlabMulti(SlabMulti),
    PartitionedLru(PartitionedLru),
    ShadowLru(ShadowLru),
    ShadowSlab(ShadowSlab),
    PartSlab(PartSlab),
}

impl Engine {
    pub fn build(kind: PolicyKind, sizing: EngineSizing) -> Self {
        match kind {
            PolicyKind::Lru => Engine::Lru(Lru::new(LruConfig::new(sizing.dram_size))),
            PolicyKind::Clock => Engine::Clock(Clock::new(ClockConfig::new(sizing.dram_size))),
            PolicyKind::LruK => Engine::LruK(LruK::new(LruKConfig::uniform(
                sizing.num_queues,
                sizing.dram_size / sizing.num_queues as u64,
            ))),
            PolicyKind::FlashCache => Engine::FlashCache(FlashCache::new(FlashCacheConfig::new(
                sizing.dram_size,
                sizing.flash_size,
            ))),
            PolicyKind::FlashCacheLruk => Engine::FlashCacheLruk(FlashCacheLruk::new(
                FlashCacheLrukConfig::new(sizing.dram_size, sizing.flash_size, sizing.num_queues),
            )),
            PolicyKind::FlashCacheLrukClock => {
                Engine::FlashCacheLrukClock(FlashCacheLrukClock::new(
                    FlashCacheLrukClockConfig::new(
                        sizing.dram_size,
                        sizing.flash_size,
                        sizing.num_queues,
                    ),
                ))
            }
            PolicyKind::RamShield => Engine::RamShield(RamShield::new(RamShieldConfig::new(
                sizing.dram_size,
                sizing.flash_size,
                0.5,
            ))),
            PolicyKind::RamShieldSel => Engine::RamShieldSel(RamShieldSel::new(
                RamShieldConfig::new(sizing.dram_size, sizing.flash_size, 0.5),
            )),
            PolicyKind::RamShieldFifo => Engine::RamShieldFifo(RamShieldFifo::new(
                RamShieldConfig::new(sizing.dram_size, sizing.flash_size, 0.5),
            )),
            PolicyKind::Ripq => Engine::Ripq(Ripq::new(RipqConfig::new(
                sizing.flash_size,
                sizing.num_sections,
            ))),
            PolicyKind::RipqShield => Engine::RipqShield(RipqShield::new(RipqShieldConfig {
                flash: RipqConfig::new(sizing.flash_size, sizing.num_sections),
                dram_size: sizing.dram_size,
                num_dsections: sizing.num_sections,
            })),
            PolicyKind::VictimCache => Engine::VictimCache(VictimCache::new(
                VictimCacheConfig::new(sizing.dram_size, sizing.flash_size),
            )),
            PolicyKind::Slab => Engine::Slab(Slab::new(SlabConfig::new(sizing.dram_size))),
            PolicyKind::SlabMulti => Engine::SlabMulti(SlabMulti::new(SlabMultiConfig {
                base: SlabConfig::new(sizing.dram_size),
                apps: vec![],
            })),
            PolicyKind::PartitionedLru => Engine::PartitionedLru(PartitionedLru::new(
                PartitionedLruConfig::even_split(sizing.dram_size, sizing.partitions),
            )),
            PolicyKind::ShadowLru => Engine::ShadowLru(ShadowLru::new()),
            PolicyKind::ShadowSlab => Engine::ShadowSlab(ShadowSlab::new(1.25)),
            PolicyKind::PartSlab => Engine::PartSlab(PartSlab::new(sizing.partitions)),
        }
    }

    pub fn process_request(
        &mut self,
        req: &Request,
        warmup: bool,
    ) -> Result<Outcome, PolicyError> {
        match self {
            Engine::Lru(e) => e.process_request(req, warmup),
            Engine::Clock(e) => e.process_request(req, warmup),
            Engine::LruK(e) => e.process_request(req, warmup),
            Engine::FlashCache(e) => e.process_request(req, warmup),
            Engine::FlashCacheLruk(e) => e.process_request(req, warmup),
            Engine::FlashCacheLrukClock(e) => e.process_request(req, warmup),
            Engine::RamShield(e) => e.process_request(req, warmup),
            Engine::RamShieldSel(e) => e.process_request(req, warmup),
            Engine::RamShieldFifo(e) => e.process_request(req, warmup),
            Engine::Ripq(e) => e.process_request(req, warmup),
            Engine::RipqShield(e) => e.process_request(req, warmup),
            Engine::VictimCache(e) => e.process_request(req, warmup),
            Engine::Slab(e) => e.process_request(req, warmup),
            Engine::SlabMulti(e) => e.process_request(req, warmup),
            Engine::PartitionedLru(e) => e.process_request(req, warmup),
            Engine::ShadowLru(e) => e.process_request(req, warmup),
            Engine::ShadowSlab(e) => e.process_request(req, warmup),
            Engine::PartSlab(e) => e.process_request(req, warmup),
        }
    }

    pub fn bytes_cached(&self) -> u64 {
        match self {
            Engine::Lru(e) => e.bytes_cached(),
            Engine::Clock(e) => e.bytes_cached(),
            Engine::LruK(e) => e.bytes_cached(),
            Engine::FlashCache(e) => e.bytes_cached(),
            Engine::FlashCacheLruk(e) => e.bytes_cached(),
            Engine::FlashCacheLrukClock(e) => e.bytes_cached(),
            Engine::RamShield(e) => e.bytes_cached(),
            Engine::RamShieldSel(e) => e.bytes_cached(),
            Engine::RamShieldFifo(e) => e.bytes_cached(),
            Engine::Ripq(e) => e.bytes_cached(),
            Engine::RipqShield(e) => e.bytes_cached(),
            Engine::VictimCache(e) => e.bytes_cached(),
            Engine::Slab(e) => e.bytes_cached(),
            Engine::SlabMulti(e) => e.bytes_cached(),
            Engine::PartitionedLru(e) => e.bytes_cached(),
            Engine::ShadowLru(e) => e.bytes_cached(),
            Engine::ShadowSlab(e) => e.bytes_cached(),
            Engine::PartSlab(e) => e.bytes_cached(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Engine::Lru(e) => e.name(),
            Engine::Clock(e) => e.name(),
            Engine::LruK(e) => e.name(),
            Engine::FlashCache(e) => e.name(),
            Engine::FlashCacheLruk(e) => e.name(),
            Engine::FlashCacheLrukClock(e) => e.name(),
            Engine::RamShield(e) => e.name(),
            Engine::RamShieldSel(e) => e.name(),
            Engine::RamShieldFifo(e) => e.name(),
            Engine::Ripq(e) => e.name(),
            Engine::RipqShield(e) => e.name(),
            Engine::VictimCache(e) => e.name(),
            Engine::Slab(e) => e.name(),
            Engine::SlabMulti(e) => e.name(),
            Engine::PartitionedLru(e) => e.name(),
            Engine::ShadowLru(e) => e.name(),
            Engine::ShadowSlab(e) => e.name(),
            Engine::PartSlab(e) => e.name(),
        }
    }

    pub fn stats(&self) -> &Stats {
        match self {
            Engine::Lru(e) => e.stats(),
            Engine::Clock(e) => e.stats(),
            Engine::LruK(e) => e.stats(),
            Engine::FlashCache(e) => e.stats(),
            Engine::FlashCacheLruk(e) => e.stats(),
            Engine::FlashCacheLrukClock(e) => e.stats(),
            Engine::RamShield(e) => e.stats(),
            Engine::RamShieldSel(e) => e.stats(),
            Engine::RamShieldFifo(e) => e.stats(),
            Engine::Ripq(e) => e.stats(),
            Engine::RipqShield(e) => e.stats(),
            Engine::VictimCache(e) => e.stats(),
            Engine::Slab(e) => e.stats(),
            Engine::SlabMulti(e) => e.stats(),
            Engine::PartitionedLru(e) => e.stats(),
            Engine::ShadowLru(e) => e.stats(),
            Engine::ShadowSlab(e) => e.stats(),
            Engine::PartSlab(e) => e.stats(),
        }
    }

    /// `key value` stats dump, the non-generic way: collect into a string.
    pub fn dump_stats(&self) -> String {
        let mut out = String::new();
        let result = match self {
            Engine::Lru(e) => e.dump_stats(&mut out),
            Engine::Clock(e) => e.dump_stats(&mut out),
            Engine::LruK(e) => e.dump_stats(&mut out),
            Engine::FlashCache(e) => e.dump_stats(&mut out),
            Engine::FlashCacheLruk(e) => e.dump_stats(&mut out),
            Engine::FlashCacheLrukClock(e) => e.dump_stats(&mut out),
            Engine::RamShield(e) => e.dump_stats(&mut out),
            Engine::RamShieldSel(e) => e.dump_stats(&mut out),
            Engine::RamShieldFifo(e) => e.dump_stats(&mut out),
            Engine::Ripq(e) => e.dump_stats(&mut out),
            Engine::RipqShield(e) => e.dump_stats(&mut out),
            Engine::VictimCache(e) => e.dump_stats(&mut out),
            Engine::Slab(e) => e.dump_stats(&mut out),
            Engine::SlabMulti(e) => e.dump_stats(&mut out),
            Engine::PartitionedLru(e) => e.dump_stats(&mut out),
            Engine::ShadowLru(e) => e.dump_stats(&mut out),
            Engine::ShadowSlab(e) => e.dump_stats(&mut out),
            Engine::PartSlab(e) => e.dump_stats(&mut out),
        };
        result.expect("writing to a String never fails");
        out
    }

    /// Whether this engine is a non-caching shadow tracer (spec §4.13):
    /// these report a hit-rate curve instead of a conventional eviction
    /// policy, and the driver dumps a CDF file for them instead of (or in
    /// addition to) the usual stats dump.
    pub fn is_shadow_tracer(&self) -> bool {
        matches!(
            self,
            Engine::ShadowLru(_) | Engine::ShadowSlab(_) | Engine::PartSlab(_)
        )
    }

    /// CDF dump (spec §6, `hit_rate_curve::dump_cdf`) for the shadow
    /// tracers; `None` for every other engine.
    pub fn dump_cdf(&self) -> Option<String> {
        let mut out = String::new();
        match self {
            Engine::ShadowLru(e) => e.hit_rate_curve().dump_cdf(&mut out).ok()?,
            Engine::ShadowSlab(e) => e.hit_rate_curve().dump_cdf(&mut out).ok()?,
            Engine::PartSlab(e) => e.hit_rate_curve().dump_cdf(&mut out).ok()?,
            _ => return None,
        }
        Some(out)
    }
}
