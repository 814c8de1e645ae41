//! Replacement and admission policy engines for a trace-driven cache simulator.
//!
//! A [`Policy`] consumes a time-ordered stream of [`Request`]s and reports,
//! for each one, a hit/miss [`Outcome`] plus whatever internal state
//! transitions (admission, promotion, eviction, DRAM/Flash migration) the
//! algorithm performs. Policies are independent, self-contained state
//! machines; there is no shared mutable state between them.
//!
//! # Choosing an engine
//!
//! ```text
//!                         single DRAM tier?
//!                        /                 \
//!                      yes                  no
//!                      /                      \
//!            need K-level       DRAM + Flash tiering?
//!             recency?              /           \
//!            /        \           yes            |
//!          no          yes      /     \     block-structured
//!          |            |   credit-   block    flash (RamShield
//!        LRU /        LRU-K  gated   GC'd      / RIPQ) ?
//!        CLOCK               migration flash        |
//!                            (FlashCache       RamShield family
//!                             family,          or RIPQ family
//!                             VictimCache)
//! ```
//!
//! | Engine | Tiers | Eviction unit | Use when |
//! |---|---|---|---|
//! | [`lru`] | DRAM | item | baseline, no flash |
//! | [`clock`] | DRAM | item | cheap approximate LRU |
//! | [`lruk`] | DRAM | item, K queues | scan resistance |
//! | [`flash_cache`] | DRAM+Flash | item | rate-limited tiering |
//! | [`flash_cache_lruk`] | DRAM+Flash | item | scan-resistant DRAM tier |
//! | [`flash_cache_lruk_clock`] | DRAM+Flash | item | global clock eviction |
//! | [`ram_shield`] | DRAM+Flash | block | flash write amplification matters |
//! | [`ripq`] | Flash (sectioned) | block | lazy-reinsertion flash |
//! | [`ripq_shield`] | DRAM+Flash (sectioned) | block | as above + DRAM tier |
//! | [`victim_cache`] | DRAM+Flash | item | simplest cascading tiering |
//! | [`slab`] | DRAM (class-sharded) | item | fixed-size-class workloads |
//! | [`shadow`] | unbounded (tracing only) | n/a | offline hit-rate-curve studies |
//!
//! # Determinism
//!
//! `process_request` is a total, synchronous function: a policy's output is
//! a deterministic function of (initial configuration, request sequence).
//! There is no background work, no I/O, and no suspension point inside it.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub(crate) mod collections;

pub mod config;
pub mod error;
pub mod hashing;
pub mod list;
pub mod policy;
pub mod request;
pub mod slabclass;
pub mod stats;

pub mod clock;
pub mod flash_cache;
pub mod flash_cache_lruk;
pub mod flash_cache_lruk_clock;
pub mod lru;
pub mod lruk;
pub mod ram_shield;
pub mod ripq;
pub mod ripq_shield;
pub mod shadow;
pub mod slab;
pub mod victim_cache;

pub use error::{PolicyError, TraceError};
pub use list::IdList;
pub use policy::{Outcome, Policy};
pub use request::Request;
pub use stats::Stats;

pub use clock::Clock;
pub use flash_cache::FlashCache;
pub use flash_cache_lruk::FlashCacheLruk;
pub use flash_cache_lruk_clock::FlashCacheLrukClock;
pub use lru::Lru;
pub use lruk::LruK;
pub use ram_shield::{RamShield, RamShieldFifo, RamShieldSel};
pub use ripq::Ripq;
pub use ripq_shield::RipqShield;
pub use shadow::{HitRateCurve, PartSlab, ShadowLru, ShadowSlab};
pub use slab::{PartitionedLru, Slab, SlabMulti};
pub use victim_cache::VictimCache;
