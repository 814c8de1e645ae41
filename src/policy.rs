//! The common interface every replacement/admission engine implements.

use crate::error::PolicyError;
use crate::request::Request;

/// Result of processing one request.
///
/// Replaces the source's `size_t` sentinel return (`PROC_MISS = ~0lu`,
/// "any positive value" otherwise meaning hit) with a real sum type. The
/// shadow tracers (spec §4.13) need to report a byte-weighted reuse
/// distance alongside the hit; every caching policy just needs the
/// boolean, so `distance` is `None` for all of them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// The request was served from the cache.
    Hit {
        /// Byte-weighted reuse distance, populated only by the shadow
        /// tracers ([`crate::shadow`]).
        distance: Option<u64>,
    },
    /// The request was not in the cache.
    Miss,
}

impl Outcome {
    /// Shorthand for a hit with no recorded distance.
    pub fn hit() -> Self {
        Outcome::Hit { distance: None }
    }

    /// Whether this outcome is a hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, Outcome::Hit { .. })
    }
}

/// A replacement/admission policy engine.
///
/// `process_request` is a total, synchronous function: given the same
/// initial configuration and the same prefix of requests, two calls
/// produce identical outcomes and identical internal state (spec §5).
pub trait Policy {
    /// Processes one request, returning its outcome.
    ///
    /// `warmup` suppresses statistics accrual but never suppresses state
    /// transitions (admission, eviction, promotion all still happen).
    fn process_request(&mut self, req: &Request, warmup: bool) -> Result<Outcome, PolicyError>;

    /// Total live bytes currently held by the policy (spec invariant 1).
    fn bytes_cached(&self) -> u64;

    /// A stable, machine-parseable name used to build dump-file names.
    fn name(&self) -> &'static str;

    /// Writes a `key value` dump of the policy's accumulated stats.
    ///
    /// The default implementation writes the BTreeMap-sorted `Stats`
    /// snapshot; engines with extra structure (per-queue sizes, per-class
    /// fragmentation, CDFs) override this to append those sections, per
    /// spec §6's "contents are key value pairs followed by optional
    /// tables."
    fn dump_stats<W: core::fmt::Write>(&self, w: &mut W) -> core::fmt::Result {
        for (k, v) in self.stats().to_btreemap() {
            writeln!(w, "{k} {v}")?;
        }
        Ok(())
    }

    /// The raw stats counter, for callers that want programmatic access
    /// instead of a text dump.
    fn stats(&self) -> &crate::stats::Stats;
}
