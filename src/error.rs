//! Error taxonomy (spec §7).
//!
//! Four kinds of trouble, only two of which are typed `Result` values:
//! malformed trace lines are logged and skipped by the caller, and
//! invariant violations are fatal assertions (a bug in the policy, not a
//! reportable condition) — see the `debug_assert!`/`assert!` calls spread
//! through the engine modules instead of an error variant here.

use crate::collections::String;

/// An error encountered while reading a CSV trace line.
///
/// The core crate never parses CSV itself (that's `trace-simulator`'s job,
/// spec §6), but the type lives here so policies and drivers share one
/// vocabulary for "this line was bad."
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// The line's `time`/`size`/`kid` fields did not parse.
    #[error("malformed trace line {line_no}: {reason}")]
    MalformedLine {
        /// 1-based line number within the source file.
        line_no: usize,
        /// Human-readable description of what failed to parse.
        reason: String,
    },
}

/// An error a [`crate::policy::Policy`] can return from
/// `process_request`.
#[derive(Debug, thiserror::Error, Clone, Copy)]
pub enum PolicyError {
    /// The request's size exceeds the policy's hard capacity and can never
    /// be admitted, even after evicting everything else.
    #[error("request for kid={kid} size={size} exceeds capacity {limit}")]
    RequestTooLarge {
        /// The oversize request's key id.
        kid: u32,
        /// The oversize request's byte size.
        size: u64,
        /// The capacity that rejected it.
        limit: u64,
    },
}
