//! Coverage planning.
//!
//! Decides where a run should start querying the archive so that history
//! already ingested is not listed again.

use crate::types::{CoverageRange, Timestamp};

/// Compute the effective query start for a run.
///
/// If `requested_since` lies within the covered range (both bounds
/// inclusive), everything up to `coverage.end` is already ingested and the
/// run skips ahead to the frontier. Otherwise the requested point is used
/// unchanged.
pub fn plan(requested_since: Timestamp, coverage: &CoverageRange) -> Timestamp {
    match coverage.end {
        Some(end) if coverage.contains(requested_since) => end,
        _ => requested_since,
    }
}
