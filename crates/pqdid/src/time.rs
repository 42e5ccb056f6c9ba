//! Time utilities.
//!
//! Verification reports carry Unix epoch microseconds; proofs carry an
//! RFC 3339 timestamp with second precision.

use chrono::{SecondsFormat, Utc};

/// Return the current time as microseconds since Unix epoch.
pub fn now_micros() -> u64 {
    u64::try_from(Utc::now().timestamp_micros()).unwrap_or(0)
}

/// Current time as an RFC 3339 string, e.g. `2026-10-16T09:30:00Z`.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
