//! Time utilities for the Signet SDK.
//!
//! Signed payloads carry an ISO-8601 `sign_time` with millisecond
//! precision in UTC (`2024-05-01T12:00:00.000Z`).

/// Return the current UTC time as an ISO-8601 string.
pub fn now_iso8601() -> String {
    chrono::Utc::now()
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
