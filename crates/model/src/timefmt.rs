//! ISO-8601 timestamp helpers.
//!
//! Record timestamps stay strings end to end; the shared `Z`-suffixed,
//! zero-padded format makes lexicographic comparison equivalent to temporal
//! comparison, and session bounds are widened that way. Parsing is only
//! needed where actual second arithmetic happens (the merge-gap rule).

use chrono::{DateTime, Utc};

/// Parse an ISO-8601 instant. Returns `None` for anything chrono rejects,
/// including the empty string used for absent timestamps.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Absolute gap in whole seconds between two instants.
pub fn abs_gap_secs(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    (a - b).num_seconds().abs()
}

/// Lexicographic minimum of two ISO-8601 strings.
pub fn lex_min<'a>(a: &'a str, b: &'a str) -> &'a str {
    if a <= b {
        a
    } else {
        b
    }
}

/// Lexicographic maximum of two ISO-8601 strings.
pub fn lex_max<'a>(a: &'a str, b: &'a str) -> &'a str {
    if a >= b {
        a
    } else {
        b
    }
}
