// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for the epoch-second clock used by token records.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current time as Unix epoch seconds.
pub fn now_epoch() -> i64 {
    Utc::now().timestamp()
}

/// Format an epoch-second timestamp as RFC3339 with a `Z` suffix, for logs.
pub fn format_epoch_rfc3339(epoch: i64) -> String {
    DateTime::<Utc>::from_timestamp(epoch, 0)
        .map(|date| date.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| epoch.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_epoch_rfc3339() {
        assert_eq!(format_epoch_rfc3339(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_epoch_rfc3339(1_700_000_000), "2023-11-14T22:13:20Z");
    }
}
