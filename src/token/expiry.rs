//! Token Expiry
//!
//! Staleness check with a clock-skew leeway.

use std::time::Duration;

use crate::types::TokenRecord;

/// Whether `record` must be refreshed at `now_ms`.
///
/// A missing record, a missing or zero `expires_time`, or a timestamp
/// within `leeway` of now all count as expired.
pub fn is_expired(record: Option<&TokenRecord>, now_ms: i64, leeway: Duration) -> bool {
    let Some(expires_time) = record.and_then(|r| r.expires_time) else {
        return true;
    };
    if expires_time == 0 {
        return true;
    }

    let leeway_ms = i64::try_from(leeway.as_millis()).unwrap_or(i64::MAX);
    now_ms > expires_time.saturating_sub(leeway_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEEWAY: Duration = Duration::from_millis(3000);

    fn expiring_at(expires_time: i64) -> TokenRecord {
        TokenRecord::new("A1").with_expires_time(expires_time)
    }

    #[test]
    fn test_missing_record_is_expired() {
        assert!(is_expired(None, 0, LEEWAY));
    }

    #[test]
    fn test_missing_or_zero_timestamp_is_expired() {
        assert!(is_expired(Some(&TokenRecord::new("A1")), 0, LEEWAY));
        assert!(is_expired(Some(&expiring_at(0)), -10_000, LEEWAY));
    }

    #[test]
    fn test_leeway_boundary() {
        let expires_time = 1_000_000;
        let record = expiring_at(expires_time);
        let edge = expires_time - 3000;

        assert!(!is_expired(Some(&record), edge - 1, LEEWAY));
        assert!(!is_expired(Some(&record), edge, LEEWAY));
        assert!(is_expired(Some(&record), edge + 1, LEEWAY));
    }

    #[test]
    fn test_zero_leeway_uses_literal_timestamp() {
        let record = expiring_at(5000);
        assert!(!is_expired(Some(&record), 5000, Duration::ZERO));
        assert!(is_expired(Some(&record), 5001, Duration::ZERO));
    }

    #[test]
    fn test_far_future_is_fresh() {
        let now = 1_700_000_000_000;
        let record = expiring_at(now + 1_000_000);
        assert!(!is_expired(Some(&record), now, LEEWAY));
    }
}
