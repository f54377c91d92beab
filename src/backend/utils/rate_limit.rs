// src/backend/utils/rate_limit.rs
use crate::error::ReportError;
use crate::models::common::{PrincipalId, TimestampNs};
use crate::utils::time::now_ns;
use std::cell::RefCell;
use std::collections::HashMap;

// --- Configuration ---
const RATE_LIMIT_CAPACITY: u32 = 20; // Max tokens in bucket (burst capacity)
const RATE_LIMIT_REFILL_RATE_PER_SEC: f64 = 1.0; // Tokens added per second

struct TokenBucket {
    tokens: f64,
    last_refill_time_ns: TimestampNs,
}

impl TokenBucket {
    fn new(now: TimestampNs) -> Self {
        TokenBucket {
            tokens: RATE_LIMIT_CAPACITY as f64,
            last_refill_time_ns: now,
        }
    }

    fn refill(&mut self, now: TimestampNs) {
        let elapsed_secs =
            (now.saturating_sub(self.last_refill_time_ns)) as f64 / 1_000_000_000.0;
        let tokens_to_add = elapsed_secs * RATE_LIMIT_REFILL_RATE_PER_SEC;

        self.tokens = (self.tokens + tokens_to_add).min(RATE_LIMIT_CAPACITY as f64);
        self.last_refill_time_ns = now;
    }

    fn take(&mut self, now: TimestampNs) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

thread_local! {
    // In-memory map for rate limiting. Cleared on upgrade.
    static PRINCIPAL_BUCKETS: RefCell<HashMap<PrincipalId, TokenBucket>> = RefCell::new(HashMap::new());
}

/// Checks the caller's token bucket at an explicit point in time. Split out
/// from `rate_guard` so tests can drive the clock.
pub fn check_rate(caller: PrincipalId, now: TimestampNs) -> Result<(), ReportError> {
    PRINCIPAL_BUCKETS.with(|buckets_refcell| {
        let mut buckets = buckets_refcell.borrow_mut();
        let bucket = buckets.entry(caller).or_insert_with(|| TokenBucket::new(now));

        if bucket.take(now) {
            Ok(())
        } else {
            Err(ReportError::RateLimitExceeded(format!(
                "Rate limit exceeded for principal {}. Please try again later.",
                caller
            )))
        }
    })
}

/// Guard for rate limiting mutating canister calls.
pub fn rate_guard(caller: PrincipalId) -> Result<(), ReportError> {
    check_rate(caller, now_ns())
}

#[cfg(test)]
mod tests {
    use super::*;
    use candid::Principal;

    const SEC: u64 = 1_000_000_000;

    #[test]
    fn burst_capacity_is_enforced_and_refills_over_time() {
        let caller = Principal::from_slice(&[9; 4]);
        let start = 1_000 * SEC;

        for _ in 0..RATE_LIMIT_CAPACITY {
            assert!(check_rate(caller, start).is_ok());
        }
        assert!(matches!(
            check_rate(caller, start),
            Err(ReportError::RateLimitExceeded(_))
        ));

        // Two seconds later two tokens have refilled.
        assert!(check_rate(caller, start + 2 * SEC).is_ok());
        assert!(check_rate(caller, start + 2 * SEC).is_ok());
        assert!(check_rate(caller, start + 2 * SEC).is_err());
    }

    #[test]
    fn buckets_are_per_principal() {
        let a = Principal::from_slice(&[1, 2, 3]);
        let b = Principal::from_slice(&[4, 5, 6]);
        let start = 5_000 * SEC;

        for _ in 0..RATE_LIMIT_CAPACITY {
            assert!(check_rate(a, start).is_ok());
        }
        assert!(check_rate(a, start).is_err());
        assert!(check_rate(b, start).is_ok());
    }
}
