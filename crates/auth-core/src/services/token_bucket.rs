//! Per-client rate limiting via a lazily-refilled token bucket.
//!
//! Refill happens on access rather than on a timer: every call recomputes
//! how many tokens would have accrued since `last_refill_time`, clamps to
//! `size`, and applies them before testing the request.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy)]
struct BucketState {
    size: i64,
    refill_amount: i64,
    refill_interval_ms: i64,
    tokens: i64,
    last_refill_time_ms: i64,
}

impl BucketState {
    fn new(size: i64, refill_amount: i64, refill_interval_ms: i64) -> Self {
        Self {
            size,
            refill_amount,
            refill_interval_ms,
            tokens: size,
            last_refill_time_ms: now_ms(),
        }
    }

    /// Recomputes accrued tokens since the last refill, clamps to `[0,
    /// size]`, and unconditionally bumps `last_refill_time` — whether or not
    /// the caller ultimately consumes anything.
    fn refill(&mut self) {
        let now = now_ms();
        let elapsed = (now - self.last_refill_time_ms).max(0);
        let accrued = (elapsed / self.refill_interval_ms.max(1)) * self.refill_amount;

        self.tokens = (self.tokens + accrued).clamp(0, self.size);
        self.last_refill_time_ms = now;
    }

    /// Refills, then consumes `n` tokens if available.
    fn try_consume(&mut self, n: i64) -> bool {
        if self.can_consume(n) {
            self.tokens -= n;
            true
        } else {
            false
        }
    }

    /// Refills and reports whether `n` tokens are available, without
    /// consuming them. Deliberately not a pure predicate: it carries the
    /// same refill side effects as `try_consume`, it just never subtracts.
    fn can_consume(&mut self, n: i64) -> bool {
        self.refill();
        self.tokens >= n
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[derive(Clone)]
pub struct TokenBucket {
    state: Arc<Mutex<BucketState>>,
}

impl TokenBucket {
    pub fn new(size: i64, refill_amount: i64, refill_interval_ms: i64) -> Self {
        Self {
            state: Arc::new(Mutex::new(BucketState::new(
                size,
                refill_amount,
                refill_interval_ms,
            ))),
        }
    }

    pub fn try_consume(&self, n: i64) -> bool {
        self.state.lock().try_consume(n)
    }

    pub fn can_consume(&self, n: i64) -> bool {
        self.state.lock().can_consume(n)
    }
}

/// Lazily materialized per-client bucket registry.
#[derive(Clone, Default)]
pub struct BucketRegistry {
    buckets: Arc<DashMap<String, TokenBucket>>,
}

impl BucketRegistry {
    pub fn new() -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
        }
    }

    pub fn get_or_create(
        &self,
        client_id: &str,
        size: i64,
        refill_amount: i64,
        refill_interval_ms: i64,
    ) -> TokenBucket {
        self.buckets
            .entry(client_id.to_string())
            .or_insert_with(|| TokenBucket::new(size, refill_amount, refill_interval_ms))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumes_down_to_zero_then_refuses() {
        let bucket = TokenBucket::new(2, 1, 60_000);
        assert!(bucket.try_consume(1));
        assert!(bucket.try_consume(1));
        assert!(!bucket.try_consume(1));
    }

    #[test]
    fn can_consume_never_goes_negative_even_with_repeated_checks() {
        let bucket = TokenBucket::new(1, 1, 60_000);
        assert!(bucket.try_consume(1));
        for _ in 0..5 {
            assert!(!bucket.can_consume(1));
        }
    }

    #[test]
    fn registry_reuses_the_same_bucket_for_a_client() {
        let registry = BucketRegistry::new();
        let a = registry.get_or_create("cli_1", 5, 1, 1_000);
        a.try_consume(3);

        let b = registry.get_or_create("cli_1", 5, 1, 1_000);
        assert!(!b.try_consume(5));
    }

    proptest::proptest! {
        #[test]
        fn tokens_never_exceed_bucket_size(size in 1i64..1000, consumes in 0i64..50) {
            let bucket = TokenBucket::new(size, size, 1);
            for _ in 0..consumes {
                bucket.try_consume(1);
            }
            let state = bucket.state.lock();
            proptest::prop_assert!(state.tokens <= size);
            proptest::prop_assert!(state.tokens >= 0);
        }
    }
}
