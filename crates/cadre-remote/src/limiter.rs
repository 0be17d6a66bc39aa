//! Named token-bucket rate limiting for remote operations.
//!
//! The registry is explicitly constructed and passed to whoever needs it;
//! there is no process-global bucket map. Sharing one registry (via `Arc`)
//! across concurrent reconciliation passes is what makes throttling global;
//! tests build their own.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Configuration for one named bucket: a burst capacity refilled over time.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    /// Maximum tokens the bucket holds (burst size).
    pub burst: u64,
    /// Tokens added per refill interval.
    pub refill: u64,
    /// How often tokens are added.
    pub refill_interval: Duration,
}

impl RateLimit {
    /// A limit of `n` operations per second, with burst `n`.
    #[must_use]
    pub fn per_second(n: u64) -> Self {
        Self {
            burst: n,
            refill: n,
            refill_interval: Duration::from_secs(1),
        }
    }

    /// One token per `interval`, with the given burst.
    #[must_use]
    pub fn per_interval(burst: u64, interval: Duration) -> Self {
        Self {
            burst,
            refill: 1,
            refill_interval: interval,
        }
    }
}

/// Token bucket limiter.
///
/// `acquire` suspends the calling task until a token is available; bucket
/// exhaustion delays work, it never fails it. The wait has no timeout of its
/// own: dropping the future abandons the wait, so cancellation is the
/// caller's lever.
pub struct TokenBucket {
    capacity: u64,
    tokens: AtomicU64,
    refill_amount: u64,
    refill_interval: Duration,
    last_refill: Mutex<Instant>,
}

impl TokenBucket {
    /// Create a bucket from a [`RateLimit`], starting full.
    #[must_use]
    pub fn new(limit: RateLimit) -> Self {
        Self {
            capacity: limit.burst,
            tokens: AtomicU64::new(limit.burst),
            refill_amount: limit.refill,
            refill_interval: limit.refill_interval,
            last_refill: Mutex::new(Instant::now()),
        }
    }

    /// Try to take one token without waiting.
    pub async fn try_acquire(&self) -> bool {
        self.refill().await;

        loop {
            let current = self.tokens.load(Ordering::Relaxed);
            if current == 0 {
                return false;
            }
            if self
                .tokens
                .compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Take one token, suspending until one is available.
    pub async fn acquire(&self) {
        while !self.try_acquire().await {
            tokio::time::sleep(self.refill_interval / 10).await;
        }
    }

    /// Current number of available tokens.
    #[must_use]
    pub fn available(&self) -> u64 {
        self.tokens.load(Ordering::Relaxed)
    }

    /// Add tokens for the intervals elapsed since the last refill.
    async fn refill(&self) {
        let mut last_refill = self.last_refill.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(*last_refill);

        if elapsed >= self.refill_interval {
            let intervals = elapsed.as_secs_f64() / self.refill_interval.as_secs_f64();
            let new_tokens = (intervals as u64) * self.refill_amount;

            if new_tokens > 0 {
                loop {
                    let current = self.tokens.load(Ordering::Relaxed);
                    let next = (current + new_tokens).min(self.capacity);
                    if self
                        .tokens
                        .compare_exchange(current, next, Ordering::SeqCst, Ordering::Relaxed)
                        .is_ok()
                    {
                        break;
                    }
                }
                *last_refill = now;
            }
        }
    }
}

/// A registry of named token buckets with a fallback for unnamed call sites.
///
/// Bucket names are fixed at construction; looking up an unconfigured name
/// falls back to the shared default bucket rather than failing, so call sites
/// never need to handle a missing bucket.
pub struct RateLimiterRegistry {
    buckets: HashMap<String, TokenBucket>,
    fallback: TokenBucket,
}

impl RateLimiterRegistry {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> RateLimiterRegistryBuilder {
        RateLimiterRegistryBuilder {
            buckets: Vec::new(),
            fallback: RateLimit::per_second(10),
        }
    }

    /// The bucket registered under `name`, or the fallback bucket.
    #[must_use]
    pub fn bucket(&self, name: &str) -> &TokenBucket {
        self.buckets.get(name).unwrap_or(&self.fallback)
    }

    /// Whether a dedicated bucket exists for `name`.
    #[must_use]
    pub fn has_bucket(&self, name: &str) -> bool {
        self.buckets.contains_key(name)
    }

    /// Take one token from the named (or fallback) bucket, suspending until
    /// one is available.
    pub async fn acquire(&self, name: &str) {
        self.bucket(name).acquire().await;
    }
}

/// Builder for [`RateLimiterRegistry`].
pub struct RateLimiterRegistryBuilder {
    buckets: Vec<(String, RateLimit)>,
    fallback: RateLimit,
}

impl RateLimiterRegistryBuilder {
    /// Register a named bucket.
    #[must_use]
    pub fn bucket(mut self, name: impl Into<String>, limit: RateLimit) -> Self {
        self.buckets.push((name.into(), limit));
        self
    }

    /// Override the fallback limit used for unconfigured names.
    #[must_use]
    pub fn fallback(mut self, limit: RateLimit) -> Self {
        self.fallback = limit;
        self
    }

    /// Build the registry.
    #[must_use]
    pub fn build(self) -> RateLimiterRegistry {
        RateLimiterRegistry {
            buckets: self
                .buckets
                .into_iter()
                .map(|(name, limit)| (name, TokenBucket::new(limit)))
                .collect(),
            fallback: TokenBucket::new(self.fallback),
        }
    }
}
