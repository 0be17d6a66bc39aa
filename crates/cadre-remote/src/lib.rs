//! # Cadre Remote
//!
//! The remote collaborator surface consumed by the cadre reconciliation
//! engine.
//!
//! The engine never speaks a wire protocol of its own; it drives a
//! [`RemoteCollection`] (fetch, add, update, remove) supplied by the host
//! plugin. This crate defines that trait, the error taxonomy remote
//! collaborators report through ([`RemoteError`]), and two policy layers that
//! decorate collaborators without changing reconciliation semantics:
//!
//! - [`RetryPolicy`]: bounded exponential backoff, retrying transport-level
//!   transient failures and responses whose body matches a configured
//!   transient pattern.
//! - [`RateLimiterRegistry`]: explicitly constructed named token buckets;
//!   acquiring from an exhausted bucket suspends the caller rather than
//!   failing.
//!
//! [`Throttled`] combines both around the attach/detach-class operations
//! that need them.

pub mod collection;
pub mod error;
pub mod limiter;
pub mod retry;
pub mod throttle;

pub use collection::RemoteCollection;
pub use error::{RemoteError, RemoteResult};
pub use limiter::{RateLimit, RateLimiterRegistry, RateLimiterRegistryBuilder, TokenBucket};
pub use retry::{RetryPolicy, TransientTriggers, DEFAULT_TRANSIENT_PATTERNS};
pub use throttle::Throttled;
