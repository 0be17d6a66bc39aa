//! Rate-limited, retried decoration of a remote collection.

use std::sync::Arc;

use async_trait::async_trait;
use cadre_core::Entity;

use crate::collection::RemoteCollection;
use crate::error::RemoteResult;
use crate::limiter::RateLimiterRegistry;
use crate::retry::RetryPolicy;

/// Decorates a [`RemoteCollection`] with token-bucket throttling and retry
/// on its mutating operations.
///
/// Used for attach/detach-class collections (repository attachments) whose
/// remote endpoints are both rate-sensitive and fronted by infrastructure
/// that produces transient outage bodies. Reconciliation semantics are
/// untouched: the engine sees the same four operations, just slower under
/// pressure.
///
/// `add` and `update` share the same bucket: for the collections this
/// wrapper targets, update is an idempotent re-attach and hits the same
/// endpoint. `fetch` passes through unthrottled: reads are cheap and the
/// engine issues at most two per pass.
pub struct Throttled<R> {
    inner: R,
    limiters: Arc<RateLimiterRegistry>,
    retry: RetryPolicy,
    add_bucket: String,
    remove_bucket: String,
}

impl<R> Throttled<R> {
    /// Wrap `inner`, drawing tokens from the named buckets of `limiters`.
    pub fn new(
        inner: R,
        limiters: Arc<RateLimiterRegistry>,
        retry: RetryPolicy,
        add_bucket: impl Into<String>,
        remove_bucket: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            limiters,
            retry,
            add_bucket: add_bucket.into(),
            remove_bucket: remove_bucket.into(),
        }
    }

    /// The wrapped collection.
    pub fn inner(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<T, R> RemoteCollection<T> for Throttled<R>
where
    T: Entity + Send + Sync,
    R: RemoteCollection<T>,
{
    async fn fetch(&self) -> RemoteResult<Vec<T>> {
        self.inner.fetch().await
    }

    async fn add(&self, entity: &T) -> RemoteResult<()> {
        self.limiters.acquire(&self.add_bucket).await;
        self.retry
            .execute(&self.add_bucket, || self.inner.add(entity))
            .await
    }

    async fn update(&self, entity: &T) -> RemoteResult<()> {
        self.limiters.acquire(&self.add_bucket).await;
        self.retry
            .execute(&self.add_bucket, || self.inner.update(entity))
            .await
    }

    async fn remove(&self, entity: &T) -> RemoteResult<()> {
        self.limiters.acquire(&self.remove_bucket).await;
        self.retry
            .execute(&self.remove_bucket, || self.inner.remove(entity))
            .await
    }
}
