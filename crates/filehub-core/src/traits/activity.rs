//! Activity logging sink.

use async_trait::async_trait;

use crate::events::ActivityEvent;
use crate::result::AppResult;

/// Destination for user-visible activity records.
///
/// Callers treat this as fire-and-forget: a failing logger must never
/// fail the operation that produced the event.
#[async_trait]
pub trait ActivityLogger: Send + Sync + std::fmt::Debug + 'static {
    /// Persist or forward one activity event.
    async fn record(&self, event: ActivityEvent) -> AppResult<()>;
}
