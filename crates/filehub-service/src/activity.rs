//! Activity logging glue.
//!
//! Services emit events through [`ActivityRecorder`], which never lets a
//! logger failure reach the caller.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use filehub_core::events::{ActivityAction, ActivityEvent, ActivityTarget};
use filehub_core::result::AppResult;
use filehub_core::traits::ActivityLogger;

use crate::context::RequestContext;

/// Writes every activity event as a structured `tracing` event.
#[derive(Debug, Clone, Default)]
pub struct TracingActivityLogger;

#[async_trait]
impl ActivityLogger for TracingActivityLogger {
    async fn record(&self, event: ActivityEvent) -> AppResult<()> {
        info!(
            target: "filehub::activity",
            event_id = %event.id,
            user_id = %event.user_id,
            action = %event.action,
            item = ?event.target,
            details = %event.details,
            ip_address = event.ip_address.as_deref().unwrap_or("-"),
            "activity"
        );
        Ok(())
    }
}

/// Discards every event.
#[derive(Debug, Clone, Default)]
pub struct NoopActivityLogger;

#[async_trait]
impl ActivityLogger for NoopActivityLogger {
    async fn record(&self, _event: ActivityEvent) -> AppResult<()> {
        Ok(())
    }
}

/// Fire-and-forget front for an [`ActivityLogger`].
#[derive(Debug, Clone)]
pub struct ActivityRecorder {
    logger: Arc<dyn ActivityLogger>,
}

impl ActivityRecorder {
    /// Creates a recorder over the given logger.
    pub fn new(logger: Arc<dyn ActivityLogger>) -> Self {
        Self { logger }
    }

    /// Records an event for the caller in `ctx`.
    pub async fn record(
        &self,
        ctx: &RequestContext,
        action: ActivityAction,
        target: ActivityTarget,
        details: serde_json::Value,
    ) {
        let mut event = ActivityEvent::new(ctx.user_id, action, target).with_details(details);
        event.ip_address = ctx.ip_address.clone();
        event.user_agent = ctx.user_agent.clone();
        self.emit(event).await;
    }

    /// Records a prepared event.
    pub async fn emit(&self, event: ActivityEvent) {
        let action = event.action;
        if let Err(e) = self.logger.record(event).await {
            warn!(action = %action, error = %e, "Failed to record activity");
        }
    }

    /// Convenience for events about a single file.
    pub async fn file(
        &self,
        ctx: &RequestContext,
        action: ActivityAction,
        file_id: Uuid,
        details: serde_json::Value,
    ) {
        self.record(ctx, action, ActivityTarget::File(file_id), details).await;
    }

    /// Convenience for events about a single folder.
    pub async fn folder(
        &self,
        ctx: &RequestContext,
        action: ActivityAction,
        folder_id: Uuid,
        details: serde_json::Value,
    ) {
        self.record(ctx, action, ActivityTarget::Folder(folder_id), details).await;
    }
}
