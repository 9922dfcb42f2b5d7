//! Batch delete, move and restore.
//!
//! Every item is processed on its own; one failure never aborts or undoes
//! the others.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use filehub_core::error::ErrorKind;
use filehub_core::events::{ActivityAction, ActivityTarget};
use filehub_core::result::AppResult;
use filehub_entity::item::{ItemRef, ItemType};

use crate::activity::ActivityRecorder;
use crate::context::RequestContext;
use crate::file::FileService;
use crate::folder::{FolderLifecycleService, FolderService};

/// A failed item of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemError {
    /// The item.
    pub item: ItemRef,
    /// Error category.
    pub kind: ErrorKind,
    /// Error message.
    pub message: String,
}

/// Per-item outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Items processed successfully.
    pub successes: Vec<ItemRef>,
    /// Items that failed.
    pub errors: Vec<BatchItemError>,
}

impl BatchResult {
    fn push(&mut self, item: ItemRef, outcome: AppResult<()>) {
        match outcome {
            Ok(()) => self.successes.push(item),
            Err(e) => self.errors.push(BatchItemError {
                item,
                kind: e.kind,
                message: e.message,
            }),
        }
    }
}

/// Runs file and folder operations over item lists.
#[derive(Debug, Clone)]
pub struct BatchService {
    files: Arc<FileService>,
    folders: Arc<FolderService>,
    lifecycle: Arc<FolderLifecycleService>,
    activity: ActivityRecorder,
}

impl BatchService {
    /// Creates a new batch service.
    pub fn new(
        files: Arc<FileService>,
        folders: Arc<FolderService>,
        lifecycle: Arc<FolderLifecycleService>,
        activity: ActivityRecorder,
    ) -> Self {
        Self {
            files,
            folders,
            lifecycle,
            activity,
        }
    }

    async fn summarize(&self, ctx: &RequestContext, action: ActivityAction, result: &BatchResult) {
        info!(
            user_id = %ctx.user_id,
            action = %action,
            succeeded = result.successes.len(),
            failed = result.errors.len(),
            "Batch finished"
        );
        self.activity
            .record(
                ctx,
                action,
                ActivityTarget::Many,
                json!({ "succeeded": result.successes, "failed": result.errors.len() }),
            )
            .await;
    }

    /// Moves every item to the trash; folders are deleted recursively.
    pub async fn delete(&self, ctx: &RequestContext, items: &[ItemRef]) -> BatchResult {
        let mut result = BatchResult::default();
        for item in items {
            let outcome = match item.item_type {
                ItemType::File => self.files.delete_file(ctx, item.id).await.map(drop),
                ItemType::Folder => self.lifecycle.delete_folder(ctx, item.id, true).await.map(drop),
            };
            result.push(*item, outcome);
        }
        self.summarize(ctx, ActivityAction::BatchDelete, &result).await;
        result
    }

    /// Moves every item into `destination`.
    pub async fn move_items(&self, ctx: &RequestContext, items: &[ItemRef], destination: Uuid) -> BatchResult {
        let mut result = BatchResult::default();
        for item in items {
            let outcome = match item.item_type {
                ItemType::File => self.files.move_file(ctx, item.id, Some(destination)).await.map(drop),
                ItemType::Folder => self.folders.move_folder(ctx, item.id, Some(destination)).await.map(drop),
            };
            result.push(*item, outcome);
        }
        self.summarize(ctx, ActivityAction::BatchMove, &result).await;
        result
    }

    /// Restores every item from the trash.
    pub async fn restore(&self, ctx: &RequestContext, items: &[ItemRef]) -> BatchResult {
        let mut result = BatchResult::default();
        for item in items {
            let outcome = match item.item_type {
                ItemType::File => self.files.restore_file(ctx, item.id).await.map(drop),
                ItemType::Folder => self.lifecycle.restore_folder(ctx, item.id).await.map(drop),
            };
            result.push(*item, outcome);
        }
        self.summarize(ctx, ActivityAction::BatchRestore, &result).await;
        result
    }
}
