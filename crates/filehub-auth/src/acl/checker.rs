//! Direct share lookups.

use std::sync::Arc;

use uuid::Uuid;

use filehub_core::result::AppResult;
use filehub_database::repositories::ShareRepository;
use filehub_entity::item::ItemType;
use filehub_entity::share::SharePermission;

/// Looks up shares granted directly on an item.
#[derive(Debug, Clone)]
pub struct ShareChecker {
    shares: Arc<dyn ShareRepository>,
}

impl ShareChecker {
    /// Creates a new share checker.
    pub fn new(shares: Arc<dyn ShareRepository>) -> Self {
        Self { shares }
    }

    /// The permission `user_id` holds directly on the item, if shared.
    pub async fn direct_permission(
        &self,
        item_type: ItemType,
        item_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<SharePermission>> {
        Ok(self
            .shares
            .find_for_item(item_type, item_id, user_id)
            .await?
            .map(|s| s.permission))
    }

    /// Highest permission `user_id` holds on any of the given folders,
    /// together with the folder it comes from.
    pub async fn best_on_folders(
        &self,
        folder_ids: &[Uuid],
        user_id: Uuid,
    ) -> AppResult<Option<(Uuid, SharePermission)>> {
        let shares = self
            .shares
            .find_for_items(ItemType::Folder, folder_ids, user_id)
            .await?;
        Ok(shares
            .into_iter()
            .max_by_key(|s| s.permission.privilege_level())
            .map(|s| (s.item_id, s.permission)))
    }
}
