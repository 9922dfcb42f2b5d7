use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_entity::item::ItemType;
use filehub_entity::share::{CreateShare, Share};

use super::MemoryDatabase;
use crate::repositories::ShareRepository;

fn newest_first(mut shares: Vec<Share>) -> Vec<Share> {
    shares.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    shares
}

#[async_trait]
impl ShareRepository for MemoryDatabase {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Share>> {
        Ok(self.state.read().await.shares.get(&id).cloned())
    }

    async fn find_for_item(
        &self,
        item_type: ItemType,
        item_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<Share>> {
        let state = self.state.read().await;
        Ok(state
            .shares
            .values()
            .find(|s| s.item_type == item_type && s.item_id == item_id && s.shared_with == user_id)
            .cloned())
    }

    async fn find_for_items(
        &self,
        item_type: ItemType,
        item_ids: &[Uuid],
        user_id: Uuid,
    ) -> AppResult<Vec<Share>> {
        let wanted: HashSet<Uuid> = item_ids.iter().copied().collect();
        let state = self.state.read().await;
        Ok(state
            .shares
            .values()
            .filter(|s| {
                s.item_type == item_type && s.shared_with == user_id && wanted.contains(&s.item_id)
            })
            .cloned()
            .collect())
    }

    async fn list_shared_with(&self, user_id: Uuid) -> AppResult<Vec<Share>> {
        let state = self.state.read().await;
        Ok(newest_first(
            state
                .shares
                .values()
                .filter(|s| s.shared_with == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Share>> {
        let state = self.state.read().await;
        Ok(newest_first(
            state
                .shares
                .values()
                .filter(|s| s.owner_id == owner_id)
                .cloned()
                .collect(),
        ))
    }

    async fn create(&self, data: &CreateShare) -> AppResult<Share> {
        let mut state = self.state.write().await;
        if state.shares.values().any(|s| {
            s.item_type == data.item_type
                && s.item_id == data.item_id
                && s.shared_with == data.shared_with
        }) {
            return Err(AppError::conflict("Item is already shared with this user"));
        }
        let share = Share {
            id: Uuid::now_v7(),
            item_type: data.item_type,
            item_id: data.item_id,
            owner_id: data.owner_id,
            shared_with: data.shared_with,
            permission: data.permission,
            created_at: Utc::now(),
        };
        state.shares.insert(share.id, share.clone());
        Ok(share)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.state.write().await.shares.remove(&id).is_some())
    }

    async fn delete_for_items(&self, item_type: ItemType, item_ids: &[Uuid]) -> AppResult<u64> {
        let wanted: HashSet<Uuid> = item_ids.iter().copied().collect();
        let mut state = self.state.write().await;
        let before = state.shares.len();
        state
            .shares
            .retain(|_, s| !(s.item_type == item_type && wanted.contains(&s.item_id)));
        Ok((before - state.shares.len()) as u64)
    }
}
