use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_entity::user::{CreateUser, User};

use super::MemoryDatabase;
use crate::repositories::UserRepository;

#[async_trait]
impl UserRepository for MemoryDatabase {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let mut state = self.state.write().await;
        if state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&data.email))
        {
            return Err(AppError::conflict(format!(
                "A user with email '{}' already exists",
                data.email
            )));
        }
        let user = User {
            id: Uuid::now_v7(),
            email: data.email.clone(),
            storage_quota_bytes: data.storage_quota_bytes,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }
}
