//! Quota accountant.
//!
//! Used bytes are always computed live from the user's non-deleted files.
//! Every operation that can grow a user's usage (upload, file restore,
//! folder restore) runs its check-then-write under the user's accounting
//! lock, so two concurrent writers cannot both pass the check on the same
//! headroom. Operations on different users never share a lock.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_database::repositories::{FileRepository, UserRepository};
use filehub_entity::quota::QuotaSnapshot;

/// Computes usage and serializes quota-sensitive writes per user.
#[derive(Debug, Clone)]
pub struct QuotaAccountant {
    users: Arc<dyn UserRepository>,
    files: Arc<dyn FileRepository>,
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl QuotaAccountant {
    /// Creates a new accountant.
    pub fn new(users: Arc<dyn UserRepository>, files: Arc<dyn FileRepository>) -> Self {
        Self {
            users,
            files,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Acquires the accounting lock of `owner_id`.
    ///
    /// Hold the guard across the quota check and the write it protects.
    pub async fn lock(&self, owner_id: Uuid) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(owner_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Sum of the sizes of `owner_id`'s live files.
    pub async fn used_bytes(&self, owner_id: Uuid) -> AppResult<i64> {
        self.files.used_bytes(owner_id).await
    }

    /// Current usage and quota of `owner_id`.
    pub async fn snapshot(&self, owner_id: Uuid) -> AppResult<QuotaSnapshot> {
        let user = self
            .users
            .find_by_id(owner_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {owner_id} not found")))?;
        let used = self.files.used_bytes(owner_id).await?;
        Ok(QuotaSnapshot::new(used, user.storage_quota_bytes))
    }

    /// Fails with `QuotaExceeded` when `used - replacing + incoming > quota`.
    ///
    /// Returns the snapshot the decision was made on.
    pub async fn assert_within_quota(
        &self,
        owner_id: Uuid,
        incoming_bytes: i64,
        replacing_bytes: i64,
    ) -> AppResult<QuotaSnapshot> {
        let snapshot = self.snapshot(owner_id).await?;
        if snapshot.would_exceed(incoming_bytes, replacing_bytes) {
            debug!(
                user_id = %owner_id,
                used = snapshot.used_bytes,
                quota = snapshot.quota_bytes,
                incoming = incoming_bytes,
                replacing = replacing_bytes,
                "Quota check failed"
            );
            return Err(AppError::quota_exceeded(format!(
                "Storage quota exceeded: {} of {} bytes used, {} more requested",
                snapshot.used_bytes,
                snapshot.quota_bytes,
                incoming_bytes - replacing_bytes
            )));
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use filehub_core::error::ErrorKind;
    use filehub_database::MemoryDatabase;
    use filehub_entity::file::{CreateFile, VersionContent};
    use filehub_entity::user::CreateUser;

    async fn setup(quota: i64) -> (MemoryDatabase, QuotaAccountant, Uuid) {
        let db = MemoryDatabase::new();
        let user = UserRepository::create(
            &db,
            &CreateUser {
                email: "quota@example.com".into(),
                storage_quota_bytes: quota,
            },
        )
        .await
        .unwrap();
        let accountant = QuotaAccountant::new(Arc::new(db.clone()), Arc::new(db.clone()));
        (db, accountant, user.id)
    }

    async fn add_file(db: &MemoryDatabase, owner: Uuid, name: &str, size: i64) {
        let id = Uuid::new_v4();
        db.create_with_version(
            &CreateFile {
                id,
                owner_id: owner,
                folder_id: None,
                name: name.into(),
            },
            &VersionContent {
                version_id: Uuid::new_v4(),
                storage_key: format!("k/{id}"),
                size_bytes: size,
                checksum_sha256: String::new(),
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_assert_within_quota() {
        let (db, accountant, owner) = setup(1000).await;
        add_file(&db, owner, "a.txt", 600).await;

        let err = accountant.assert_within_quota(owner, 600, 0).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::QuotaExceeded);

        // Replacing the existing 600 bytes leaves room.
        assert!(accountant.assert_within_quota(owner, 1000, 600).await.is_ok());
        // Exactly filling the quota is allowed.
        assert!(accountant.assert_within_quota(owner, 400, 0).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let (_db, accountant, _owner) = setup(10).await;
        let err = accountant.snapshot(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_is_per_user() {
        let (_db, accountant, owner) = setup(10).await;
        let _held = accountant.lock(owner).await;

        let other = tokio::time::timeout(Duration::from_millis(10), accountant.lock(Uuid::new_v4())).await;
        assert!(other.is_ok());

        let same = tokio::time::timeout(Duration::from_millis(10), accountant.lock(owner)).await;
        assert!(same.is_err());
    }
}
