//! The service stack over the local filesystem provider.

use std::sync::Arc;
use std::time::Duration;

use filehub_core::config::QuotaConfig;
use filehub_database::repositories::Repositories;
use filehub_service::{NoopActivityLogger, RequestContext, Services};
use filehub_service::user::CreateAccountRequest;
use filehub_storage::StorageManager;
use filehub_storage::providers::LocalStorageProvider;

use crate::helpers::collect;

#[tokio::test]
async fn test_local_storage_upload_download_purge() {
    let dir = tempfile::tempdir().unwrap();
    let provider = LocalStorageProvider::new(dir.path().to_str().unwrap())
        .await
        .unwrap();
    let storage = StorageManager::new(
        Arc::new(provider),
        Duration::from_secs(5),
        Duration::from_secs(5),
    );
    let services = Services::new(
        Repositories::in_memory(),
        Arc::new(storage),
        Arc::new(NoopActivityLogger),
        QuotaConfig::default(),
    );

    let user = services
        .users
        .create_account(CreateAccountRequest {
            email: "disk@example.com".into(),
            storage_quota_bytes: None,
        })
        .await
        .unwrap();
    let ctx = RequestContext::new(user.id);

    let outcome = services
        .uploads
        .upload(
            &ctx,
            filehub_service::file::UploadRequest {
                folder_id: None,
                name: "disk.txt".into(),
                data: bytes::Bytes::from_static(b"on disk"),
            },
        )
        .await
        .unwrap();
    let on_disk = dir.path().join(&outcome.version.storage_key);
    assert!(on_disk.exists());

    let download = services.downloads.download(&ctx, outcome.file.id).await.unwrap();
    assert_eq!(collect(download.stream).await, b"on disk");

    let report = services.files.purge_file(&ctx, outcome.file.id).await.unwrap();
    assert!(report.is_clean());
    assert!(!on_disk.exists());
}
