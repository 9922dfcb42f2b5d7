//! Per-user quota enforcement across uploads, deletes and restores.

use filehub_core::error::ErrorKind;

use crate::helpers::TestEnv;

#[tokio::test]
async fn test_upload_rejected_over_quota_until_space_is_freed() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 1000).await;

    let first = env.upload(&ctx, None, "a.bin", &[1u8; 600]).await;
    assert!(first.created);
    assert_eq!(env.used(ctx.user_id).await, 600);

    let err = env
        .try_upload(&ctx, None, "b.bin", &[2u8; 600])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::QuotaExceeded);
    assert_eq!(env.used(ctx.user_id).await, 600);
    assert_eq!(env.objects.len(), 1);

    env.services.files.delete_file(&ctx, first.file.id).await.unwrap();
    assert_eq!(env.used(ctx.user_id).await, 0);

    env.upload(&ctx, None, "b.bin", &[2u8; 600]).await;
    assert_eq!(env.used(ctx.user_id).await, 600);
}

#[tokio::test]
async fn test_new_version_counts_only_the_size_difference() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 1000).await;

    env.upload(&ctx, None, "a.bin", &[1u8; 800]).await;
    let second = env.upload(&ctx, None, "a.bin", &[1u8; 900]).await;

    assert!(!second.created);
    assert_eq!(second.file.current_version, 2);
    assert_eq!(env.used(ctx.user_id).await, 900);
}

#[tokio::test]
async fn test_restore_file_rechecks_quota() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 1000).await;

    let old = env.upload(&ctx, None, "old.bin", &[1u8; 700]).await;
    env.services.files.delete_file(&ctx, old.file.id).await.unwrap();
    env.upload(&ctx, None, "new.bin", &[1u8; 700]).await;

    let err = env
        .services
        .files
        .restore_file(&ctx, old.file.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::QuotaExceeded);

    let trash = env.services.trash.list(&ctx).await.unwrap();
    assert_eq!(trash.files.len(), 1);
}

#[tokio::test]
async fn test_concurrent_uploads_never_overshoot_quota() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 1000).await;

    let mut handles = Vec::new();
    for i in 0..5 {
        let uploads = env.services.uploads.clone();
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            uploads
                .upload(
                    &ctx,
                    filehub_service::file::UploadRequest {
                        folder_id: None,
                        name: format!("f{i}.bin"),
                        data: bytes::Bytes::from(vec![0u8; 300]),
                    },
                )
                .await
        }));
    }

    let mut stored = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => stored += 1,
            Err(e) => assert_eq!(e.kind, ErrorKind::QuotaExceeded),
        }
    }
    assert_eq!(stored, 3);
    assert_eq!(env.used(ctx.user_id).await, 900);
}
