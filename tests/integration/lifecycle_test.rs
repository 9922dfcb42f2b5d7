//! Soft delete, atomic restore, purge and trash emptying.

use filehub_core::error::ErrorKind;
use filehub_core::events::ActivityAction;
use filehub_database::repositories::FileRepository;
use filehub_entity::lifecycle::Lifecycle;

use crate::helpers::TestEnv;

#[tokio::test]
async fn test_folder_restore_over_quota_restores_nothing() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 1000).await;

    let docs = env.folder(&ctx, "docs", None).await;
    let inner = env.folder(&ctx, "inner", Some(docs.id)).await;
    env.upload(&ctx, Some(docs.id), "a.bin", &[0u8; 300]).await;
    env.upload(&ctx, Some(inner.id), "b.bin", &[0u8; 300]).await;

    let deleted = env
        .services
        .folder_lifecycle
        .delete_folder(&ctx, docs.id, true)
        .await
        .unwrap();
    assert_eq!((deleted.folders, deleted.files, deleted.size_bytes), (2, 2, 600));
    assert_eq!(env.used(ctx.user_id).await, 0);

    env.upload(&ctx, None, "filler.bin", &[0u8; 500]).await;

    let err = env
        .services
        .folder_lifecycle
        .restore_folder(&ctx, docs.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::QuotaExceeded);

    let trash = env.services.trash.list(&ctx).await.unwrap();
    assert_eq!(trash.folders.len(), 2);
    assert_eq!(trash.files.len(), 2);
    assert_eq!(env.used(ctx.user_id).await, 500);
}

#[tokio::test]
async fn test_folder_restore_name_clash_is_conflict_and_rolls_back() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 10_000).await;

    let original = env.folder(&ctx, "reports", None).await;
    env.upload(&ctx, Some(original.id), "q1.txt", b"q1").await;
    env.services
        .folder_lifecycle
        .delete_folder(&ctx, original.id, true)
        .await
        .unwrap();
    env.folder(&ctx, "reports", None).await;

    let err = env
        .services
        .folder_lifecycle
        .restore_folder(&ctx, original.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let trash = env.services.trash.list(&ctx).await.unwrap();
    assert_eq!(trash.folders.len(), 1);
    assert_eq!(trash.files.len(), 1);
    assert_eq!(env.used(ctx.user_id).await, 0);
}

#[tokio::test]
async fn test_restore_under_trashed_parent_is_conflict() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 10_000).await;
    let parent = env.folder(&ctx, "parent", None).await;
    let file = env.upload(&ctx, Some(parent.id), "f.txt", b"f").await;

    env.services.files.delete_file(&ctx, file.file.id).await.unwrap();
    env.services
        .folder_lifecycle
        .delete_folder(&ctx, parent.id, true)
        .await
        .unwrap();

    let err = env
        .services
        .files
        .restore_file(&ctx, file.file.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    env.services
        .folder_lifecycle
        .restore_folder(&ctx, parent.id)
        .await
        .unwrap();
    // The folder restore brings its trashed files back with it.
    let restored = env.services.files.get_file(&ctx, file.file.id).await.unwrap();
    assert!(restored.is_active());
    assert_eq!(env.used(ctx.user_id).await, 1);
}

#[tokio::test]
async fn test_purge_reports_failed_storage_deletes() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 10_000).await;

    let folder = env.folder(&ctx, "logs", None).await;
    let stuck = env.upload(&ctx, Some(folder.id), "stuck.log", b"one").await;
    env.upload(&ctx, Some(folder.id), "stuck.log", b"two").await;
    env.upload(&ctx, Some(folder.id), "fine.log", b"three").await;
    assert_eq!(env.objects.len(), 3);

    env.storage.fail_deletes_of(&stuck.file.id.to_string());

    let report = env
        .services
        .folder_lifecycle
        .purge_folder(&ctx, folder.id)
        .await
        .unwrap();

    assert_eq!(report.folders_removed, 1);
    assert_eq!(report.files_removed, 2);
    assert_eq!(report.objects_removed, 1);
    assert_eq!(report.failed_objects.len(), 2);
    assert!(!report.is_clean());

    let err = env.services.folders.get_folder(&ctx, folder.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(env.services.trash.list(&ctx).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_only_the_owner_can_purge() {
    let env = TestEnv::new();
    let (_, owner) = env.user("owner@example.com", 1000).await;
    let (_, other) = env.user("other@example.com", 1000).await;
    let file = env.upload(&owner, None, "mine.txt", b"mine").await;

    let err = env
        .services
        .files
        .purge_file(&other, file.file.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    let report = env.services.files.purge_file(&owner, file.file.id).await.unwrap();
    assert!(report.is_clean());
    assert!(env.objects.is_empty());
}

#[tokio::test]
async fn test_empty_trash_purges_everything_trashed() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 10_000).await;

    let outer = env.folder(&ctx, "outer", None).await;
    let inner = env.folder(&ctx, "inner", Some(outer.id)).await;
    env.upload(&ctx, Some(inner.id), "deep.txt", b"deep").await;
    let loose = env.upload(&ctx, None, "loose.txt", b"loose").await;
    env.upload(&ctx, None, "kept.txt", b"kept").await;

    env.services
        .folder_lifecycle
        .delete_folder(&ctx, outer.id, true)
        .await
        .unwrap();
    env.services.files.delete_file(&ctx, loose.file.id).await.unwrap();

    let report = env.services.trash.empty(&ctx).await.unwrap();
    assert_eq!(report.folders_removed, 2);
    assert_eq!(report.files_removed, 2);
    assert!(report.is_clean());

    assert!(env.services.trash.list(&ctx).await.unwrap().is_empty());
    assert_eq!(env.objects.len(), 1);
    assert!(env.activity.actions().contains(&ActivityAction::TrashEmpty));
}

#[tokio::test]
async fn test_delete_rules() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 10_000).await;
    let root = env.root(ctx.user_id).await;
    let full = env.folder(&ctx, "full", None).await;
    env.upload(&ctx, Some(full.id), "x.txt", b"x").await;

    let err = env
        .services
        .folder_lifecycle
        .delete_folder(&ctx, root.id, true)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = env
        .services
        .folder_lifecycle
        .delete_folder(&ctx, full.id, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    env.services
        .folder_lifecycle
        .delete_folder(&ctx, full.id, true)
        .await
        .unwrap();
    let err = env
        .services
        .folder_lifecycle
        .delete_folder(&ctx, full.id, true)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_empty_trash_keeps_trashed_folder_holding_live_files() {
    let env = TestEnv::new();
    let (user, ctx) = env.user("alice@example.com", 10_000).await;
    let docs = env.folder(&ctx, "docs", None).await;
    let kept = env.upload(&ctx, Some(docs.id), "kept.txt", b"kept").await;
    let loose = env.upload(&ctx, None, "loose.txt", b"loose").await;

    env.services
        .folder_lifecycle
        .delete_folder(&ctx, docs.id, true)
        .await
        .unwrap();
    env.services.files.delete_file(&ctx, loose.file.id).await.unwrap();
    // A live file left behind in the trashed folder.
    env.services
        .repositories
        .files
        .set_lifecycle(&[kept.file.id], Lifecycle::Active)
        .await
        .unwrap();

    let report = env.services.trash.empty(&ctx).await.unwrap();
    assert_eq!(report.folders_removed, 0);
    assert_eq!(report.files_removed, 1);

    let survivor = env
        .services
        .repositories
        .files
        .find_by_id(kept.file.id)
        .await
        .unwrap()
        .unwrap();
    assert!(survivor.is_active());
    assert_eq!(env.used(user.id).await, 4);
    assert_eq!(env.objects.len(), 1);

    let purge = env.services.folder_lifecycle.purge_folder(&ctx, docs.id).await;
    assert_eq!(purge.unwrap_err().kind, ErrorKind::Conflict);
}
