//! Batch operations report per-item outcomes.

use filehub_core::error::ErrorKind;
use filehub_entity::ItemRef;
use uuid::Uuid;

use crate::helpers::TestEnv;

#[tokio::test]
async fn test_batch_delete_continues_past_missing_items() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 10_000).await;
    let file_a = env.upload(&ctx, None, "a.txt", b"a").await;
    let folder = env.folder(&ctx, "old", None).await;
    env.upload(&ctx, Some(folder.id), "inside.txt", b"inside").await;
    let missing = Uuid::new_v4();

    let result = env
        .services
        .batch
        .delete(
            &ctx,
            &[
                ItemRef::file(file_a.file.id),
                ItemRef::folder(missing),
                ItemRef::folder(folder.id),
            ],
        )
        .await;

    assert_eq!(
        result.successes,
        vec![ItemRef::file(file_a.file.id), ItemRef::folder(folder.id)]
    );
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].item, ItemRef::folder(missing));
    assert_eq!(result.errors[0].kind, ErrorKind::NotFound);

    let trash = env.services.trash.list(&ctx).await.unwrap();
    assert_eq!(trash.folders.len(), 1);
    assert_eq!(trash.files.len(), 2);
    assert_eq!(env.used(ctx.user_id).await, 0);
}

#[tokio::test]
async fn test_batch_move_reports_name_clashes() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 10_000).await;
    let target = env.folder(&ctx, "target", None).await;
    env.upload(&ctx, Some(target.id), "dup.txt", b"there").await;
    let dup = env.upload(&ctx, None, "dup.txt", b"here").await;
    let fresh = env.upload(&ctx, None, "fresh.txt", b"new").await;
    let sub = env.folder(&ctx, "sub", None).await;

    let result = env
        .services
        .batch
        .move_items(
            &ctx,
            &[
                ItemRef::file(dup.file.id),
                ItemRef::file(fresh.file.id),
                ItemRef::folder(sub.id),
                ItemRef::folder(target.id),
            ],
            target.id,
        )
        .await;

    assert_eq!(
        result.successes,
        vec![ItemRef::file(fresh.file.id), ItemRef::folder(sub.id)]
    );
    let kinds: Vec<ErrorKind> = result.errors.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![ErrorKind::Conflict, ErrorKind::Validation]);

    let view = env.services.folders.get_view(&ctx, Some(target.id)).await.unwrap();
    assert_eq!(view.folders.len(), 1);
    assert_eq!(view.files.len(), 2);
}

#[tokio::test]
async fn test_batch_restore() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 10_000).await;
    let file = env.upload(&ctx, None, "a.txt", b"a").await;
    let folder = env.folder(&ctx, "docs", None).await;
    env.services.files.delete_file(&ctx, file.file.id).await.unwrap();
    env.services
        .folder_lifecycle
        .delete_folder(&ctx, folder.id, true)
        .await
        .unwrap();

    let result = env
        .services
        .batch
        .restore(
            &ctx,
            &[ItemRef::file(file.file.id), ItemRef::folder(folder.id)],
        )
        .await;

    assert_eq!(result.successes.len(), 2);
    assert!(result.errors.is_empty());
    assert!(env.services.trash.list(&ctx).await.unwrap().is_empty());
}
