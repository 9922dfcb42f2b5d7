//! Folder tree operations: create, ensure path, rename, move, listing, search.

use filehub_core::error::ErrorKind;
use filehub_database::repositories::folder::MAX_TREE_DEPTH;

use crate::helpers::TestEnv;

#[tokio::test]
async fn test_create_folder_is_idempotent() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 1000).await;

    let first = env.folder(&ctx, "docs", None).await;
    let second = env.folder(&ctx, "docs", None).await;
    assert_eq!(first.id, second.id);

    let root = env.root(ctx.user_id).await;
    assert_eq!(first.parent_id, Some(root.id));
}

#[tokio::test]
async fn test_ensure_path_creates_missing_segments() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 1000).await;
    let existing = env.folder(&ctx, "a", None).await;

    let leaf = env
        .services
        .folders
        .ensure_path(&ctx, "a/b/c", None)
        .await
        .unwrap();
    let crumbs = env.services.folders.ancestors(&ctx, leaf.id).await.unwrap();
    let names: Vec<&str> = crumbs.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names[1..], ["a", "b", "c"]);
    assert_eq!(crumbs[1].id, existing.id);

    let again = env
        .services
        .folders
        .ensure_path(&ctx, "a/b/c", None)
        .await
        .unwrap();
    assert_eq!(again.id, leaf.id);

    let err = env
        .services
        .folders
        .ensure_path(&ctx, "a/../etc", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_move_into_descendant_is_rejected() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 1000).await;
    let a = env.folder(&ctx, "a", None).await;
    let b = env.folder(&ctx, "b", Some(a.id)).await;
    let c = env.folder(&ctx, "c", Some(b.id)).await;

    for dest in [a.id, c.id] {
        let err = env
            .services
            .folders
            .move_folder(&ctx, a.id, Some(dest))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    let root = env.root(ctx.user_id).await;
    let moved = env.services.folders.move_folder(&ctx, c.id, None).await.unwrap();
    assert_eq!(moved.parent_id, Some(root.id));

    let back = env
        .services
        .folders
        .move_folder(&ctx, c.id, Some(b.id))
        .await
        .unwrap();
    assert_eq!(back.parent_id, Some(b.id));
}

#[tokio::test]
async fn test_root_cannot_be_renamed_or_moved() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 1000).await;
    let root = env.root(ctx.user_id).await;
    let other = env.folder(&ctx, "other", None).await;

    let err = env
        .services
        .folders
        .rename_folder(&ctx, root.id, "home")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = env
        .services
        .folders
        .move_folder(&ctx, root.id, Some(other.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_rename_clash_is_conflict() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 1000).await;
    env.folder(&ctx, "taken", None).await;
    let free = env.folder(&ctx, "free", None).await;

    let err = env
        .services
        .folders
        .rename_folder(&ctx, free.id, "taken")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let renamed = env
        .services
        .folders
        .rename_folder(&ctx, free.id, "renamed")
        .await
        .unwrap();
    assert_eq!(renamed.name, "renamed");
}

#[tokio::test]
async fn test_moves_never_cross_owners() {
    let env = TestEnv::new();
    let (_, alice) = env.user("alice@example.com", 1000).await;
    let (_, bob) = env.user("bob@example.com", 1000).await;
    let mine = env.upload(&alice, None, "mine.txt", b"mine").await;
    let bobs = env.folder(&bob, "bobs", None).await;

    // Forbidden before owner checks: alice cannot write into bob's folder.
    let err = env
        .services
        .files
        .move_file(&alice, mine.file.id, Some(bobs.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_root_view_lists_root_level_files_and_sizes() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 1000).await;
    let docs = env.folder(&ctx, "docs", None).await;
    env.upload(&ctx, None, "top.txt", &[0u8; 10]).await;
    env.upload(&ctx, Some(docs.id), "inner.txt", &[0u8; 20]).await;

    let view = env.services.folders.get_view(&ctx, None).await.unwrap();
    assert_eq!(view.folder.size_bytes, 30);
    assert_eq!(view.folders.len(), 1);
    assert_eq!(view.folders[0].size_bytes, 20);
    assert_eq!(view.files.len(), 1);
    assert_eq!(view.files[0].name, "top.txt");
    assert_eq!(view.storage.used_bytes, 30);
    assert_eq!(view.parent_name, None);
}

#[tokio::test]
async fn test_file_moved_to_root_folder_lives_at_root_level() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 1000).await;
    let root = env.root(ctx.user_id).await;
    let docs = env.folder(&ctx, "docs", None).await;
    let file = env.upload(&ctx, Some(docs.id), "a.txt", b"a").await;

    let moved = env
        .services
        .files
        .move_file(&ctx, file.file.id, Some(root.id))
        .await
        .unwrap();
    assert_eq!(moved.folder_id, None);

    // Uploading the same name at the root level versions it.
    let again = env.upload(&ctx, Some(root.id), "a.txt", b"b").await;
    assert!(!again.created);
    assert_eq!(again.file.id, file.file.id);
}

#[tokio::test]
async fn test_search_matches_live_names_only() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 1000).await;
    env.folder(&ctx, "Reports", None).await;
    env.upload(&ctx, None, "report-2024.pdf", b"pdf").await;
    let old = env.upload(&ctx, None, "old-report.txt", b"txt").await;
    env.upload(&ctx, None, "notes.txt", b"notes").await;
    env.services.files.delete_file(&ctx, old.file.id).await.unwrap();

    let results = env.services.search.search(&ctx, "report").await.unwrap();
    assert_eq!(results.folders.len(), 1);
    assert_eq!(results.files.len(), 1);
    assert_eq!(results.files[0].name, "report-2024.pdf");

    let err = env.services.search.search(&ctx, "  ").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_opposite_concurrent_moves_never_form_a_cycle() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 1000).await;
    let root = env.root(ctx.user_id).await;
    let a = env.folder(&ctx, "a", None).await;
    let b = env.folder(&ctx, "b", None).await;

    let (a_into_b, b_into_a) = tokio::join!(
        env.services.folders.move_folder(&ctx, a.id, Some(b.id)),
        env.services.folders.move_folder(&ctx, b.id, Some(a.id)),
    );
    let outcomes = [a_into_b, b_into_a];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let failed = outcomes.into_iter().find_map(Result::err).unwrap();
    assert_eq!(failed.kind, ErrorKind::Validation);

    for id in [a.id, b.id] {
        let crumbs = env.services.folders.ancestors(&ctx, id).await.unwrap();
        assert_eq!(crumbs[0].id, root.id);
    }
}

#[tokio::test]
async fn test_folder_nesting_is_capped() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 1000).await;
    let segments: Vec<String> = (1..=MAX_TREE_DEPTH).map(|i| format!("d{i}")).collect();

    let deepest = env
        .services
        .folders
        .ensure_path(&ctx, &segments.join("/"), None)
        .await
        .unwrap();
    let crumbs = env.services.folders.ancestors(&ctx, deepest.id).await.unwrap();
    assert_eq!(crumbs.len() as i32, MAX_TREE_DEPTH + 1);

    let err = env
        .services
        .folders
        .create_folder(&ctx, "one-more", Some(deepest.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    let err = env
        .services
        .folders
        .ensure_path(&ctx, &format!("{}/one-more", segments.join("/")), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    // A two-level folder fits under level 1022 but not under level 1023.
    let a = env.folder(&ctx, "a", None).await;
    let b = env.folder(&ctx, "b", Some(a.id)).await;
    let depth = (MAX_TREE_DEPTH - 1) as usize;
    let too_low = env
        .services
        .folders
        .ensure_path(&ctx, &segments[..depth].join("/"), None)
        .await
        .unwrap();
    let err = env
        .services
        .folders
        .move_folder(&ctx, a.id, Some(too_low.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    let unmoved = env.services.folders.get_folder(&ctx, a.id).await.unwrap();
    assert_eq!(unmoved.parent_id, a.parent_id);

    let fits = env
        .services
        .folders
        .ensure_path(&ctx, &segments[..depth - 1].join("/"), None)
        .await
        .unwrap();
    env.services
        .folders
        .move_folder(&ctx, a.id, Some(fits.id))
        .await
        .unwrap();
    let crumbs = env.services.folders.ancestors(&ctx, b.id).await.unwrap();
    assert_eq!(crumbs.len() as i32, MAX_TREE_DEPTH + 1);
}
