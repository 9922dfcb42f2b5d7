//! Create-or-version uploads, version history and downloads.

use bytes::Bytes;
use filehub_core::error::ErrorKind;
use filehub_core::events::ActivityAction;
use filehub_database::repositories::FileRepository;
use filehub_service::file::{PathUpload, sha256_hex};

use crate::helpers::{TestEnv, collect};

#[tokio::test]
async fn test_reupload_creates_new_version_and_keeps_old_ones() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 10_000).await;
    let docs = env.folder(&ctx, "docs", None).await;

    let v1 = env.upload(&ctx, Some(docs.id), "spec.txt", b"first").await;
    let v2 = env.upload(&ctx, Some(docs.id), "spec.txt", b"second draft").await;

    assert!(v1.created);
    assert!(!v2.created);
    assert_eq!(v1.file.id, v2.file.id);
    assert_eq!(v2.version.version, 2);
    assert_eq!(v2.file.current_version, 2);
    assert_eq!(v2.file.size_bytes, 12);
    assert_eq!(v2.file.checksum_sha256, sha256_hex(b"second draft"));
    assert_ne!(v1.version.storage_key, v2.version.storage_key);

    let history = env
        .services
        .versions
        .list_versions(&ctx, v1.file.id)
        .await
        .unwrap();
    let numbers: Vec<i32> = history.iter().map(|v| v.version).collect();
    assert!(numbers.contains(&1) && numbers.contains(&2));
    let first = history.iter().find(|v| v.version == 1).unwrap();
    assert_eq!(first.size_bytes, 5);
    assert_eq!(first.checksum_sha256, sha256_hex(b"first"));

    let current = env.services.downloads.download(&ctx, v1.file.id).await.unwrap();
    assert_eq!(current.version, 2);
    assert_eq!(current.content_type, "text/plain");
    assert_eq!(collect(current.stream).await, b"second draft");

    let old = env
        .services
        .downloads
        .download_version(&ctx, v1.file.id, 1)
        .await
        .unwrap();
    assert_eq!(old.size_bytes, 5);
    assert_eq!(collect(old.stream).await, b"first");

    let missing = env
        .services
        .downloads
        .download_version(&ctx, v1.file.id, 3)
        .await;
    assert_eq!(missing.err().unwrap().kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_upload_after_delete_starts_a_new_file() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 10_000).await;

    let first = env.upload(&ctx, None, "a.txt", b"one").await;
    env.services.files.delete_file(&ctx, first.file.id).await.unwrap();
    let second = env.upload(&ctx, None, "a.txt", b"two").await;

    assert!(second.created);
    assert_ne!(second.file.id, first.file.id);
    assert_eq!(second.version.version, 1);

    // The trashed file can no longer come back under its old name.
    let err = env
        .services
        .files
        .restore_file(&ctx, first.file.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_trashed_file_cannot_be_downloaded() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 10_000).await;
    let file = env.upload(&ctx, None, "a.txt", b"a").await;
    env.services.files.delete_file(&ctx, file.file.id).await.unwrap();

    let err = env.services.downloads.download(&ctx, file.file.id).await;
    assert_eq!(err.err().unwrap().kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_invalid_names_are_rejected() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 10_000).await;

    for name in ["", "..", "a/b.txt"] {
        let err = env.try_upload(&ctx, None, name, b"x").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation, "{name:?}");
    }
    assert!(env.objects.is_empty());
}

#[tokio::test]
async fn test_upload_with_paths_builds_folders_and_reports_each_entry() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 100).await;
    let base = env.folder(&ctx, "import", None).await;

    let result = env
        .services
        .uploads
        .upload_with_paths(
            &ctx,
            Some(base.id),
            vec![
                PathUpload {
                    relative_path: "2024/q1/report.txt".into(),
                    data: Bytes::from_static(b"q1"),
                },
                PathUpload {
                    relative_path: "2024/q2/report.txt".into(),
                    data: Bytes::from_static(b"q2"),
                },
                PathUpload {
                    relative_path: "2024/huge.bin".into(),
                    data: Bytes::from(vec![0u8; 200]),
                },
                PathUpload {
                    relative_path: "bad/../x.txt".into(),
                    data: Bytes::from_static(b"x"),
                },
            ],
        )
        .await;

    assert_eq!(result.successes.len(), 2);
    let kinds: Vec<ErrorKind> = result.errors.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![ErrorKind::QuotaExceeded, ErrorKind::Validation]);

    let year = env
        .services
        .folders
        .ensure_path(&ctx, "2024", Some(base.id))
        .await
        .unwrap();
    let view = env.services.folders.get_view(&ctx, Some(year.id)).await.unwrap();
    let mut names: Vec<String> = view.folders.iter().map(|f| f.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["q1", "q2"]);
    assert_eq!(view.folder.size_bytes, 4);

    let uploads = env
        .activity
        .actions()
        .into_iter()
        .filter(|a| *a == ActivityAction::FileUpload)
        .count();
    assert_eq!(uploads, 2);
}

#[tokio::test]
async fn test_failed_storage_write_commits_nothing() {
    let env = TestEnv::new();
    let (user, ctx) = env.user("alice@example.com", 10_000).await;
    let first = env.upload(&ctx, None, "a.txt", b"first").await;
    let used = env.used(user.id).await;

    env.storage.fail_puts(true);
    let again = env.try_upload(&ctx, None, "a.txt", b"second").await.unwrap_err();
    assert_eq!(again.kind, ErrorKind::Storage);
    let fresh = env.try_upload(&ctx, None, "b.txt", b"new").await.unwrap_err();
    assert_eq!(fresh.kind, ErrorKind::Storage);

    let history = env
        .services
        .versions
        .list_versions(&ctx, first.file.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    let missing = env
        .services
        .repositories
        .files
        .find_live_by_name(user.id, None, "b.txt")
        .await
        .unwrap();
    assert!(missing.is_none());
    assert_eq!(env.used(user.id).await, used);
    assert_eq!(env.objects.len(), 1);

    env.storage.fail_puts(false);
    let retried = env.upload(&ctx, None, "a.txt", b"second").await;
    assert_eq!(retried.version.version, 2);
}

#[tokio::test]
async fn test_upload_waiting_on_a_folder_delete_is_not_stored() {
    let env = TestEnv::new();
    let (user, ctx) = env.user("alice@example.com", 10_000).await;
    let docs = env.folder(&ctx, "docs", None).await;

    // Queue the delete ahead of the upload, both past their initial checks.
    let guard = env.services.accountant.lock(user.id).await;
    let delete = env.services.folder_lifecycle.delete_folder(&ctx, docs.id, true);
    let upload = async {
        tokio::task::yield_now().await;
        env.try_upload(&ctx, Some(docs.id), "late.txt", b"late").await
    };
    let release = async {
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        drop(guard);
    };
    let (deleted, uploaded, ()) = tokio::join!(delete, upload, release);

    assert_eq!(deleted.unwrap().files, 0);
    assert_eq!(uploaded.unwrap_err().kind, ErrorKind::NotFound);
    assert_eq!(env.used(user.id).await, 0);
    assert!(env.objects.is_empty());
    let stray = env
        .services
        .repositories
        .files
        .find_in_folder(user.id, Some(docs.id), true)
        .await
        .unwrap();
    assert!(stray.is_empty());
}
