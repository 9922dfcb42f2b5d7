//! Streaming zip downloads of folders.

use std::io::{Cursor, Read};

use filehub_core::error::ErrorKind;
use futures::StreamExt;

use crate::helpers::{TestEnv, collect};

fn read_entry(archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>, name: &str) -> Vec<u8> {
    let mut entry = archive.by_name(name).unwrap();
    let mut out = Vec::new();
    entry.read_to_end(&mut out).unwrap();
    out
}

#[tokio::test]
async fn test_zip_contains_live_subtree_with_relative_paths() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 1_000_000).await;

    let project = env.folder(&ctx, "project", None).await;
    let src = env.folder(&ctx, "src", Some(project.id)).await;
    env.folder(&ctx, "empty", Some(project.id)).await;
    let gone = env.folder(&ctx, "gone", Some(project.id)).await;
    env.upload(&ctx, Some(project.id), "README.md", b"# project").await;
    env.upload(&ctx, Some(src.id), "main.rs", b"fn main() {}").await;
    env.upload(&ctx, Some(gone.id), "old.txt", b"old").await;
    env.services
        .folder_lifecycle
        .delete_folder(&ctx, gone.id, true)
        .await
        .unwrap();

    let archive = env.services.archives.download_zip(&ctx, project.id).await.unwrap();
    assert_eq!(archive.file_name, "project.zip");
    assert_eq!(archive.file_count, 2);

    let bytes = collect(archive.stream).await;
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

    let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(names, vec!["README.md", "empty/", "src/", "src/main.rs"]);
    assert_eq!(read_entry(&mut zip, "src/main.rs"), b"fn main() {}");
    assert_eq!(read_entry(&mut zip, "README.md"), b"# project");
}

#[tokio::test]
async fn test_zip_of_root_includes_root_level_files() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 1_000_000).await;
    let root = env.root(ctx.user_id).await;
    let docs = env.folder(&ctx, "docs", None).await;
    env.upload(&ctx, None, "top.txt", b"top").await;
    env.upload(&ctx, Some(docs.id), "inner.txt", b"inner").await;

    let archive = env.services.archives.download_zip(&ctx, root.id).await.unwrap();
    let bytes = collect(archive.stream).await;
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

    assert_eq!(read_entry(&mut zip, "top.txt"), b"top");
    assert_eq!(read_entry(&mut zip, "docs/inner.txt"), b"inner");
}

#[tokio::test]
async fn test_zip_requires_view_permission() {
    let env = TestEnv::new();
    let (_, owner) = env.user("owner@example.com", 1000).await;
    let (_, other) = env.user("other@example.com", 1000).await;
    let folder = env.folder(&owner, "private", None).await;

    let err = env
        .services
        .archives
        .download_zip(&other, folder.id)
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_dropping_zip_stream_early_is_harmless() {
    let env = TestEnv::new();
    let (_, ctx) = env.user("alice@example.com", 10_000_000).await;
    let folder = env.folder(&ctx, "big", None).await;
    for i in 0..4 {
        let data: Vec<u8> = (0..500_000u32).map(|n| (n.wrapping_mul(31) ^ i) as u8).collect();
        env.upload(&ctx, Some(folder.id), &format!("part{i}.bin"), &data).await;
    }

    let mut archive = env.services.archives.download_zip(&ctx, folder.id).await.unwrap();
    let first = archive.stream.next().await.unwrap().unwrap();
    assert!(!first.is_empty());
    drop(archive);

    // The service stays usable after the reader goes away.
    let again = env.services.archives.download_zip(&ctx, folder.id).await.unwrap();
    assert_eq!(again.file_count, 4);
}
