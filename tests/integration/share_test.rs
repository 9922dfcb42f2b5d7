//! Shares and their inheritance through the folder tree.

use filehub_core::error::ErrorKind;
use filehub_entity::ItemType;
use filehub_entity::share::SharePermission;
use filehub_service::share::CreateShareRequest;

use crate::helpers::{TestEnv, collect};

fn share(item_type: ItemType, item_id: uuid::Uuid, email: &str, permission: SharePermission) -> CreateShareRequest {
    CreateShareRequest {
        item_type,
        item_id,
        target_email: email.to_string(),
        permission,
    }
}

#[tokio::test]
async fn test_folder_share_grants_view_on_nested_files() {
    let env = TestEnv::new();
    let (_, owner) = env.user("owner@example.com", 10_000).await;
    let (_, guest) = env.user("guest@example.com", 10_000).await;

    let shared = env.folder(&owner, "F", None).await;
    let sub = env.folder(&owner, "sub", Some(shared.id)).await;
    let deep = env.upload(&owner, Some(sub.id), "deep.txt", b"deep content").await;

    let before = env.services.downloads.download(&guest, deep.file.id).await;
    assert_eq!(before.unwrap_err().kind, ErrorKind::Forbidden);

    env.services
        .shares
        .create_share(
            &owner,
            share(ItemType::Folder, shared.id, "guest@example.com", SharePermission::View),
        )
        .await
        .unwrap();

    let resolver = &env.services.resolver;
    assert!(
        resolver
            .has_permission(guest.user_id, ItemType::Folder, sub.id, SharePermission::View)
            .await
            .unwrap()
    );
    assert!(
        !resolver
            .has_permission(guest.user_id, ItemType::Folder, sub.id, SharePermission::Edit)
            .await
            .unwrap()
    );

    let download = env.services.downloads.download(&guest, deep.file.id).await.unwrap();
    assert_eq!(download.file_name, "deep.txt");
    assert_eq!(collect(download.stream).await, b"deep content");

    // View does not allow writes anywhere below the share.
    let err = env
        .try_upload(&guest, Some(sub.id), "mine.txt", b"x")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_edit_share_lets_guest_upload_into_owner_tree() {
    let env = TestEnv::new();
    let (_, owner) = env.user("owner@example.com", 1000).await;
    let (_, guest) = env.user("guest@example.com", 1000).await;

    let shared = env.folder(&owner, "team", None).await;
    env.services
        .shares
        .create_share(
            &owner,
            share(ItemType::Folder, shared.id, "guest@example.com", SharePermission::Edit),
        )
        .await
        .unwrap();

    let outcome = env.upload(&guest, Some(shared.id), "notes.txt", &[0u8; 400]).await;

    // The file belongs to the tree owner and is charged to them.
    assert_eq!(outcome.file.owner_id, owner.user_id);
    assert_eq!(env.used(owner.user_id).await, 400);
    assert_eq!(env.used(guest.user_id).await, 0);
}

#[tokio::test]
async fn test_share_rules() {
    let env = TestEnv::new();
    let (_, owner) = env.user("owner@example.com", 1000).await;
    let (_, guest) = env.user("guest@example.com", 1000).await;
    let folder = env.folder(&owner, "docs", None).await;

    let self_share = env
        .services
        .shares
        .create_share(
            &owner,
            share(ItemType::Folder, folder.id, "owner@example.com", SharePermission::View),
        )
        .await;
    assert_eq!(self_share.unwrap_err().kind, ErrorKind::Validation);

    let not_owner = env
        .services
        .shares
        .create_share(
            &guest,
            share(ItemType::Folder, folder.id, "owner@example.com", SharePermission::View),
        )
        .await;
    assert_eq!(not_owner.unwrap_err().kind, ErrorKind::Forbidden);

    let unknown = env
        .services
        .shares
        .create_share(
            &owner,
            share(ItemType::Folder, folder.id, "nobody@example.com", SharePermission::View),
        )
        .await;
    assert_eq!(unknown.unwrap_err().kind, ErrorKind::NotFound);

    let created = env
        .services
        .shares
        .create_share(
            &owner,
            share(ItemType::Folder, folder.id, "guest@example.com", SharePermission::View),
        )
        .await
        .unwrap();
    let duplicate = env
        .services
        .shares
        .create_share(
            &owner,
            share(ItemType::Folder, folder.id, "guest@example.com", SharePermission::Edit),
        )
        .await;
    assert_eq!(duplicate.unwrap_err().kind, ErrorKind::Conflict);

    let listed = env.services.shares.list_shared_with_me(&guest).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].item_name, "docs");
    assert_eq!(listed[0].owner_email, "owner@example.com");

    env.services.shares.revoke(&owner, created.id).await.unwrap();
    assert!(env.services.shares.list_shared_with_me(&guest).await.unwrap().is_empty());
    let view = env.services.folders.get_folder(&guest, folder.id).await;
    assert_eq!(view.unwrap_err().kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_trashed_items_drop_out_of_shared_list() {
    let env = TestEnv::new();
    let (_, owner) = env.user("owner@example.com", 1000).await;
    let (_, guest) = env.user("guest@example.com", 1000).await;
    let file = env.upload(&owner, None, "plan.txt", b"plan").await;

    env.services
        .shares
        .create_share(
            &owner,
            share(ItemType::File, file.file.id, "guest@example.com", SharePermission::View),
        )
        .await
        .unwrap();
    assert_eq!(env.services.shares.list_shared_with_me(&guest).await.unwrap().len(), 1);

    env.services.files.delete_file(&owner, file.file.id).await.unwrap();
    assert!(env.services.shares.list_shared_with_me(&guest).await.unwrap().is_empty());
}
