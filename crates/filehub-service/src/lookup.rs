//! Row lookups shared by the services.

use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_database::repositories::{FileRepository, FolderRepository};
use filehub_entity::file::File;
use filehub_entity::folder::Folder;

/// A folder in any persisted lifecycle state.
pub(crate) async fn folder(folders: &dyn FolderRepository, id: Uuid) -> AppResult<Folder> {
    folders
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))
}

/// A live folder; trashed folders are reported as missing.
pub(crate) async fn live_folder(folders: &dyn FolderRepository, id: Uuid) -> AppResult<Folder> {
    let folder = self::folder(folders, id).await?;
    if !folder.is_active() {
        return Err(AppError::not_found(format!("Folder {id} not found")));
    }
    Ok(folder)
}

/// A file in any persisted lifecycle state.
pub(crate) async fn file(files: &dyn FileRepository, id: Uuid) -> AppResult<File> {
    files
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("File {id} not found")))
}

/// A live file; trashed files are reported as missing.
pub(crate) async fn live_file(files: &dyn FileRepository, id: Uuid) -> AppResult<File> {
    let file = self::file(files, id).await?;
    if !file.is_active() {
        return Err(AppError::not_found(format!("File {id} not found")));
    }
    Ok(file)
}

/// The live root folder of `owner_id`.
pub(crate) async fn root_folder(folders: &dyn FolderRepository, owner_id: Uuid) -> AppResult<Folder> {
    folders
        .find_root(owner_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {owner_id} has no root folder")))
}
