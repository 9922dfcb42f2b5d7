use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_entity::file::{CreateFile, File, FileVersion, VersionContent};
use filehub_entity::lifecycle::Lifecycle;

use super::{InnerState, MemoryDatabase, name_matches};
use crate::repositories::{FileRepository, FileVersionRepository};

fn sorted_by_name(mut files: Vec<File>) -> Vec<File> {
    files.sort_by(|a, b| a.name.cmp(&b.name));
    files
}

fn record_version(
    state: &mut InnerState,
    file_id: Uuid,
    version: i32,
    content: &VersionContent,
) -> AppResult<FileVersion> {
    if state
        .versions
        .values()
        .any(|v| v.file_id == file_id && v.version == version)
    {
        return Err(AppError::conflict(format!(
            "Version {version} of file {file_id} already exists"
        )));
    }
    let row = FileVersion {
        id: content.version_id,
        file_id,
        version,
        storage_key: content.storage_key.clone(),
        size_bytes: content.size_bytes,
        checksum_sha256: content.checksum_sha256.clone(),
        created_at: Utc::now(),
    };
    state.versions.insert(row.id, row.clone());
    Ok(row)
}

#[async_trait]
impl FileRepository for MemoryDatabase {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>> {
        Ok(self.state.read().await.files.get(&id).cloned())
    }

    async fn find_live_by_name(
        &self,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<File>> {
        let state = self.state.read().await;
        Ok(state
            .files
            .values()
            .find(|f| {
                f.owner_id == owner_id && f.folder_id == folder_id && f.name == name && f.is_active()
            })
            .cloned())
    }

    async fn find_in_folder(
        &self,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
        include_deleted: bool,
    ) -> AppResult<Vec<File>> {
        let state = self.state.read().await;
        Ok(sorted_by_name(
            state
                .files
                .values()
                .filter(|f| {
                    f.owner_id == owner_id
                        && f.folder_id == folder_id
                        && (include_deleted || f.is_active())
                })
                .cloned()
                .collect(),
        ))
    }

    async fn find_in_folders(
        &self,
        folder_ids: &[Uuid],
        include_deleted: bool,
    ) -> AppResult<Vec<File>> {
        let wanted: HashSet<Uuid> = folder_ids.iter().copied().collect();
        let state = self.state.read().await;
        Ok(sorted_by_name(
            state
                .files
                .values()
                .filter(|f| {
                    f.folder_id.is_some_and(|id| wanted.contains(&id))
                        && (include_deleted || f.is_active())
                })
                .cloned()
                .collect(),
        ))
    }

    async fn sum_live_size_in_folders(&self, folder_ids: &[Uuid]) -> AppResult<i64> {
        let wanted: HashSet<Uuid> = folder_ids.iter().copied().collect();
        let state = self.state.read().await;
        Ok(state
            .files
            .values()
            .filter(|f| f.is_active() && f.folder_id.is_some_and(|id| wanted.contains(&id)))
            .map(|f| f.size_bytes)
            .sum())
    }

    async fn sum_live_size_at_root(&self, owner_id: Uuid) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .files
            .values()
            .filter(|f| f.is_active() && f.owner_id == owner_id && f.folder_id.is_none())
            .map(|f| f.size_bytes)
            .sum())
    }

    async fn used_bytes(&self, owner_id: Uuid) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .files
            .values()
            .filter(|f| f.is_active() && f.owner_id == owner_id)
            .map(|f| f.size_bytes)
            .sum())
    }

    async fn find_trashed(&self, owner_id: Uuid) -> AppResult<Vec<File>> {
        let state = self.state.read().await;
        let mut files: Vec<File> = state
            .files
            .values()
            .filter(|f| f.owner_id == owner_id && f.lifecycle.is_deleted())
            .cloned()
            .collect();
        files.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(files)
    }

    async fn search_by_name(
        &self,
        owner_id: Uuid,
        query: &str,
        limit: i64,
    ) -> AppResult<Vec<File>> {
        let state = self.state.read().await;
        let mut files = sorted_by_name(
            state
                .files
                .values()
                .filter(|f| f.owner_id == owner_id && f.is_active() && name_matches(&f.name, query))
                .cloned()
                .collect(),
        );
        files.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(files)
    }

    async fn create_with_version(
        &self,
        data: &CreateFile,
        content: &VersionContent,
    ) -> AppResult<(File, FileVersion)> {
        let mut state = self.state.write().await;
        if state.file_name_taken(data.owner_id, data.folder_id, &data.name, None) {
            return Err(AppError::conflict(format!(
                "A file named '{}' already exists here",
                data.name
            )));
        }
        if state.files.contains_key(&data.id) {
            return Err(AppError::conflict(format!("File {} already exists", data.id)));
        }

        let now = Utc::now();
        let file = File {
            id: data.id,
            owner_id: data.owner_id,
            folder_id: data.folder_id,
            name: data.name.clone(),
            size_bytes: content.size_bytes,
            current_version: 1,
            storage_key: content.storage_key.clone(),
            checksum_sha256: content.checksum_sha256.clone(),
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        };
        let version = record_version(&mut state, file.id, 1, content)?;
        state.files.insert(file.id, file.clone());
        Ok((file, version))
    }

    async fn append_version(
        &self,
        file_id: Uuid,
        content: &VersionContent,
    ) -> AppResult<(File, FileVersion)> {
        let mut state = self.state.write().await;
        let next = state
            .files
            .get(&file_id)
            .map(|f| f.current_version + 1)
            .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))?;

        let version = record_version(&mut state, file_id, next, content)?;
        let file = state
            .files
            .get_mut(&file_id)
            .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))?;
        file.current_version = next;
        file.size_bytes = content.size_bytes;
        file.storage_key = content.storage_key.clone();
        file.checksum_sha256 = content.checksum_sha256.clone();
        file.updated_at = Utc::now();
        Ok((file.clone(), version))
    }

    async fn rename(&self, id: Uuid, name: &str) -> AppResult<File> {
        let mut state = self.state.write().await;
        let current = state
            .files
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;
        if current.is_active()
            && state.file_name_taken(current.owner_id, current.folder_id, name, Some(id))
        {
            return Err(AppError::conflict(format!(
                "A file named '{name}' already exists here"
            )));
        }
        let file = state
            .files
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;
        file.name = name.to_string();
        file.updated_at = Utc::now();
        Ok(file.clone())
    }

    async fn relocate(&self, id: Uuid, folder_id: Option<Uuid>) -> AppResult<File> {
        let mut state = self.state.write().await;
        let current = state
            .files
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;
        if current.is_active()
            && state.file_name_taken(current.owner_id, folder_id, &current.name, Some(id))
        {
            return Err(AppError::conflict(format!(
                "A file named '{}' already exists in the destination",
                current.name
            )));
        }
        let file = state
            .files
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;
        file.folder_id = folder_id;
        file.updated_at = Utc::now();
        Ok(file.clone())
    }

    async fn set_lifecycle(&self, ids: &[Uuid], lifecycle: Lifecycle) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let targets: HashSet<Uuid> = ids.iter().copied().collect();

        if lifecycle == Lifecycle::Active {
            let mut live: HashSet<(Uuid, Option<Uuid>, String)> = state
                .files
                .values()
                .filter(|f| f.is_active() && !targets.contains(&f.id))
                .map(|f| (f.owner_id, f.folder_id, f.name.clone()))
                .collect();
            for id in &targets {
                if let Some(f) = state.files.get(id) {
                    if !live.insert((f.owner_id, f.folder_id, f.name.clone())) {
                        return Err(AppError::conflict(format!(
                            "A live file named '{}' already exists in its folder",
                            f.name
                        )));
                    }
                }
            }
        }

        let now = Utc::now();
        let mut updated = 0;
        for id in &targets {
            if let Some(file) = state.files.get_mut(id) {
                file.lifecycle = lifecycle;
                file.updated_at = now;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete_many(&self, ids: &[Uuid]) -> AppResult<u64> {
        let targets: HashSet<Uuid> = ids.iter().copied().collect();
        let mut state = self.state.write().await;
        state.versions.retain(|_, v| !targets.contains(&v.file_id));
        let before = state.files.len();
        state.files.retain(|id, _| !targets.contains(id));
        Ok((before - state.files.len()) as u64)
    }
}

#[async_trait]
impl FileVersionRepository for MemoryDatabase {
    async fn find_by_file(&self, file_id: Uuid) -> AppResult<Vec<FileVersion>> {
        let state = self.state.read().await;
        let mut versions: Vec<FileVersion> = state
            .versions
            .values()
            .filter(|v| v.file_id == file_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(versions)
    }

    async fn find_version(&self, file_id: Uuid, version: i32) -> AppResult<Option<FileVersion>> {
        let state = self.state.read().await;
        Ok(state
            .versions
            .values()
            .find(|v| v.file_id == file_id && v.version == version)
            .cloned())
    }

    async fn find_by_files(&self, file_ids: &[Uuid]) -> AppResult<Vec<FileVersion>> {
        let wanted: HashSet<Uuid> = file_ids.iter().copied().collect();
        let state = self.state.read().await;
        let mut versions: Vec<FileVersion> = state
            .versions
            .values()
            .filter(|v| wanted.contains(&v.file_id))
            .cloned()
            .collect();
        versions.sort_by(|a, b| (a.file_id, a.version).cmp(&(b.file_id, b.version)));
        Ok(versions)
    }
}
