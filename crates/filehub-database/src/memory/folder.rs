use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_entity::folder::{CreateFolder, Folder};
use filehub_entity::lifecycle::Lifecycle;

use super::{MemoryDatabase, name_matches};
use crate::repositories::FolderRepository;
use crate::repositories::folder::{MAX_TREE_DEPTH, depth_exceeded};

#[async_trait]
impl FolderRepository for MemoryDatabase {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Folder>> {
        Ok(self.state.read().await.folders.get(&id).cloned())
    }

    async fn find_root(&self, owner_id: Uuid) -> AppResult<Option<Folder>> {
        let state = self.state.read().await;
        Ok(state
            .folders
            .values()
            .find(|f| f.owner_id == owner_id && f.parent_id.is_none() && f.is_active())
            .cloned())
    }

    async fn find_live_child(
        &self,
        owner_id: Uuid,
        parent_id: Uuid,
        name: &str,
    ) -> AppResult<Option<Folder>> {
        let state = self.state.read().await;
        Ok(state
            .folders
            .values()
            .find(|f| {
                f.owner_id == owner_id
                    && f.parent_id == Some(parent_id)
                    && f.name == name
                    && f.is_active()
            })
            .cloned())
    }

    async fn find_children(
        &self,
        parent_id: Uuid,
        include_deleted: bool,
    ) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        let mut children: Vec<Folder> = state
            .folders
            .values()
            .filter(|f| f.parent_id == Some(parent_id) && (include_deleted || f.is_active()))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    async fn find_ancestors(&self, folder_id: Uuid) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        let mut chain = Vec::new();
        let mut next = Some(folder_id);
        while let Some(id) = next {
            let Some(folder) = state.folders.get(&id) else {
                break;
            };
            if chain.len() as i32 > MAX_TREE_DEPTH {
                return Err(depth_exceeded(folder_id));
            }
            next = folder.parent_id;
            chain.push(folder.clone());
        }
        Ok(chain)
    }

    async fn find_subtree(&self, folder_id: Uuid, include_deleted: bool) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        let Some(root) = state.folders.get(&folder_id) else {
            return Ok(Vec::new());
        };

        let mut seen = HashSet::from([root.id]);
        let mut out = vec![root.clone()];
        let mut queue = VecDeque::from([(root.id, 0)]);
        while let Some((parent, level)) = queue.pop_front() {
            let mut children: Vec<&Folder> = state
                .folders
                .values()
                .filter(|f| f.parent_id == Some(parent) && (include_deleted || f.is_active()))
                .collect();
            if !children.is_empty() && level >= MAX_TREE_DEPTH {
                return Err(depth_exceeded(folder_id));
            }
            children.sort_by(|a, b| a.name.cmp(&b.name));
            for child in children {
                if seen.insert(child.id) {
                    queue.push_back((child.id, level + 1));
                    out.push(child.clone());
                }
            }
        }
        Ok(out)
    }

    async fn find_trashed(&self, owner_id: Uuid) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        let mut folders: Vec<Folder> = state
            .folders
            .values()
            .filter(|f| f.owner_id == owner_id && f.lifecycle.is_deleted())
            .cloned()
            .collect();
        folders.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(folders)
    }

    async fn search_by_name(
        &self,
        owner_id: Uuid,
        query: &str,
        limit: i64,
    ) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        let mut folders: Vec<Folder> = state
            .folders
            .values()
            .filter(|f| {
                f.owner_id == owner_id
                    && f.is_active()
                    && !f.is_root()
                    && name_matches(&f.name, query)
            })
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        folders.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(folders)
    }

    async fn create(&self, data: &CreateFolder) -> AppResult<Folder> {
        let mut state = self.state.write().await;
        if state.folder_name_taken(data.owner_id, data.parent_id, &data.name, None) {
            return Err(AppError::conflict(format!(
                "A folder named '{}' already exists here",
                data.name
            )));
        }
        let now = Utc::now();
        let folder = Folder {
            id: Uuid::now_v7(),
            owner_id: data.owner_id,
            parent_id: data.parent_id,
            name: data.name.clone(),
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        };
        state.folders.insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn rename(&self, id: Uuid, name: &str) -> AppResult<Folder> {
        let mut state = self.state.write().await;
        let current = state
            .folders
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;
        if current.is_active()
            && state.folder_name_taken(current.owner_id, current.parent_id, name, Some(id))
        {
            return Err(AppError::conflict(format!(
                "A folder named '{name}' already exists here"
            )));
        }
        let folder = state
            .folders
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;
        folder.name = name.to_string();
        folder.updated_at = Utc::now();
        Ok(folder.clone())
    }

    async fn reparent(&self, id: Uuid, parent_id: Uuid) -> AppResult<Folder> {
        let mut state = self.state.write().await;
        let current = state
            .folders
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;
        let mut next = Some(parent_id);
        let mut steps = 0;
        while let Some(ancestor) = next {
            if ancestor == id {
                return Err(AppError::validation(
                    "Cannot move a folder into itself or one of its descendants",
                ));
            }
            steps += 1;
            if steps > MAX_TREE_DEPTH + 1 {
                return Err(depth_exceeded(parent_id));
            }
            next = state.folders.get(&ancestor).and_then(|f| f.parent_id);
        }
        if current.is_active()
            && state.folder_name_taken(current.owner_id, Some(parent_id), &current.name, Some(id))
        {
            return Err(AppError::conflict(format!(
                "A folder named '{}' already exists in the destination",
                current.name
            )));
        }
        let folder = state
            .folders
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;
        folder.parent_id = Some(parent_id);
        folder.updated_at = Utc::now();
        Ok(folder.clone())
    }

    async fn set_lifecycle(&self, ids: &[Uuid], lifecycle: Lifecycle) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let targets: HashSet<Uuid> = ids.iter().copied().collect();

        if lifecycle == Lifecycle::Active {
            let mut live: HashSet<(Uuid, Option<Uuid>, String)> = state
                .folders
                .values()
                .filter(|f| f.is_active() && !targets.contains(&f.id))
                .map(|f| (f.owner_id, f.parent_id, f.name.clone()))
                .collect();
            for id in ids {
                if let Some(f) = state.folders.get(id) {
                    if !live.insert((f.owner_id, f.parent_id, f.name.clone())) {
                        return Err(AppError::conflict(format!(
                            "A live folder named '{}' already exists in its parent",
                            f.name
                        )));
                    }
                }
            }
        }

        let now = Utc::now();
        let mut updated = 0;
        for id in &targets {
            if let Some(folder) = state.folders.get_mut(id) {
                folder.lifecycle = lifecycle;
                folder.updated_at = now;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete_many(&self, ids: &[Uuid]) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let mut removed = 0;
        for id in ids {
            if state.folders.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filehub_core::error::ErrorKind;

    fn create(owner_id: Uuid, parent_id: Option<Uuid>, name: &str) -> CreateFolder {
        CreateFolder {
            owner_id,
            parent_id,
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_live_sibling_names_are_unique() {
        let db = MemoryDatabase::new();
        let owner = Uuid::new_v4();
        let root = db.create(&create(owner, None, "root")).await.unwrap();
        let first = db.create(&create(owner, Some(root.id), "docs")).await.unwrap();

        let dup = db.create(&create(owner, Some(root.id), "docs")).await;
        assert_eq!(dup.unwrap_err().kind, ErrorKind::Conflict);

        db.set_lifecycle(&[first.id], Lifecycle::Deleted).await.unwrap();
        let second = db.create(&create(owner, Some(root.id), "docs")).await.unwrap();
        assert_ne!(first.id, second.id);

        let restore = db.set_lifecycle(&[first.id], Lifecycle::Active).await;
        assert_eq!(restore.unwrap_err().kind, ErrorKind::Conflict);
        let still_deleted = db.find_by_id(first.id).await.unwrap().unwrap();
        assert!(still_deleted.lifecycle.is_deleted());
    }

    #[tokio::test]
    async fn test_subtree_stops_at_deleted_folders() {
        let db = MemoryDatabase::new();
        let owner = Uuid::new_v4();
        let root = db.create(&create(owner, None, "root")).await.unwrap();
        let a = db.create(&create(owner, Some(root.id), "a")).await.unwrap();
        let b = db.create(&create(owner, Some(a.id), "b")).await.unwrap();
        db.create(&create(owner, Some(b.id), "c")).await.unwrap();
        db.set_lifecycle(&[b.id], Lifecycle::Deleted).await.unwrap();

        let live = db.find_subtree(root.id, false).await.unwrap();
        assert_eq!(live.len(), 2);
        let all = db.find_subtree(root.id, true).await.unwrap();
        assert_eq!(all.len(), 4);

        let chain = db.find_ancestors(b.id).await.unwrap();
        let names: Vec<&str> = chain.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "root"]);
    }

    #[tokio::test]
    async fn test_reparent_rejects_cycles() {
        let db = MemoryDatabase::new();
        let owner = Uuid::new_v4();
        let root = db.create(&create(owner, None, "root")).await.unwrap();
        let a = db.create(&create(owner, Some(root.id), "a")).await.unwrap();
        let b = db.create(&create(owner, Some(a.id), "b")).await.unwrap();

        let into_child = FolderRepository::reparent(&db, a.id, b.id).await;
        assert_eq!(into_child.unwrap_err().kind, ErrorKind::Validation);
        let into_self = FolderRepository::reparent(&db, a.id, a.id).await;
        assert_eq!(into_self.unwrap_err().kind, ErrorKind::Validation);

        let unchanged = db.find_by_id(a.id).await.unwrap().unwrap();
        assert_eq!(unchanged.parent_id, Some(root.id));
        FolderRepository::reparent(&db, b.id, root.id).await.unwrap();
        FolderRepository::reparent(&db, a.id, b.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_walks_fail_past_max_depth() {
        let db = MemoryDatabase::new();
        let owner = Uuid::new_v4();
        let root = db.create(&create(owner, None, "root")).await.unwrap();
        let mut parent = root.id;
        let mut chain = Vec::new();
        for level in 1..=MAX_TREE_DEPTH + 1 {
            let folder = db
                .create(&create(owner, Some(parent), &format!("d{level}")))
                .await
                .unwrap();
            parent = folder.id;
            chain.push(folder.id);
        }
        let at_limit = chain[(MAX_TREE_DEPTH - 1) as usize];

        let ancestors = db.find_ancestors(at_limit).await.unwrap();
        assert_eq!(ancestors.len() as i32, MAX_TREE_DEPTH + 1);
        let too_deep = db.find_ancestors(parent).await;
        assert_eq!(too_deep.unwrap_err().kind, ErrorKind::Internal);

        let subtree = db.find_subtree(chain[0], false).await.unwrap();
        assert_eq!(subtree.len() as i32, MAX_TREE_DEPTH + 1);
        let whole = db.find_subtree(root.id, false).await;
        assert_eq!(whole.unwrap_err().kind, ErrorKind::Internal);
    }
}
