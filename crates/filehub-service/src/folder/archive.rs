//! Streaming zip download of a folder subtree.
//!
//! The archive is written by a background task into a bounded channel, a
//! few chunks ahead of the reader. Dropping the returned stream aborts the
//! task together with any storage read it has in flight.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::channel::mpsc;
use futures::{SinkExt, Stream, StreamExt};
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use filehub_auth::acl::SharePermissionResolver;
use filehub_core::error::{AppError, ErrorKind};
use filehub_core::events::ActivityAction;
use filehub_core::result::AppResult;
use filehub_database::repositories::{FileRepository, FolderRepository};
use filehub_entity::folder::Folder;
use filehub_entity::share::SharePermission;
use filehub_storage::StorageManager;

use crate::activity::ActivityRecorder;
use crate::context::RequestContext;
use crate::lookup;

/// Chunks buffered between the writer task and the reader.
const CHANNEL_CAPACITY: usize = 8;

/// Compressed bytes accumulated before a chunk is emitted.
const FLUSH_THRESHOLD: usize = 64 * 1024;

/// One member of the archive.
#[derive(Debug, Clone)]
enum ArchiveEntry {
    Directory(String),
    File {
        path: String,
        storage_key: String,
        size_bytes: i64,
    },
}

/// A zip archive being produced.
pub struct FolderArchive {
    /// Suggested download name.
    pub file_name: String,
    /// Number of files in the archive.
    pub file_count: usize,
    /// Archive bytes.
    pub stream: ArchiveStream,
}

impl std::fmt::Debug for FolderArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderArchive")
            .field("file_name", &self.file_name)
            .field("file_count", &self.file_count)
            .finish()
    }
}

/// Archive byte stream; aborts the writer task when dropped.
pub struct ArchiveStream {
    rx: mpsc::Receiver<AppResult<Bytes>>,
    task: JoinHandle<()>,
}

impl Stream for ArchiveStream {
    type Item = AppResult<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_next_unpin(cx)
    }
}

impl Drop for ArchiveStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Shared buffer the zip writer appends to.
#[derive(Clone, Default)]
struct ChunkSink(Arc<Mutex<Vec<u8>>>);

impl ChunkSink {
    fn buffered(&self) -> usize {
        self.0.lock().map(|b| b.len()).unwrap_or(0)
    }

    fn take(&self) -> Bytes {
        match self.0.lock() {
            Ok(mut buf) => Bytes::from(std::mem::take(&mut *buf)),
            Err(_) => Bytes::new(),
        }
    }
}

impl Write for ChunkSink {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("archive buffer poisoned"))?
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn zip_error(e: zip::result::ZipError) -> AppError {
    AppError::with_source(ErrorKind::Internal, "Failed to write zip archive", e)
}

/// Produces zip archives of folder subtrees.
#[derive(Debug, Clone)]
pub struct ArchiveService {
    folders: Arc<dyn FolderRepository>,
    files: Arc<dyn FileRepository>,
    storage: Arc<StorageManager>,
    resolver: Arc<SharePermissionResolver>,
    activity: ActivityRecorder,
}

impl ArchiveService {
    /// Creates a new archive service.
    pub fn new(
        folders: Arc<dyn FolderRepository>,
        files: Arc<dyn FileRepository>,
        storage: Arc<StorageManager>,
        resolver: Arc<SharePermissionResolver>,
        activity: ActivityRecorder,
    ) -> Self {
        Self {
            folders,
            files,
            storage,
            resolver,
            activity,
        }
    }

    /// Streams every live file under `folder_id` as a zip archive.
    ///
    /// Paths inside the archive are relative to the folder; empty
    /// subfolders appear as directory entries.
    pub async fn download_zip(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<FolderArchive> {
        let folder = lookup::live_folder(self.folders.as_ref(), folder_id).await?;
        self.resolver
            .require_folder(&folder, ctx.user_id, SharePermission::View)
            .await?;

        let entries = self.collect_entries(&folder).await?;
        let file_count = entries
            .iter()
            .filter(|e| matches!(e, ArchiveEntry::File { .. }))
            .count();

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let storage = Arc::clone(&self.storage);
        let task = tokio::spawn(write_archive(entries, storage, tx));

        self.activity
            .folder(
                ctx,
                ActivityAction::FolderDownload,
                folder_id,
                json!({ "name": folder.name, "files": file_count }),
            )
            .await;

        Ok(FolderArchive {
            file_name: format!("{}.zip", folder.name),
            file_count,
            stream: ArchiveStream { rx, task },
        })
    }

    async fn collect_entries(&self, folder: &Folder) -> AppResult<Vec<ArchiveEntry>> {
        let subtree = self.folders.find_subtree(folder.id, false).await?;

        // BFS order: every parent precedes its children.
        let mut prefixes: HashMap<Uuid, String> = HashMap::new();
        let mut entries = Vec::new();
        for f in &subtree {
            let prefix = match f.parent_id.and_then(|p| prefixes.get(&p)) {
                Some(parent) if f.id != folder.id => format!("{parent}{}/", f.name),
                _ => String::new(),
            };
            if !prefix.is_empty() {
                entries.push(ArchiveEntry::Directory(prefix.clone()));
            }
            prefixes.insert(f.id, prefix);
        }

        let ids: Vec<Uuid> = subtree.iter().map(|f| f.id).collect();
        let mut files = self.files.find_in_folders(&ids, false).await?;
        if folder.is_root() {
            files.extend(self.files.find_in_folder(folder.owner_id, None, false).await?);
        }

        let mut taken: HashSet<String> = HashSet::new();
        for file in files {
            let prefix = file
                .folder_id
                .and_then(|id| prefixes.get(&id))
                .cloned()
                .unwrap_or_default();
            let path = unique_path(&mut taken, &prefix, &file.name);
            entries.push(ArchiveEntry::File {
                path,
                storage_key: file.storage_key,
                size_bytes: file.size_bytes,
            });
        }
        Ok(entries)
    }
}

/// `prefix + name`, suffixed with ` (n)` when the path is already taken.
fn unique_path(taken: &mut HashSet<String>, prefix: &str, name: &str) -> String {
    let candidate = format!("{prefix}{name}");
    if taken.insert(candidate.clone()) {
        return candidate;
    }
    let (stem, ext) = match name.rfind('.') {
        Some(i) if i > 0 => (&name[..i], &name[i..]),
        _ => (name, ""),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{prefix}{stem} ({n}){ext}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Writer task body: reports its failure through the channel.
async fn write_archive(
    entries: Vec<ArchiveEntry>,
    storage: Arc<StorageManager>,
    mut tx: mpsc::Sender<AppResult<Bytes>>,
) {
    if let Err(e) = stream_entries(entries, &storage, &mut tx).await {
        warn!(error = %e, "Zip archive aborted");
        let _ = tx.send(Err(e)).await;
    }
}

async fn stream_entries(
    entries: Vec<ArchiveEntry>,
    storage: &StorageManager,
    tx: &mut mpsc::Sender<AppResult<Bytes>>,
) -> AppResult<()> {
    let sink = ChunkSink::default();
    let mut zip = ZipWriter::new_stream(sink.clone());
    let base = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        match entry {
            ArchiveEntry::Directory(path) => {
                zip.add_directory(path, base).map_err(zip_error)?;
            }
            ArchiveEntry::File {
                path,
                storage_key,
                size_bytes,
            } => {
                let options = base.large_file(size_bytes >= i64::from(u32::MAX));
                zip.start_file(path.as_str(), options).map_err(zip_error)?;

                let mut object = storage.get(&storage_key).await?;
                while let Some(chunk) = object.stream.next().await {
                    let chunk = chunk.map_err(AppError::from)?;
                    zip.write_all(&chunk).map_err(AppError::from)?;
                    if sink.buffered() >= FLUSH_THRESHOLD && !emit(tx, sink.take()).await {
                        return Ok(());
                    }
                }
                debug!(path = %path, "Archived file");
            }
        }
    }

    zip.finish().map_err(zip_error)?;
    emit(tx, sink.take()).await;
    Ok(())
}

/// Sends a chunk; `false` once the reader is gone.
async fn emit(tx: &mut mpsc::Sender<AppResult<Bytes>>, chunk: Bytes) -> bool {
    if chunk.is_empty() {
        return true;
    }
    tx.send(Ok(chunk)).await.is_ok()
}
