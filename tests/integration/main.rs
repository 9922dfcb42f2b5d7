//! Workspace integration tests driving the full service container over
//! in-memory repositories and storage.

mod archive_test;
mod batch_test;
mod helpers;
mod lifecycle_test;
mod quota_test;
mod share_test;
mod storage_test;
mod tree_test;
mod upload_test;
