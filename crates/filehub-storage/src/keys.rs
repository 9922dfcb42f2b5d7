//! Object key allocation and content-type detection.

use uuid::Uuid;

use filehub_entity::file::model::extension_of;

/// Storage key for one version of one file.
///
/// Every version gets its own object so that history stays readable and a
/// failed upload can never clobber a committed version.
pub fn object_key(owner_id: Uuid, file_id: Uuid, version_id: Uuid, file_name: &str) -> String {
    match extension_of(file_name) {
        Some(ext) => format!("users/{owner_id}/files/{file_id}/{version_id}.{ext}"),
        None => format!("users/{owner_id}/files/{file_id}/{version_id}"),
    }
}

/// MIME type guessed from a file name, `application/octet-stream` if unknown.
pub fn content_type_for(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
