//! Validation of file and folder names.

use filehub_core::{AppError, AppResult};

/// Longest accepted name, in bytes.
pub const MAX_NAME_BYTES: usize = 255;

/// Validate a single file or folder name and return it trimmed.
///
/// Names are one path segment: no separators, no control characters, not
/// `.` or `..`.
pub fn validate_name(raw: &str) -> AppResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name must not be empty"));
    }
    if name.len() > MAX_NAME_BYTES {
        return Err(AppError::validation(format!(
            "Name exceeds {MAX_NAME_BYTES} bytes"
        )));
    }
    if name == "." || name == ".." {
        return Err(AppError::validation(format!("'{name}' is not a valid name")));
    }
    if let Some(c) = name
        .chars()
        .find(|c| *c == '/' || *c == '\\' || c.is_control())
    {
        return Err(AppError::validation(format!(
            "Name contains forbidden character {c:?}"
        )));
    }
    Ok(name.to_string())
}

/// Split a client-supplied relative path into validated segments.
///
/// Backslashes are treated as separators and empty segments produced by
/// leading, trailing or doubled separators are dropped.
pub fn split_relative_path(raw: &str) -> AppResult<Vec<String>> {
    let normalized = raw.replace('\\', "/");
    let segments = normalized
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(validate_name)
        .collect::<AppResult<Vec<_>>>()?;

    if segments.is_empty() {
        return Err(AppError::validation("Path must contain at least one name"));
    }
    Ok(segments)
}
