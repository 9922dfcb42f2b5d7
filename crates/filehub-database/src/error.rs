//! sqlx error mapping.

use filehub_core::error::{AppError, ErrorKind};

/// Map a sqlx error into an [`AppError`].
///
/// Unique-constraint violations become `Conflict` so that races on live
/// sibling names surface the same way as the explicit pre-checks.
pub(crate) fn db_error(context: &str, e: sqlx::Error) -> AppError {
    let unique_violation =
        matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
    if unique_violation {
        AppError::with_source(
            ErrorKind::Conflict,
            format!("{context}: an item with the same identity already exists"),
            e,
        )
    } else {
        AppError::with_source(ErrorKind::Database, context.to_string(), e)
    }
}

/// Build an ILIKE pattern matching `query` as a literal substring.
pub(crate) fn contains_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
