//! Result alias shared by every FileHub crate.

use crate::error::AppError;

/// `Result` specialized to [`AppError`].
pub type AppResult<T> = Result<T, AppError>;
