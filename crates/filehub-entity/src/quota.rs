//! Quota value object.

use serde::{Deserialize, Serialize};

/// A point-in-time view of one user's usage against their quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    /// Sum of the current sizes of the user's live files.
    pub used_bytes: i64,
    /// The user's quota.
    pub quota_bytes: i64,
}

impl QuotaSnapshot {
    /// Create a snapshot.
    pub fn new(used_bytes: i64, quota_bytes: i64) -> Self {
        Self {
            used_bytes,
            quota_bytes,
        }
    }

    /// Bytes still available (never negative).
    pub fn available_bytes(&self) -> i64 {
        (self.quota_bytes - self.used_bytes).max(0)
    }

    /// Usage after adding `incoming` bytes and releasing `replaced` bytes.
    pub fn projected(&self, incoming: i64, replaced: i64) -> i64 {
        self.used_bytes - replaced + incoming
    }

    /// Whether the projected usage would exceed the quota.
    ///
    /// Exactly reaching the quota is allowed.
    pub fn would_exceed(&self, incoming: i64, replaced: i64) -> bool {
        self.projected(incoming, replaced) > self.quota_bytes
    }

    /// Usage percentage (0.0 - 100.0+).
    pub fn usage_percent(&self) -> f64 {
        if self.quota_bytes <= 0 {
            return 0.0;
        }
        (self.used_bytes as f64 / self.quota_bytes as f64) * 100.0
    }
}
