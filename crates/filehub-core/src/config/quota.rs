//! Storage quota configuration.

use serde::{Deserialize, Serialize};

/// Per-user storage quota settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Quota assigned to new accounts when none is given explicitly.
    #[serde(default = "default_quota_bytes")]
    pub default_quota_bytes: i64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            default_quota_bytes: default_quota_bytes(),
        }
    }
}

fn default_quota_bytes() -> i64 {
    10 * 1024 * 1024 * 1024 // 10 GiB
}
