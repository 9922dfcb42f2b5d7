//! Request context carrying the verified caller identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context for the current authenticated request.
///
/// Built by the boundary layer once the caller identity has been verified
/// and passed into service methods so that every operation knows *who* is
/// acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: Uuid,
    /// IP address of the request origin.
    pub ip_address: Option<String>,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context for `user_id` with no client details.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            ip_address: None,
            user_agent: None,
            request_time: Utc::now(),
        }
    }

    /// Attaches client address and user agent.
    pub fn with_client(mut self, ip_address: impl Into<String>, user_agent: Option<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self.user_agent = user_agent;
        self
    }
}
