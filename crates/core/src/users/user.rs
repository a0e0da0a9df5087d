use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Canonical record for one account.
///
/// `id` is a pure function of the normalized email (see
/// [`UserRegistry::generate_user_id`](crate::users::registry::UserRegistry::generate_user_id)),
/// so the same account always resolves to the same record no matter how many
/// times it registers or reconnects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable identifier derived from the email
    pub id: String,
    /// Normalized (lower-cased, trimmed) email
    pub email: String,
    /// Display name; falls back to the email local part
    pub username: String,
    /// Given name; falls back to the display name
    pub first_name: String,
    /// Family name; empty when not provided
    pub last_name: String,
    /// Registration timestamp, never changed after creation
    pub registered_at: DateTime<Utc>,
    /// Refreshed by every update and connection change
    pub last_seen: DateTime<Utc>,
    /// Active connection handles (opaque ids, no duplicates)
    pub connections: HashSet<String>,
    /// Derived: true iff `connections` is non-empty
    pub is_online: bool,
}

/// Partial update applied to a stored identity.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Compact projection of an online user for statistics output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub email: String,
    pub last_seen: DateTime<Utc>,
    /// Number of active connections
    pub connections: usize,
}

/// Aggregate registry statistics.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    /// Up to 10 online users, most recently seen first
    pub top_users: Vec<UserSummary>,
}
