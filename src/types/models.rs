use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GlobalRole, GroupRole, SharePermission};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub email: String,
    pub role: GlobalRole,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub group_id: String,
    pub username: String,
    pub role: GroupRole,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
}

/// Visibility rule for one path in a user's personal tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAccess {
    pub path: String,
    pub owner: String,
    pub is_public: bool,
    #[serde(default)]
    pub group_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A grant exposing one path to a group other than its origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedFile {
    pub id: String,
    pub source_path: String,
    /// Group receiving access.
    pub group_id: String,
    /// Group the path originates from; empty for personal files.
    #[serde(default)]
    pub source_group: String,
    pub shared_by: String,
    pub shared_at: DateTime<Utc>,
    pub permission: SharePermission,
}

/// Identity carried inside a signed session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub username: String,
    pub role: GlobalRole,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub jti: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// The authenticated identity performing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub username: String,
    pub role: GlobalRole,
}

impl From<&SessionClaims> for Actor {
    fn from(claims: &SessionClaims) -> Self {
        Self {
            username: claims.username.clone(),
            role: claims.role,
        }
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role,
        }
    }
}
