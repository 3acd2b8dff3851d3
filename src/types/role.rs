use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Global role attached to a user, independent of any group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GlobalRole {
    Admin,
    User,
    #[default]
    Guest,
}

impl GlobalRole {
    /// Parses a role string, returning None for unknown values.
    pub fn parse(s: &str) -> Option<GlobalRole> {
        match s {
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            "guest" => Some(Self::Guest),
            _ => None,
        }
    }

    /// Like `parse`, but unknown input becomes `Guest`.
    #[must_use]
    pub fn coerce(s: &str) -> GlobalRole {
        Self::parse(s).unwrap_or(Self::Guest)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::Guest => "guest",
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Role of a member inside one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GroupRole {
    Admin,
    Contributor,
    #[default]
    Reader,
}

impl GroupRole {
    pub fn parse(s: &str) -> Option<GroupRole> {
        match s {
            "admin" => Some(Self::Admin),
            "contributor" => Some(Self::Contributor),
            "reader" => Some(Self::Reader),
            _ => None,
        }
    }

    /// Unknown roles downgrade to `Reader`, never escalate.
    #[must_use]
    pub fn coerce(s: &str) -> GroupRole {
        Self::parse(s).unwrap_or(Self::Reader)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Contributor => "contributor",
            Self::Reader => "reader",
        }
    }

    /// Returns true if this role may perform the action inside its group.
    #[must_use]
    pub const fn permits(self, action: GroupAction) -> bool {
        match action {
            GroupAction::Read => true,
            GroupAction::Write | GroupAction::Upload => {
                matches!(self, Self::Admin | Self::Contributor)
            }
            GroupAction::Manage | GroupAction::Delete => matches!(self, Self::Admin),
        }
    }
}

/// Actions checked against a group role. The mapping in `GroupRole::permits` is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupAction {
    Read,
    Write,
    Upload,
    Manage,
    Delete,
}

impl GroupAction {
    pub fn parse(s: &str) -> Option<GroupAction> {
        match s {
            "read" => Some(Self::Read),
            "write" => Some(Self::Write),
            "upload" => Some(Self::Upload),
            "manage" => Some(Self::Manage),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// Access level granted by a cross-group share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SharePermission {
    #[default]
    Read,
    ReadWrite,
}

impl SharePermission {
    pub fn parse(s: &str) -> Option<SharePermission> {
        match s {
            "read" => Some(Self::Read),
            "read_write" => Some(Self::ReadWrite),
            _ => None,
        }
    }

    /// Unknown permissions fall back to `Read`.
    #[must_use]
    pub fn coerce(s: &str) -> SharePermission {
        Self::parse(s).unwrap_or(Self::Read)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::ReadWrite => "read_write",
        }
    }

    #[must_use]
    pub const fn allows_write(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

// Each enum is stored as its lowercase name; deserialization goes through
// `coerce` so a hand-edited file can never escalate privileges.
macro_rules! coerced_string_enum {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<&str> for $ty {
            fn from(s: &str) -> Self {
                <$ty>::coerce(s)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok(<$ty>::coerce(&raw))
            }
        }
    };
}

coerced_string_enum!(GlobalRole);
coerced_string_enum!(GroupRole);
coerced_string_enum!(SharePermission);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_role_coercion() {
        assert_eq!(GroupRole::coerce("admin"), GroupRole::Admin);
        assert_eq!(GroupRole::coerce("contributor"), GroupRole::Contributor);
        assert_eq!(GroupRole::coerce("owner"), GroupRole::Reader);
        assert_eq!(GroupRole::coerce("Admin"), GroupRole::Reader);
        assert_eq!(GroupRole::coerce(""), GroupRole::Reader);
    }

    #[test]
    fn test_global_role_coercion() {
        assert_eq!(GlobalRole::coerce("user"), GlobalRole::User);
        assert_eq!(GlobalRole::coerce("root"), GlobalRole::Guest);
    }

    #[test]
    fn test_share_permission_coercion() {
        assert_eq!(SharePermission::coerce("read_write"), SharePermission::ReadWrite);
        assert_eq!(SharePermission::coerce("write"), SharePermission::Read);
    }

    #[test]
    fn test_action_mapping() {
        assert!(GroupRole::Reader.permits(GroupAction::Read));
        assert!(!GroupRole::Reader.permits(GroupAction::Write));
        assert!(GroupRole::Contributor.permits(GroupAction::Upload));
        assert!(!GroupRole::Contributor.permits(GroupAction::Manage));
        assert!(GroupRole::Admin.permits(GroupAction::Delete));
        assert_eq!(GroupAction::parse("rename"), None);
    }

    #[test]
    fn test_deserialize_coerces_unknown() {
        let role: GroupRole = serde_json::from_str("\"superuser\"").unwrap();
        assert_eq!(role, GroupRole::Reader);

        let perm: SharePermission = serde_json::from_str("\"read_write\"").unwrap();
        assert_eq!(perm, SharePermission::ReadWrite);
        assert_eq!(serde_json::to_string(&perm).unwrap(), "\"read_write\"");
    }
}
