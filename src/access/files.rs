use std::sync::Arc;

use chrono::Utc;

use super::GroupManager;
use crate::auth::CredentialStore;
use crate::error::{Error, Result};
use crate::store::path::FILE_ACCESS_FILE;
use crate::store::{JsonCollection, StorageLayout};
use crate::types::FileAccess;

/// Per-path ownership, visibility and group grants for personal storage.
pub struct FileAccessControl {
    credentials: Arc<CredentialStore>,
    groups: Arc<GroupManager>,
    rules: JsonCollection<FileAccess>,
}

impl FileAccessControl {
    pub fn open(
        credentials: Arc<CredentialStore>,
        groups: Arc<GroupManager>,
        layout: &StorageLayout,
    ) -> Result<Self> {
        Ok(Self {
            credentials,
            groups,
            rules: JsonCollection::open(layout.data_file(FILE_ACCESS_FILE))?,
        })
    }

    /// Inserts the rule for `path`, replacing any existing rule wholesale.
    pub fn set_file_access(
        &self,
        path: &str,
        owner: &str,
        is_public: bool,
        group_ids: Vec<String>,
    ) -> Result<FileAccess> {
        let rule = FileAccess {
            path: path.to_string(),
            owner: owner.to_string(),
            is_public,
            group_ids,
            created_at: Utc::now(),
        };

        let rule = self
            .rules
            .update(|rules| {
                if let Some(existing) = rules.iter_mut().find(|r| r.path == path) {
                    *existing = rule.clone();
                } else {
                    rules.push(rule.clone());
                }
                Ok(rule)
            })
            .inspect_err(|e| {
                tracing::error!(operation = "set_file_access", actor = owner, subject = path, "Failed to persist access rules: {e}");
            })?;

        tracing::info!(
            target: "audit",
            event = "ACCESS_RULE_SET",
            actor = owner,
            subject = path,
            public = is_public,
            groups = rule.group_ids.len()
        );
        Ok(rule)
    }

    pub fn get_file_access(&self, path: &str) -> Result<FileAccess> {
        self.rules
            .read(|rules| rules.iter().find(|r| r.path == path).cloned())
            .ok_or(Error::NoAccessRuleDefined)
    }

    pub fn remove_file_access(&self, path: &str) -> Result<()> {
        self.rules.update(|rules| {
            let before = rules.len();
            rules.retain(|r| r.path != path);
            if rules.len() == before {
                return Err(Error::NoAccessRuleDefined);
            }
            Ok(())
        })
    }

    #[must_use]
    pub fn list_owned_by(&self, owner: &str) -> Vec<FileAccess> {
        self.rules.read(|rules| {
            rules
                .iter()
                .filter(|r| r.owner == owner)
                .cloned()
                .collect()
        })
    }

    /// Drops every rule owned by `owner`. Returns how many were removed.
    pub fn remove_owned_by(&self, owner: &str) -> Result<usize> {
        self.rules.update(|rules| {
            let before = rules.len();
            rules.retain(|r| r.owner != owner);
            Ok(before - rules.len())
        })
    }

    /// Decides whether `username` may access `path` in personal storage.
    ///
    /// Global admins are allowed before any rule is consulted. Without a rule
    /// the path is private. Otherwise the owner, anyone for a public path, and
    /// members of any listed group are allowed. Paths match exactly.
    pub fn has_file_access(&self, username: &str, path: &str) -> Result<bool> {
        if self.credentials.global_role(username)?.is_admin() {
            return Ok(true);
        }

        let Ok(rule) = self.get_file_access(path) else {
            return Ok(false);
        };

        if rule.owner == username || rule.is_public {
            return Ok(true);
        }

        Ok(rule
            .group_ids
            .iter()
            .any(|gid| self.groups.member_role(gid, username).is_some()))
    }
}
