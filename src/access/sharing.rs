use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::GroupManager;
use crate::auth::CredentialStore;
use crate::error::{Error, Result};
use crate::store::path::{SHARES_FILE, is_owned_path};
use crate::store::{JsonCollection, StorageLayout};
use crate::types::{SharePermission, SharedFile};

/// Cross-group shares and the access decision for shared paths.
pub struct SharingEngine {
    credentials: Arc<CredentialStore>,
    groups: Arc<GroupManager>,
    shares: JsonCollection<SharedFile>,
}

impl SharingEngine {
    pub fn open(
        credentials: Arc<CredentialStore>,
        groups: Arc<GroupManager>,
        layout: &StorageLayout,
    ) -> Result<Self> {
        Ok(Self {
            credentials,
            groups,
            shares: JsonCollection::open(layout.data_file(SHARES_FILE))?,
        })
    }

    /// Exposes `source_path` to `target_group`.
    ///
    /// `source_group` is empty for personal files. Each (path, target) pair
    /// can only be shared once.
    pub fn share_file(
        &self,
        source_path: &str,
        source_group: &str,
        target_group: &str,
        shared_by: &str,
        permission: SharePermission,
    ) -> Result<SharedFile> {
        if self.groups.get_group(target_group).is_none() {
            return Err(Error::GroupNotFound);
        }
        if !source_group.is_empty() && self.groups.get_group(source_group).is_none() {
            return Err(Error::GroupNotFound);
        }
        if source_group == target_group {
            return Err(Error::SelfShare);
        }

        let share = SharedFile {
            id: Uuid::new_v4().to_string(),
            source_path: source_path.to_string(),
            group_id: target_group.to_string(),
            source_group: source_group.to_string(),
            shared_by: shared_by.to_string(),
            shared_at: Utc::now(),
            permission,
        };

        self.shares
            .update(|shares| {
                if shares
                    .iter()
                    .any(|s| s.source_path == source_path && s.group_id == target_group)
                {
                    return Err(Error::AlreadyShared);
                }
                shares.push(share.clone());
                Ok(())
            })
            .inspect_err(|e| log_store_error("share_file", shared_by, source_path, e))?;

        tracing::info!(
            target: "audit",
            event = "FILE_SHARED",
            actor = shared_by,
            subject = target_group,
            path = source_path,
            permission = %permission
        );
        Ok(share)
    }

    /// Removes a share. Only the original sharer or a global admin may do so.
    pub fn remove_share(&self, share_id: &str, username: &str) -> Result<()> {
        let is_admin = self.credentials.is_admin(username);

        let removed = self
            .shares
            .update(|shares| {
                let idx = shares
                    .iter()
                    .position(|s| s.id == share_id)
                    .ok_or(Error::ShareNotFound)?;

                if !is_admin && shares[idx].shared_by != username {
                    return Err(Error::Unauthorized(
                        "only the sharer or an admin can remove a share".to_string(),
                    ));
                }

                Ok(shares.remove(idx))
            })
            .inspect_err(|e| log_store_error("remove_share", username, share_id, e))?;

        tracing::info!(
            target: "audit",
            event = "SHARE_REMOVED",
            actor = username,
            subject = share_id,
            path = %removed.source_path
        );
        Ok(())
    }

    /// Drops every share authored by `username` or exposing a path in their
    /// personal tree. Returns how many were removed.
    pub fn remove_shares_by(&self, username: &str) -> Result<usize> {
        self.shares
            .update(|shares| {
                let before = shares.len();
                shares.retain(|s| {
                    s.shared_by != username && !is_owned_path(&s.source_path, username)
                });
                Ok(before - shares.len())
            })
            .inspect_err(|e| log_store_error("remove_shares_by", username, "*", e))
    }

    #[must_use]
    pub fn get_share(&self, share_id: &str) -> Option<SharedFile> {
        self.shares
            .read(|shares| shares.iter().find(|s| s.id == share_id).cloned())
    }

    #[must_use]
    pub fn list_shares_for_group(&self, group_id: &str) -> Vec<SharedFile> {
        self.shares.read(|shares| {
            shares
                .iter()
                .filter(|s| s.group_id == group_id)
                .cloned()
                .collect()
        })
    }

    #[must_use]
    pub fn list_shares_for_path(&self, path: &str) -> Vec<SharedFile> {
        self.shares.read(|shares| {
            shares
                .iter()
                .filter(|s| s.source_path == path)
                .cloned()
                .collect()
        })
    }

    /// Decides access to a shared path.
    ///
    /// Any share of `path` targeting one of the caller's groups grants read;
    /// writes additionally need a `read_write` share.
    pub fn has_access_to_shared_file(
        &self,
        username: &str,
        path: &str,
        require_write: bool,
    ) -> Result<bool> {
        if self.credentials.global_role(username)?.is_admin() {
            return Ok(true);
        }

        let my_groups = self.groups.group_ids_for_user(username);
        if my_groups.is_empty() {
            return Ok(false);
        }

        Ok(self.shares.read(|shares| {
            shares.iter().any(|s| {
                s.source_path == path
                    && my_groups.contains(&s.group_id)
                    && (!require_write || s.permission.allows_write())
            })
        }))
    }
}

fn log_store_error(operation: &str, actor: &str, target: &str, err: &Error) {
    if matches!(err, Error::Io(_) | Error::Json(_)) {
        tracing::error!(operation, actor, target, "Failed to persist shares: {err}");
    }
}
