use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::CredentialStore;
use crate::error::{Error, Result};
use crate::store::path::{GROUPS_FILE, MEMBERS_FILE};
use crate::store::{JsonCollection, StorageLayout};
use crate::types::{Group, GroupAction, GroupMember, GroupRole};

/// Owns groups and per-group role assignments.
pub struct GroupManager {
    credentials: Arc<CredentialStore>,
    layout: StorageLayout,
    groups: JsonCollection<Group>,
    members: JsonCollection<GroupMember>,
}

impl GroupManager {
    pub fn open(credentials: Arc<CredentialStore>, layout: StorageLayout) -> Result<Self> {
        let groups = JsonCollection::open(layout.data_file(GROUPS_FILE))?;
        let members = JsonCollection::open(layout.data_file(MEMBERS_FILE))?;
        Ok(Self {
            credentials,
            layout,
            groups,
            members,
        })
    }

    /// Creates a group and enrolls `creator` as its admin.
    pub fn create_group(&self, name: &str, description: &str, creator: &str) -> Result<Group> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::BadRequest("Group name cannot be empty".to_string()));
        }

        let now = Utc::now();
        let group = Group {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            created_by: creator.to_string(),
            created_at: now,
        };

        self.groups
            .update(|groups| {
                if groups.iter().any(|g| g.name == group.name) {
                    return Err(Error::GroupExists);
                }
                groups.push(group.clone());
                Ok(())
            })
            .inspect_err(|e| log_store_error("create_group", creator, name, e))?;

        let enrolled = self.members.update(|members| {
            members.push(GroupMember {
                group_id: group.id.clone(),
                username: creator.to_string(),
                role: GroupRole::Admin,
                added_by: creator.to_string(),
                added_at: now,
            });
            Ok(())
        });

        if let Err(e) = enrolled {
            tracing::error!(actor = creator, subject = %group.id, "Failed to enroll group creator: {e}");
            if let Err(rollback) = self
                .groups
                .update(|groups| {
                    groups.retain(|g| g.id != group.id);
                    Ok(())
                })
            {
                tracing::error!(subject = %group.id, "Failed to roll back group creation: {rollback}");
            }
            return Err(e);
        }

        let group_dir = self.layout.group_dir(&group.id);
        if let Err(e) = std::fs::create_dir_all(&group_dir) {
            tracing::warn!(
                "Failed to create storage directory {} for group {}: {e}",
                group_dir.display(),
                group.name
            );
        }

        tracing::info!(target: "audit", event = "GROUP_CREATED", actor = creator, subject = %group.id, name = %group.name);
        Ok(group)
    }

    pub fn add_member(
        &self,
        group_id: &str,
        username: &str,
        role: GroupRole,
        added_by: &str,
    ) -> Result<GroupMember> {
        if self.get_group(group_id).is_none() {
            return Err(Error::GroupNotFound);
        }
        if !self.credentials.user_exists(username) {
            return Err(Error::UserNotFound);
        }

        let member = GroupMember {
            group_id: group_id.to_string(),
            username: username.to_string(),
            role,
            added_by: added_by.to_string(),
            added_at: Utc::now(),
        };

        self.members
            .update(|members| {
                if members
                    .iter()
                    .any(|m| m.group_id == group_id && m.username == username)
                {
                    return Err(Error::UserAlreadyInGroup);
                }
                members.push(member.clone());
                Ok(())
            })
            .inspect_err(|e| log_store_error("add_member", added_by, group_id, e))?;

        tracing::info!(
            target: "audit",
            event = "GROUP_USER_ADDED",
            actor = added_by,
            subject = group_id,
            member = username,
            role = %role
        );
        Ok(member)
    }

    pub fn remove_member(&self, group_id: &str, username: &str, removed_by: &str) -> Result<()> {
        if self.get_group(group_id).is_none() {
            return Err(Error::GroupNotFound);
        }

        self.members
            .update(|members| {
                let before = members.len();
                members.retain(|m| !(m.group_id == group_id && m.username == username));
                if members.len() == before {
                    return Err(Error::UserNotInGroup);
                }
                Ok(())
            })
            .inspect_err(|e| log_store_error("remove_member", removed_by, group_id, e))?;

        tracing::info!(
            target: "audit",
            event = "GROUP_USER_REMOVED",
            actor = removed_by,
            subject = group_id,
            member = username
        );
        Ok(())
    }

    /// Drops every membership held by `username`. Returns how many were removed.
    pub fn remove_user_everywhere(&self, username: &str) -> Result<usize> {
        self.members
            .update(|members| {
                let before = members.len();
                members.retain(|m| m.username != username);
                Ok(before - members.len())
            })
            .inspect_err(|e| log_store_error("remove_user_everywhere", username, "*", e))
    }

    #[must_use]
    pub fn list_members(&self, group_id: &str) -> Vec<GroupMember> {
        self.members.read(|members| {
            members
                .iter()
                .filter(|m| m.group_id == group_id)
                .cloned()
                .collect()
        })
    }

    /// Groups `username` belongs to, in creation order.
    #[must_use]
    pub fn list_groups_for_user(&self, username: &str) -> Vec<Group> {
        let ids = self.group_ids_for_user(username);
        self.groups.read(|groups| {
            groups
                .iter()
                .filter(|g| ids.contains(&g.id))
                .cloned()
                .collect()
        })
    }

    #[must_use]
    pub fn group_ids_for_user(&self, username: &str) -> HashSet<String> {
        self.members.read(|members| {
            members
                .iter()
                .filter(|m| m.username == username)
                .map(|m| m.group_id.clone())
                .collect()
        })
    }

    #[must_use]
    pub fn list_groups(&self) -> Vec<Group> {
        self.groups.read(<[Group]>::to_vec)
    }

    #[must_use]
    pub fn get_group(&self, group_id: &str) -> Option<Group> {
        self.groups
            .read(|groups| groups.iter().find(|g| g.id == group_id).cloned())
    }

    #[must_use]
    pub fn get_group_by_name(&self, name: &str) -> Option<Group> {
        self.groups
            .read(|groups| groups.iter().find(|g| g.name == name).cloned())
    }

    #[must_use]
    pub fn member_role(&self, group_id: &str, username: &str) -> Option<GroupRole> {
        self.members.read(|members| {
            members
                .iter()
                .find(|m| m.group_id == group_id && m.username == username)
                .map(|m| m.role)
        })
    }

    /// Checks `action` against the caller's role in the group.
    ///
    /// Global admins pass unconditionally. An unknown group is an error,
    /// while a non-member or an unrecognized action is a plain denial.
    pub fn has_group_permission(&self, username: &str, group_id: &str, action: &str) -> Result<bool> {
        if self.credentials.is_admin(username) {
            return Ok(true);
        }

        if self.get_group(group_id).is_none() {
            return Err(Error::GroupNotFound);
        }

        let Some(role) = self.member_role(group_id, username) else {
            return Ok(false);
        };

        Ok(GroupAction::parse(action).is_some_and(|action| role.permits(action)))
    }
}

fn log_store_error(operation: &str, actor: &str, target: &str, err: &Error) {
    if matches!(err, Error::Io(_) | Error::Json(_)) {
        tracing::error!(operation, actor, target, "Failed to persist group data: {err}");
    }
}
