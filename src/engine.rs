//! The authorization engine: every store opened over one data directory.
//!
//! `Engine` owns the operations that span record families, such as the
//! user-deletion cascade and bearer credential resolution, plus the
//! actor-level checks a request handler performs before mutating shared state.

use std::sync::Arc;

use crate::access::{FileAccessControl, GroupManager, SharingEngine};
use crate::auth::{CredentialStore, PasswordHasher, SessionManager, is_api_key};
use crate::config::CoreConfig;
use crate::error::{Error, Result};
use crate::store::path::{BLACKLIST_FILE, is_owned_path};
use crate::store::{JsonCollection, StorageLayout};
use crate::types::{Actor, GroupMember, GroupRole, SharePermission, SharedFile, User};

pub struct Engine {
    layout: StorageLayout,
    credentials: Arc<CredentialStore>,
    sessions: SessionManager,
    groups: Arc<GroupManager>,
    files: FileAccessControl,
    sharing: SharingEngine,
}

/// What a user-deletion cascade removed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeletionReport {
    pub memberships: usize,
    pub access_rules: usize,
    pub shares: usize,
}

impl Engine {
    pub fn open(config: &CoreConfig) -> Result<Self> {
        let hasher = PasswordHasher::new(&config.password)?;
        Self::open_with_hasher(config, hasher)
    }

    pub fn open_with_hasher(config: &CoreConfig, hasher: PasswordHasher) -> Result<Self> {
        config.validate()?;

        let layout = config.layout();
        layout.ensure_dirs()?;

        let secret = config.resolve_secret()?;
        let blacklist = if config.session.persist_blacklist {
            Some(JsonCollection::open(layout.data_file(BLACKLIST_FILE))?)
        } else {
            None
        };
        let sessions = SessionManager::new(&secret, config.token_ttl()?, blacklist)?;

        let credentials = Arc::new(CredentialStore::open(layout.clone(), hasher)?);
        let groups = Arc::new(GroupManager::open(credentials.clone(), layout.clone())?);
        let files = FileAccessControl::open(credentials.clone(), groups.clone(), &layout)?;
        let sharing = SharingEngine::open(credentials.clone(), groups.clone(), &layout)?;

        tracing::debug!(
            data_dir = %layout.data_dir.display(),
            users = credentials.len(),
            "Opened authorization engine"
        );

        Ok(Self {
            layout,
            credentials,
            sessions,
            groups,
            files,
            sharing,
        })
    }

    #[must_use]
    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    #[must_use]
    pub fn groups(&self) -> &GroupManager {
        &self.groups
    }

    #[must_use]
    pub fn files(&self) -> &FileAccessControl {
        &self.files
    }

    #[must_use]
    pub fn sharing(&self) -> &SharingEngine {
        &self.sharing
    }

    /// Verifies a password and issues a session token.
    pub fn login(&self, username: &str, password: &str) -> Result<(String, User)> {
        let (user, _) = self.credentials.authenticate(username, password)?;
        let token = self.sessions.issue(&user.username, user.role)?;
        Ok((token, user))
    }

    pub fn logout(&self, token: &str) -> Result<()> {
        self.sessions.revoke(token)
    }

    /// Resolves a bearer value, either a session token or an API credential, to an actor.
    ///
    /// A session token for an account that no longer exists is rejected.
    pub fn resolve_bearer(&self, credential: &str) -> Result<Actor> {
        if is_api_key(credential) {
            let username = self
                .credentials
                .lookup_credential(credential)
                .ok_or(Error::InvalidToken)?;
            let user = self
                .credentials
                .get_user(&username)
                .ok_or(Error::InvalidToken)?;
            return Ok(Actor::from(&user));
        }

        let claims = self.sessions.validate(credential)?;
        if !self.credentials.user_exists(&claims.username) {
            return Err(Error::InvalidToken);
        }
        Ok(Actor::from(&claims))
    }

    /// Deletes a user, then their memberships, owned access rules and authored shares.
    ///
    /// Each cleanup step is idempotent. A failing step is logged and the rest still run.
    pub fn delete_user(&self, username: &str, deleted_by: &str) -> Result<DeletionReport> {
        self.credentials.delete_user(username)?;

        let mut report = DeletionReport::default();

        match self.groups.remove_user_everywhere(username) {
            Ok(n) => report.memberships = n,
            Err(e) => tracing::error!(actor = deleted_by, subject = username, "Failed to remove memberships: {e}"),
        }
        match self.files.remove_owned_by(username) {
            Ok(n) => report.access_rules = n,
            Err(e) => tracing::error!(actor = deleted_by, subject = username, "Failed to remove access rules: {e}"),
        }
        match self.sharing.remove_shares_by(username) {
            Ok(n) => report.shares = n,
            Err(e) => tracing::error!(actor = deleted_by, subject = username, "Failed to remove shares: {e}"),
        }

        tracing::info!(
            target: "audit",
            event = "USER_DELETED",
            actor = deleted_by,
            subject = username,
            memberships = report.memberships,
            access_rules = report.access_rules,
            shares = report.shares
        );
        Ok(report)
    }

    /// Shares a path on behalf of `actor`.
    ///
    /// Group files need manage permission on the source group. Personal files
    /// may only be shared from the actor's own tree.
    pub fn share_as(
        &self,
        actor: &Actor,
        source_path: &str,
        source_group: &str,
        target_group: &str,
        permission: SharePermission,
    ) -> Result<SharedFile> {
        if source_group.is_empty() {
            if !actor.role.is_admin() && !is_owned_path(source_path, &actor.username) {
                return Err(Error::Unauthorized(
                    "you can only share your own files".to_string(),
                ));
            }
        } else if !self
            .groups
            .has_group_permission(&actor.username, source_group, "manage")?
        {
            return Err(Error::Unauthorized(
                "you don't have permission to share this file".to_string(),
            ));
        }

        self.sharing.share_file(
            source_path,
            source_group,
            target_group,
            &actor.username,
            permission,
        )
    }

    /// Adds a member on behalf of `actor`, who needs manage permission on the group.
    pub fn add_member_as(
        &self,
        actor: &Actor,
        group_id: &str,
        username: &str,
        role: GroupRole,
    ) -> Result<GroupMember> {
        self.require_group_permission(actor, group_id, "manage")?;
        self.groups.add_member(group_id, username, role, &actor.username)
    }

    /// Removes a member on behalf of `actor`. Members may always remove themselves.
    pub fn remove_member_as(&self, actor: &Actor, group_id: &str, username: &str) -> Result<()> {
        if actor.username != username {
            self.require_group_permission(actor, group_id, "manage")?;
        }
        self.groups.remove_member(group_id, username, &actor.username)
    }

    /// Shares targeting `group_id`, visible to anyone who can read the group.
    pub fn shares_for_group_as(&self, actor: &Actor, group_id: &str) -> Result<Vec<SharedFile>> {
        self.require_group_permission(actor, group_id, "read")?;
        Ok(self.sharing.list_shares_for_group(group_id))
    }

    fn require_group_permission(&self, actor: &Actor, group_id: &str, action: &str) -> Result<()> {
        if self
            .groups
            .has_group_permission(&actor.username, group_id, action)?
        {
            Ok(())
        } else {
            Err(Error::Unauthorized(format!(
                "{action} permission required on group"
            )))
        }
    }
}

#[cfg(test)]
pub(crate) fn test_engine(temp: &tempfile::TempDir) -> Engine {
    let mut config = CoreConfig::with_data_dir(temp.path().join("data"));
    config.session.secret = Some("test-secret".to_string());
    Engine::open_with_hasher(&config, crate::auth::test_hasher()).unwrap()
}
