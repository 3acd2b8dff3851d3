use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard};

use chrono::Utc;

use super::password::{
    PasswordHasher, generate_api_key, validate_email, validate_password, validate_username,
};
use crate::error::{Error, Result};
use crate::store::path::USERS_FILE;
use crate::store::{StorageLayout, read_records, write_records_atomic};
use crate::types::{GlobalRole, User};

/// Users keyed by name plus the derived credential index.
/// Rebuilt from the record list on every load; only the store mutates it.
#[derive(Clone, Default)]
struct UserTable {
    users: BTreeMap<String, User>,
    by_api_key: HashMap<String, String>,
}

impl UserTable {
    fn from_records(records: Vec<User>) -> Self {
        let mut table = Self::default();
        for user in records {
            table.insert(user);
        }
        table
    }

    fn records(&self) -> Vec<User> {
        self.users.values().cloned().collect()
    }

    fn insert(&mut self, user: User) {
        self.by_api_key
            .insert(user.api_key.clone(), user.username.clone());
        self.users.insert(user.username.clone(), user);
    }

    fn remove(&mut self, username: &str) -> Option<User> {
        let user = self.users.remove(username)?;
        self.by_api_key.remove(&user.api_key);
        Some(user)
    }
}

/// Persists users, verifies passwords and manages API credentials.
pub struct CredentialStore {
    path: PathBuf,
    layout: StorageLayout,
    hasher: PasswordHasher,
    table: RwLock<UserTable>,
}

impl CredentialStore {
    pub fn open(layout: StorageLayout, hasher: PasswordHasher) -> Result<Self> {
        let path = layout.data_file(USERS_FILE);
        let records = read_records(&path)?;
        Ok(Self {
            path,
            layout,
            hasher,
            table: RwLock::new(UserTable::from_records(records)),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, UserTable> {
        self.table.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Read-modify-write under the write lock. The table only changes if the save succeeds.
    fn update<R>(&self, f: impl FnOnce(&mut UserTable) -> Result<R>) -> Result<R> {
        let mut guard = self.table.write().unwrap_or_else(|e| e.into_inner());
        let mut working = guard.clone();
        let out = f(&mut working)?;
        write_records_atomic(&self.path, &working.records())?;
        *guard = working;
        Ok(out)
    }

    /// Creates a user and returns it with its freshly generated API credential.
    pub fn create_user(
        &self,
        username: &str,
        password: &str,
        email: &str,
        role: GlobalRole,
    ) -> Result<(User, String)> {
        validate_username(username)?;
        validate_email(email)?;
        validate_password(password)?;

        if self.user_exists(username) {
            return Err(Error::UserExists);
        }

        // Hash outside the lock; existence is re-checked under it.
        let password_hash = self.hasher.hash(password)?;
        let api_key = generate_api_key();

        let user = User {
            username: username.to_string(),
            password_hash,
            email: email.to_string(),
            role,
            api_key: api_key.clone(),
            created_at: Utc::now(),
            last_login: None,
        };

        self.update(|table| {
            if table.users.contains_key(username) {
                return Err(Error::UserExists);
            }
            table.insert(user.clone());
            Ok(())
        })
        .inspect_err(|e| log_store_error("create_user", username, e))?;

        let user_dir = self.layout.user_dir(username);
        if let Err(e) = std::fs::create_dir_all(&user_dir) {
            tracing::warn!(
                "Failed to create storage directory {} for {username}: {e}",
                user_dir.display()
            );
        }

        tracing::info!(target: "audit", event = "USER_CREATED", actor = username, role = %role);
        Ok((user, api_key))
    }

    /// Verifies a password. Unknown users and wrong passwords fail identically.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<(User, String)> {
        let stored_hash = self
            .read()
            .users
            .get(username)
            .map(|u| u.password_hash.clone())
            .ok_or(Error::InvalidCredentials)?;

        if !self.hasher.verify(password, &stored_hash) {
            tracing::info!(target: "audit", event = "LOGIN_FAILED", actor = username);
            return Err(Error::InvalidCredentials);
        }

        let user = self
            .update(|table| {
                let user = table
                    .users
                    .get_mut(username)
                    .ok_or(Error::InvalidCredentials)?;
                user.last_login = Some(Utc::now());
                Ok(user.clone())
            })
            .inspect_err(|e| log_store_error("authenticate", username, e))?;

        let api_key = user.api_key.clone();
        Ok((user, api_key))
    }

    /// Replaces the user's API credential. The old value stops resolving immediately.
    pub fn rotate_credential(&self, username: &str) -> Result<String> {
        let new_key = generate_api_key();

        self.update(|table| {
            let mut user = table.remove(username).ok_or(Error::UserNotFound)?;
            user.api_key = new_key.clone();
            table.insert(user);
            Ok(())
        })
        .inspect_err(|e| log_store_error("rotate_credential", username, e))?;

        tracing::info!(target: "audit", event = "API_KEY_ROTATED", actor = username);
        Ok(new_key)
    }

    /// Deletes the account, then makes a best-effort attempt to remove its storage.
    pub fn delete_user(&self, username: &str) -> Result<()> {
        self.update(|table| table.remove(username).map(|_| ()).ok_or(Error::UserNotFound))
            .inspect_err(|e| log_store_error("delete_user", username, e))?;

        let user_dir = self.layout.user_dir(username);
        if user_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&user_dir) {
                tracing::warn!(
                    "Failed to delete storage directory {} for {username}: {e}",
                    user_dir.display()
                );
            }
        }

        tracing::debug!("Deleted user record {username}");
        Ok(())
    }

    #[must_use]
    pub fn get_user(&self, username: &str) -> Option<User> {
        self.read().users.get(username).cloned()
    }

    #[must_use]
    pub fn user_exists(&self, username: &str) -> bool {
        self.read().users.contains_key(username)
    }

    /// All users, ordered by username.
    #[must_use]
    pub fn list_users(&self) -> Vec<User> {
        self.read().records()
    }

    /// Resolves an API credential to its username.
    #[must_use]
    pub fn lookup_credential(&self, api_key: &str) -> Option<String> {
        self.read().by_api_key.get(api_key).cloned()
    }

    pub fn global_role(&self, username: &str) -> Result<GlobalRole> {
        self.read()
            .users
            .get(username)
            .map(|u| u.role)
            .ok_or(Error::UserNotFound)
    }

    /// True only for known users holding the admin role.
    #[must_use]
    pub fn is_admin(&self, username: &str) -> bool {
        self.global_role(username).is_ok_and(GlobalRole::is_admin)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().users.is_empty()
    }
}

fn log_store_error(operation: &str, username: &str, err: &Error) {
    if matches!(err, Error::Io(_) | Error::Json(_)) {
        tracing::error!(operation, actor = username, "Failed to persist users: {err}");
    }
}
