use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Error, Result};
use crate::store::JsonCollection;
use crate::types::{BlacklistEntry, GlobalRole, SessionClaims};

type HmacSha256 = Hmac<Sha256>;

const JTI_BYTES: usize = 16;

/// Issues and validates HMAC-SHA256 signed session tokens.
///
/// A token is `base64url(claims JSON) "." base64url(mac)` without padding.
/// Tokens are stateless; the only shared state is the revocation blacklist,
/// keyed by raw token and purged of expired entries on every lookup.
pub struct SessionManager {
    key: Vec<u8>,
    ttl: TimeDelta,
    revoked: Mutex<HashMap<String, DateTime<Utc>>>,
    persisted: Option<JsonCollection<BlacklistEntry>>,
}

impl SessionManager {
    /// `persisted` restores and records revocations in `blacklist.json`.
    pub fn new(
        secret: &str,
        ttl: TimeDelta,
        persisted: Option<JsonCollection<BlacklistEntry>>,
    ) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::Config("session secret cannot be empty".to_string()));
        }
        if ttl <= TimeDelta::zero() {
            return Err(Error::Config("token expiry must be positive".to_string()));
        }

        let now = Utc::now();
        let revoked: HashMap<String, DateTime<Utc>> = persisted
            .as_ref()
            .map(|store| {
                store.read(|entries| {
                    entries
                        .iter()
                        .filter(|e| e.expires_at > now)
                        .map(|e| (e.token.clone(), e.expires_at))
                        .collect()
                })
            })
            .unwrap_or_default();

        Ok(Self {
            key: secret.as_bytes().to_vec(),
            ttl,
            revoked: Mutex::new(revoked),
            persisted,
        })
    }

    #[must_use]
    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.key)
            .map_err(|e| Error::Config(format!("invalid session key: {e}")))
    }

    fn revoked(&self) -> MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.revoked.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn issue(&self, username: &str, role: GlobalRole) -> Result<String> {
        self.issue_at(username, role, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        username: &str,
        role: GlobalRole,
        issued_at: DateTime<Utc>,
    ) -> Result<String> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| Error::Config("token expiry out of range".to_string()))?;
        let claims = SessionClaims {
            username: username.to_string(),
            role,
            issued_at,
            expires_at,
            jti: random_jti(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &SessionClaims) -> Result<String> {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// Blacklist first, then format and signature, then expiry.
    pub fn validate(&self, token: &str) -> Result<SessionClaims> {
        if self.is_revoked(token) {
            return Err(Error::InvalidToken);
        }

        let claims = self.decode(token)?;

        if Utc::now() >= claims.expires_at {
            return Err(Error::ExpiredToken);
        }

        Ok(claims)
    }

    fn decode(&self, token: &str) -> Result<SessionClaims> {
        let (payload, signature) = token.split_once('.').ok_or(Error::InvalidToken)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| Error::InvalidToken)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| Error::InvalidToken)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| Error::InvalidToken)?;
        serde_json::from_slice(&json).map_err(|_| Error::InvalidToken)
    }

    fn is_revoked(&self, token: &str) -> bool {
        let now = Utc::now();
        let mut revoked = self.revoked();
        revoked.retain(|_, expires_at| *expires_at > now);
        revoked.contains_key(token)
    }

    /// Blacklists a token until its natural expiry. Tokens that do not
    /// validate are rejected with the validation error and nothing is stored.
    pub fn revoke(&self, token: &str) -> Result<()> {
        let claims = self.validate(token)?;

        if let Some(store) = &self.persisted {
            let now = Utc::now();
            store
                .update(|entries| {
                    entries.retain(|e| e.expires_at > now && e.token != token);
                    entries.push(BlacklistEntry {
                        token: token.to_string(),
                        expires_at: claims.expires_at,
                    });
                    Ok(())
                })
                .inspect_err(|e| {
                    tracing::error!(actor = %claims.username, "Failed to persist token blacklist: {e}");
                })?;
        }

        self.revoked()
            .insert(token.to_string(), claims.expires_at);

        tracing::info!(target: "audit", event = "TOKEN_REVOKED", actor = %claims.username, jti = %claims.jti);
        Ok(())
    }

    /// Issues a new token for the same identity with a fresh expiry.
    pub fn refresh(&self, claims: &SessionClaims) -> Result<String> {
        self.issue(&claims.username, claims.role)
    }

    /// Validates `token` and refreshes its claims.
    pub fn refresh_token(&self, token: &str) -> Result<String> {
        let claims = self.validate(token)?;
        self.refresh(&claims)
    }

    /// Number of unexpired revocations.
    #[must_use]
    pub fn blacklist_len(&self) -> usize {
        let now = Utc::now();
        let mut revoked = self.revoked();
        revoked.retain(|_, expires_at| *expires_at > now);
        revoked.len()
    }
}

fn random_jti() -> String {
    use rand::Rng;
    let mut bytes = [0u8; JTI_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::path::BLACKLIST_FILE;
    use tempfile::TempDir;

    fn manager() -> SessionManager {
        SessionManager::new("test-secret", TimeDelta::hours(24), None).unwrap()
    }

    #[test]
    fn test_issue_and_validate() {
        let sessions = manager();
        let token = sessions.issue("alice", GlobalRole::User).unwrap();

        let claims = sessions.validate(&token).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, GlobalRole::User);
        assert_eq!(claims.expires_at - claims.issued_at, TimeDelta::hours(24));
    }

    #[test]
    fn test_token_format() {
        let token = manager().issue("alice", GlobalRole::User).unwrap();
        let (payload, signature) = token.split_once('.').unwrap();
        assert!(!token.contains('='));
        assert_eq!(URL_SAFE_NO_PAD.decode(signature).unwrap().len(), 32);
        let claims: SessionClaims =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn test_tokens_in_same_instant_differ() {
        let sessions = manager();
        let now = Utc::now();
        let a = sessions.issue_at("alice", GlobalRole::User, now).unwrap();
        let b = sessions.issue_at("alice", GlobalRole::User, now).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let sessions = manager();
        let token = sessions.issue("alice", GlobalRole::User).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let forged_claims = SessionClaims {
            username: "alice".to_string(),
            role: GlobalRole::Admin,
            issued_at: Utc::now(),
            expires_at: Utc::now() + TimeDelta::hours(1),
            jti: "x".to_string(),
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{forged_payload}.{signature}");

        assert!(matches!(sessions.validate(&forged), Err(Error::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = manager().issue("alice", GlobalRole::User).unwrap();
        let other = SessionManager::new("other-secret", TimeDelta::hours(24), None).unwrap();
        assert!(matches!(other.validate(&token), Err(Error::InvalidToken)));
    }

    #[test]
    fn test_garbage_rejected() {
        let sessions = manager();
        for token in ["", "abc", "a.b", "not.base64!", "..."] {
            assert!(matches!(sessions.validate(token), Err(Error::InvalidToken)));
        }
    }

    #[test]
    fn test_expired_token() {
        let sessions = manager();
        let token = sessions
            .issue_at("alice", GlobalRole::User, Utc::now() - TimeDelta::hours(25))
            .unwrap();
        assert!(matches!(sessions.validate(&token), Err(Error::ExpiredToken)));
    }

    #[test]
    fn test_revoke_then_invalid() {
        let sessions = manager();
        let token = sessions.issue("alice", GlobalRole::User).unwrap();

        sessions.revoke(&token).unwrap();
        assert!(matches!(sessions.validate(&token), Err(Error::InvalidToken)));
        assert_eq!(sessions.blacklist_len(), 1);
    }

    #[test]
    fn test_revoke_invalid_token_stores_nothing() {
        let sessions = manager();
        assert!(matches!(sessions.revoke("garbage"), Err(Error::InvalidToken)));

        let expired = sessions
            .issue_at("alice", GlobalRole::User, Utc::now() - TimeDelta::hours(48))
            .unwrap();
        assert!(matches!(sessions.revoke(&expired), Err(Error::ExpiredToken)));
        assert_eq!(sessions.blacklist_len(), 0);
    }

    #[test]
    fn test_blacklist_purges_expired_entries() {
        let sessions = manager();
        sessions
            .revoked()
            .insert("stale".to_string(), Utc::now() - TimeDelta::seconds(1));
        assert_eq!(sessions.revoked().len(), 1);

        assert!(!sessions.is_revoked("stale"));
        assert!(sessions.revoked().is_empty());
    }

    #[test]
    fn test_refresh_keeps_identity() {
        let sessions = manager();
        let old = sessions
            .issue_at("bob", GlobalRole::Admin, Utc::now() - TimeDelta::hours(1))
            .unwrap();
        let old_claims = sessions.validate(&old).unwrap();

        let fresh = sessions.refresh_token(&old).unwrap();
        let claims = sessions.validate(&fresh).unwrap();
        assert_eq!(claims.username, "bob");
        assert_eq!(claims.role, GlobalRole::Admin);
        assert!(claims.expires_at > old_claims.expires_at);
    }

    #[test]
    fn test_rejects_bad_construction() {
        assert!(SessionManager::new("", TimeDelta::hours(1), None).is_err());
        assert!(SessionManager::new("k", TimeDelta::zero(), None).is_err());
    }

    #[test]
    fn test_unrepresentable_expiry_is_error() {
        let sessions = SessionManager::new("k", TimeDelta::MAX, None).unwrap();
        assert!(matches!(
            sessions.issue("alice", GlobalRole::User),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_persisted_blacklist_survives_restart() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(BLACKLIST_FILE);

        let token = {
            let sessions =
                SessionManager::new("k", TimeDelta::hours(1), Some(JsonCollection::open(&path).unwrap()))
                    .unwrap();
            let token = sessions.issue("alice", GlobalRole::User).unwrap();
            sessions.revoke(&token).unwrap();
            token
        };

        let sessions =
            SessionManager::new("k", TimeDelta::hours(1), Some(JsonCollection::open(&path).unwrap()))
                .unwrap();
        assert!(matches!(sessions.validate(&token), Err(Error::InvalidToken)));
    }
}
