use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;

use crate::config::PasswordConfig;
use crate::error::{Error, Result};

const ARGON2_OUTPUT_LEN: usize = 32;

const API_KEY_PREFIX: &str = "luna";
const API_KEY_BYTES: usize = 32;
const SECRET_BYTES: usize = 32;

const MIN_PASSWORD_LEN: usize = 8;
const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 32;

/// Argon2id hashing for user passwords.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new(config: &PasswordConfig) -> Result<Self> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            Some(ARGON2_OUTPUT_LEN),
        )
        .map_err(|e| Error::Config(format!("invalid argon2 params: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hashes a password into a PHC string with a random salt.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Config(format!("failed to hash password: {e}")))?;
        Ok(hash.to_string())
    }

    /// Verifies a password against a stored PHC string.
    /// A malformed stored hash never matches.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            tracing::error!("Stored password hash is not a valid PHC string");
            return false;
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Generates an API credential with the format: luna_<64 hex chars>
#[must_use]
pub fn generate_api_key() -> String {
    format!("{API_KEY_PREFIX}_{}", random_hex(API_KEY_BYTES))
}

/// Returns true if `s` has the shape of an API credential.
#[must_use]
pub fn is_api_key(s: &str) -> bool {
    s.strip_prefix(API_KEY_PREFIX)
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|hex| hex.len() == API_KEY_BYTES * 2 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Generates a random signing secret as hex.
#[must_use]
pub fn generate_secret() -> String {
    random_hex(SECRET_BYTES)
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill(&mut bytes[..]);
    hex::encode(bytes)
}

/// At least 8 characters with an uppercase letter, a lowercase letter and a digit.
pub fn validate_password(password: &str) -> Result<()> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LEN;
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_upper && has_lower && has_digit {
        Ok(())
    } else {
        Err(Error::WeakPassword)
    }
}

pub fn validate_username(username: &str) -> Result<()> {
    let len_ok = (MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&username.len());
    let chars_ok = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_');

    if len_ok && chars_ok {
        Ok(())
    } else {
        Err(Error::InvalidUsername)
    }
}

/// Loose `local@domain.tld` check. Empty emails are allowed.
pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Ok(());
    }

    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        let local_ok = !local.is_empty()
            && local
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
        let domain_ok = domain
            .rsplit_once('.')
            .is_some_and(|(host, tld)| {
                !host.is_empty()
                    && host
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
                    && tld.len() >= 2
                    && tld.chars().all(|c| c.is_ascii_alphabetic())
            });
        local_ok && domain_ok
    });

    if valid { Ok(()) } else { Err(Error::InvalidEmail) }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> PasswordHasher {
    PasswordHasher::new(&PasswordConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}
