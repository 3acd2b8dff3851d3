mod credentials;
mod helpers;
mod middleware;
mod password;
mod session;

pub use credentials::CredentialStore;
pub use helpers::extract_bearer_token;
pub use middleware::{AuthError, RequireAdmin, RequireSession};
pub use password::{
    PasswordHasher, generate_api_key, generate_secret, is_api_key, validate_email,
    validate_password, validate_username,
};
pub use session::SessionManager;

#[cfg(test)]
pub(crate) use password::test_hasher;
