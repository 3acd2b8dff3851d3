use crate::error::{Error, ErrorKind};

use super::middleware::AuthError;

/// Extracts the bearer credential from an Authorization header.
/// Returns None if no auth header is present.
/// Returns Err if the scheme is not Bearer or the credential is empty.
pub fn extract_bearer_token(auth_header: Option<&str>) -> Result<Option<&str>, AuthError> {
    let Some(header) = auth_header else {
        return Ok(None);
    };

    let (scheme, credential) = header.split_once(' ').ok_or(AuthError::InvalidScheme)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidScheme);
    }

    let credential = credential.trim();
    if credential.is_empty() {
        return Err(AuthError::InvalidToken);
    }

    Ok(Some(credential))
}

/// Maps a credential resolution failure onto the rejection sent to the client.
pub fn rejection_for(err: &Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredToken => AuthError::TokenExpired,
        ErrorKind::InvalidToken | ErrorKind::Unauthorized | ErrorKind::NotFound => {
            AuthError::InvalidToken
        }
        _ => {
            tracing::error!("Failed to resolve bearer credential: {err}");
            AuthError::InternalError
        }
    }
}
