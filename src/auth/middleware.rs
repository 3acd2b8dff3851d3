use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::AUTHORIZATION, header::WWW_AUTHENTICATE, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::helpers::{extract_bearer_token, rejection_for};
use crate::engine::Engine;
use crate::types::Actor;

/// Extractor that requires a valid session token or API credential.
pub struct RequireSession(pub Actor);

/// Extractor that requires an authenticated global admin.
pub struct RequireAdmin(pub Actor);

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    NotAdmin,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InvalidScheme => (StatusCode::UNAUTHORIZED, "Invalid authorization scheme"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
            AuthError::NotAdmin => (StatusCode::FORBIDDEN, "Admin access required"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "data": null, "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"lunatransfer\""),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<Engine>> for RequireSession {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        engine: &Arc<Engine>,
    ) -> Result<Self, Self::Rejection> {
        let actor = authenticate_parts(parts, engine)?;
        Ok(RequireSession(actor))
    }
}

impl FromRequestParts<Arc<Engine>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        engine: &Arc<Engine>,
    ) -> Result<Self, Self::Rejection> {
        let actor = authenticate_parts(parts, engine)?;

        if !actor.role.is_admin() {
            return Err(AuthError::NotAdmin);
        }

        Ok(RequireAdmin(actor))
    }
}

fn authenticate_parts(parts: &Parts, engine: &Engine) -> Result<Actor, AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let credential = extract_bearer_token(auth_header)?.ok_or(AuthError::MissingAuth)?;

    engine
        .resolve_bearer(credential)
        .map_err(|e| rejection_for(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_engine;
    use crate::types::GlobalRole;
    use axum::http::Request;
    use tempfile::TempDir;

    fn parts_with(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/files");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_session_token_accepted() {
        let temp = TempDir::new().unwrap();
        let engine = Arc::new(test_engine(&temp));
        engine
            .credentials()
            .create_user("alice", "Password1", "", GlobalRole::User)
            .unwrap();
        let token = engine.sessions().issue("alice", GlobalRole::User).unwrap();

        let mut parts = parts_with(Some(&format!("Bearer {token}")));
        let RequireSession(actor) = RequireSession::from_request_parts(&mut parts, &engine)
            .await
            .unwrap();
        assert_eq!(actor.username, "alice");
        assert_eq!(actor.role, GlobalRole::User);
    }

    #[tokio::test]
    async fn test_api_credential_accepted() {
        let temp = TempDir::new().unwrap();
        let engine = Arc::new(test_engine(&temp));
        let (_, key) = engine
            .credentials()
            .create_user("bob", "Password1", "", GlobalRole::Admin)
            .unwrap();

        let mut parts = parts_with(Some(&format!("Bearer {key}")));
        let RequireAdmin(actor) = RequireAdmin::from_request_parts(&mut parts, &engine)
            .await
            .unwrap();
        assert_eq!(actor.username, "bob");
    }

    #[tokio::test]
    async fn test_missing_and_bad_scheme() {
        let temp = TempDir::new().unwrap();
        let engine = Arc::new(test_engine(&temp));

        let mut parts = parts_with(None);
        let result = RequireSession::from_request_parts(&mut parts, &engine).await;
        assert!(matches!(result, Err(AuthError::MissingAuth)));

        let mut parts = parts_with(Some("Basic Zm9vOmJhcg=="));
        let result = RequireSession::from_request_parts(&mut parts, &engine).await;
        assert!(matches!(result, Err(AuthError::InvalidScheme)));
    }

    #[tokio::test]
    async fn test_revoked_and_expired_tokens_rejected() {
        let temp = TempDir::new().unwrap();
        let engine = Arc::new(test_engine(&temp));
        engine
            .credentials()
            .create_user("alice", "Password1", "", GlobalRole::User)
            .unwrap();

        let token = engine.sessions().issue("alice", GlobalRole::User).unwrap();
        engine.sessions().revoke(&token).unwrap();
        let mut parts = parts_with(Some(&format!("Bearer {token}")));
        let result = RequireSession::from_request_parts(&mut parts, &engine).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));

        let stale = engine
            .sessions()
            .issue_at(
                "alice",
                GlobalRole::User,
                chrono::Utc::now() - chrono::TimeDelta::days(2),
            )
            .unwrap();
        let mut parts = parts_with(Some(&format!("Bearer {stale}")));
        let result = RequireSession::from_request_parts(&mut parts, &engine).await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn test_non_admin_rejected_by_require_admin() {
        let temp = TempDir::new().unwrap();
        let engine = Arc::new(test_engine(&temp));
        let (_, key) = engine
            .credentials()
            .create_user("alice", "Password1", "", GlobalRole::User)
            .unwrap();

        let mut parts = parts_with(Some(&format!("Bearer {key}")));
        let result = RequireAdmin::from_request_parts(&mut parts, &engine).await;
        assert!(matches!(result, Err(AuthError::NotAdmin)));
    }

    #[tokio::test]
    async fn test_rejection_response_shape() {
        let response = AuthError::TokenExpired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(WWW_AUTHENTICATE).unwrap(),
            "Bearer realm=\"lunatransfer\""
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["data"], serde_json::Value::Null);
        assert_eq!(json["error"], "Token expired");

        let response = AuthError::InternalError.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    }
}
