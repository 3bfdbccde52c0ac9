use axum::{
    extract::{Request, State},
    http::HeaderName,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::warn;

use crate::models::error::ApiError;

pub static X_APP_TOKEN: HeaderName = HeaderName::from_static("x-app-token");

/// Shared-secret check for client requests
#[derive(Clone)]
pub struct AuthManager {
    /// Digest of the configured token; `None` when `APP_TOKEN` is not set
    expected: Option<Arc<[u8; 32]>>,
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

impl AuthManager {
    pub fn new(app_token: Option<&str>) -> Self {
        Self {
            expected: app_token
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| Arc::new(digest(t))),
        }
    }

    /// Compare fixed-size digests so the check does not leak the token length
    pub fn verify(&self, provided: Option<&str>) -> Result<(), ApiError> {
        let expected = self
            .expected
            .as_deref()
            .ok_or_else(|| ApiError::Config("APP_TOKEN is not set".to_string()))?;

        let provided = provided.map(str::trim).unwrap_or_default();
        let actual = digest(provided);
        let diff = expected
            .iter()
            .zip(actual.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));

        if provided.is_empty() || diff != 0 {
            return Err(ApiError::Unauthorized);
        }
        Ok(())
    }
}

pub async fn require_app_token(
    State(auth): State<AuthManager>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = req
        .headers()
        .get(&X_APP_TOKEN)
        .and_then(|h| h.to_str().ok());

    if let Err(e) = auth.verify(provided) {
        if matches!(e, ApiError::Unauthorized) {
            warn!("Rejected {} {}: bad or missing app token", req.method(), req.uri().path());
        }
        return Err(e);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_token() {
        let auth = AuthManager::new(Some("s3cret"));
        assert!(auth.verify(Some("s3cret")).is_ok());
        assert!(matches!(auth.verify(Some("wrong")), Err(ApiError::Unauthorized)));
        assert!(matches!(auth.verify(None), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn test_missing_app_token_is_config_error() {
        let auth = AuthManager::new(Some("   "));
        assert!(matches!(auth.verify(Some("anything")), Err(ApiError::Config(_))));
    }
}
