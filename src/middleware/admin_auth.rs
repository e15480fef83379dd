use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::crypto::{hash_secret, verify_secret};
use crate::error::AppError;
use crate::store::AppState;
use crate::util::extract_bearer_token;

/// Digest of the configured admin token. `None` locks the admin API.
#[derive(Clone, Default)]
pub struct AdminCredential {
    token_hash: Option<String>,
}

impl AdminCredential {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token_hash: token.map(hash_secret),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.token_hash.is_some()
    }

    pub fn verify(&self, presented: &str) -> bool {
        self.token_hash
            .as_deref()
            .is_some_and(|expected| verify_secret(presented, expected))
    }
}

/// Inserted into request extensions once the admin token checks out.
#[derive(Clone, Debug)]
pub struct AdminContext {
    /// Short digest prefix, safe to log.
    pub fingerprint: String,
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;

    if !state.admin.verify(token) {
        tracing::warn!("Rejected admin request with invalid token");
        return Err(AppError::Unauthorized);
    }

    let fingerprint = hash_secret(token)[..8].to_string();
    request.extensions_mut().insert(AdminContext { fingerprint });
    Ok(next.run(request).await)
}
