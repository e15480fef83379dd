use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::store::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerResetRequest {
    /// `"<tenant id>:<password>"`
    pub tenant_credential: String,
    pub license_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerResetResponse {
    pub success: bool,
    pub license_key: String,
}

/// POST /owner/reset-binding - let a game owner unbind their own license
///
/// The credential must resolve to a tenant whose configured license key is
/// the one being reset. Every failed check yields the same 401.
pub async fn owner_reset_binding(
    State(state): State<AppState>,
    Json(req): Json<OwnerResetRequest>,
) -> Result<Json<OwnerResetResponse>> {
    let key = req.license_key.trim();
    if key.is_empty() || req.tenant_credential.is_empty() {
        return Err(AppError::BadRequest(
            "tenantCredential and licenseKey are required".into(),
        ));
    }

    let tenant = state
        .tenants
        .resolve_credential(&req.tenant_credential)
        .ok_or(AppError::Unauthorized)?;

    if tenant.music_license_key.as_deref() != Some(key) {
        tracing::warn!("Tenant {} attempted reset of a license it does not own", tenant.id);
        return Err(AppError::Unauthorized);
    }

    state.licensing.reset_binding(key)?;
    tracing::info!("License {} binding reset by owner {}", key, tenant.id);

    Ok(Json(OwnerResetResponse {
        success: true,
        license_key: key.to_string(),
    }))
}
