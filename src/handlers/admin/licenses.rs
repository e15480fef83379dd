use axum::extract::{Extension, State};
use chrono::Utc;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::middleware::AdminContext;
use crate::models::{IssueLicense, LicenseKeyInput, LicenseRecord, LicenseState};
use crate::store::AppState;

/// Full record plus its derived lifecycle state.
#[derive(Debug, Serialize)]
pub struct LicenseListing {
    #[serde(flatten)]
    pub license: LicenseRecord,
    pub state: LicenseState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseIssued {
    pub license_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseToggled {
    pub success: bool,
    pub license_key: String,
    pub active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseUpdated {
    pub success: bool,
    pub license_key: String,
}

fn required_key(input: &LicenseKeyInput) -> Result<&str> {
    let key = input.license_key.trim();
    if key.is_empty() {
        return Err(AppError::BadRequest("licenseKey is required".into()));
    }
    Ok(key)
}

/// GET /admin/licenses
pub async fn list_licenses(State(state): State<AppState>) -> Json<Vec<LicenseListing>> {
    let now = Utc::now();
    let listings = state
        .licensing
        .list()
        .into_iter()
        .map(|license| LicenseListing {
            state: license.state(now),
            license,
        })
        .collect();
    Json(listings)
}

/// POST /admin/licenses
pub async fn issue_license(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    Json(input): Json<IssueLicense>,
) -> Result<Json<LicenseIssued>> {
    let license_key = state.licensing.issue(&input)?;
    tracing::info!("License {} issued by admin {}", license_key, ctx.fingerprint);
    Ok(Json(LicenseIssued { license_key }))
}

/// POST /admin/licenses/toggle
pub async fn toggle_license(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    Json(input): Json<LicenseKeyInput>,
) -> Result<Json<LicenseToggled>> {
    let key = required_key(&input)?;
    let active = state.licensing.toggle(key)?;
    tracing::info!("License {} toggled by admin {}", key, ctx.fingerprint);
    Ok(Json(LicenseToggled {
        success: true,
        license_key: key.to_string(),
        active,
    }))
}

/// POST /admin/licenses/delete
pub async fn delete_license(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    Json(input): Json<LicenseKeyInput>,
) -> Result<Json<LicenseUpdated>> {
    let key = required_key(&input)?;
    state.licensing.delete(key)?;
    tracing::info!("License {} deleted by admin {}", key, ctx.fingerprint);
    Ok(Json(LicenseUpdated {
        success: true,
        license_key: key.to_string(),
    }))
}

/// POST /admin/licenses/reset - clear the game binding
pub async fn reset_license_binding(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    Json(input): Json<LicenseKeyInput>,
) -> Result<Json<LicenseUpdated>> {
    let key = required_key(&input)?;
    state.licensing.reset_binding(key)?;
    tracing::info!("License {} binding reset by admin {}", key, ctx.fingerprint);
    Ok(Json(LicenseUpdated {
        success: true,
        license_key: key.to_string(),
    }))
}
