use axum::{extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::extractors::Json;
use crate::licensing::{DenialReason, Verdict};
use crate::store::AppState;

/// Every field is optional at the wire level so a missing one is reported as
/// a denial rather than a deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(default)]
    pub license_key: Option<String>,
    #[serde(default, alias = "universeId")]
    pub tenant_identifier: Option<String>,
    #[serde(default, alias = "placeId")]
    pub sub_identifier: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidLicense {
    pub valid: bool,
    pub owner: String,
    pub expiry_date: Option<DateTime<Utc>>,
    pub script_version: String,
    pub force_update: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidLicense {
    pub valid: bool,
    pub error: String,
    pub force_stop: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum VerifyResponse {
    Valid(ValidLicense),
    Invalid(InvalidLicense),
}

impl From<Verdict> for VerifyResponse {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Granted(grant) => VerifyResponse::Valid(ValidLicense {
                valid: true,
                owner: grant.owner,
                expiry_date: grant.expiry_date,
                script_version: grant.script_version,
                force_update: grant.force_update,
            }),
            Verdict::Denied(reason) => VerifyResponse::Invalid(InvalidLicense {
                valid: false,
                error: reason.message().to_string(),
                force_stop: true,
            }),
        }
    }
}

/// POST /api/verify - check a license for a game, binding it on first use
///
/// Denials are a normal outcome and come back as 200 with `valid: false`,
/// except missing parameters which is a 400.
pub async fn verify_license(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<(StatusCode, Json<VerifyResponse>)> {
    let verdict = state.licensing.verify(
        req.license_key.as_deref(),
        req.tenant_identifier.as_deref(),
        req.sub_identifier.as_deref(),
    )?;

    let status = match verdict {
        Verdict::Denied(DenialReason::MissingParameters) => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    };

    Ok((status, Json(verdict.into())))
}
