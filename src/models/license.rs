use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version written into a store that was never configured.
pub const DEFAULT_SCRIPT_VERSION: &str = "1.0.0";

/// One issued license.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    /// Lookup key. Never changes after issue.
    #[serde(rename = "licenseKey", alias = "key")]
    pub key: String,
    #[serde(default)]
    pub owner: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    /// None = never expires
    pub expiry_date: Option<DateTime<Utc>>,
    /// Tenant the key is locked to. None = the next successful verification binds it.
    #[serde(alias = "universeId")]
    pub bound_tenant: Option<String>,
    /// Informational only, refreshed on every successful verification.
    #[serde(alias = "placeId")]
    pub bound_sub_identifier: Option<String>,
    pub first_activation: Option<DateTime<Utc>>,
    pub last_verified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub verification_count: u64,
    #[serde(default)]
    pub notes: String,
}

/// Where a record sits in its lifecycle at a given instant.
///
/// `Expired` is derived from `expiry_date` and takes precedence over
/// `Disabled`; neither is stored as its own field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseState {
    Unbound,
    Bound,
    Disabled,
    Expired,
}

impl LicenseRecord {
    pub fn new(key: String, owner: String, notes: String, created_at: DateTime<Utc>) -> Self {
        Self {
            key,
            owner,
            active: true,
            created_at,
            expiry_date: None,
            bound_tenant: None,
            bound_sub_identifier: None,
            first_activation: None,
            last_verified: None,
            verification_count: 0,
            notes,
        }
    }

    /// Expiry exactly at `now` counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.is_some_and(|exp| exp <= now)
    }

    pub fn is_bound(&self) -> bool {
        self.bound_tenant.is_some()
    }

    pub fn state(&self, now: DateTime<Utc>) -> LicenseState {
        if self.is_expired(now) {
            LicenseState::Expired
        } else if !self.active {
            LicenseState::Disabled
        } else if self.is_bound() {
            LicenseState::Bound
        } else {
            LicenseState::Unbound
        }
    }
}

/// The whole persisted universe: every record plus the broadcast globals.
///
/// Saved as one unit. `BTreeMap` keeps the file output stable between saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseDocument {
    #[serde(default)]
    pub licenses: BTreeMap<String, LicenseRecord>,
    #[serde(default = "default_script_version")]
    pub script_version: String,
    #[serde(default)]
    pub force_update: bool,
    #[serde(default)]
    pub update_message: String,
}

fn default_script_version() -> String {
    DEFAULT_SCRIPT_VERSION.to_string()
}

impl LicenseDocument {
    pub fn new(script_version: impl Into<String>) -> Self {
        Self {
            licenses: BTreeMap::new(),
            script_version: script_version.into(),
            force_update: false,
            update_message: String::new(),
        }
    }

    pub fn broadcast(&self) -> Broadcast {
        Broadcast {
            version: self.script_version.clone(),
            force_update: self.force_update,
            update_message: self.update_message.clone(),
        }
    }
}

impl Default for LicenseDocument {
    fn default() -> Self {
        Self::new(DEFAULT_SCRIPT_VERSION)
    }
}

/// Store-global update signal for remote callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Broadcast {
    pub version: String,
    #[serde(default)]
    pub force_update: bool,
    #[serde(default)]
    pub update_message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLicense {
    #[serde(default)]
    pub owner: Option<String>,
    /// Days from now until expiry. Absent = perpetual, 0 = already expired.
    #[serde(default)]
    pub expiry_days: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body shared by the single-license admin operations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseKeyInput {
    pub license_key: String,
}
