use serde::{Deserialize, Serialize};

/// A configured game that relays donations and may own a license.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub universe_id: Option<String>,
    /// `crypto::hash_secret` digest of the tenant password
    pub password_hash: String,
    /// License the tenant may self-service reset
    #[serde(default)]
    pub music_license_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TenantFile {
    #[serde(default)]
    pub tenants: Vec<Tenant>,
}
