//! Tenant ("game") directory used to authorize owner self-service.
//!
//! A tenant credential is `"<tenant id>:<password>"`. The password is checked
//! against the stored digest in constant time.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::crypto::verify_secret;
use crate::models::{Tenant, TenantFile};

#[derive(Debug, Default)]
pub struct TenantDirectory {
    tenants: Vec<Tenant>,
}

impl TenantDirectory {
    pub fn new(tenants: Vec<Tenant>) -> Self {
        Self { tenants }
    }

    /// Load from a JSON file. A missing or unreadable file yields an empty directory.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No tenant file at {}, owner self-service disabled", path.display());
                return Self::default();
            }
            Err(e) => {
                tracing::warn!("Failed to read tenant file {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str::<TenantFile>(&raw) {
            Ok(file) => {
                tracing::info!("Loaded {} tenant(s) from {}", file.tenants.len(), path.display());
                Self::new(file.tenants)
            }
            Err(e) => {
                tracing::warn!("Failed to parse tenant file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Tenant> {
        self.tenants.iter().find(|t| t.id == id)
    }

    /// Resolve a `"<tenant id>:<password>"` credential to its tenant.
    pub fn resolve_credential(&self, credential: &str) -> Option<&Tenant> {
        let (id, password) = credential.split_once(':')?;
        if password.is_empty() {
            return None;
        }
        let tenant = self.get(id.trim())?;
        verify_secret(password, &tenant.password_hash).then_some(tenant)
    }
}
