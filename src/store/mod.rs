//! Persistence for the license document.
//!
//! Every mutation is a full load-mutate-save of one document; there is no
//! caching layer. Reads fail soft (an unreadable store looks empty), writes
//! fail loud (`save` returns the error so no success is reported over an
//! unpersisted mutation).

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use thiserror::Error;

use crate::licensing::Licensing;
use crate::middleware::AdminCredential;
use crate::models::LicenseDocument;
use crate::tenants::TenantDirectory;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Backend for the license document.
///
/// The JSON file is the only production backend; the trait keeps the
/// lifecycle engine independent of it.
pub trait LicenseStore: Send + Sync {
    /// Current snapshot. Never fails: unreadable state yields an empty document.
    fn load(&self) -> LicenseDocument;

    /// Replace the persisted snapshot with `doc`.
    fn save(&self, doc: &LicenseDocument) -> Result<(), StoreError>;

    /// Persist an empty document if nothing is stored yet. Returns whether
    /// it wrote one. `load` never writes, so this is the only place a fresh
    /// store comes into being outside a mutation.
    fn initialize(&self) -> Result<bool, StoreError> {
        Ok(false)
    }
}

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub licensing: Arc<Licensing>,
    pub tenants: Arc<TenantDirectory>,
    pub admin: AdminCredential,
}
