use std::sync::Mutex;

use super::{LicenseStore, StoreError};
use crate::models::LicenseDocument;

/// In-process store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    doc: Mutex<LicenseDocument>,
}

impl MemoryStore {
    pub fn new(doc: LicenseDocument) -> Self {
        Self {
            doc: Mutex::new(doc),
        }
    }
}

impl LicenseStore for MemoryStore {
    fn load(&self) -> LicenseDocument {
        match self.doc.lock() {
            Ok(doc) => doc.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn save(&self, doc: &LicenseDocument) -> Result<(), StoreError> {
        let mut guard = match self.doc.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = doc.clone();
        Ok(())
    }
}
