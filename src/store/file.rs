use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{LicenseStore, StoreError};
use crate::models::LicenseDocument;

/// License document kept as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    default_version: String,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, default_version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            default_version: default_version.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn empty(&self) -> LicenseDocument {
        LicenseDocument::new(self.default_version.clone())
    }

    /// Keep a copy of an unparseable file so the next save doesn't destroy it.
    fn quarantine(&self) {
        let mut target = self.path.clone().into_os_string();
        target.push(".corrupt");
        match fs::copy(&self.path, &target) {
            Ok(_) => tracing::warn!(
                "Unreadable license store copied to {}",
                PathBuf::from(&target).display()
            ),
            Err(e) => tracing::warn!("Failed to copy unreadable license store aside: {}", e),
        }
    }
}

impl LicenseStore for JsonFileStore {
    fn load(&self) -> LicenseDocument {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return self.empty(),
            Err(e) => {
                tracing::error!(
                    "Failed to read license store {}: {} (serving empty store)",
                    self.path.display(),
                    e
                );
                self.quarantine();
                return self.empty();
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!(
                    "Failed to parse license store {}: {} (serving empty store)",
                    self.path.display(),
                    e
                );
                self.quarantine();
                self.empty()
            }
        }
    }

    fn initialize(&self) -> Result<bool, StoreError> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save(&self.empty())?;
        tracing::info!("Initialized empty license store at {}", self.path.display());
        Ok(true)
    }

    fn save(&self, doc: &LicenseDocument) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        let mut bytes = serde_json::to_vec_pretty(doc)?;
        bytes.push(b'\n');

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        tmp.as_file_mut()
            .write_all(&bytes)
            .map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;

        Ok(())
    }
}
