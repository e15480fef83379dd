//! License lifecycle engine bound to a store.
//!
//! Each operation reloads the document, applies one transition from
//! [`lifecycle`], and saves it back before returning. Mutations are
//! serialized by a process-wide lock so two concurrent first-use
//! verifications cannot both bind the same key, and two writes to different
//! keys cannot overwrite each other's whole-file save.

pub mod lifecycle;

pub use lifecycle::{DenialReason, Grant, Verdict};

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use crate::crypto::generate_license_key;
use crate::error::{AppError, Result};
use crate::models::{Broadcast, IssueLicense, LicenseDocument, LicenseRecord};
use crate::store::LicenseStore;

pub struct Licensing {
    store: Arc<dyn LicenseStore>,
    key_prefix: String,
    write_lock: Mutex<()>,
}

impl Licensing {
    pub fn new(store: Arc<dyn LicenseStore>, key_prefix: impl Into<String>) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| AppError::Internal("License store lock poisoned".into()))
    }

    /// Run `f` against a fresh snapshot and save it when `f` reports a change.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut LicenseDocument) -> Result<(T, bool)>,
    ) -> Result<T> {
        let _guard = self.lock()?;
        let mut doc = self.store.load();
        let (value, changed) = f(&mut doc)?;
        if changed {
            self.store.save(&doc)?;
        }
        Ok(value)
    }

    /// Create the backing store if it does not exist yet, under the write lock.
    pub fn initialize(&self) -> Result<bool> {
        let _guard = self.lock()?;
        Ok(self.store.initialize()?)
    }

    /// Verify a license for a tenant, binding it on first use.
    ///
    /// Denials are returned as `Ok(Verdict::Denied(..))`; an `Err` means the
    /// granted mutation could not be persisted.
    pub fn verify(
        &self,
        license_key: Option<&str>,
        tenant: Option<&str>,
        sub_identifier: Option<&str>,
    ) -> Result<Verdict> {
        let verdict = self.mutate(|doc| {
            let verdict =
                lifecycle::verify(doc, license_key, tenant, sub_identifier, Utc::now());
            let changed = verdict.is_granted();
            Ok((verdict, changed))
        })?;

        match &verdict {
            Verdict::Granted(grant) if grant.newly_bound => {
                tracing::info!(
                    "License {} bound to tenant {}",
                    license_key.unwrap_or_default(),
                    tenant.unwrap_or_default()
                );
            }
            Verdict::Granted(_) => {}
            Verdict::Denied(reason) => {
                tracing::debug!(
                    "License verification denied ({}) for tenant {:?}",
                    reason.message(),
                    tenant
                );
            }
        }

        Ok(verdict)
    }

    pub fn issue(&self, input: &IssueLicense) -> Result<String> {
        let prefix = &self.key_prefix;
        let key = self.mutate(|doc| {
            let key = lifecycle::issue(doc, input, Utc::now(), || generate_license_key(prefix))?;
            Ok((key, true))
        })?;
        tracing::info!("Issued license {}", key);
        Ok(key)
    }

    /// Returns the new `active` value.
    pub fn toggle(&self, key: &str) -> Result<bool> {
        let active = self.mutate(|doc| Ok((lifecycle::toggle(doc, key)?, true)))?;
        tracing::info!(
            "License {} {}",
            key,
            if active { "enabled" } else { "disabled" }
        );
        Ok(active)
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        let removed = self.mutate(|doc| Ok((lifecycle::delete(doc, key)?, true)))?;
        tracing::info!("Deleted license {} (owner: {})", removed.key, removed.owner);
        Ok(())
    }

    /// Returns the tenant the key was bound to before the reset.
    pub fn reset_binding(&self, key: &str) -> Result<Option<String>> {
        let previous = self.mutate(|doc| Ok((lifecycle::reset_binding(doc, key)?, true)))?;
        tracing::info!(
            "License {} binding reset (was: {})",
            key,
            previous.as_deref().unwrap_or("unbound")
        );
        Ok(previous)
    }

    pub fn update_broadcast(&self, broadcast: &Broadcast) -> Result<()> {
        self.mutate(|doc| Ok((lifecycle::update_broadcast(doc, broadcast)?, true)))?;
        tracing::info!(
            "Broadcast updated: version {}, force update {}",
            broadcast.version.trim(),
            broadcast.force_update
        );
        Ok(())
    }

    /// Every record, for display. Reads without taking the write lock.
    pub fn list(&self) -> Vec<LicenseRecord> {
        self.store.load().licenses.into_values().collect()
    }

    pub fn get(&self, key: &str) -> Option<LicenseRecord> {
        self.store.load().licenses.remove(key)
    }

    pub fn broadcast(&self) -> Broadcast {
        self.store.load().broadcast()
    }
}
