//! State transitions on a loaded [`LicenseDocument`].
//!
//! Functions here take the document and the current time and never touch
//! persistence. A transition that returns an error leaves the document
//! unchanged.

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{AppError, Result};
use crate::models::{Broadcast, IssueLicense, LicenseDocument, LicenseRecord};

/// Attempts at finding an unused key before giving up.
const MAX_KEY_ATTEMPTS: usize = 8;

const DEFAULT_OWNER: &str = "Unknown";

/// Why a verification was refused. Every denial instructs the caller to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    MissingParameters,
    InvalidKey,
    Disabled,
    Expired,
    BoundElsewhere,
}

impl DenialReason {
    pub fn message(&self) -> &'static str {
        match self {
            DenialReason::MissingParameters => "Missing parameters",
            DenialReason::InvalidKey => "Invalid license key",
            DenialReason::Disabled => "License disabled",
            DenialReason::Expired => "License expired",
            DenialReason::BoundElsewhere => "License already used in another game",
        }
    }
}

/// Data returned to a caller whose license checked out.
#[derive(Debug, Clone, PartialEq)]
pub struct Grant {
    pub owner: String,
    pub expiry_date: Option<DateTime<Utc>>,
    pub script_version: String,
    pub force_update: bool,
    /// True when this call performed the first-use binding.
    pub newly_bound: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Granted(Grant),
    Denied(DenialReason),
}

impl Verdict {
    pub fn is_granted(&self) -> bool {
        matches!(self, Verdict::Granted(_))
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Decide a verification attempt, binding the key on first use.
///
/// The document is modified only when the verdict is `Granted`.
pub fn verify(
    doc: &mut LicenseDocument,
    license_key: Option<&str>,
    tenant: Option<&str>,
    sub_identifier: Option<&str>,
    now: DateTime<Utc>,
) -> Verdict {
    let (Some(license_key), Some(tenant)) = (present(license_key), present(tenant)) else {
        return Verdict::Denied(DenialReason::MissingParameters);
    };

    let script_version = doc.script_version.clone();
    let force_update = doc.force_update;

    let Some(record) = doc.licenses.get_mut(license_key) else {
        return Verdict::Denied(DenialReason::InvalidKey);
    };

    if !record.active {
        return Verdict::Denied(DenialReason::Disabled);
    }

    if record.is_expired(now) {
        return Verdict::Denied(DenialReason::Expired);
    }

    let newly_bound = match record.bound_tenant.as_deref() {
        None => {
            record.bound_tenant = Some(tenant.to_string());
            record.first_activation = Some(now);
            true
        }
        Some(bound) if bound != tenant => {
            return Verdict::Denied(DenialReason::BoundElsewhere);
        }
        Some(_) => false,
    };

    record.last_verified = Some(now);
    record.verification_count += 1;
    if let Some(sub) = present(sub_identifier) {
        record.bound_sub_identifier = Some(sub.to_string());
    }

    Verdict::Granted(Grant {
        owner: record.owner.clone(),
        expiry_date: record.expiry_date,
        script_version,
        force_update,
        newly_bound,
    })
}

/// Create a new unbound record under a key from `generate_key`.
///
/// Keys already present are skipped, never overwritten.
pub fn issue(
    doc: &mut LicenseDocument,
    input: &IssueLicense,
    now: DateTime<Utc>,
    mut generate_key: impl FnMut() -> String,
) -> Result<String> {
    let expiry_date = match input.expiry_days {
        None => None,
        Some(days) if days < 0 => {
            return Err(AppError::BadRequest("expiryDays must not be negative".into()));
        }
        Some(days) => {
            let offset = TimeDelta::try_days(days)
                .and_then(|delta| now.checked_add_signed(delta))
                .ok_or_else(|| AppError::BadRequest("expiryDays is out of range".into()))?;
            Some(offset)
        }
    };

    let key = (0..MAX_KEY_ATTEMPTS)
        .map(|_| generate_key())
        .find(|candidate| !candidate.is_empty() && !doc.licenses.contains_key(candidate))
        .ok_or_else(|| AppError::Internal("Could not generate an unused license key".into()))?;

    let owner = input
        .owner
        .as_deref()
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .unwrap_or(DEFAULT_OWNER)
        .to_string();
    let notes = input.notes.clone().unwrap_or_default();

    let mut record = LicenseRecord::new(key.clone(), owner, notes, now);
    record.expiry_date = expiry_date;
    doc.licenses.insert(key.clone(), record);

    Ok(key)
}

fn record_mut<'a>(doc: &'a mut LicenseDocument, key: &str) -> Result<&'a mut LicenseRecord> {
    doc.licenses
        .get_mut(key)
        .ok_or_else(|| AppError::NotFound("License not found".into()))
}

/// Flip `active`. Returns the new value.
pub fn toggle(doc: &mut LicenseDocument, key: &str) -> Result<bool> {
    let record = record_mut(doc, key)?;
    record.active = !record.active;
    Ok(record.active)
}

/// Remove the record permanently.
pub fn delete(doc: &mut LicenseDocument, key: &str) -> Result<LicenseRecord> {
    doc.licenses
        .remove(key)
        .ok_or_else(|| AppError::NotFound("License not found".into()))
}

/// Clear the binding so the next successful verification rebinds the key.
///
/// Counters, `last_verified` and `active` are left alone. Returns the tenant
/// the key was bound to, if any.
pub fn reset_binding(doc: &mut LicenseDocument, key: &str) -> Result<Option<String>> {
    let record = record_mut(doc, key)?;
    record.bound_sub_identifier = None;
    record.first_activation = None;
    Ok(record.bound_tenant.take())
}

pub fn update_broadcast(doc: &mut LicenseDocument, broadcast: &Broadcast) -> Result<()> {
    let version = broadcast.version.trim();
    if version.is_empty() {
        return Err(AppError::BadRequest("version is required".into()));
    }
    doc.script_version = version.to_string();
    doc.force_update = broadcast.force_update;
    doc.update_message = broadcast.update_message.clone();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::generate_license_key;
    use chrono::Duration;

    fn issue_one(doc: &mut LicenseDocument, now: DateTime<Utc>) -> String {
        issue(doc, &IssueLicense::default(), now, || generate_license_key("LIC")).unwrap()
    }

    #[test]
    fn test_first_verify_binds_then_locks() {
        let now = Utc::now();
        let mut doc = LicenseDocument::default();
        let key = issue_one(&mut doc, now);

        let first = verify(&mut doc, Some(&key), Some("universeA"), Some("place1"), now);
        match first {
            Verdict::Granted(grant) => assert!(grant.newly_bound),
            other => panic!("expected grant, got {:?}", other),
        }

        let record = &doc.licenses[&key];
        assert_eq!(record.bound_tenant.as_deref(), Some("universeA"));
        assert_eq!(record.bound_sub_identifier.as_deref(), Some("place1"));
        assert_eq!(record.first_activation, Some(now));
        assert_eq!(record.verification_count, 1);

        let later = now + Duration::minutes(5);
        let second = verify(&mut doc, Some(&key), Some("universeA"), None, later);
        match second {
            Verdict::Granted(grant) => assert!(!grant.newly_bound),
            other => panic!("expected grant, got {:?}", other),
        }
        assert_eq!(doc.licenses[&key].first_activation, Some(now));
        assert_eq!(doc.licenses[&key].last_verified, Some(later));

        let before = doc.clone();
        let other = verify(&mut doc, Some(&key), Some("universeB"), None, later);
        assert_eq!(other, Verdict::Denied(DenialReason::BoundElsewhere));
        assert_eq!(doc, before, "denial must not mutate the document");
    }

    #[test]
    fn test_missing_parameters() {
        let mut doc = LicenseDocument::default();
        let now = Utc::now();
        assert_eq!(
            verify(&mut doc, None, Some("u"), None, now),
            Verdict::Denied(DenialReason::MissingParameters)
        );
        assert_eq!(
            verify(&mut doc, Some("LIC"), Some("   "), None, now),
            Verdict::Denied(DenialReason::MissingParameters)
        );
    }

    #[test]
    fn test_disabled_checked_before_expiry_and_binding() {
        let now = Utc::now();
        let mut doc = LicenseDocument::default();
        let key = issue_one(&mut doc, now);
        toggle(&mut doc, &key).unwrap();

        assert_eq!(
            verify(&mut doc, Some(&key), Some("u"), None, now),
            Verdict::Denied(DenialReason::Disabled)
        );
        assert!(doc.licenses[&key].bound_tenant.is_none());
        assert_eq!(doc.licenses[&key].verification_count, 0);
    }

    #[test]
    fn test_expired_denies_even_when_bound() {
        let now = Utc::now();
        let mut doc = LicenseDocument::default();
        let key = issue_one(&mut doc, now);
        assert!(verify(&mut doc, Some(&key), Some("u"), None, now).is_granted());

        doc.licenses.get_mut(&key).unwrap().expiry_date = Some(now - Duration::days(1));
        assert_eq!(
            verify(&mut doc, Some(&key), Some("u"), None, now),
            Verdict::Denied(DenialReason::Expired)
        );
        assert_eq!(doc.licenses[&key].verification_count, 1);
    }

    #[test]
    fn test_issue_with_zero_days_is_expired_immediately() {
        let now = Utc::now();
        let mut doc = LicenseDocument::default();
        let input = IssueLicense {
            owner: Some("Archie".into()),
            expiry_days: Some(0),
            notes: None,
        };
        let key = issue(&mut doc, &input, now, || "LIC-ZERO".into()).unwrap();
        assert_eq!(doc.licenses[&key].expiry_date, Some(now));
        assert_eq!(
            verify(&mut doc, Some(&key), Some("u"), None, now),
            Verdict::Denied(DenialReason::Expired)
        );
    }

    #[test]
    fn test_issue_skips_colliding_keys() {
        let now = Utc::now();
        let mut doc = LicenseDocument::default();
        issue(&mut doc, &IssueLicense::default(), now, || "LIC-TAKEN".into()).unwrap();
        let original = doc.licenses["LIC-TAKEN"].clone();

        let mut candidates = vec!["LIC-FRESH".to_string(), "LIC-TAKEN".to_string()];
        let key = issue(&mut doc, &IssueLicense::default(), now, || {
            candidates.pop().unwrap_or_default()
        })
        .unwrap();

        assert_eq!(key, "LIC-FRESH");
        assert_eq!(doc.licenses["LIC-TAKEN"], original);
        assert_eq!(doc.licenses.len(), 2);
    }

    #[test]
    fn test_issue_gives_up_when_every_key_collides() {
        let now = Utc::now();
        let mut doc = LicenseDocument::default();
        issue(&mut doc, &IssueLicense::default(), now, || "LIC-TAKEN".into()).unwrap();
        let result = issue(&mut doc, &IssueLicense::default(), now, || "LIC-TAKEN".into());
        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(doc.licenses.len(), 1);
    }

    #[test]
    fn test_issue_rejects_negative_days() {
        let mut doc = LicenseDocument::default();
        let input = IssueLicense {
            expiry_days: Some(-1),
            ..Default::default()
        };
        let result = issue(&mut doc, &input, Utc::now(), || "LIC-NEG".into());
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(doc.licenses.is_empty());
    }

    #[test]
    fn test_issue_defaults() {
        let now = Utc::now();
        let mut doc = LicenseDocument::default();
        let key = issue(&mut doc, &IssueLicense::default(), now, || "LIC-D".into()).unwrap();
        let record = &doc.licenses[&key];
        assert_eq!(record.owner, DEFAULT_OWNER);
        assert!(record.active);
        assert_eq!(record.created_at, now);
        assert!(record.expiry_date.is_none());
        assert!(record.bound_tenant.is_none());
        assert_eq!(record.verification_count, 0);
    }

    #[test]
    fn test_toggle_is_involution() {
        let now = Utc::now();
        let mut doc = LicenseDocument::default();
        let key = issue_one(&mut doc, now);
        verify(&mut doc, Some(&key), Some("u"), None, now);
        let before = doc.licenses[&key].clone();

        assert!(!toggle(&mut doc, &key).unwrap());
        assert!(toggle(&mut doc, &key).unwrap());
        assert_eq!(doc.licenses[&key], before);
    }

    #[test]
    fn test_reset_binding_allows_rebind() {
        let now = Utc::now();
        let mut doc = LicenseDocument::default();
        let key = issue_one(&mut doc, now);
        verify(&mut doc, Some(&key), Some("universeA"), Some("p"), now);

        let previous = reset_binding(&mut doc, &key).unwrap();
        assert_eq!(previous.as_deref(), Some("universeA"));
        let record = &doc.licenses[&key];
        assert!(record.bound_tenant.is_none());
        assert!(record.bound_sub_identifier.is_none());
        assert!(record.first_activation.is_none());
        assert_eq!(record.verification_count, 1);
        assert_eq!(record.last_verified, Some(now));

        assert!(verify(&mut doc, Some(&key), Some("universeB"), None, now).is_granted());
        assert_eq!(doc.licenses[&key].bound_tenant.as_deref(), Some("universeB"));
        assert_eq!(doc.licenses[&key].verification_count, 2);
    }

    #[test]
    fn test_reset_keeps_disabled_state() {
        let now = Utc::now();
        let mut doc = LicenseDocument::default();
        let key = issue_one(&mut doc, now);
        verify(&mut doc, Some(&key), Some("u"), None, now);
        toggle(&mut doc, &key).unwrap();
        reset_binding(&mut doc, &key).unwrap();
        assert!(!doc.licenses[&key].active);
    }

    #[test]
    fn test_delete_then_verify_is_invalid() {
        let now = Utc::now();
        let mut doc = LicenseDocument::default();
        let key = issue_one(&mut doc, now);
        delete(&mut doc, &key).unwrap();
        assert_eq!(
            verify(&mut doc, Some(&key), Some("u"), None, now),
            Verdict::Denied(DenialReason::InvalidKey)
        );
        assert!(matches!(delete(&mut doc, &key), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_unknown_key_operations_not_found() {
        let mut doc = LicenseDocument::default();
        assert!(matches!(toggle(&mut doc, "nope"), Err(AppError::NotFound(_))));
        assert!(matches!(reset_binding(&mut doc, "nope"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_count_matches_successes() {
        let now = Utc::now();
        let mut doc = LicenseDocument::default();
        let key = issue_one(&mut doc, now);
        for _ in 0..5 {
            assert!(verify(&mut doc, Some(&key), Some("u"), None, now).is_granted());
        }
        for _ in 0..3 {
            assert!(!verify(&mut doc, Some(&key), Some("other"), None, now).is_granted());
        }
        assert_eq!(doc.licenses[&key].verification_count, 5);
    }

    #[test]
    fn test_update_broadcast() {
        let mut doc = LicenseDocument::default();
        let broadcast = Broadcast {
            version: " 2.1.0 ".into(),
            force_update: true,
            update_message: "Update now".into(),
        };
        update_broadcast(&mut doc, &broadcast).unwrap();
        assert_eq!(doc.script_version, "2.1.0");
        assert!(doc.force_update);
        assert_eq!(doc.update_message, "Update now");

        let empty = Broadcast {
            version: "".into(),
            force_update: false,
            update_message: String::new(),
        };
        assert!(matches!(update_broadcast(&mut doc, &empty), Err(AppError::BadRequest(_))));
        assert_eq!(doc.script_version, "2.1.0");
    }

    #[test]
    fn test_grant_carries_broadcast_state() {
        let now = Utc::now();
        let mut doc = LicenseDocument::default();
        doc.script_version = "3.0.0".into();
        doc.force_update = true;
        let key = issue_one(&mut doc, now);
        match verify(&mut doc, Some(&key), Some("u"), None, now) {
            Verdict::Granted(grant) => {
                assert_eq!(grant.script_version, "3.0.0");
                assert!(grant.force_update);
                assert_eq!(grant.owner, DEFAULT_OWNER);
            }
            other => panic!("expected grant, got {:?}", other),
        }
    }
}
