//! Hospital registry.
//!
//! Read-mostly reference data: each hospital's unique name and the `rate_multiplier` used as
//! the default pricing factor for new procedure lines. Changing a multiplier only affects
//! future calculations; stored lines keep the factor they were priced with.
//!
//! The registry is optionally backed by a single YAML file, rewritten atomically on every
//! change.

use crate::constants::{DEFAULT_RATE_MULTIPLIER, HOSPITAL_NAME_MAX_LEN};
use crate::error::Entity;
use crate::storage::{read_yaml, write_yaml_atomic};
use crate::validation::{optional_note, positive_multiplier, required_text};
use crate::{CaseError, CaseResult};
use chrono::{DateTime, Utc};
use medico_types::NonEmptyText;
use medico_uuid::HospitalId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: HospitalId,
    pub name: NonEmptyText,
    #[serde(default)]
    pub location: Option<String>,
    pub rate_multiplier: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A hospital to register, as read from a seed file or an admin command.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct HospitalSeed {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Defaults to 1.00.
    #[serde(default)]
    pub rate_multiplier: Option<Decimal>,
}

pub struct HospitalRegistry {
    path: Option<PathBuf>,
    hospitals: RwLock<BTreeMap<HospitalId, Hospital>>,
}

impl HospitalRegistry {
    /// A registry that lives only in memory.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            hospitals: RwLock::new(BTreeMap::new()),
        }
    }

    /// Opens the registry file at `path`. A missing file yields an empty registry that will be
    /// created on the first change.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::FileRead` or `CaseError::Deserialization` if the file exists but
    /// cannot be read or parsed, and `CaseError::Validation` if a stored multiplier is out of
    /// range.
    pub fn open(path: &Path) -> CaseResult<Self> {
        let stored: Vec<Hospital> = read_yaml(path)?.unwrap_or_default();
        for hospital in &stored {
            positive_multiplier("rate_multiplier", hospital.rate_multiplier)?;
        }
        tracing::debug!(
            path = %path.display(),
            count = stored.len(),
            "opened hospital registry"
        );
        let hospitals = stored.into_iter().map(|h| (h.id, h)).collect();
        Ok(Self {
            path: Some(path.to_path_buf()),
            hospitals: RwLock::new(hospitals),
        })
    }

    /// # Errors
    ///
    /// Returns `CaseError::NotFound` if no hospital has this id.
    pub fn get(&self, id: HospitalId) -> CaseResult<Hospital> {
        self.hospitals
            .read()?
            .get(&id)
            .cloned()
            .ok_or_else(|| CaseError::not_found(Entity::Hospital, id))
    }

    /// Current multiplier of a hospital, used to price new procedure lines.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::NotFound` if no hospital has this id.
    pub fn rate_multiplier(&self, id: HospitalId) -> CaseResult<Decimal> {
        self.get(id).map(|h| h.rate_multiplier)
    }

    /// Case-insensitive lookup by name.
    pub fn find_by_name(&self, name: &str) -> CaseResult<Option<Hospital>> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .hospitals
            .read()?
            .values()
            .find(|h| h.name.as_str().to_lowercase() == wanted)
            .cloned())
    }

    /// All hospitals ordered by name.
    pub fn list(&self) -> CaseResult<Vec<Hospital>> {
        let mut hospitals: Vec<Hospital> = self.hospitals.read()?.values().cloned().collect();
        hospitals.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        Ok(hospitals)
    }

    /// Registers a new hospital.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::Validation` if the name is blank, too long or already taken, or if
    /// the multiplier is not strictly positive. Storage errors are returned as-is.
    pub fn register(&self, seed: HospitalSeed) -> CaseResult<Hospital> {
        let now = Utc::now();
        let mut guard = self.hospitals.write()?;
        let mut next = guard.clone();
        let hospital = new_hospital(&next, seed, now)?;
        next.insert(hospital.id, hospital.clone());

        self.persist(&next)?;
        *guard = next;
        tracing::info!(
            hospital_id = %hospital.id,
            name = hospital.name.as_str(),
            "registered hospital"
        );
        Ok(hospital)
    }

    /// Registers every seed whose name is not present yet; existing names are skipped.
    ///
    /// All seeds are validated before anything is written.
    ///
    /// # Errors
    ///
    /// Same as [`HospitalRegistry::register`], except that duplicate names are not errors.
    pub fn seed(&self, seeds: Vec<HospitalSeed>) -> CaseResult<Vec<Hospital>> {
        let now = Utc::now();
        let mut guard = self.hospitals.write()?;
        let mut next = guard.clone();
        let mut added = Vec::new();

        for seed in seeds {
            if name_taken(&next, seed.name.trim()) {
                tracing::debug!(name = seed.name.trim(), "hospital already registered, skipping");
                continue;
            }
            let hospital = new_hospital(&next, seed, now)?;
            next.insert(hospital.id, hospital.clone());
            added.push(hospital);
        }

        if !added.is_empty() {
            self.persist(&next)?;
            *guard = next;
        }
        tracing::info!(added = added.len(), "seeded hospital registry");
        Ok(added)
    }

    /// Changes the multiplier used for future procedure lines at this hospital.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::NotFound` for an unknown id and `CaseError::Validation` for a
    /// multiplier that is not strictly positive.
    pub fn set_rate_multiplier(&self, id: HospitalId, multiplier: Decimal) -> CaseResult<Hospital> {
        let multiplier = positive_multiplier("rate_multiplier", multiplier)?;
        let mut guard = self.hospitals.write()?;
        let mut next = guard.clone();
        let hospital = next
            .get_mut(&id)
            .ok_or_else(|| CaseError::not_found(Entity::Hospital, id))?;
        let previous = hospital.rate_multiplier;
        hospital.rate_multiplier = multiplier;
        hospital.updated_at = Utc::now();
        let updated = hospital.clone();

        self.persist(&next)?;
        *guard = next;
        tracing::info!(
            hospital_id = %id,
            %previous,
            current = %multiplier,
            "changed hospital rate multiplier"
        );
        Ok(updated)
    }

    fn persist(&self, hospitals: &BTreeMap<HospitalId, Hospital>) -> CaseResult<()> {
        match &self.path {
            Some(path) => {
                let mut list: Vec<&Hospital> = hospitals.values().collect();
                list.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
                write_yaml_atomic(path, &list)
            }
            None => Ok(()),
        }
    }
}

fn name_taken(hospitals: &BTreeMap<HospitalId, Hospital>, name: &str) -> bool {
    let wanted = name.to_lowercase();
    hospitals
        .values()
        .any(|h| h.name.as_str().to_lowercase() == wanted)
}

fn new_hospital(
    existing: &BTreeMap<HospitalId, Hospital>,
    seed: HospitalSeed,
    now: DateTime<Utc>,
) -> CaseResult<Hospital> {
    let name = required_text("name", &seed.name, HOSPITAL_NAME_MAX_LEN)?;
    if name_taken(existing, name.as_str()) {
        return Err(CaseError::validation(
            "name",
            format!("a hospital named '{name}' already exists"),
        ));
    }
    let rate_multiplier = positive_multiplier(
        "rate_multiplier",
        seed.rate_multiplier.unwrap_or(DEFAULT_RATE_MULTIPLIER),
    )?;

    Ok(Hospital {
        id: HospitalId::new(),
        name,
        location: optional_note(seed.location.as_deref()),
        rate_multiplier,
        created_at: now,
        updated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed(name: &str, rate: Option<&str>) -> HospitalSeed {
        HospitalSeed {
            name: name.into(),
            location: None,
            rate_multiplier: rate.map(|r| r.parse().unwrap()),
        }
    }

    #[test]
    fn register_defaults_multiplier_and_rejects_duplicates() {
        let registry = HospitalRegistry::in_memory();
        let hospital = registry.register(seed("Clinica Norte", None)).unwrap();
        assert_eq!(hospital.rate_multiplier.to_string(), "1.00");

        let err = registry.register(seed("  clinica norte ", None)).unwrap_err();
        assert!(matches!(err, CaseError::Validation { ref field, .. } if field == "name"));
    }

    #[test]
    fn register_rejects_non_positive_multiplier() {
        let registry = HospitalRegistry::in_memory();
        assert!(registry.register(seed("A", Some("0"))).is_err());
        assert!(registry.register(seed("B", Some("-1.5"))).is_err());
        assert!(registry.register(seed("C", Some("1000"))).is_err());
        assert!(registry.list().unwrap().is_empty());
    }

    #[test]
    fn set_rate_multiplier_updates_lookup() {
        let registry = HospitalRegistry::in_memory();
        let hospital = registry.register(seed("Central", Some("1.2"))).unwrap();

        registry
            .set_rate_multiplier(hospital.id, "1.45".parse().unwrap())
            .unwrap();
        assert_eq!(
            registry.rate_multiplier(hospital.id).unwrap().to_string(),
            "1.45"
        );
        assert!(registry
            .set_rate_multiplier(hospital.id, "1.455".parse().unwrap())
            .is_err());

        let err = registry
            .set_rate_multiplier(HospitalId::new(), Decimal::ONE)
            .unwrap_err();
        assert!(matches!(err, CaseError::NotFound { entity: Entity::Hospital, .. }));
    }

    #[test]
    fn seed_skips_existing_names() {
        let registry = HospitalRegistry::in_memory();
        registry.register(seed("Central", None)).unwrap();

        let added = registry
            .seed(vec![seed("Central", Some("2")), seed("Sur", Some("1.1"))])
            .unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].name.as_str(), "Sur");

        let names: Vec<String> = registry
            .list()
            .unwrap()
            .into_iter()
            .map(|h| h.name.into_inner())
            .collect();
        assert_eq!(names, vec!["Central", "Sur"]);
    }

    #[test]
    fn registry_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hospitals.yaml");

        let registry = HospitalRegistry::open(&path).unwrap();
        let hospital = registry.register(seed("Central", Some("1.35"))).unwrap();
        drop(registry);

        let reopened = HospitalRegistry::open(&path).unwrap();
        let back = reopened.get(hospital.id).unwrap();
        assert_eq!(back, hospital);
        assert_eq!(
            reopened.find_by_name("CENTRAL").unwrap().map(|h| h.id),
            Some(hospital.id)
        );
    }

    #[test]
    fn open_rejects_hand_edited_out_of_range_multiplier() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hospitals.yaml");
        let registry = HospitalRegistry::open(&path).unwrap();
        registry.register(seed("Central", Some("1.35"))).unwrap();
        drop(registry);

        let yaml = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, yaml.replace("1.35", "5000.00")).unwrap();

        let err = HospitalRegistry::open(&path).err().unwrap();
        assert!(matches!(
            err,
            CaseError::Validation { ref field, .. } if field == "rate_multiplier"
        ));
    }
}
