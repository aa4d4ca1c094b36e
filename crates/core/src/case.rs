//! Surgical case data model.
//!
//! A [`SurgicalCase`] is one surgery event: who the patient was, where and when it happened,
//! how far it has progressed through billing, who assisted, and the procedures performed.
//! The case owns its procedures; they are persisted together with it.
//!
//! Fields are crate-private. Every mutation goes through the lifecycle, ledger and
//! collaboration modules so that the invariants checked by
//! [`SurgicalCase::check_invariants`] hold after every write.

use crate::constants::{FACTOR_MAX_DIGITS, RVU_MAX_DIGITS, VALUE_MAX_DIGITS};
use crate::error::{CaseError, CaseResult};
use crate::ledger::CaseProcedure;
use crate::lifecycle;
use crate::validation::check_amount;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use medico_types::NonEmptyText;
use medico_uuid::{CaseId, HospitalId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Descriptive label of where a case stands.
///
/// This is advisory only. Billing is gated by [`ProcessFlags`], never by the status.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    #[default]
    Scheduled,
    Completed,
    Billed,
    Paid,
    Cancelled,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 5] = [
        CaseStatus::Scheduled,
        CaseStatus::Completed,
        CaseStatus::Billed,
        CaseStatus::Paid,
        CaseStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Scheduled => "scheduled",
            CaseStatus::Completed => "completed",
            CaseStatus::Billed => "billed",
            CaseStatus::Paid => "paid",
            CaseStatus::Cancelled => "cancelled",
        }
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            CaseStatus::Scheduled => "Scheduled",
            CaseStatus::Completed => "Completed",
            CaseStatus::Billed => "Billed",
            CaseStatus::Paid => "Paid",
            CaseStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaseStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| CaseError::InvalidStatus(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatientGender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

impl PatientGender {
    pub fn code(&self) -> &'static str {
        match self {
            PatientGender::Male => "M",
            PatientGender::Female => "F",
            PatientGender::Other => "O",
        }
    }
}

impl FromStr for PatientGender {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "M" => Ok(PatientGender::Male),
            "F" => Ok(PatientGender::Female),
            "O" => Ok(PatientGender::Other),
            other => Err(CaseError::validation(
                "patient_gender",
                format!("'{other}' is not one of M, F, O"),
            )),
        }
    }
}

/// The three booleans that gate money movement.
///
/// Monotonic: a case cannot be billed before it was operated, nor paid before it was billed.
/// See [`lifecycle::validate`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessFlags {
    pub is_operated: bool,
    pub is_billed: bool,
    pub is_paid: bool,
}

/// Who assisted the owner in surgery.
///
/// A registered colleague and a free-text name are mutually exclusive by construction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Assistant {
    #[default]
    None,
    /// A registered physician, who takes part in the invitation protocol.
    Registered(UserId),
    /// An unregistered collaborator, recorded by name only.
    FreeText(NonEmptyText),
}

impl Assistant {
    pub fn registered_user(&self) -> Option<UserId> {
        match self {
            Assistant::Registered(user) => Some(*user),
            _ => None,
        }
    }

    pub fn free_text_name(&self) -> Option<&str> {
        match self {
            Assistant::FreeText(name) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Assistant::None)
    }
}

/// Consent state of the assistant invitation (`null` / `true` / `false` on the wire).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantConsent {
    /// No answer yet, or no registered assistant at all.
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl AssistantConsent {
    pub fn as_option(&self) -> Option<bool> {
        match self {
            AssistantConsent::Pending => None,
            AssistantConsent::Accepted => Some(true),
            AssistantConsent::Rejected => Some(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDetails {
    pub name: NonEmptyText,
    #[serde(default)]
    pub id: Option<NonEmptyText>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<PatientGender>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub hospital: HospitalId,
    pub surgery_date: NaiveDate,
    #[serde(default)]
    pub surgery_time: Option<NaiveTime>,
    #[serde(default)]
    pub surgery_end_time: Option<NaiveTime>,
    /// Opaque identifier owned by the calendar-sync collaborator.
    #[serde(default)]
    pub calendar_event_id: Option<NonEmptyText>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurgicalCase {
    pub(crate) id: CaseId,
    pub(crate) patient: PatientDetails,
    pub(crate) schedule: Schedule,
    #[serde(default)]
    pub(crate) status: CaseStatus,
    #[serde(default)]
    pub(crate) flags: ProcessFlags,
    #[serde(default)]
    pub(crate) assistant: Assistant,
    #[serde(default)]
    pub(crate) assistant_consent: AssistantConsent,
    #[serde(default)]
    pub(crate) assistant_notified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) diagnosis: Option<String>,
    #[serde(default)]
    pub(crate) notes: Option<String>,
    pub(crate) procedures: Vec<CaseProcedure>,
    pub(crate) created_by: UserId,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl SurgicalCase {
    pub fn id(&self) -> CaseId {
        self.id
    }

    pub fn patient(&self) -> &PatientDetails {
        &self.patient
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn hospital(&self) -> HospitalId {
        self.schedule.hospital
    }

    pub fn status(&self) -> CaseStatus {
        self.status
    }

    pub fn flags(&self) -> ProcessFlags {
        self.flags
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    pub fn assistant_consent(&self) -> AssistantConsent {
        self.assistant_consent
    }

    pub fn assistant_notified_at(&self) -> Option<DateTime<Utc>> {
        self.assistant_notified_at
    }

    pub fn diagnosis(&self) -> Option<&str> {
        self.diagnosis.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Procedures in insertion order. Use [`crate::ledger::ordered`] for display order.
    pub fn procedures(&self) -> &[CaseProcedure] {
        &self.procedures
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.created_by == user
    }

    pub fn is_assisted_by(&self, user: UserId) -> bool {
        self.assistant.registered_user() == Some(user)
    }

    /// Checks the invariants every persisted case must satisfy.
    ///
    /// Stores run this on records read back from disk, which may have been edited by hand.
    pub fn check_invariants(&self) -> CaseResult<()> {
        lifecycle::validate(&self.flags)?;
        if self.procedures.is_empty() {
            return Err(CaseError::validation(
                "procedures",
                "a case must carry at least one procedure",
            ));
        }
        for (index, line) in self.procedures.iter().enumerate() {
            let field = |name: &str| format!("procedures[{index}].{name}");
            check_amount(&field("rvu"), line.rvu, RVU_MAX_DIGITS)?;
            check_amount(&field("hospital_factor"), line.hospital_factor, FACTOR_MAX_DIGITS)?;
            check_amount(&field("calculated_value"), line.calculated_value, VALUE_MAX_DIGITS)?;
        }
        if self.assistant.registered_user().is_none()
            && self.assistant_consent != AssistantConsent::Pending
        {
            return Err(CaseError::validation(
                "assistant_accepted",
                "consent can only be recorded for a registered assistant",
            ));
        }
        Ok(())
    }
}

/// Test fixtures shared by the unit tests of several modules.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::ledger::{ProcedureInput, ProcedureLedger};
    use rust_decimal::Decimal;

    pub(crate) fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    pub(crate) fn procedure(code: &str, specialty: &str, rvu: &str) -> ProcedureInput {
        ProcedureInput {
            surgery_code: code.to_string(),
            surgery_name: format!("Procedure {code}"),
            specialty: specialty.to_string(),
            grupo: None,
            rvu: dec(rvu),
            hospital_factor: None,
            calculated_value: None,
            notes: None,
            order: None,
        }
    }

    /// A scheduled case owned by `owner` with one 10-RVU procedure at factor 1.50.
    pub(crate) fn case_owned_by(owner: UserId) -> SurgicalCase {
        let now = Utc::now();
        let procedures =
            ProcedureLedger::build(vec![procedure("47562", "General", "10")], dec("1.5"), 0, now)
                .unwrap();
        SurgicalCase {
            id: CaseId::new(),
            patient: PatientDetails {
                name: NonEmptyText::new("Ana Torres").unwrap(),
                id: None,
                age: Some(42),
                gender: Some(PatientGender::Female),
            },
            schedule: Schedule {
                hospital: HospitalId::new(),
                surgery_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
                surgery_time: None,
                surgery_end_time: None,
                calendar_event_id: None,
            },
            status: CaseStatus::Scheduled,
            flags: ProcessFlags::default(),
            assistant: Assistant::None,
            assistant_consent: AssistantConsent::Pending,
            assistant_notified_at: None,
            diagnosis: None,
            notes: None,
            procedures,
            created_by: owner,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::case_owned_by;
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn status_parses_the_five_labels() {
        for status in CaseStatus::ALL {
            assert_eq!(status.as_str().parse::<CaseStatus>().unwrap(), status);
        }
    }

    #[test]
    fn status_rejects_unknown_values() {
        let err = "archived".parse::<CaseStatus>().unwrap_err();
        assert!(matches!(err, CaseError::InvalidStatus(ref s) if s == "archived"));
    }

    #[test]
    fn consent_maps_to_tri_state() {
        assert_eq!(AssistantConsent::Pending.as_option(), None);
        assert_eq!(AssistantConsent::Accepted.as_option(), Some(true));
        assert_eq!(AssistantConsent::Rejected.as_option(), Some(false));
    }

    #[test]
    fn check_invariants_rejects_empty_procedures() {
        let mut case = case_owned_by(UserId::new());
        case.procedures.clear();
        assert!(matches!(
            case.check_invariants(),
            Err(CaseError::Validation { ref field, .. }) if field == "procedures"
        ));
    }

    #[test]
    fn check_invariants_rejects_out_of_range_stored_amounts() {
        let mut case = case_owned_by(UserId::new());
        case.procedures[0].calculated_value = Decimal::MAX;
        assert!(matches!(
            case.check_invariants(),
            Err(CaseError::Validation { ref field, .. })
                if field == "procedures[0].calculated_value"
        ));
    }

    #[test]
    fn check_invariants_rejects_paid_without_billed() {
        let mut case = case_owned_by(UserId::new());
        case.flags.is_paid = true;
        assert!(matches!(
            case.check_invariants(),
            Err(CaseError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn assistant_serializes_as_tagged_union() {
        let user = UserId::parse("550e8400e29b41d4a716446655440000").unwrap();
        let yaml = serde_yaml::to_string(&Assistant::Registered(user)).unwrap();
        assert!(yaml.contains("kind: registered"));
        assert!(yaml.contains("550e8400e29b41d4a716446655440000"));

        let back: Assistant = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, Assistant::Registered(user));
    }
}
