//! Typed create and update commands.
//!
//! An update carries only the fields that change. It is validated as a whole against the stored
//! case first, and only then applied, so a rejected update never leaves a half-written case.

use crate::case::{
    Assistant, AssistantConsent, CaseStatus, PatientDetails, PatientGender, ProcessFlags, Schedule,
    SurgicalCase,
};
use crate::collaboration::{self, AssistantPatch, AssistantTransition};
use crate::constants::{CALENDAR_EVENT_ID_MAX_LEN, PATIENT_ID_MAX_LEN, PATIENT_NAME_MAX_LEN};
use crate::ledger::{CaseProcedure, ProcedureInput, ProcedureLedger};
use crate::lifecycle::{self, FlagsPatch};
use crate::validation::{optional_note, optional_text, required_text};
use crate::CaseResult;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use medico_types::NonEmptyText;
use medico_uuid::{CaseId, HospitalId, UserId};
use rust_decimal::Decimal;

/// Everything needed to create a case.
#[derive(Clone, Debug)]
pub struct NewCase {
    pub patient_name: String,
    pub patient_id: Option<String>,
    pub patient_age: Option<u32>,
    pub patient_gender: Option<PatientGender>,
    pub hospital: HospitalId,
    pub surgery_date: NaiveDate,
    pub surgery_time: Option<NaiveTime>,
    pub surgery_end_time: Option<NaiveTime>,
    pub calendar_event_id: Option<String>,
    /// Status label; `None` means `scheduled`.
    pub status: Option<String>,
    pub flags: ProcessFlags,
    pub assistant_doctor: Option<UserId>,
    pub assistant_doctor_name: Option<String>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub procedures: Vec<ProcedureInput>,
}

impl NewCase {
    /// Validates the command and builds the case owned by `owner`.
    ///
    /// # Arguments
    ///
    /// * `owner` - The requesting user, recorded as `created_by`.
    /// * `default_factor` - The rate multiplier of `self.hospital` at the time of the call.
    /// * `now` - Creation time.
    ///
    /// # Errors
    ///
    /// Returns a `CaseError` if:
    /// - a text field is blank or too long (`Validation`),
    /// - the status label is unknown (`InvalidStatus`),
    /// - the flags violate billing monotonicity (`InvalidTransition`),
    /// - both assistant kinds are given (`Validation`),
    /// - the procedure list is empty or a line is invalid (`Validation`).
    pub fn into_case(
        self,
        owner: UserId,
        default_factor: Decimal,
        now: DateTime<Utc>,
    ) -> CaseResult<SurgicalCase> {
        let patient = PatientDetails {
            name: required_text("patient_name", &self.patient_name, PATIENT_NAME_MAX_LEN)?,
            id: optional_text("patient_id", self.patient_id.as_deref(), PATIENT_ID_MAX_LEN)?,
            age: self.patient_age,
            gender: self.patient_gender,
        };
        let schedule = Schedule {
            hospital: self.hospital,
            surgery_date: self.surgery_date,
            surgery_time: self.surgery_time,
            surgery_end_time: self.surgery_end_time,
            calendar_event_id: calendar_event_id(self.calendar_event_id.as_deref())?,
        };
        let status: CaseStatus = match self.status.as_deref() {
            Some(raw) => raw.parse()?,
            None => CaseStatus::default(),
        };
        lifecycle::validate(&self.flags)?;
        let assistant =
            collaboration::assistant_from_fields(
                self.assistant_doctor,
                self.assistant_doctor_name,
            )?;

        let mut case = SurgicalCase {
            id: CaseId::new(),
            patient,
            schedule,
            status,
            flags: self.flags,
            assistant: Assistant::None,
            assistant_consent: AssistantConsent::Pending,
            assistant_notified_at: None,
            diagnosis: optional_note(self.diagnosis.as_deref()),
            notes: optional_note(self.notes.as_deref()),
            procedures: Vec::new(),
            created_by: owner,
            created_at: now,
            updated_at: now,
        };
        ProcedureLedger::add_procedures(&mut case, self.procedures, default_factor, now)?;
        collaboration::assign_assistant(&mut case, assistant, now);
        Ok(case)
    }
}

/// Partial update of a case.
///
/// `None` keeps the stored value. For clearable fields, `Some(None)` clears and
/// `Some(Some(_))` sets. Consent is not part of the command: it only changes through the
/// invitation protocol.
#[derive(Clone, Debug, Default)]
pub struct CaseUpdate {
    pub patient_name: Option<String>,
    pub patient_id: Option<Option<String>>,
    pub patient_age: Option<Option<u32>>,
    pub patient_gender: Option<Option<PatientGender>>,
    pub hospital: Option<HospitalId>,
    pub surgery_date: Option<NaiveDate>,
    pub surgery_time: Option<Option<NaiveTime>>,
    pub surgery_end_time: Option<Option<NaiveTime>>,
    pub calendar_event_id: Option<Option<String>>,
    pub status: Option<String>,
    pub flags: FlagsPatch,
    pub assistant: AssistantPatch,
    pub diagnosis: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    /// Full replacement of the procedure set; lines are never merged.
    pub procedures: Option<Vec<ProcedureInput>>,
}

/// What an applied update changed, for logging by callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub assistant: AssistantTransition,
    pub procedures_replaced: bool,
}

impl CaseUpdate {
    /// The hospital the case will reference once this update is applied.
    pub fn target_hospital(&self, case: &SurgicalCase) -> HospitalId {
        self.hospital.unwrap_or(case.schedule.hospital)
    }

    /// Validates the update against `case` and applies it.
    ///
    /// `default_factor` is the multiplier of [`CaseUpdate::target_hospital`]; it is only used
    /// when the update replaces the procedure set. Existing lines keep their factors when the
    /// hospital changes without a replacement.
    ///
    /// # Errors
    ///
    /// Same as [`NewCase::into_case`]. On error `case` is left unchanged.
    pub fn apply(
        self,
        case: &mut SurgicalCase,
        default_factor: Decimal,
        now: DateTime<Utc>,
    ) -> CaseResult<UpdateOutcome> {
        // Validate everything before touching the case.
        let patient_name = self
            .patient_name
            .as_deref()
            .map(|name| required_text("patient_name", name, PATIENT_NAME_MAX_LEN))
            .transpose()?;
        let patient_id = match &self.patient_id {
            Some(value) => Some(optional_text(
                "patient_id",
                value.as_deref(),
                PATIENT_ID_MAX_LEN,
            )?),
            None => None,
        };
        let calendar_event = match &self.calendar_event_id {
            Some(value) => Some(calendar_event_id(value.as_deref())?),
            None => None,
        };
        let status: Option<CaseStatus> = self
            .status
            .as_deref()
            .map(str::parse::<CaseStatus>)
            .transpose()?;
        let flags = self.flags.merge(case.flags);
        lifecycle::validate(&flags)?;
        let assistant = self.assistant.resolve(&case.assistant)?;
        let procedures: Option<Vec<CaseProcedure>> = match self.procedures {
            Some(items) => Some(ProcedureLedger::build(items, default_factor, 0, now)?),
            None => None,
        };

        // Apply.
        if let Some(name) = patient_name {
            case.patient.name = name;
        }
        if let Some(id) = patient_id {
            case.patient.id = id;
        }
        if let Some(age) = self.patient_age {
            case.patient.age = age;
        }
        if let Some(gender) = self.patient_gender {
            case.patient.gender = gender;
        }
        if let Some(hospital) = self.hospital {
            case.schedule.hospital = hospital;
        }
        if let Some(date) = self.surgery_date {
            case.schedule.surgery_date = date;
        }
        if let Some(time) = self.surgery_time {
            case.schedule.surgery_time = time;
        }
        if let Some(time) = self.surgery_end_time {
            case.schedule.surgery_end_time = time;
        }
        if let Some(event) = calendar_event {
            case.schedule.calendar_event_id = event;
        }
        if let Some(status) = status {
            case.status = status;
        }
        case.flags = flags;
        if let Some(diagnosis) = self.diagnosis {
            case.diagnosis = optional_note(diagnosis.as_deref());
        }
        if let Some(notes) = self.notes {
            case.notes = optional_note(notes.as_deref());
        }
        let procedures_replaced = procedures.is_some();
        if let Some(lines) = procedures {
            case.procedures = lines;
        }
        let transition = collaboration::assign_assistant(case, assistant, now);

        Ok(UpdateOutcome {
            assistant: transition,
            procedures_replaced,
        })
    }
}

fn calendar_event_id(value: Option<&str>) -> CaseResult<Option<NonEmptyText>> {
    optional_text("calendar_event_id", value, CALENDAR_EVENT_ID_MAX_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::fixtures::{dec, procedure};
    use crate::CaseError;

    fn new_case(hospital: HospitalId) -> NewCase {
        NewCase {
            patient_name: "  Lucia Mendez ".into(),
            patient_id: Some("".into()),
            patient_age: Some(57),
            patient_gender: Some(PatientGender::Female),
            hospital,
            surgery_date: NaiveDate::from_ymd_opt(2026, 5, 2).unwrap(),
            surgery_time: None,
            surgery_end_time: None,
            calendar_event_id: Some("   ".into()),
            status: None,
            flags: ProcessFlags::default(),
            assistant_doctor: None,
            assistant_doctor_name: None,
            diagnosis: Some("Cholelithiasis".into()),
            notes: None,
            procedures: vec![procedure("47562", "General", "10")],
        }
    }

    #[test]
    fn into_case_normalises_and_prices() {
        let owner = UserId::new();
        let case = new_case(HospitalId::new())
            .into_case(owner, dec("1.5"), Utc::now())
            .unwrap();

        assert_eq!(case.patient().name.as_str(), "Lucia Mendez");
        assert_eq!(case.patient().id, None);
        assert_eq!(case.schedule().calendar_event_id, None);
        assert_eq!(case.status(), CaseStatus::Scheduled);
        assert_eq!(case.created_by(), owner);
        assert_eq!(case.procedures()[0].calculated_value, dec("15.00"));
        assert!(case.check_invariants().is_ok());
    }

    #[test]
    fn into_case_with_registered_assistant_records_invitation() {
        let assistant = UserId::new();
        let mut cmd = new_case(HospitalId::new());
        cmd.assistant_doctor = Some(assistant);
        let case = cmd.into_case(UserId::new(), dec("1"), Utc::now()).unwrap();

        assert_eq!(case.assistant(), &Assistant::Registered(assistant));
        assert_eq!(case.assistant_consent(), AssistantConsent::Pending);
        assert!(case.assistant_notified_at().is_some());
    }

    #[test]
    fn into_case_rejects_invalid_input() {
        let mut cmd = new_case(HospitalId::new());
        cmd.procedures.clear();
        assert!(matches!(
            cmd.into_case(UserId::new(), dec("1"), Utc::now()),
            Err(CaseError::Validation { .. })
        ));

        let mut cmd = new_case(HospitalId::new());
        cmd.flags.is_billed = true;
        assert!(matches!(
            cmd.into_case(UserId::new(), dec("1"), Utc::now()),
            Err(CaseError::InvalidTransition { .. })
        ));

        let mut cmd = new_case(HospitalId::new());
        cmd.status = Some("done".into());
        assert!(matches!(
            cmd.into_case(UserId::new(), dec("1"), Utc::now()),
            Err(CaseError::InvalidStatus(_))
        ));
    }

    #[test]
    fn rejected_update_leaves_case_untouched() {
        let mut case = new_case(HospitalId::new())
            .into_case(UserId::new(), dec("1"), Utc::now())
            .unwrap();
        let before = case.clone();

        let update = CaseUpdate {
            patient_name: Some("Someone Else".into()),
            flags: FlagsPatch {
                is_paid: Some(true),
                ..FlagsPatch::default()
            },
            procedures: Some(vec![procedure("1", "A", "99")]),
            ..CaseUpdate::default()
        };
        assert!(update.apply(&mut case, dec("1"), Utc::now()).is_err());
        assert_eq!(case, before);
    }

    #[test]
    fn update_merges_flags_with_stored_state() {
        let mut case = new_case(HospitalId::new())
            .into_case(UserId::new(), dec("1"), Utc::now())
            .unwrap();

        let operated = CaseUpdate {
            flags: FlagsPatch {
                is_operated: Some(true),
                ..FlagsPatch::default()
            },
            ..CaseUpdate::default()
        };
        operated.apply(&mut case, dec("1"), Utc::now()).unwrap();

        let billed = CaseUpdate {
            flags: FlagsPatch {
                is_billed: Some(true),
                ..FlagsPatch::default()
            },
            ..CaseUpdate::default()
        };
        billed.apply(&mut case, dec("1"), Utc::now()).unwrap();
        assert!(case.flags().is_operated && case.flags().is_billed);
    }

    #[test]
    fn update_without_procedures_keeps_lines_and_factors() {
        let mut case = new_case(HospitalId::new())
            .into_case(UserId::new(), dec("1.5"), Utc::now())
            .unwrap();
        let lines = case.procedures().to_vec();

        let update = CaseUpdate {
            hospital: Some(HospitalId::new()),
            notes: Some(Some("moved".into())),
            ..CaseUpdate::default()
        };
        let outcome = update.apply(&mut case, dec("3"), Utc::now()).unwrap();

        assert!(!outcome.procedures_replaced);
        assert_eq!(case.procedures(), lines.as_slice());
        assert_eq!(case.notes(), Some("moved"));
    }

    #[test]
    fn update_reassignment_resets_accepted_consent() {
        let x = UserId::new();
        let mut cmd = new_case(HospitalId::new());
        cmd.assistant_doctor = Some(x);
        let mut case = cmd.into_case(UserId::new(), dec("1"), Utc::now()).unwrap();
        collaboration::accept_invitation(&mut case, x).unwrap();

        let y = UserId::new();
        let update = CaseUpdate {
            assistant: AssistantPatch {
                doctor: Some(Some(y)),
                name: None,
            },
            ..CaseUpdate::default()
        };
        let outcome = update.apply(&mut case, dec("1"), Utc::now()).unwrap();
        assert_eq!(outcome.assistant.invited, Some(y));
        assert_eq!(case.assistant_consent(), AssistantConsent::Pending);
    }
}
