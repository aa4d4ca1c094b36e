//! Wire types for the REST API.
//!
//! Request types convert into core commands; response types are built from core views.
//! Decimals travel as strings (`"15.00"`) and are accepted as strings or numbers.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use medico_core::{
    AssistantConsent, AssistantPatch, CaseFilter, CaseProcedure, CaseStats, CaseStatus, CaseUpdate,
    CaseView, FlagsPatch, Hospital, NewCase, PatientGender, ProcedureInput, ProcessFlags, Quote,
};
use medico_core::{HospitalId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn parse_hospital_id(field: &str, raw: &str) -> Result<HospitalId, ApiError> {
    HospitalId::parse(raw.trim()).map_err(|e| ApiError::bad_request(field, e.to_string()))
}

pub(crate) fn parse_user_id(field: &str, raw: &str) -> Result<UserId, ApiError> {
    UserId::parse(raw.trim()).map_err(|e| ApiError::bad_request(field, e.to_string()))
}

fn parse_gender(raw: Option<&str>) -> Result<Option<PatientGender>, ApiError> {
    raw.map(str::trim)
        .filter(|g| !g.is_empty())
        .map(|g| g.parse::<PatientGender>().map_err(ApiError::from))
        .transpose()
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct ProcedureReq {
    pub surgery_code: String,
    pub surgery_name: String,
    pub specialty: String,
    #[serde(default)]
    pub grupo: Option<String>,
    #[schema(value_type = String, example = "10.00")]
    pub rvu: Decimal,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "1.50")]
    pub hospital_factor: Option<Decimal>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub calculated_value: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub order: Option<u32>,
}

impl From<ProcedureReq> for ProcedureInput {
    fn from(req: ProcedureReq) -> Self {
        ProcedureInput {
            surgery_code: req.surgery_code,
            surgery_name: req.surgery_name,
            specialty: req.specialty,
            grupo: req.grupo,
            rvu: req.rvu,
            hospital_factor: req.hospital_factor,
            calculated_value: req.calculated_value,
            notes: req.notes,
            order: req.order,
        }
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct CreateCaseReq {
    pub patient_name: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub patient_age: Option<u32>,
    /// One of `M`, `F`, `O`.
    #[serde(default)]
    pub patient_gender: Option<String>,
    pub hospital: String,
    #[schema(value_type = String, format = Date)]
    pub surgery_date: NaiveDate,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "08:30:00")]
    pub surgery_time: Option<NaiveTime>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "10:00:00")]
    pub surgery_end_time: Option<NaiveTime>,
    #[serde(default)]
    pub calendar_event_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_operated: bool,
    #[serde(default)]
    pub is_billed: bool,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub assistant_doctor: Option<String>,
    #[serde(default)]
    pub assistant_doctor_name: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub procedures: Vec<ProcedureReq>,
}

impl TryFrom<CreateCaseReq> for NewCase {
    type Error = ApiError;

    fn try_from(req: CreateCaseReq) -> Result<Self, Self::Error> {
        let assistant_doctor = req
            .assistant_doctor
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|raw| parse_user_id("assistant_doctor", raw))
            .transpose()?;

        Ok(NewCase {
            patient_name: req.patient_name,
            patient_id: req.patient_id,
            patient_age: req.patient_age,
            patient_gender: parse_gender(req.patient_gender.as_deref())?,
            hospital: parse_hospital_id("hospital", &req.hospital)?,
            surgery_date: req.surgery_date,
            surgery_time: req.surgery_time,
            surgery_end_time: req.surgery_end_time,
            calendar_event_id: req.calendar_event_id,
            status: req.status,
            flags: ProcessFlags {
                is_operated: req.is_operated,
                is_billed: req.is_billed,
                is_paid: req.is_paid,
            },
            assistant_doctor,
            assistant_doctor_name: req.assistant_doctor_name,
            diagnosis: req.diagnosis,
            notes: req.notes,
            procedures: req.procedures.into_iter().map(Into::into).collect(),
        })
    }
}

/// Partial case update. Absent fields are kept; `null` clears clearable fields.
///
/// There is no `assistant_accepted`: consent only changes through the invitation endpoints.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCaseReq {
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub patient_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<u32>)]
    pub patient_age: Option<Option<u32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub patient_gender: Option<Option<String>>,
    #[serde(default)]
    pub hospital: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Date)]
    pub surgery_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub surgery_time: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub surgery_end_time: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub calendar_event_id: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_operated: Option<bool>,
    #[serde(default)]
    pub is_billed: Option<bool>,
    #[serde(default)]
    pub is_paid: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub assistant_doctor: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub assistant_doctor_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub diagnosis: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    #[serde(default)]
    pub procedures: Option<Vec<ProcedureReq>>,
}

impl TryFrom<UpdateCaseReq> for CaseUpdate {
    type Error = ApiError;

    fn try_from(req: UpdateCaseReq) -> Result<Self, Self::Error> {
        let patient_gender = match req.patient_gender {
            Some(raw) => Some(parse_gender(raw.as_deref())?),
            None => None,
        };
        let hospital = req
            .hospital
            .as_deref()
            .map(|raw| parse_hospital_id("hospital", raw))
            .transpose()?;
        let doctor = match req.assistant_doctor {
            Some(raw) => Some(
                raw.as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|id| parse_user_id("assistant_doctor", id))
                    .transpose()?,
            ),
            None => None,
        };

        Ok(CaseUpdate {
            patient_name: req.patient_name,
            patient_id: req.patient_id,
            patient_age: req.patient_age,
            patient_gender,
            hospital,
            surgery_date: req.surgery_date,
            surgery_time: req.surgery_time,
            surgery_end_time: req.surgery_end_time,
            calendar_event_id: req.calendar_event_id,
            status: req.status,
            flags: FlagsPatch {
                is_operated: req.is_operated,
                is_billed: req.is_billed,
                is_paid: req.is_paid,
            },
            assistant: AssistantPatch {
                doctor,
                name: req.assistant_doctor_name,
            },
            diagnosis: req.diagnosis,
            notes: req.notes,
            procedures: req
                .procedures
                .map(|items| items.into_iter().map(Into::into).collect()),
        })
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct ReplaceProceduresReq {
    pub procedures: Vec<ProcedureReq>,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct UpdateStatusReq {
    pub status: String,
}

#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCasesQuery {
    pub status: Option<String>,
    pub hospital: Option<String>,
    #[param(value_type = Option<String>, format = Date)]
    pub date_from: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = Date)]
    pub date_to: Option<NaiveDate>,
    /// Case-insensitive match on patient name or patient id.
    pub search: Option<String>,
    pub assisted_only: Option<bool>,
}

impl TryFrom<ListCasesQuery> for CaseFilter {
    type Error = ApiError;

    fn try_from(q: ListCasesQuery) -> Result<Self, Self::Error> {
        let status = q
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<CaseStatus>)
            .transpose()
            .map_err(ApiError::from)?;
        let hospital = q
            .hospital
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|raw| parse_hospital_id("hospital", raw))
            .transpose()?;
        Ok(CaseFilter {
            status,
            hospital,
            date_from: q.date_from,
            date_to: q.date_to,
            search: q.search,
            assisted_only: q.assisted_only.unwrap_or(false),
        })
    }
}

#[derive(Clone, Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuoteQuery {
    #[param(value_type = String)]
    pub rvu: Decimal,
    pub hospital: Option<String>,
    #[param(value_type = Option<String>)]
    pub factor: Option<Decimal>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct HospitalRes {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    #[schema(value_type = String)]
    pub rate_multiplier: Decimal,
}

impl From<Hospital> for HospitalRes {
    fn from(h: Hospital) -> Self {
        HospitalRes {
            id: h.id.to_string(),
            name: h.name.into_inner(),
            location: h.location,
            rate_multiplier: h.rate_multiplier,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, ToSchema)]
pub struct PermissionsRes {
    pub can_view: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub is_owner: bool,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ProcedureRes {
    pub id: String,
    pub surgery_code: String,
    pub surgery_name: String,
    pub specialty: String,
    pub grupo: Option<String>,
    #[schema(value_type = String)]
    pub rvu: Decimal,
    #[schema(value_type = String)]
    pub hospital_factor: Decimal,
    #[schema(value_type = String)]
    pub calculated_value: Decimal,
    pub notes: Option<String>,
    pub order: u32,
}

impl From<&CaseProcedure> for ProcedureRes {
    fn from(p: &CaseProcedure) -> Self {
        ProcedureRes {
            id: p.id.to_string(),
            surgery_code: p.surgery_code.as_str().to_string(),
            surgery_name: p.surgery_name.as_str().to_string(),
            specialty: p.specialty.as_str().to_string(),
            grupo: p.grupo.as_ref().map(|g| g.as_str().to_string()),
            rvu: p.rvu,
            hospital_factor: p.hospital_factor,
            calculated_value: p.calculated_value,
            notes: p.notes.clone(),
            order: p.order,
        }
    }
}

/// Compact case representation used by list endpoints.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct CaseSummaryRes {
    pub id: String,
    pub patient_name: String,
    pub patient_id: Option<String>,
    pub hospital: String,
    pub hospital_name: Option<String>,
    #[schema(value_type = String, format = Date)]
    pub surgery_date: NaiveDate,
    #[schema(value_type = Option<String>)]
    pub surgery_time: Option<NaiveTime>,
    pub status: String,
    pub status_label: String,
    pub is_operated: bool,
    pub is_billed: bool,
    pub is_paid: bool,
    pub assistant_display_name: String,
    /// `null` pending, `true` accepted, `false` rejected.
    pub assistant_accepted: Option<bool>,
    pub procedure_count: usize,
    #[schema(value_type = String)]
    pub total_rvu: Decimal,
    #[schema(value_type = String)]
    pub total_value: Decimal,
    pub primary_specialty: Option<String>,
    pub created_by: String,
    pub permissions: PermissionsRes,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl From<CaseView> for CaseSummaryRes {
    fn from(view: CaseView) -> Self {
        let case = &view.case;
        let flags = case.flags();
        CaseSummaryRes {
            id: case.id().to_string(),
            patient_name: case.patient().name.as_str().to_string(),
            patient_id: case.patient().id.as_ref().map(|id| id.as_str().to_string()),
            hospital: case.hospital().to_string(),
            hospital_name: view.hospital_name.clone(),
            surgery_date: case.schedule().surgery_date,
            surgery_time: case.schedule().surgery_time,
            status: case.status().as_str().to_string(),
            status_label: case.status().label().to_string(),
            is_operated: flags.is_operated,
            is_billed: flags.is_billed,
            is_paid: flags.is_paid,
            assistant_display_name: view.assistant_display_name.clone(),
            assistant_accepted: consent(case.assistant_consent()),
            procedure_count: view.totals.count,
            total_rvu: view.totals.total_rvu,
            total_value: view.totals.total_value,
            primary_specialty: view.primary_specialty.clone(),
            created_by: case.created_by().to_string(),
            permissions: permissions(&view),
            created_at: case.created_at(),
        }
    }
}

/// Full case representation.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct CaseDetailRes {
    pub id: String,
    pub patient_name: String,
    pub patient_id: Option<String>,
    pub patient_age: Option<u32>,
    pub patient_gender: Option<String>,
    pub hospital: String,
    pub hospital_name: Option<String>,
    #[schema(value_type = Option<String>)]
    pub hospital_rate_multiplier: Option<Decimal>,
    #[schema(value_type = String, format = Date)]
    pub surgery_date: NaiveDate,
    #[schema(value_type = Option<String>)]
    pub surgery_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub surgery_end_time: Option<NaiveTime>,
    pub calendar_event_id: Option<String>,
    pub status: String,
    pub status_label: String,
    pub is_operated: bool,
    pub is_billed: bool,
    pub is_paid: bool,
    pub assistant_doctor: Option<String>,
    pub assistant_doctor_name: Option<String>,
    pub assistant_display_name: String,
    pub assistant_accepted: Option<bool>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub assistant_notified_at: Option<DateTime<Utc>>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub procedures: Vec<ProcedureRes>,
    pub procedure_count: usize,
    #[schema(value_type = String)]
    pub total_rvu: Decimal,
    #[schema(value_type = String)]
    pub total_value: Decimal,
    pub primary_specialty: Option<String>,
    pub created_by: String,
    pub permissions: PermissionsRes,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<Utc>,
}

impl From<CaseView> for CaseDetailRes {
    fn from(view: CaseView) -> Self {
        let permissions = permissions(&view);
        let case = view.case;
        let flags = case.flags();
        let patient = case.patient();
        let schedule = case.schedule();
        let procedures = medico_core::ProcedureLedger::ordered(case.procedures())
            .into_iter()
            .map(ProcedureRes::from)
            .collect();

        CaseDetailRes {
            id: case.id().to_string(),
            patient_name: patient.name.as_str().to_string(),
            patient_id: patient.id.as_ref().map(|id| id.as_str().to_string()),
            patient_age: patient.age,
            patient_gender: patient.gender.map(|g| g.code().to_string()),
            hospital: case.hospital().to_string(),
            hospital_name: view.hospital_name,
            hospital_rate_multiplier: view.hospital_rate_multiplier,
            surgery_date: schedule.surgery_date,
            surgery_time: schedule.surgery_time,
            surgery_end_time: schedule.surgery_end_time,
            calendar_event_id: schedule
                .calendar_event_id
                .as_ref()
                .map(|e| e.as_str().to_string()),
            status: case.status().as_str().to_string(),
            status_label: case.status().label().to_string(),
            is_operated: flags.is_operated,
            is_billed: flags.is_billed,
            is_paid: flags.is_paid,
            assistant_doctor: case.assistant().registered_user().map(|u| u.to_string()),
            assistant_doctor_name: case.assistant().free_text_name().map(str::to_string),
            assistant_display_name: view.assistant_display_name,
            assistant_accepted: consent(case.assistant_consent()),
            assistant_notified_at: case.assistant_notified_at(),
            diagnosis: case.diagnosis().map(str::to_string),
            notes: case.notes().map(str::to_string),
            procedures,
            procedure_count: view.totals.count,
            total_rvu: view.totals.total_rvu,
            total_value: view.totals.total_value,
            primary_specialty: view.primary_specialty,
            created_by: case.created_by().to_string(),
            permissions,
            created_at: case.created_at(),
            updated_at: case.updated_at(),
        }
    }
}

fn consent(consent: AssistantConsent) -> Option<bool> {
    consent.as_option()
}

fn permissions(view: &CaseView) -> PermissionsRes {
    PermissionsRes {
        can_view: view.permissions.can_view,
        can_edit: view.permissions.can_edit,
        can_delete: view.permissions.can_delete,
        is_owner: view.permissions.is_owner,
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct AssistedCasesRes {
    pub pending: Vec<CaseSummaryRes>,
    pub accepted: Vec<CaseSummaryRes>,
    pub pending_count: usize,
    pub accepted_count: usize,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct InvitationRes {
    pub message: String,
    pub case: CaseDetailRes,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct AddProcedureRes {
    pub procedure_id: String,
    pub case: CaseDetailRes,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct StatusStatsRes {
    pub status: String,
    pub count: usize,
    #[schema(value_type = String)]
    pub total_value: Decimal,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SpecialtyStatsRes {
    pub specialty: String,
    pub count: usize,
    #[schema(value_type = String)]
    pub total_value: Decimal,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct CaseStatsRes {
    pub total_cases: usize,
    pub total_procedures: usize,
    #[schema(value_type = String)]
    pub total_value: Decimal,
    pub cases_by_status: Vec<StatusStatsRes>,
    pub cases_by_specialty: Vec<SpecialtyStatsRes>,
    pub recent_cases: Vec<CaseSummaryRes>,
}

impl CaseStatsRes {
    pub fn new(stats: CaseStats, recent_cases: Vec<CaseSummaryRes>) -> Self {
        CaseStatsRes {
            total_cases: stats.total_cases,
            total_procedures: stats.total_procedures,
            total_value: stats.total_value,
            cases_by_status: stats
                .by_status
                .into_iter()
                .map(|s| StatusStatsRes {
                    status: s.status.as_str().to_string(),
                    count: s.count,
                    total_value: s.total_value,
                })
                .collect(),
            cases_by_specialty: stats
                .top_specialties
                .into_iter()
                .map(|s| SpecialtyStatsRes {
                    specialty: s.specialty,
                    count: s.count,
                    total_value: s.total_value,
                })
                .collect(),
            recent_cases,
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct QuoteRes {
    #[schema(value_type = String)]
    pub rvu: Decimal,
    #[schema(value_type = String)]
    pub factor: Decimal,
    #[schema(value_type = String)]
    pub value: Decimal,
}

impl From<Quote> for QuoteRes {
    fn from(q: Quote) -> Self {
        QuoteRes {
            rvu: q.rvu,
            factor: q.factor,
            value: q.value,
        }
    }
}
