//! # Medico Core
//!
//! Core business logic for the Medico surgical case and billing engine.
//!
//! This crate contains pure case operations and file-backed persistence:
//! - The case data model and its invariants ([`case`])
//! - Procedure pricing and totals ([`ledger`])
//! - Billing flag rules and deletion guards ([`lifecycle`])
//! - The assistant invitation protocol ([`collaboration`])
//! - View/edit/delete permissions ([`access`])
//! - The hospital registry and case stores under `MEDICO_DATA_DIR`
//!
//! **No API concerns**: authentication, HTTP servers and CLIs belong in `api-rest` and `cli`.

pub mod access;
pub mod case;
pub mod collaboration;
pub mod command;
pub mod config;
pub mod constants;
pub mod directory;
pub mod error;
pub mod hospital;
pub mod ledger;
pub mod lifecycle;
pub mod money;
pub mod query;
pub mod service;
pub mod stats;
pub mod storage;
pub mod store;
pub mod validation;
pub mod view;

pub use access::{CaseAction, CasePermissions};
pub use case::{
    Assistant, AssistantConsent, CaseStatus, PatientDetails, PatientGender, ProcessFlags, Schedule,
    SurgicalCase,
};
pub use collaboration::{AssistantPatch, AssistedCases, InvitationResponse};
pub use command::{CaseUpdate, NewCase};
pub use config::{
    case_data_dir_from_env_value, hospitals_file_from_env_value, rate_multiplier_from_env_value,
    CoreConfig,
};
pub use constants::DEFAULT_CASE_DATA_DIR;
pub use directory::{StaticUserDirectory, UserDirectory};
pub use error::{CaseError, CaseResult, Entity, ErrorKind};
pub use hospital::{Hospital, HospitalRegistry, HospitalSeed};
pub use ledger::{CaseProcedure, ProcedureInput, ProcedureLedger, ProcedureTotals};
pub use lifecycle::FlagsPatch;
pub use query::CaseFilter;
pub use service::{CaseService, Quote};
pub use stats::{CaseStats, SpecialtyTotals, StatusTotals};
pub use store::{CaseStore, FileCaseStore, InMemoryCaseStore};
pub use view::CaseView;

pub use medico_types::NonEmptyText;
pub use medico_uuid::{CaseId, HospitalId, ProcedureId, UserId};
