//! # API REST
//!
//! REST API implementation for Medico.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON wire types, identity headers, CORS)
//!
//! All case rules live in `medico-core`; this crate only translates.

#![warn(rust_2018_idioms)]

pub mod auth;
pub mod dto;
pub mod error;
mod handlers;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use medico_core::{
    case_data_dir_from_env_value, hospitals_file_from_env_value, rate_multiplier_from_env_value,
    CaseResult, CaseService, CoreConfig, FileCaseStore, HospitalRegistry, StaticUserDirectory,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CaseService<FileCaseStore>>,
    /// Shared key expected in `x-api-key`; `None` leaves the API open.
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    /// Opens the hospital registry and case store described by `cfg`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the hospital registry file exists but cannot be read.
    pub fn open(cfg: Arc<CoreConfig>, api_key: Option<String>) -> CaseResult<Self> {
        let hospitals = Arc::new(HospitalRegistry::open(cfg.hospitals_file())?);
        let store = FileCaseStore::new(cfg.clone());
        let service = CaseService::new(cfg, store, hospitals, Arc::new(StaticUserDirectory::new()));
        Ok(Self {
            service: Arc::new(service),
            api_key: api_key
                .filter(|k| !k.trim().is_empty())
                .map(Arc::from),
        })
    }
}

/// Builds [`CoreConfig`] from `MEDICO_DATA_DIR`, `MEDICO_HOSPITALS_FILE` and
/// `MEDICO_DEFAULT_RATE`.
///
/// # Errors
///
/// Returns an error if the default rate is not a positive decimal.
pub fn core_config_from_env() -> anyhow::Result<Arc<CoreConfig>> {
    let case_data_dir = case_data_dir_from_env_value(std::env::var("MEDICO_DATA_DIR").ok());
    let hospitals_file =
        hospitals_file_from_env_value(std::env::var("MEDICO_HOSPITALS_FILE").ok(), &case_data_dir);
    let default_rate = rate_multiplier_from_env_value(std::env::var("MEDICO_DEFAULT_RATE").ok())?;
    Ok(Arc::new(CoreConfig::new(
        case_data_dir,
        hospitals_file,
        default_rate,
    )?))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_hospitals,
        handlers::list_cases,
        handlers::create_case,
        handlers::get_case,
        handlers::replace_case,
        handlers::patch_case,
        handlers::delete_case,
        handlers::case_stats,
        handlers::assisted_cases,
        handlers::accept_invitation,
        handlers::reject_invitation,
        handlers::update_status,
        handlers::replace_procedures,
        handlers::add_procedure,
        handlers::remove_procedure,
        handlers::quote,
    ),
    components(schemas(
        dto::HealthRes,
        dto::ErrorRes,
        dto::HospitalRes,
        dto::ProcedureReq,
        dto::ProcedureRes,
        dto::CreateCaseReq,
        dto::UpdateCaseReq,
        dto::UpdateStatusReq,
        dto::ReplaceProceduresReq,
        dto::PermissionsRes,
        dto::CaseSummaryRes,
        dto::CaseDetailRes,
        dto::AssistedCasesRes,
        dto::InvitationRes,
        dto::AddProcedureRes,
        dto::StatusStatsRes,
        dto::SpecialtyStatsRes,
        dto::CaseStatsRes,
        dto::QuoteRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/hospitals", get(handlers::list_hospitals))
        .route(
            "/cases",
            get(handlers::list_cases).post(handlers::create_case),
        )
        .route("/cases/stats", get(handlers::case_stats))
        .route("/cases/assisted", get(handlers::assisted_cases))
        .route(
            "/cases/:id",
            get(handlers::get_case)
                .put(handlers::replace_case)
                .patch(handlers::patch_case)
                .delete(handlers::delete_case),
        )
        .route(
            "/cases/:id/accept-invitation",
            post(handlers::accept_invitation),
        )
        .route(
            "/cases/:id/reject-invitation",
            post(handlers::reject_invitation),
        )
        .route("/cases/:id/status", patch(handlers::update_status))
        .route(
            "/cases/:id/procedures",
            put(handlers::replace_procedures).post(handlers::add_procedure),
        )
        .route(
            "/cases/:id/procedures/:procedure_id",
            delete(handlers::remove_procedure),
        )
        .route("/calculator", get(handlers::quote))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
