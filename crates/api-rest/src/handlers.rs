//! HTTP handlers.
//!
//! Handlers translate wire types, call [`medico_core::CaseService`] and translate the result
//! back. No case rule is decided here.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use medico_core::{CaseFilter, CaseId, CaseUpdate, NewCase, ProcedureId};

use crate::auth::{ApiKeyGuard, RequestUser};
use crate::dto::{
    parse_hospital_id, AddProcedureRes, AssistedCasesRes, CaseDetailRes, CaseStatsRes,
    CaseSummaryRes, CreateCaseReq, ErrorRes, HealthRes, HospitalRes, InvitationRes,
    ListCasesQuery, ProcedureReq, QuoteQuery, QuoteRes, ReplaceProceduresReq, UpdateCaseReq,
    UpdateStatusReq,
};
use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = Result<T, ApiError>;

fn parse_case_id(raw: &str) -> ApiResult<CaseId> {
    CaseId::parse(raw.trim()).map_err(|e| ApiError::bad_request("id", e.to_string()))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API.
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Medico REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/hospitals",
    responses(
        (status = 200, description = "Hospitals ordered by name", body = [HospitalRes]),
        (status = 401, description = "Missing or invalid API key", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn list_hospitals(
    State(state): State<AppState>,
    _key: ApiKeyGuard,
) -> ApiResult<Json<Vec<HospitalRes>>> {
    let hospitals = state.service.hospitals().list()?;
    Ok(Json(hospitals.into_iter().map(HospitalRes::from).collect()))
}

#[utoipa::path(
    get,
    path = "/cases",
    params(ListCasesQuery),
    responses(
        (status = 200, description = "Own and assisted cases, most recent first", body = [CaseSummaryRes]),
        (status = 400, description = "Invalid filter", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn list_cases(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
    Query(query): Query<ListCasesQuery>,
) -> ApiResult<Json<Vec<CaseSummaryRes>>> {
    let filter = CaseFilter::try_from(query)?;
    let views = state.service.list_cases(user, &filter)?;
    Ok(Json(views.into_iter().map(CaseSummaryRes::from).collect()))
}

#[utoipa::path(
    post,
    path = "/cases",
    request_body = CreateCaseReq,
    responses(
        (status = 201, description = "Case created", body = CaseDetailRes),
        (status = 400, description = "Invalid case data", body = ErrorRes),
        (status = 404, description = "Unknown hospital", body = ErrorRes)
    )
)]
/// Creates a case owned by the requesting physician.
///
/// # Errors
/// Returns `400 Bad Request` for invalid fields, flag combinations or status values, and
/// `404 Not Found` when the hospital does not exist.
#[axum::debug_handler]
pub async fn create_case(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
    Json(req): Json<CreateCaseReq>,
) -> ApiResult<(StatusCode, Json<CaseDetailRes>)> {
    let command = NewCase::try_from(req)?;
    let view = state.service.create_case(user, command)?;
    Ok((StatusCode::CREATED, Json(view.into())))
}

#[utoipa::path(
    get,
    path = "/cases/{id}",
    params(("id" = String, Path, description = "Case id")),
    responses(
        (status = 200, description = "Case detail", body = CaseDetailRes),
        (status = 403, description = "Not the owner or registered assistant", body = ErrorRes),
        (status = 404, description = "Unknown case", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn get_case(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
    Path(id): Path<String>,
) -> ApiResult<Json<CaseDetailRes>> {
    let view = state.service.get_case(parse_case_id(&id)?, user)?;
    Ok(Json(view.into()))
}

#[utoipa::path(
    put,
    path = "/cases/{id}",
    params(("id" = String, Path, description = "Case id")),
    request_body = UpdateCaseReq,
    responses(
        (status = 200, description = "Updated case", body = CaseDetailRes),
        (status = 400, description = "Invalid update or missing procedures", body = ErrorRes),
        (status = 403, description = "Not the owner", body = ErrorRes),
        (status = 404, description = "Unknown case", body = ErrorRes)
    )
)]
/// Full update. Same as `PATCH` except that the procedure list is required.
#[axum::debug_handler]
pub async fn replace_case(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateCaseReq>,
) -> ApiResult<Json<CaseDetailRes>> {
    let id = parse_case_id(&id)?;
    if req.procedures.is_none() {
        return Err(ApiError::bad_request(
            "procedures",
            "is required for a full update",
        ));
    }
    let update = CaseUpdate::try_from(req)?;
    let view = state.service.update_case(id, user, update)?;
    Ok(Json(view.into()))
}

#[utoipa::path(
    patch,
    path = "/cases/{id}",
    params(("id" = String, Path, description = "Case id")),
    request_body = UpdateCaseReq,
    responses(
        (status = 200, description = "Updated case", body = CaseDetailRes),
        (status = 400, description = "Invalid update", body = ErrorRes),
        (status = 403, description = "Not the owner", body = ErrorRes),
        (status = 404, description = "Unknown case", body = ErrorRes)
    )
)]
/// Partial update. Absent fields are kept and `null` clears optional ones.
///
/// The whole update is validated against the stored case before anything is written, so a
/// rejected request leaves the case untouched.
#[axum::debug_handler]
pub async fn patch_case(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateCaseReq>,
) -> ApiResult<Json<CaseDetailRes>> {
    let id = parse_case_id(&id)?;
    let update = CaseUpdate::try_from(req)?;
    let view = state.service.update_case(id, user, update)?;
    Ok(Json(view.into()))
}

#[utoipa::path(
    delete,
    path = "/cases/{id}",
    params(("id" = String, Path, description = "Case id")),
    responses(
        (status = 204, description = "Case deleted"),
        (status = 403, description = "Not the owner", body = ErrorRes),
        (status = 404, description = "Unknown case", body = ErrorRes),
        (status = 409, description = "Case cannot be deleted yet", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_case(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.service.delete_case(parse_case_id(&id)?, user)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/cases/stats",
    responses(
        (status = 200, description = "Statistics over the physician's own cases", body = CaseStatsRes)
    )
)]
#[axum::debug_handler]
pub async fn case_stats(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
) -> ApiResult<Json<CaseStatsRes>> {
    let mut stats = state.service.stats(user)?;
    let recent = std::mem::take(&mut stats.recent_cases)
        .into_iter()
        .map(|case| CaseSummaryRes::from(state.service.view(case, user)))
        .collect();
    Ok(Json(CaseStatsRes::new(stats, recent)))
}

#[utoipa::path(
    get,
    path = "/cases/assisted",
    responses(
        (status = 200, description = "Pending and accepted invitations", body = AssistedCasesRes)
    )
)]
#[axum::debug_handler]
pub async fn assisted_cases(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
) -> ApiResult<Json<AssistedCasesRes>> {
    let assisted = state.service.assisted_cases(user)?;
    let pending: Vec<CaseSummaryRes> = assisted.pending.into_iter().map(Into::into).collect();
    let accepted: Vec<CaseSummaryRes> = assisted.accepted.into_iter().map(Into::into).collect();
    Ok(Json(AssistedCasesRes {
        pending_count: pending.len(),
        accepted_count: accepted.len(),
        pending,
        accepted,
    }))
}

#[utoipa::path(
    post,
    path = "/cases/{id}/accept-invitation",
    params(("id" = String, Path, description = "Case id")),
    responses(
        (status = 200, description = "Invitation accepted (or already accepted)", body = InvitationRes),
        (status = 403, description = "Not the invited assistant", body = ErrorRes),
        (status = 404, description = "Unknown case", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn accept_invitation(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
    Path(id): Path<String>,
) -> ApiResult<Json<InvitationRes>> {
    let (response, view) = state.service.accept_invitation(parse_case_id(&id)?, user)?;
    Ok(Json(InvitationRes {
        message: response.message().into(),
        case: view.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/cases/{id}/reject-invitation",
    params(("id" = String, Path, description = "Case id")),
    responses(
        (status = 200, description = "Invitation rejected", body = InvitationRes),
        (status = 403, description = "Not the invited assistant", body = ErrorRes),
        (status = 404, description = "Unknown case", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn reject_invitation(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
    Path(id): Path<String>,
) -> ApiResult<Json<InvitationRes>> {
    let (response, view) = state.service.reject_invitation(parse_case_id(&id)?, user)?;
    Ok(Json(InvitationRes {
        message: response.message().into(),
        case: view.into(),
    }))
}

#[utoipa::path(
    patch,
    path = "/cases/{id}/status",
    params(("id" = String, Path, description = "Case id")),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Status changed", body = CaseDetailRes),
        (status = 400, description = "Unknown status value", body = ErrorRes),
        (status = 403, description = "Not the owner", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusReq>,
) -> ApiResult<Json<CaseDetailRes>> {
    let view = state
        .service
        .update_status(parse_case_id(&id)?, user, &req.status)?;
    Ok(Json(view.into()))
}

#[utoipa::path(
    put,
    path = "/cases/{id}/procedures",
    params(("id" = String, Path, description = "Case id")),
    request_body = ReplaceProceduresReq,
    responses(
        (status = 200, description = "Procedure list replaced", body = CaseDetailRes),
        (status = 400, description = "Empty or invalid procedure list", body = ErrorRes),
        (status = 403, description = "Not the owner", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn replace_procedures(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
    Path(id): Path<String>,
    Json(req): Json<ReplaceProceduresReq>,
) -> ApiResult<Json<CaseDetailRes>> {
    let items = req.procedures.into_iter().map(Into::into).collect();
    let view = state
        .service
        .replace_procedures(parse_case_id(&id)?, user, items)?;
    Ok(Json(view.into()))
}

#[utoipa::path(
    post,
    path = "/cases/{id}/procedures",
    params(("id" = String, Path, description = "Case id")),
    request_body = ProcedureReq,
    responses(
        (status = 201, description = "Procedure appended", body = AddProcedureRes),
        (status = 400, description = "Invalid procedure", body = ErrorRes),
        (status = 403, description = "Not the owner", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn add_procedure(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
    Path(id): Path<String>,
    Json(req): Json<ProcedureReq>,
) -> ApiResult<(StatusCode, Json<AddProcedureRes>)> {
    let (procedure_id, view) = state
        .service
        .add_procedure(parse_case_id(&id)?, user, req.into())?;
    Ok((
        StatusCode::CREATED,
        Json(AddProcedureRes {
            procedure_id: procedure_id.to_string(),
            case: view.into(),
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/cases/{id}/procedures/{procedure_id}",
    params(
        ("id" = String, Path, description = "Case id"),
        ("procedure_id" = String, Path, description = "Procedure line id")
    ),
    responses(
        (status = 200, description = "Procedure removed", body = CaseDetailRes),
        (status = 400, description = "Would leave the case without procedures", body = ErrorRes),
        (status = 404, description = "Unknown case or procedure", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn remove_procedure(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
    Path((id, procedure_id)): Path<(String, String)>,
) -> ApiResult<Json<CaseDetailRes>> {
    let procedure_id = ProcedureId::parse(procedure_id.trim())
        .map_err(|e| ApiError::bad_request("procedure_id", e.to_string()))?;
    let view = state
        .service
        .remove_procedure(parse_case_id(&id)?, user, procedure_id)?;
    Ok(Json(view.into()))
}

#[utoipa::path(
    get,
    path = "/calculator",
    params(QuoteQuery),
    responses(
        (status = 200, description = "Value of the RVU at the chosen factor", body = QuoteRes),
        (status = 400, description = "Invalid RVU or factor", body = ErrorRes),
        (status = 404, description = "Unknown hospital", body = ErrorRes)
    )
)]
/// Prices an RVU without storing anything.
///
/// The factor is the explicit `factor` when given, otherwise the hospital's multiplier,
/// otherwise the configured default.
#[axum::debug_handler]
pub async fn quote(
    State(state): State<AppState>,
    _key: ApiKeyGuard,
    Query(query): Query<QuoteQuery>,
) -> ApiResult<Json<QuoteRes>> {
    let hospital = query
        .hospital
        .as_deref()
        .filter(|h| !h.trim().is_empty())
        .map(|h| parse_hospital_id("hospital", h))
        .transpose()?;
    let quote = state.service.quote(query.rvu, hospital, query.factor)?;
    Ok(Json(quote.into()))
}
