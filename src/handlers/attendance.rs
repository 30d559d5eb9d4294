// src/handlers/attendance.rs
// Ponto do próprio colaborador.

use axum::extract::State;
use chrono::Utc;

use crate::{
    common::{
        db_utils::begin_scoped,
        error::AppError,
        extract::{QueryParams, ValidatedJson},
        response::ApiResponse,
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::attendance::{Attendance, AttendanceDay, CheckInPayload, CheckOutPayload, CurrentStatus, HistoryQuery},
};

// GET /api/attendance/current-status
#[utoipa::path(
    get,
    path = "/api/attendance/current-status",
    tag = "Attendance",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Situação de hoje (sem efeitos colaterais)", body = ApiResponse<CurrentStatus>))
)]
pub async fn current_status(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<ApiResponse<CurrentStatus>, AppError> {
    let status = app_state
        .attendance_service
        .current_status(tenant.tenant_id, user.employee_id, Utc::now())
        .await?;
    Ok(ApiResponse::ok("OK", status))
}

// POST /api/attendance/check-in
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    tag = "Attendance",
    security(("api_jwt" = [])),
    request_body = CheckInPayload,
    responses(
        (status = 201, description = "Entrada registrada", body = ApiResponse<Attendance>),
        (status = 400, description = "Already checked in today")
    )
)]
pub async fn check_in(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    ValidatedJson(payload): ValidatedJson<CheckInPayload>,
) -> Result<ApiResponse<Attendance>, AppError> {
    let tx = begin_scoped(&app_state, &tenant, &user).await?;
    let record = app_state
        .attendance_service
        .check_in(tx, tenant.tenant_id, user.employee_id, payload, Utc::now())
        .await?;
    Ok(ApiResponse::created("Checked in successfully.", record))
}

// POST /api/attendance/check-out
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    tag = "Attendance",
    security(("api_jwt" = [])),
    request_body = CheckOutPayload,
    responses(
        (status = 200, description = "Saída registrada", body = ApiResponse<Attendance>),
        (status = 400, description = "Must check in before checking out / Already checked out today")
    )
)]
pub async fn check_out(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    ValidatedJson(payload): ValidatedJson<CheckOutPayload>,
) -> Result<ApiResponse<Attendance>, AppError> {
    let tx = begin_scoped(&app_state, &tenant, &user).await?;
    let record = app_state
        .attendance_service
        .check_out(tx, tenant.tenant_id, user.employee_id, payload, Utc::now())
        .await?;
    Ok(ApiResponse::ok("Checked out successfully.", record))
}

// GET /api/attendance/history
#[utoipa::path(
    get,
    path = "/api/attendance/history",
    tag = "Attendance",
    security(("api_jwt" = [])),
    params(HistoryQuery),
    responses(
        (status = 200, description = "Status dia a dia", body = ApiResponse<Vec<AttendanceDay>>),
        (status = 400, description = "Data inválida")
    )
)]
pub async fn history(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    QueryParams(query): QueryParams<HistoryQuery>,
) -> Result<ApiResponse<Vec<AttendanceDay>>, AppError> {
    let days = app_state
        .attendance_service
        .history(tenant.tenant_id, user.employee_id, query, Utc::now())
        .await?;
    Ok(ApiResponse::ok("OK", days))
}
