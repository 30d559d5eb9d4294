// src/handlers/reports.rs

use axum::extract::State;
use chrono::Utc;

use crate::{
    common::{error::AppError, extract::QueryParams, response::ApiResponse},
    config::AppState,
    middleware::{
        rbac::{PermAttendanceRead, RequirePermission},
        tenancy::TenantContext,
    },
    models::attendance::{DailyReport, DailyReportQuery, MonthlyReport, MonthlyReportQuery},
};

// GET /api/admin/attendance/daily
#[utoipa::path(
    get,
    path = "/api/admin/attendance/daily",
    tag = "Reports",
    security(("api_jwt" = [])),
    params(DailyReportQuery),
    responses(
        (status = 200, description = "Status resolvido de cada colaborador no dia", body = ApiResponse<DailyReport>),
        (status = 403, description = "Sem permissão attendance:read")
    )
)]
pub async fn daily_report(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermAttendanceRead>,
    QueryParams(query): QueryParams<DailyReportQuery>,
) -> Result<ApiResponse<DailyReport>, AppError> {
    let report = app_state.attendance_service.daily_report(tenant.tenant_id, query, Utc::now()).await?;
    Ok(ApiResponse::ok("OK", report))
}

// GET /api/admin/attendance/monthly?month=YYYY-MM
#[utoipa::path(
    get,
    path = "/api/admin/attendance/monthly",
    tag = "Reports",
    security(("api_jwt" = [])),
    params(MonthlyReportQuery),
    responses(
        (status = 200, description = "Consolidado do mês por colaborador", body = ApiResponse<MonthlyReport>),
        (status = 400, description = "Mês inválido")
    )
)]
pub async fn monthly_report(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermAttendanceRead>,
    QueryParams(query): QueryParams<MonthlyReportQuery>,
) -> Result<ApiResponse<MonthlyReport>, AppError> {
    let report = app_state.attendance_service.monthly_report(tenant.tenant_id, query, Utc::now()).await?;
    Ok(ApiResponse::ok("OK", report))
}
