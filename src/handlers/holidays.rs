// src/handlers/holidays.rs

use axum::extract::{Path, State};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::begin_scoped,
        error::AppError,
        extract::{QueryParams, ValidatedJson},
        response::ApiResponse,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermHolidayManage, RequirePermission},
        tenancy::TenantContext,
    },
    models::holiday::{CreateHolidayPayload, Holiday, HolidayQuery},
};

// GET /api/holidays
// Qualquer colaborador pode consultar o calendário.
#[utoipa::path(
    get,
    path = "/api/holidays",
    tag = "Holidays",
    security(("api_jwt" = [])),
    params(HolidayQuery),
    responses((status = 200, description = "Feriados do tenant", body = ApiResponse<Vec<Holiday>>))
)]
pub async fn list_holidays(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    QueryParams(query): QueryParams<HolidayQuery>,
) -> Result<ApiResponse<Vec<Holiday>>, AppError> {
    let holidays = app_state.holiday_service.list(tenant.tenant_id, query).await?;
    Ok(ApiResponse::ok("OK", holidays))
}

// POST /api/admin/holidays
#[utoipa::path(
    post,
    path = "/api/admin/holidays",
    tag = "Holidays",
    security(("api_jwt" = [])),
    request_body = CreateHolidayPayload,
    responses(
        (status = 201, description = "Feriado criado", body = ApiResponse<Holiday>),
        (status = 409, description = "Já existe feriado nessa data")
    )
)]
pub async fn create_holiday(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermHolidayManage>,
    ValidatedJson(payload): ValidatedJson<CreateHolidayPayload>,
) -> Result<ApiResponse<Holiday>, AppError> {
    let tx = begin_scoped(&app_state, &tenant, &user).await?;
    let holiday = app_state.holiday_service.create(tx, tenant.tenant_id, payload).await?;
    Ok(ApiResponse::created("Holiday created.", holiday))
}

// DELETE /api/admin/holidays/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/holidays/{id}",
    tag = "Holidays",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID do feriado")),
    responses(
        (status = 200, description = "Feriado removido"),
        (status = 404, description = "Não encontrado")
    )
)]
pub async fn delete_holiday(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermHolidayManage>,
    Path(holiday_id): Path<Uuid>,
) -> Result<ApiResponse<()>, AppError> {
    let tx = begin_scoped(&app_state, &tenant, &user).await?;
    app_state.holiday_service.delete(tx, tenant.tenant_id, holiday_id).await?;
    Ok(ApiResponse::message("Holiday deleted."))
}
