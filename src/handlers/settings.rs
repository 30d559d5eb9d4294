// src/handlers/settings.rs

use axum::extract::State;

use crate::{
    common::{db_utils::begin_scoped, error::AppError, extract::ValidatedJson, response::ApiResponse},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermSettingsManage, RequirePermission},
        tenancy::TenantContext,
    },
    models::settings::{TenantSettings, UpdateSettingsRequest},
};

// GET /api/admin/settings
#[utoipa::path(
    get,
    path = "/api/admin/settings",
    tag = "Settings",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Configurações do tenant (ou padrões)", body = ApiResponse<TenantSettings>))
)]
pub async fn get_settings(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermSettingsManage>,
) -> Result<ApiResponse<TenantSettings>, AppError> {
    let settings = app_state.settings_service.get(tenant.tenant_id).await?;
    Ok(ApiResponse::ok("OK", settings))
}

// PUT /api/admin/settings
#[utoipa::path(
    put,
    path = "/api/admin/settings",
    tag = "Settings",
    security(("api_jwt" = [])),
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Configurações salvas", body = ApiResponse<TenantSettings>),
        (status = 400, description = "Valores fora da faixa")
    )
)]
pub async fn update_settings(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermSettingsManage>,
    ValidatedJson(payload): ValidatedJson<UpdateSettingsRequest>,
) -> Result<ApiResponse<TenantSettings>, AppError> {
    let tx = begin_scoped(&app_state, &tenant, &user).await?;
    let settings = app_state.settings_service.update(tx, tenant.tenant_id, payload).await?;
    Ok(ApiResponse::ok("Settings updated.", settings))
}
