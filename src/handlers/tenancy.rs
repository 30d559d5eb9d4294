// src/handlers/tenancy.rs

use axum::extract::{Path, State};
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_scoped, error::AppError, extract::ValidatedJson, response::ApiResponse},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermBranchManage, RequirePermission},
        tenancy::TenantContext,
    },
    models::tenancy::{Branch, CreateBranchPayload, OnboardTenantPayload, OnboardingResult, RenewTenantPayload, Tenant},
};

// =============================================================================
//  PLATAFORMA (x-platform-key)
// =============================================================================

// POST /api/platform/tenants
#[utoipa::path(
    post,
    path = "/api/platform/tenants",
    tag = "Platform",
    security(("platform_key" = [])),
    request_body = OnboardTenantPayload,
    responses(
        (status = 201, description = "Tenant criado com filiais, admin, cargos, tipos de licença e configurações", body = ApiResponse<OnboardingResult>),
        (status = 401, description = "Chave de plataforma inválida"),
        (status = 409, description = "Lista de problemas; nada foi gravado")
    )
)]
pub async fn onboard_tenant(
    State(app_state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<OnboardTenantPayload>,
) -> Result<ApiResponse<OnboardingResult>, AppError> {
    let result = app_state.tenant_service.onboard(payload).await?;
    Ok(ApiResponse::created("Tenant onboarded.", result))
}

// GET /api/platform/tenants
#[utoipa::path(
    get,
    path = "/api/platform/tenants",
    tag = "Platform",
    security(("platform_key" = [])),
    responses((status = 200, description = "Todos os tenants", body = ApiResponse<Vec<Tenant>>))
)]
pub async fn list_tenants(State(app_state): State<AppState>) -> Result<ApiResponse<Vec<Tenant>>, AppError> {
    let tenants = app_state.tenant_service.list_tenants().await?;
    Ok(ApiResponse::ok("OK", tenants))
}

// POST /api/platform/tenants/{id}/renew
#[utoipa::path(
    post,
    path = "/api/platform/tenants/{id}/renew",
    tag = "Platform",
    security(("platform_key" = [])),
    params(("id" = Uuid, Path, description = "ID do tenant")),
    request_body = RenewTenantPayload,
    responses(
        (status = 200, description = "Assinatura renovada", body = ApiResponse<Tenant>),
        (status = 404, description = "Tenant não encontrado")
    )
)]
pub async fn renew_tenant(
    State(app_state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<RenewTenantPayload>,
) -> Result<ApiResponse<Tenant>, AppError> {
    let tenant = app_state.tenant_service.renew(tenant_id, payload).await?;
    Ok(ApiResponse::ok("Subscription renewed.", tenant))
}

// =============================================================================
//  FILIAIS (admin do tenant)
// =============================================================================

// POST /api/admin/branches
#[utoipa::path(
    post,
    path = "/api/admin/branches",
    tag = "Branches",
    security(("api_jwt" = [])),
    request_body = CreateBranchPayload,
    responses(
        (status = 201, description = "Filial criada", body = ApiResponse<Branch>),
        (status = 409, description = "Código repetido ou limite do plano")
    )
)]
pub async fn create_branch(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermBranchManage>,
    ValidatedJson(payload): ValidatedJson<CreateBranchPayload>,
) -> Result<ApiResponse<Branch>, AppError> {
    let tx = begin_scoped(&app_state, &tenant, &user).await?;
    let branch = app_state.tenant_service.create_branch(tx, tenant.tenant_id, payload).await?;
    Ok(ApiResponse::created("Branch created.", branch))
}

// GET /api/admin/branches
#[utoipa::path(
    get,
    path = "/api/admin/branches",
    tag = "Branches",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Filiais do tenant", body = ApiResponse<Vec<Branch>>))
)]
pub async fn list_branches(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermBranchManage>,
) -> Result<ApiResponse<Vec<Branch>>, AppError> {
    let branches = app_state.tenant_service.list_branches(tenant.tenant_id).await?;
    Ok(ApiResponse::ok("OK", branches))
}
