// src/handlers/rbac.rs

use axum::extract::{Path, State};
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_scoped, error::AppError, extract::ValidatedJson, response::ApiResponse},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermRoleManage, RequirePermission},
        tenancy::TenantContext,
    },
    models::rbac::{AssignRolePayload, CreateRolePayload, Permission, RoleResponse, SetRolePermissionsPayload},
};

// GET /api/admin/roles
#[utoipa::path(
    get,
    path = "/api/admin/roles",
    tag = "RBAC",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Cargos do tenant com suas permissões", body = ApiResponse<Vec<RoleResponse>>))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermRoleManage>,
) -> Result<ApiResponse<Vec<RoleResponse>>, AppError> {
    let roles = app_state.rbac_service.list_roles(tenant.tenant_id).await?;
    Ok(ApiResponse::ok("OK", roles))
}

// POST /api/admin/roles
#[utoipa::path(
    post,
    path = "/api/admin/roles",
    tag = "RBAC",
    security(("api_jwt" = [])),
    request_body = CreateRolePayload,
    responses(
        (status = 201, description = "Cargo criado", body = ApiResponse<RoleResponse>),
        (status = 400, description = "Permissão desconhecida"),
        (status = 409, description = "Nome já existe")
    )
)]
pub async fn create_role(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermRoleManage>,
    ValidatedJson(payload): ValidatedJson<CreateRolePayload>,
) -> Result<ApiResponse<RoleResponse>, AppError> {
    let tx = begin_scoped(&app_state, &tenant, &user).await?;
    let role = app_state.rbac_service.create_role(tx, tenant.tenant_id, payload).await?;
    Ok(ApiResponse::created("Role created.", role))
}

// PUT /api/admin/roles/{id}/permissions
#[utoipa::path(
    put,
    path = "/api/admin/roles/{id}/permissions",
    tag = "RBAC",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID do cargo")),
    request_body = SetRolePermissionsPayload,
    responses(
        (status = 200, description = "Permissões substituídas", body = ApiResponse<RoleResponse>),
        (status = 400, description = "Permissão desconhecida"),
        (status = 404, description = "Cargo não encontrado")
    )
)]
pub async fn set_role_permissions(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermRoleManage>,
    Path(role_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SetRolePermissionsPayload>,
) -> Result<ApiResponse<RoleResponse>, AppError> {
    let tx = begin_scoped(&app_state, &tenant, &user).await?;
    let role = app_state
        .rbac_service
        .set_permissions(tx, tenant.tenant_id, role_id, payload.permissions)
        .await?;
    Ok(ApiResponse::ok("Role permissions updated.", role))
}

// POST /api/admin/employees/{id}/roles
#[utoipa::path(
    post,
    path = "/api/admin/employees/{id}/roles",
    tag = "RBAC",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID do colaborador")),
    request_body = AssignRolePayload,
    responses(
        (status = 200, description = "Cargo atribuído"),
        (status = 404, description = "Colaborador ou cargo não encontrado")
    )
)]
pub async fn assign_role(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermRoleManage>,
    Path(employee_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<AssignRolePayload>,
) -> Result<ApiResponse<()>, AppError> {
    let tx = begin_scoped(&app_state, &tenant, &user).await?;
    app_state
        .rbac_service
        .assign_role(tx, tenant.tenant_id, employee_id, payload.role_id)
        .await?;
    Ok(ApiResponse::message("Role assigned."))
}

// GET /api/admin/permissions (catálogo para a tela de cargos)
#[utoipa::path(
    get,
    path = "/api/admin/permissions",
    tag = "RBAC",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Catálogo de permissões", body = ApiResponse<Vec<Permission>>))
)]
pub async fn list_permissions(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRoleManage>,
) -> Result<ApiResponse<Vec<Permission>>, AppError> {
    let permissions = app_state.rbac_service.list_permissions().await?;
    Ok(ApiResponse::ok("OK", permissions))
}
