// src/handlers/employees.rs

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
        rbac::{PermEmployeeManage, RequirePermission},
        tenancy::TenantContext,
    },
    models::employee::{CreateEmployeePayload, Employee, EmployeeQuery},
};

// POST /api/admin/employees
#[utoipa::path(
    post,
    path = "/api/admin/employees",
    tag = "Employees",
    security(("api_jwt" = [])),
    request_body = CreateEmployeePayload,
    responses(
        (status = 201, description = "Colaborador criado com login e saldos do ano", body = ApiResponse<Employee>),
        (status = 409, description = "E-mail ou código já usados, ou limite do plano")
    )
)]
pub async fn create_employee(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEmployeeManage>,
    ValidatedJson(payload): ValidatedJson<CreateEmployeePayload>,
) -> Result<ApiResponse<Employee>, AppError> {
    let tx = begin_scoped(&app_state, &tenant, &user).await?;
    let employee = app_state.employee_service.create_employee(tx, tenant.tenant_id, payload).await?;
    Ok(ApiResponse::created("Employee created.", employee))
}

// GET /api/admin/employees
#[utoipa::path(
    get,
    path = "/api/admin/employees",
    tag = "Employees",
    security(("api_jwt" = [])),
    params(EmployeeQuery),
    responses((status = 200, description = "Colaboradores do tenant", body = ApiResponse<Vec<Employee>>))
)]
pub async fn list_employees(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermEmployeeManage>,
    QueryParams(query): QueryParams<EmployeeQuery>,
) -> Result<ApiResponse<Vec<Employee>>, AppError> {
    let employees = app_state.employee_service.list_employees(tenant.tenant_id, query).await?;
    Ok(ApiResponse::ok("OK", employees))
}

// GET /api/admin/employees/{id}
#[utoipa::path(
    get,
    path = "/api/admin/employees/{id}",
    tag = "Employees",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID do colaborador")),
    responses(
        (status = 200, description = "Colaborador", body = ApiResponse<Employee>),
        (status = 404, description = "Não encontrado")
    )
)]
pub async fn get_employee(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermEmployeeManage>,
    Path(employee_id): Path<Uuid>,
) -> Result<ApiResponse<Employee>, AppError> {
    let employee = app_state.employee_service.get_employee(tenant.tenant_id, employee_id).await?;
    Ok(ApiResponse::ok("OK", employee))
}
