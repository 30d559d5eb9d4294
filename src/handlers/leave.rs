// src/handlers/leave.rs

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
        rbac::{PermLeaveApprove, PermLeaveManage, RequirePermission},
        tenancy::TenantContext,
    },
    models::leave::{
        AllocateBalancePayload, BalanceQuery, CreateLeaveTypePayload, LeaveBalance, LeaveBalanceView, LeaveRequest,
        LeaveRequestQuery, LeaveRequestView, LeaveType, RejectLeavePayload, SubmitLeavePayload,
    },
};

// =============================================================================
//  COLABORADOR
// =============================================================================

// POST /api/leave/submit
#[utoipa::path(
    post,
    path = "/api/leave/submit",
    tag = "Leave",
    security(("api_jwt" = [])),
    request_body = SubmitLeavePayload,
    responses(
        (status = 201, description = "Pedido criado como Pending", body = ApiResponse<LeaveRequest>),
        (status = 400, description = "Saldo insuficiente, feriado no intervalo, sobreposição ou datas inválidas")
    )
)]
pub async fn submit_leave(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    ValidatedJson(payload): ValidatedJson<SubmitLeavePayload>,
) -> Result<ApiResponse<LeaveRequest>, AppError> {
    let tx = begin_scoped(&app_state, &tenant, &user).await?;
    let request = app_state
        .leave_service
        .submit(tx, tenant.tenant_id, user.employee_id, payload)
        .await?;
    Ok(ApiResponse::created("Leave request submitted.", request))
}

// GET /api/leave/requests
#[utoipa::path(
    get,
    path = "/api/leave/requests",
    tag = "Leave",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Pedidos do colaborador", body = ApiResponse<Vec<LeaveRequestView>>))
)]
pub async fn my_requests(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<ApiResponse<Vec<LeaveRequestView>>, AppError> {
    let requests = app_state.leave_service.my_requests(tenant.tenant_id, user.employee_id).await?;
    Ok(ApiResponse::ok("OK", requests))
}

// GET /api/leave/balance?year=
#[utoipa::path(
    get,
    path = "/api/leave/balance",
    tag = "Leave",
    security(("api_jwt" = [])),
    params(BalanceQuery),
    responses((status = 200, description = "Saldos do ano", body = ApiResponse<Vec<LeaveBalanceView>>))
)]
pub async fn my_balances(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    QueryParams(query): QueryParams<BalanceQuery>,
) -> Result<ApiResponse<Vec<LeaveBalanceView>>, AppError> {
    let balances = app_state
        .leave_service
        .balances(tenant.tenant_id, user.employee_id, query.year)
        .await?;
    Ok(ApiResponse::ok("OK", balances))
}

// GET /api/leave/types
#[utoipa::path(
    get,
    path = "/api/leave/types",
    tag = "Leave",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Tipos ativos", body = ApiResponse<Vec<LeaveType>>))
)]
pub async fn leave_types(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<ApiResponse<Vec<LeaveType>>, AppError> {
    let types = app_state.leave_service.types(tenant.tenant_id, true).await?;
    Ok(ApiResponse::ok("OK", types))
}

// =============================================================================
//  ADMIN
// =============================================================================

// GET /api/admin/leave/requests
#[utoipa::path(
    get,
    path = "/api/admin/leave/requests",
    tag = "Leave Admin",
    security(("api_jwt" = [])),
    params(LeaveRequestQuery),
    responses((status = 200, description = "Pedidos do tenant", body = ApiResponse<Vec<LeaveRequestView>>))
)]
pub async fn list_requests(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermLeaveApprove>,
    QueryParams(query): QueryParams<LeaveRequestQuery>,
) -> Result<ApiResponse<Vec<LeaveRequestView>>, AppError> {
    let requests = app_state.leave_service.list_requests(tenant.tenant_id, query).await?;
    Ok(ApiResponse::ok("OK", requests))
}

// POST /api/admin/leave/requests/{id}/approve
#[utoipa::path(
    post,
    path = "/api/admin/leave/requests/{id}/approve",
    tag = "Leave Admin",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Aprovado; dias saem de pending para used", body = ApiResponse<LeaveRequest>),
        (status = 400, description = "Pedido não pendente ou saldo insuficiente"),
        (status = 403, description = "Auto-aprovação ou fora da filial")
    )
)]
pub async fn approve_request(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermLeaveApprove>,
    Path(request_id): Path<Uuid>,
) -> Result<ApiResponse<LeaveRequest>, AppError> {
    let tx = begin_scoped(&app_state, &tenant, &user).await?;
    let request = app_state
        .leave_service
        .approve(tx, tenant.tenant_id, user.employee_id, request_id)
        .await?;
    Ok(ApiResponse::ok("Leave request approved.", request))
}

// POST /api/admin/leave/requests/{id}/reject
#[utoipa::path(
    post,
    path = "/api/admin/leave/requests/{id}/reject",
    tag = "Leave Admin",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID do pedido")),
    request_body = RejectLeavePayload,
    responses(
        (status = 200, description = "Rejeitado; pending liberado", body = ApiResponse<LeaveRequest>),
        (status = 400, description = "Motivo ausente ou pedido não pendente")
    )
)]
pub async fn reject_request(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermLeaveApprove>,
    Path(request_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<RejectLeavePayload>,
) -> Result<ApiResponse<LeaveRequest>, AppError> {
    let tx = begin_scoped(&app_state, &tenant, &user).await?;
    let request = app_state
        .leave_service
        .reject(tx, tenant.tenant_id, user.employee_id, request_id, payload)
        .await?;
    Ok(ApiResponse::ok("Leave request rejected.", request))
}

// GET /api/admin/leave/types
#[utoipa::path(
    get,
    path = "/api/admin/leave/types",
    tag = "Leave Admin",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Todos os tipos, inclusive inativos", body = ApiResponse<Vec<LeaveType>>))
)]
pub async fn list_all_types(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermLeaveManage>,
) -> Result<ApiResponse<Vec<LeaveType>>, AppError> {
    let types = app_state.leave_service.types(tenant.tenant_id, false).await?;
    Ok(ApiResponse::ok("OK", types))
}

// POST /api/admin/leave/types
#[utoipa::path(
    post,
    path = "/api/admin/leave/types",
    tag = "Leave Admin",
    security(("api_jwt" = [])),
    request_body = CreateLeaveTypePayload,
    responses(
        (status = 201, description = "Tipo criado", body = ApiResponse<LeaveType>),
        (status = 409, description = "Nome já existe")
    )
)]
pub async fn create_type(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermLeaveManage>,
    ValidatedJson(payload): ValidatedJson<CreateLeaveTypePayload>,
) -> Result<ApiResponse<LeaveType>, AppError> {
    let tx = begin_scoped(&app_state, &tenant, &user).await?;
    let leave_type = app_state.leave_service.create_type(tx, tenant.tenant_id, payload).await?;
    Ok(ApiResponse::created("Leave type created.", leave_type))
}

// PUT /api/admin/leave/balances
#[utoipa::path(
    put,
    path = "/api/admin/leave/balances",
    tag = "Leave Admin",
    security(("api_jwt" = [])),
    request_body = AllocateBalancePayload,
    responses(
        (status = 200, description = "Alocação gravada", body = ApiResponse<LeaveBalance>),
        (status = 400, description = "Abaixo de usado + pendente")
    )
)]
pub async fn allocate_balance(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermLeaveManage>,
    ValidatedJson(payload): ValidatedJson<AllocateBalancePayload>,
) -> Result<ApiResponse<LeaveBalance>, AppError> {
    let tx = begin_scoped(&app_state, &tenant, &user).await?;
    let balance = app_state.leave_service.allocate(tx, tenant.tenant_id, payload).await?;
    Ok(ApiResponse::ok("Leave balance allocated.", balance))
}
