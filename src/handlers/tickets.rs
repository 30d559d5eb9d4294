// src/handlers/tickets.rs
// Reclamações e chamados técnicos. Mesmo serviço, `TicketKind` decide a tabela.

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
        rbac::{PermComplaintManage, PermTechIssueManage, RequirePermission},
        tenancy::TenantContext,
    },
    models::tickets::{CreateTicketPayload, Ticket, TicketKind, TicketQuery, UpdateTicketStatusPayload},
};

async fn create(
    app_state: AppState,
    user: AuthenticatedUser,
    tenant: TenantContext,
    kind: TicketKind,
    payload: CreateTicketPayload,
) -> Result<ApiResponse<Ticket>, AppError> {
    let tx = begin_scoped(&app_state, &tenant, &user).await?;
    let ticket = app_state
        .ticket_service
        .create(tx, kind, tenant.tenant_id, user.employee_id, payload)
        .await?;
    Ok(ApiResponse::created(format!("{} {} created.", kind.label(), ticket.code), ticket))
}

async fn update(
    app_state: AppState,
    user: AuthenticatedUser,
    tenant: TenantContext,
    kind: TicketKind,
    ticket_id: Uuid,
    payload: UpdateTicketStatusPayload,
) -> Result<ApiResponse<Ticket>, AppError> {
    let tx = begin_scoped(&app_state, &tenant, &user).await?;
    let ticket = app_state
        .ticket_service
        .update_status(tx, kind, tenant.tenant_id, user.employee_id, ticket_id, payload)
        .await?;
    Ok(ApiResponse::ok("Status updated.", ticket))
}

// --- Reclamações ---

// POST /api/complaints
#[utoipa::path(
    post,
    path = "/api/complaints",
    tag = "Complaints",
    security(("api_jwt" = [])),
    request_body = CreateTicketPayload,
    responses((status = 201, description = "Reclamação aberta", body = ApiResponse<Ticket>))
)]
pub async fn create_complaint(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    ValidatedJson(payload): ValidatedJson<CreateTicketPayload>,
) -> Result<ApiResponse<Ticket>, AppError> {
    create(app_state, user, tenant, TicketKind::Complaint, payload).await
}

// GET /api/complaints
#[utoipa::path(
    get,
    path = "/api/complaints",
    tag = "Complaints",
    security(("api_jwt" = [])),
    params(TicketQuery),
    responses((status = 200, description = "Reclamações do colaborador", body = ApiResponse<Vec<Ticket>>))
)]
pub async fn my_complaints(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    QueryParams(query): QueryParams<TicketQuery>,
) -> Result<ApiResponse<Vec<Ticket>>, AppError> {
    let tickets = app_state
        .ticket_service
        .list_own(TicketKind::Complaint, tenant.tenant_id, user.employee_id, query)
        .await?;
    Ok(ApiResponse::ok("OK", tickets))
}

// GET /api/admin/complaints
#[utoipa::path(
    get,
    path = "/api/admin/complaints",
    tag = "Complaints",
    security(("api_jwt" = [])),
    params(TicketQuery),
    responses((status = 200, description = "Reclamações do tenant", body = ApiResponse<Vec<Ticket>>))
)]
pub async fn list_complaints(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermComplaintManage>,
    QueryParams(query): QueryParams<TicketQuery>,
) -> Result<ApiResponse<Vec<Ticket>>, AppError> {
    let tickets = app_state.ticket_service.list_all(TicketKind::Complaint, tenant.tenant_id, query).await?;
    Ok(ApiResponse::ok("OK", tickets))
}

// PATCH /api/admin/complaints/{id}/status
#[utoipa::path(
    patch,
    path = "/api/admin/complaints/{id}/status",
    tag = "Complaints",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID da reclamação")),
    request_body = UpdateTicketStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = ApiResponse<Ticket>),
        (status = 400, description = "Transição inválida ou resolução ausente")
    )
)]
pub async fn update_complaint_status(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermComplaintManage>,
    Path(ticket_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateTicketStatusPayload>,
) -> Result<ApiResponse<Ticket>, AppError> {
    update(app_state, user, tenant, TicketKind::Complaint, ticket_id, payload).await
}

// --- Chamados técnicos ---

// POST /api/tech-issues
#[utoipa::path(
    post,
    path = "/api/tech-issues",
    tag = "Tech Issues",
    security(("api_jwt" = [])),
    request_body = CreateTicketPayload,
    responses((status = 201, description = "Chamado aberto", body = ApiResponse<Ticket>))
)]
pub async fn create_tech_issue(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    ValidatedJson(payload): ValidatedJson<CreateTicketPayload>,
) -> Result<ApiResponse<Ticket>, AppError> {
    create(app_state, user, tenant, TicketKind::TechIssue, payload).await
}

// GET /api/tech-issues
#[utoipa::path(
    get,
    path = "/api/tech-issues",
    tag = "Tech Issues",
    security(("api_jwt" = [])),
    params(TicketQuery),
    responses((status = 200, description = "Chamados do colaborador", body = ApiResponse<Vec<Ticket>>))
)]
pub async fn my_tech_issues(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    QueryParams(query): QueryParams<TicketQuery>,
) -> Result<ApiResponse<Vec<Ticket>>, AppError> {
    let tickets = app_state
        .ticket_service
        .list_own(TicketKind::TechIssue, tenant.tenant_id, user.employee_id, query)
        .await?;
    Ok(ApiResponse::ok("OK", tickets))
}

// GET /api/admin/tech-issues
#[utoipa::path(
    get,
    path = "/api/admin/tech-issues",
    tag = "Tech Issues",
    security(("api_jwt" = [])),
    params(TicketQuery),
    responses((status = 200, description = "Chamados do tenant", body = ApiResponse<Vec<Ticket>>))
)]
pub async fn list_tech_issues(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermTechIssueManage>,
    QueryParams(query): QueryParams<TicketQuery>,
) -> Result<ApiResponse<Vec<Ticket>>, AppError> {
    let tickets = app_state.ticket_service.list_all(TicketKind::TechIssue, tenant.tenant_id, query).await?;
    Ok(ApiResponse::ok("OK", tickets))
}

// PATCH /api/admin/tech-issues/{id}/status
#[utoipa::path(
    patch,
    path = "/api/admin/tech-issues/{id}/status",
    tag = "Tech Issues",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID do chamado")),
    request_body = UpdateTicketStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = ApiResponse<Ticket>),
        (status = 400, description = "Transição inválida, resolução ausente ou responsável inválido")
    )
)]
pub async fn update_tech_issue_status(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermTechIssueManage>,
    Path(ticket_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateTicketStatusPayload>,
) -> Result<ApiResponse<Ticket>, AppError> {
    update(app_state, user, tenant, TicketKind::TechIssue, ticket_id, payload).await
}
