// src/handlers/audit.rs

use axum::extract::State;

use crate::{
    common::{error::AppError, extract::QueryParams, response::ApiResponse},
    config::AppState,
    middleware::{
        rbac::{PermAuditRead, RequirePermission},
        tenancy::TenantContext,
    },
    models::audit::{AuditLog, AuditQuery},
};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

// GET /api/admin/audit-logs
#[utoipa::path(
    get,
    path = "/api/admin/audit-logs",
    tag = "Audit",
    security(("api_jwt" = [])),
    params(AuditQuery),
    responses((status = 200, description = "Eventos mais recentes primeiro", body = ApiResponse<Vec<AuditLog>>))
)]
pub async fn list_audit_logs(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermAuditRead>,
    QueryParams(query): QueryParams<AuditQuery>,
) -> Result<ApiResponse<Vec<AuditLog>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let logs = app_state
        .audit_repo
        .list(tenant.tenant_id, query.entity.as_deref(), limit)
        .await?;
    Ok(ApiResponse::ok("OK", logs))
}
