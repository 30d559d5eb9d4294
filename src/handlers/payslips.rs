// src/handlers/payslips.rs

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
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
        rbac::{PermPayslipGenerate, RequirePermission},
        tenancy::TenantContext,
    },
    models::payslip::{GeneratePayslipPayload, Payslip, PayslipQuery},
};

fn pdf_response(file_name: String, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)),
        ],
        bytes,
    )
        .into_response()
}

// GET /api/payslips
#[utoipa::path(
    get,
    path = "/api/payslips",
    tag = "Payslips",
    security(("api_jwt" = [])),
    params(PayslipQuery),
    responses((status = 200, description = "Holerites do colaborador", body = ApiResponse<Vec<Payslip>>))
)]
pub async fn my_payslips(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    QueryParams(query): QueryParams<PayslipQuery>,
) -> Result<ApiResponse<Vec<Payslip>>, AppError> {
    let payslips = app_state
        .payslip_service
        .list_own(tenant.tenant_id, user.employee_id, query)
        .await?;
    Ok(ApiResponse::ok("OK", payslips))
}

// GET /api/payslips/{id}/pdf
#[utoipa::path(
    get,
    path = "/api/payslips/{id}/pdf",
    tag = "Payslips",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID do holerite")),
    responses(
        (status = 200, description = "PDF do holerite", content_type = "application/pdf"),
        (status = 404, description = "Não encontrado ou de outro colaborador")
    )
)]
pub async fn download_my_payslip(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(payslip_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let (file_name, bytes) = app_state
        .payslip_service
        .render_pdf(tenant.tenant_id, payslip_id, Some(user.employee_id))
        .await?;
    Ok(pdf_response(file_name, bytes))
}

// POST /api/admin/payslips
#[utoipa::path(
    post,
    path = "/api/admin/payslips",
    tag = "Payslips",
    security(("api_jwt" = [])),
    request_body = GeneratePayslipPayload,
    responses(
        (status = 201, description = "Holerite gerado", body = ApiResponse<Payslip>),
        (status = 400, description = "Líquido negativo"),
        (status = 409, description = "Já existe holerite para o mês")
    )
)]
pub async fn generate_payslip(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermPayslipGenerate>,
    ValidatedJson(payload): ValidatedJson<GeneratePayslipPayload>,
) -> Result<ApiResponse<Payslip>, AppError> {
    let tx = begin_scoped(&app_state, &tenant, &user).await?;
    let payslip = app_state
        .payslip_service
        .generate(tx, tenant.tenant_id, user.employee_id, payload)
        .await?;
    Ok(ApiResponse::created("Payslip generated.", payslip))
}

// GET /api/admin/payslips
#[utoipa::path(
    get,
    path = "/api/admin/payslips",
    tag = "Payslips",
    security(("api_jwt" = [])),
    params(PayslipQuery),
    responses((status = 200, description = "Holerites do tenant", body = ApiResponse<Vec<Payslip>>))
)]
pub async fn list_payslips(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermPayslipGenerate>,
    QueryParams(query): QueryParams<PayslipQuery>,
) -> Result<ApiResponse<Vec<Payslip>>, AppError> {
    let payslips = app_state.payslip_service.list_all(tenant.tenant_id, query).await?;
    Ok(ApiResponse::ok("OK", payslips))
}

// GET /api/admin/payslips/{id}/pdf
#[utoipa::path(
    get,
    path = "/api/admin/payslips/{id}/pdf",
    tag = "Payslips",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID do holerite")),
    responses(
        (status = 200, description = "PDF do holerite", content_type = "application/pdf"),
        (status = 404, description = "Não encontrado")
    )
)]
pub async fn download_payslip(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermPayslipGenerate>,
    Path(payslip_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let (file_name, bytes) = app_state
        .payslip_service
        .render_pdf(tenant.tenant_id, payslip_id, None)
        .await?;
    Ok(pdf_response(file_name, bytes))
}
