// src/services/payslip_service.rs

use serde_json::json;
use uuid::Uuid;

use crate::{
    common::{db_utils::UnitOfWork, error::AppError},
    db::{payslip_repo::NewPayslip, AuditRepository, EmployeeRepository, PayslipRepository, SettingsRepository, TenantRepository},
    models::{
        audit::NewAuditEntry,
        payslip::{GeneratePayslipPayload, PayTotals, Payslip, PayslipQuery},
    },
    services::document_service::{DocumentService, PayslipDocument},
};

#[derive(Clone)]
pub struct PayslipService {
    payslip_repo: PayslipRepository,
    employee_repo: EmployeeRepository,
    tenant_repo: TenantRepository,
    settings_repo: SettingsRepository,
    audit_repo: AuditRepository,
    document_service: DocumentService,
}

impl PayslipService {
    pub fn new(
        payslip_repo: PayslipRepository,
        employee_repo: EmployeeRepository,
        tenant_repo: TenantRepository,
        settings_repo: SettingsRepository,
        audit_repo: AuditRepository,
        document_service: DocumentService,
    ) -> Self {
        Self { payslip_repo, employee_repo, tenant_repo, settings_repo, audit_repo, document_service }
    }

    pub async fn generate(
        &self,
        mut tx: UnitOfWork,
        tenant_id: Uuid,
        generated_by: Uuid,
        payload: GeneratePayslipPayload,
    ) -> Result<Payslip, AppError> {
        let employee = self
            .employee_repo
            .find_by_id(&mut *tx, tenant_id, payload.employee_id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee not found."))?;

        let basic_salary = payload.basic_salary.unwrap_or(employee.base_salary);
        let totals = PayTotals::compute(basic_salary, &payload.earnings, &payload.deductions);
        if totals.net_pay.is_sign_negative() {
            return Err(AppError::bad_request("Deductions cannot exceed the gross pay."));
        }

        let payslip = self
            .payslip_repo
            .create(
                &mut *tx,
                NewPayslip {
                    tenant_id,
                    employee_id: employee.id,
                    month: payload.month,
                    year: payload.year,
                    basic_salary,
                    earnings: &payload.earnings,
                    deductions: &payload.deductions,
                    totals,
                    generated_by,
                },
            )
            .await?;

        self.audit_repo
            .record(
                &mut *tx,
                NewAuditEntry {
                    tenant_id,
                    actor_user_id: None,
                    action: "PAYSLIP_GENERATED",
                    entity: "payslip",
                    entity_id: Some(payslip.id),
                    details: json!({
                        "employeeId": employee.id,
                        "period": format!("{:04}-{:02}", payslip.year, payslip.month),
                        "netPay": payslip.net_pay,
                    }),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(employee_id = %employee.id, payslip_id = %payslip.id, "Holerite gerado");
        Ok(payslip)
    }

    pub async fn list_own(&self, tenant_id: Uuid, employee_id: Uuid, query: PayslipQuery) -> Result<Vec<Payslip>, AppError> {
        let query = PayslipQuery { employee_id: Some(employee_id), ..query };
        self.payslip_repo.list(tenant_id, &query).await
    }

    pub async fn list_all(&self, tenant_id: Uuid, query: PayslipQuery) -> Result<Vec<Payslip>, AppError> {
        self.payslip_repo.list(tenant_id, &query).await
    }

    /// PDF do holerite. Com `owner`, só devolve se o holerite for dele.
    pub async fn render_pdf(
        &self,
        tenant_id: Uuid,
        payslip_id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<(String, Vec<u8>), AppError> {
        let payslip = self
            .payslip_repo
            .find(tenant_id, payslip_id)
            .await?
            .filter(|p| owner.is_none_or(|o| o == p.employee_id))
            .ok_or_else(|| AppError::not_found("Payslip not found."))?;

        let employee = self
            .employee_repo
            .get(tenant_id, payslip.employee_id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee not found."))?;
        let tenant = self
            .tenant_repo
            .find_by_id(tenant_id)
            .await?
            .ok_or_else(|| AppError::not_found("Organization not found."))?;
        let settings = self.settings_repo.get_or_default(tenant_id).await?;

        let document = PayslipDocument {
            tenant_name: tenant.name,
            tenant_slug: tenant.slug,
            employee_name: employee.full_name,
            employee_code: employee.employee_code,
            department: employee.department,
            designation: employee.designation,
            currency: settings.currency,
            footer: settings.payslip_footer,
            payslip,
        };

        let service = self.document_service.clone();
        let file_name = document.file_name();
        let bytes = tokio::task::spawn_blocking(move || service.render_payslip(&document))
            .await
            .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("Renderização do PDF falhou: {}", e)))??;

        Ok((file_name, bytes))
    }
}
