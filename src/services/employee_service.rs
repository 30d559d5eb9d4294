// src/services/employee_service.rs

use chrono::{Datelike, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::{db_utils::UnitOfWork, error::AppError},
    db::{
        employee_repo::NewEmployee, AuditRepository, EmployeeRepository, LeaveRepository, RbacRepository,
        TenantRepository, UserRepository,
    },
    models::{
        audit::NewAuditEntry,
        employee::{CreateEmployeePayload, Employee, EmployeeQuery, EmployeeScope},
        rbac::EMPLOYEE_ROLE,
    },
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct EmployeeService {
    employee_repo: EmployeeRepository,
    user_repo: UserRepository,
    tenant_repo: TenantRepository,
    rbac_repo: RbacRepository,
    leave_repo: LeaveRepository,
    audit_repo: AuditRepository,
}

impl EmployeeService {
    pub fn new(
        employee_repo: EmployeeRepository,
        user_repo: UserRepository,
        tenant_repo: TenantRepository,
        rbac_repo: RbacRepository,
        leave_repo: LeaveRepository,
        audit_repo: AuditRepository,
    ) -> Self {
        Self { employee_repo, user_repo, tenant_repo, rbac_repo, leave_repo, audit_repo }
    }

    /// Cria login + colaborador, dá o cargo "Employee" e os saldos do ano.
    pub async fn create_employee(
        &self,
        mut tx: UnitOfWork,
        tenant_id: Uuid,
        payload: CreateEmployeePayload,
    ) -> Result<Employee, AppError> {
        // Hash antes de travar o tenant
        let password_hash = hash_password(&payload.password).await?;

        // 1. Limite do plano (linha do tenant travada até o commit)
        let tenant = self.tenant_repo.lock_tenant(&mut *tx, tenant_id).await?;
        let active = self.employee_repo.count_active(&mut *tx, tenant_id).await?;
        if active >= i64::from(tenant.max_employees) {
            return Err(AppError::conflict(format!(
                "Employee limit reached for this plan ({}).",
                tenant.max_employees
            )));
        }

        // 2. A filial precisa ser deste tenant
        self.tenant_repo
            .find_branch(&mut *tx, tenant_id, payload.branch_id)
            .await?
            .ok_or_else(|| AppError::bad_request("The selected branch does not exist."))?;

        if self.user_repo.email_exists(&mut *tx, &payload.email).await? {
            return Err(AppError::EmailAlreadyExists);
        }

        // 3. Usuário e colaborador
        let user = self
            .user_repo
            .create_user(&mut *tx, tenant_id, &payload.email, &password_hash)
            .await?;

        let employee = self
            .employee_repo
            .create_employee(
                &mut *tx,
                NewEmployee {
                    tenant_id,
                    branch_id: payload.branch_id,
                    user_id: user.id,
                    employee_code: &payload.employee_code,
                    full_name: &payload.full_name,
                    email: &payload.email,
                    department: payload.department.as_deref(),
                    designation: payload.designation.as_deref(),
                    joined_on: payload.joined_on.unwrap_or_else(|| Utc::now().date_naive()),
                    base_salary: payload.base_salary,
                },
            )
            .await?;

        // 4. Cargo padrão, se o tenant ainda o tiver
        if let Some(role) = self.rbac_repo.find_role_by_name(&mut *tx, tenant_id, EMPLOYEE_ROLE).await? {
            self.rbac_repo.assign_role_to_employee(&mut *tx, employee.id, role.id).await?;
        }

        // 5. Saldos do ano corrente
        let year = Utc::now().year();
        let allocated = self.leave_repo.allocate_defaults(&mut *tx, tenant_id, employee.id, year).await?;

        self.audit_repo
            .record(
                &mut *tx,
                NewAuditEntry {
                    tenant_id,
                    actor_user_id: None,
                    action: "EMPLOYEE_CREATED",
                    entity: "employee",
                    entity_id: Some(employee.id),
                    details: json!({
                        "employeeCode": employee.employee_code,
                        "branchId": employee.branch_id,
                        "leaveBalances": allocated,
                    }),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant_id, employee_id = %employee.id, "Colaborador criado");
        Ok(employee)
    }

    pub async fn list_employees(&self, tenant_id: Uuid, query: EmployeeQuery) -> Result<Vec<Employee>, AppError> {
        let scope = EmployeeScope {
            branch_id: query.branch_id,
            department: query.department,
            employee_id: None,
        };
        self.employee_repo.list(tenant_id, &scope, query.include_inactive).await
    }

    pub async fn get_employee(&self, tenant_id: Uuid, employee_id: Uuid) -> Result<Employee, AppError> {
        self.employee_repo
            .get(tenant_id, employee_id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee not found."))
    }
}
