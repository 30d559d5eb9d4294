// src/services/tenancy_service.rs

use std::collections::HashSet;

use chrono::{Datelike, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::UnitOfWork, error::AppError},
    db::{
        employee_repo::NewEmployee, AuditRepository, EmployeeRepository, LeaveRepository, RbacRepository,
        SettingsRepository, TenantRepository, UserRepository,
    },
    models::{
        audit::NewAuditEntry,
        leave::LeaveType,
        rbac::{default_roles, Permission, RoleResponse, SUPER_ADMIN_ROLE},
        settings::TenantSettings,
        tenancy::{
            Branch, CreateBranchPayload, OnboardLeaveTypePayload, OnboardRolePayload, OnboardTenantPayload,
            OnboardingResult, RenewTenantPayload, Tenant,
        },
    },
    services::auth::hash_password,
};

/// Regras do onboarding que não dependem de escrita. Devolve todos os problemas de uma vez.
pub fn validate_onboarding(
    payload: &OnboardTenantPayload,
    slug_taken: bool,
    email_taken: bool,
    known_permissions: &[String],
) -> Vec<String> {
    let mut problems = Vec::new();

    if slug_taken {
        problems.push(format!("Slug '{}' is already taken.", payload.slug));
    }

    if payload.branches.is_empty() {
        problems.push("At least one branch is required.".to_string());
    }
    if payload.branches.len() > payload.max_branches as usize {
        problems.push(format!(
            "{} branches exceed the plan limit of {}.",
            payload.branches.len(),
            payload.max_branches
        ));
    }

    let mut codes = HashSet::new();
    for branch in &payload.branches {
        if !codes.insert(branch.code.as_str()) {
            problems.push(format!("Branch code '{}' is repeated.", branch.code));
        }
    }

    if email_taken {
        problems.push(format!("E-mail '{}' is already in use.", payload.admin.email));
    }
    if !codes.contains(payload.admin.branch_code.as_str()) {
        problems.push(format!(
            "Admin branch code '{}' does not match any branch in the request.",
            payload.admin.branch_code
        ));
    }

    let mut role_names = HashSet::new();
    for role in &payload.roles {
        if !role_names.insert(role.name.trim().to_lowercase()) {
            problems.push(format!("Role '{}' is repeated.", role.name));
        }
        for slug in &role.permissions {
            if !known_permissions.contains(slug) {
                problems.push(format!("Role '{}' references unknown permission '{}'.", role.name, slug));
            }
        }
    }

    let mut type_names = HashSet::new();
    for leave_type in &payload.leave_types {
        if !type_names.insert(leave_type.name.trim().to_lowercase()) {
            problems.push(format!("Leave type '{}' is repeated.", leave_type.name));
        }
    }

    problems
}

/// Cargos do onboarding: os informados ou os padrões. O admin sempre recebe "Super Admin".
fn roles_to_create(payload: &OnboardTenantPayload, catalog: &[Permission]) -> Vec<OnboardRolePayload> {
    let all: Vec<String> = catalog.iter().map(|p| p.slug.clone()).collect();

    let mut roles: Vec<OnboardRolePayload> = if payload.roles.is_empty() {
        default_roles()
            .into_iter()
            .map(|(name, description, permissions)| OnboardRolePayload {
                name: name.to_string(),
                description: Some(description.to_string()),
                permissions: permissions
                    .map(|p| p.into_iter().map(String::from).collect())
                    .unwrap_or_else(|| all.clone()),
            })
            .collect()
    } else {
        payload.roles.clone()
    };

    if !roles.iter().any(|r| r.name == SUPER_ADMIN_ROLE) {
        roles.push(OnboardRolePayload {
            name: SUPER_ADMIN_ROLE.to_string(),
            description: Some("Full administrative access (generated at onboarding)".to_string()),
            permissions: all,
        });
    }
    roles
}

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    user_repo: UserRepository,
    employee_repo: EmployeeRepository,
    rbac_repo: RbacRepository,
    leave_repo: LeaveRepository,
    settings_repo: SettingsRepository,
    audit_repo: AuditRepository,
    pool: PgPool, // Usamos a pool para iniciar transações
}

impl TenantService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_repo: TenantRepository,
        user_repo: UserRepository,
        employee_repo: EmployeeRepository,
        rbac_repo: RbacRepository,
        leave_repo: LeaveRepository,
        settings_repo: SettingsRepository,
        audit_repo: AuditRepository,
        pool: PgPool,
    ) -> Self {
        Self { tenant_repo, user_repo, employee_repo, rbac_repo, leave_repo, settings_repo, audit_repo, pool }
    }

    /// Cria o tenant completo numa transação só. Qualquer falha desfaz tudo.
    pub async fn onboard(&self, payload: OnboardTenantPayload) -> Result<OnboardingResult, AppError> {
        // 1. Checagens antes de qualquer escrita
        let catalog = self.rbac_repo.list_all_permissions(&self.pool).await?;
        let known: Vec<String> = catalog.iter().map(|p| p.slug.clone()).collect();
        let slug_taken = self.tenant_repo.slug_exists(&self.pool, &payload.slug).await?;
        let email_taken = self.user_repo.email_exists(&self.pool, &payload.admin.email).await?;

        let problems = validate_onboarding(&payload, slug_taken, email_taken, &known);
        if !problems.is_empty() {
            tracing::warn!(slug = %payload.slug, ?problems, "Onboarding recusado");
            return Err(AppError::OnboardingRejected(problems));
        }

        let password_hash = hash_password(&payload.admin.password).await?;

        // 2. Escritas. Erros de regra passam; o resto vira falha genérica.
        let tx = self.pool.begin().await?;
        match self.write_tenant(tx, &payload, &catalog, &password_hash).await {
            Ok(result) => {
                tracing::info!(tenant_id = %result.tenant.id, slug = %result.tenant.slug, "Tenant criado");
                Ok(result)
            }
            Err(err @ (AppError::Conflict(_) | AppError::EmailAlreadyExists | AppError::BadRequest(_))) => Err(err),
            Err(err) => {
                tracing::error!(slug = %payload.slug, "Falha no onboarding: {:?}", err);
                Err(AppError::InternalServerError(anyhow::anyhow!("Tenant onboarding failed.")))
            }
        }
    }

    async fn write_tenant(
        &self,
        mut tx: UnitOfWork,
        payload: &OnboardTenantPayload,
        catalog: &[Permission],
        password_hash: &str,
    ) -> Result<OnboardingResult, AppError> {
        // Tenant
        let tenant = self
            .tenant_repo
            .create_tenant(
                &mut *tx,
                payload.name.trim(),
                &payload.slug,
                &payload.plan,
                payload.subscription_expires_at,
                payload.max_employees,
                payload.max_branches,
            )
            .await?;

        // Filiais
        let mut branches = Vec::with_capacity(payload.branches.len());
        for branch in &payload.branches {
            branches.push(
                self.tenant_repo
                    .create_branch(&mut *tx, tenant.id, branch.name.trim(), &branch.code, branch.address.as_deref())
                    .await?,
            );
        }
        let admin_branch = branches
            .iter()
            .find(|b| b.code == payload.admin.branch_code)
            .ok_or_else(|| AppError::bad_request("Admin branch code does not match any branch."))?;

        // Admin: usuário + colaborador
        let admin = &payload.admin;
        let user = self.user_repo.create_user(&mut *tx, tenant.id, &admin.email, password_hash).await?;
        let employee = self
            .employee_repo
            .create_employee(
                &mut *tx,
                NewEmployee {
                    tenant_id: tenant.id,
                    branch_id: admin_branch.id,
                    user_id: user.id,
                    employee_code: &admin.employee_code,
                    full_name: admin.full_name.trim(),
                    email: &admin.email,
                    department: admin.department.as_deref(),
                    designation: admin.designation.as_deref(),
                    joined_on: Utc::now().date_naive(),
                    base_salary: Default::default(),
                },
            )
            .await?;

        // Cargos e vínculos
        let mut roles = Vec::new();
        for role_def in roles_to_create(payload, catalog) {
            let role = self
                .rbac_repo
                .create_role(&mut *tx, tenant.id, role_def.name.trim(), role_def.description.as_deref())
                .await?;
            let ids: Vec<Uuid> = catalog
                .iter()
                .filter(|p| role_def.permissions.contains(&p.slug))
                .map(|p| p.id)
                .collect();
            if !ids.is_empty() {
                self.rbac_repo.assign_permissions(&mut *tx, role.id, &ids).await?;
            }
            if role.name == SUPER_ADMIN_ROLE {
                self.rbac_repo.assign_role_to_employee(&mut *tx, employee.id, role.id).await?;
            }
            roles.push(RoleResponse { role, permissions: role_def.permissions });
        }

        // Tipos de licença e saldos do admin
        let leave_defs = if payload.leave_types.is_empty() {
            OnboardLeaveTypePayload::defaults()
        } else {
            payload.leave_types.clone()
        };
        let mut leave_types: Vec<LeaveType> = Vec::with_capacity(leave_defs.len());
        for leave_def in &leave_defs {
            leave_types.push(
                self.leave_repo
                    .create_type(
                        &mut *tx,
                        tenant.id,
                        leave_def.name.trim(),
                        leave_def.max_days_per_year,
                        leave_def.is_paid,
                        leave_def.requires_approval,
                    )
                    .await?,
            );
        }
        self.leave_repo
            .allocate_defaults(&mut *tx, tenant.id, employee.id, Utc::now().year())
            .await?;

        // Configurações
        let settings = match &payload.settings {
            Some(input) => TenantSettings::defaults(tenant.id).merged_with(input),
            None => TenantSettings::defaults(tenant.id),
        };
        let settings = self.settings_repo.upsert_settings(&mut *tx, &settings).await?;

        self.audit_repo
            .record(
                &mut *tx,
                NewAuditEntry {
                    tenant_id: tenant.id,
                    actor_user_id: Some(user.id),
                    action: "TENANT_ONBOARDED",
                    entity: "tenant",
                    entity_id: Some(tenant.id),
                    details: json!({
                        "slug": tenant.slug,
                        "plan": tenant.plan,
                        "branches": branches.len(),
                        "roles": roles.iter().map(|r| r.role.name.clone()).collect::<Vec<_>>(),
                        "leaveTypes": leave_types.len(),
                        "adminEmployeeId": employee.id,
                    }),
                },
            )
            .await?;

        tx.commit().await?;

        Ok(OnboardingResult {
            tenant,
            branches,
            admin_user_id: user.id,
            admin_employee_id: employee.id,
            roles,
            leave_types,
            settings,
        })
    }

    pub async fn list_tenants(&self) -> Result<Vec<Tenant>, AppError> {
        self.tenant_repo.list_tenants().await
    }

    /// Renovação de assinatura (plano, validade, limites, ativação).
    pub async fn renew(&self, tenant_id: Uuid, payload: RenewTenantPayload) -> Result<Tenant, AppError> {
        let mut tx = self.pool.begin().await?;

        let tenant = self
            .tenant_repo
            .renew(
                &mut *tx,
                tenant_id,
                &payload.plan,
                payload.subscription_expires_at,
                payload.max_employees,
                payload.max_branches,
                payload.is_active,
            )
            .await?
            .ok_or_else(|| AppError::not_found("Tenant not found."))?;

        self.audit_repo
            .record(
                &mut *tx,
                NewAuditEntry {
                    tenant_id,
                    actor_user_id: None,
                    action: "TENANT_RENEWED",
                    entity: "tenant",
                    entity_id: Some(tenant_id),
                    details: json!({
                        "plan": tenant.plan,
                        "subscriptionExpiresAt": tenant.subscription_expires_at,
                        "isActive": tenant.is_active,
                    }),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant_id, expires = %tenant.subscription_expires_at, "Assinatura renovada");
        Ok(tenant)
    }

    pub async fn create_branch(
        &self,
        mut tx: UnitOfWork,
        tenant_id: Uuid,
        payload: CreateBranchPayload,
    ) -> Result<Branch, AppError> {
        // Linha do tenant travada: duas criações simultâneas não furam o limite
        let tenant = self.tenant_repo.lock_tenant(&mut *tx, tenant_id).await?;
        let count = self.tenant_repo.count_branches(&mut *tx, tenant_id).await?;
        if count >= i64::from(tenant.max_branches) {
            return Err(AppError::conflict(format!(
                "Branch limit reached for this plan ({}).",
                tenant.max_branches
            )));
        }

        let branch = self
            .tenant_repo
            .create_branch(&mut *tx, tenant_id, payload.name.trim(), &payload.code, payload.address.as_deref())
            .await?;

        self.audit_repo
            .record(
                &mut *tx,
                NewAuditEntry {
                    tenant_id,
                    actor_user_id: None,
                    action: "BRANCH_CREATED",
                    entity: "branch",
                    entity_id: Some(branch.id),
                    details: json!({ "code": branch.code, "name": branch.name }),
                },
            )
            .await?;

        tx.commit().await?;
        Ok(branch)
    }

    pub async fn list_branches(&self, tenant_id: Uuid) -> Result<Vec<Branch>, AppError> {
        self.tenant_repo.list_branches(&self.pool, tenant_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tenancy::OnboardAdminPayload;
    use chrono::Duration;

    fn branch(code: &str) -> CreateBranchPayload {
        CreateBranchPayload { name: format!("Branch {code}"), code: code.into(), address: None }
    }

    fn payload() -> OnboardTenantPayload {
        OnboardTenantPayload {
            name: "Acme Bank".into(),
            slug: "acme-bank".into(),
            plan: "PROFESSIONAL".into(),
            subscription_expires_at: Utc::now() + Duration::days(365),
            max_employees: 50,
            max_branches: 2,
            branches: vec![branch("HQ"), branch("BR-01")],
            admin: OnboardAdminPayload {
                full_name: "Ana Souza".into(),
                email: "ana@acme.test".into(),
                password: "s3cret-pass".into(),
                employee_code: "EMP-001".into(),
                branch_code: "HQ".into(),
                department: None,
                designation: None,
            },
            roles: vec![],
            leave_types: vec![],
            settings: None,
        }
    }

    fn catalog() -> Vec<String> {
        vec!["leave:approve".into(), "attendance:read".into()]
    }

    #[test]
    fn clean_request_has_no_problems() {
        assert!(validate_onboarding(&payload(), false, false, &catalog()).is_empty());
    }

    #[test]
    fn collects_every_problem() {
        let mut p = payload();
        p.branches.push(branch("HQ"));
        p.admin.branch_code = "NOPE".into();
        p.roles = vec![
            OnboardRolePayload { name: "Teller".into(), description: None, permissions: vec!["loan:approve".into()] },
            OnboardRolePayload { name: "teller".into(), description: None, permissions: vec![] },
        ];

        let problems = validate_onboarding(&p, true, true, &catalog());
        assert_eq!(problems.len(), 7, "{problems:?}");
        assert!(problems.iter().any(|m| m.contains("already taken")));
        assert!(problems.iter().any(|m| m.contains("exceed the plan limit")));
        assert!(problems.iter().any(|m| m.contains("'HQ' is repeated")));
        assert!(problems.iter().any(|m| m.contains("already in use")));
        assert!(problems.iter().any(|m| m.contains("'NOPE'")));
        assert!(problems.iter().any(|m| m.contains("unknown permission 'loan:approve'")));
        assert!(problems.iter().any(|m| m.contains("Role 'teller' is repeated")));

        let mut q = payload();
        q.roles = p.roles.clone();
        assert!(validate_onboarding(&q, false, false, &catalog()).iter().any(|m| m.contains("Role 'teller' is repeated")));
    }

    #[test]
    fn requires_a_branch() {
        let mut p = payload();
        p.branches.clear();
        let problems = validate_onboarding(&p, false, false, &catalog());
        assert!(problems.iter().any(|m| m == "At least one branch is required."));
    }

    #[test]
    fn default_roles_always_include_super_admin() {
        let perms: Vec<Permission> = catalog()
            .into_iter()
            .map(|slug| Permission { id: Uuid::new_v4(), slug, description: String::new(), module: "X".into() })
            .collect();

        let roles = roles_to_create(&payload(), &perms);
        let admin = roles.iter().find(|r| r.name == SUPER_ADMIN_ROLE).unwrap();
        assert_eq!(admin.permissions.len(), 2);

        let mut custom = payload();
        custom.roles = vec![OnboardRolePayload { name: "Teller".into(), description: None, permissions: vec![] }];
        let roles = roles_to_create(&custom, &perms);
        assert_eq!(roles.len(), 2);
        assert!(roles.iter().any(|r| r.name == SUPER_ADMIN_ROLE));
    }

    // --- Com banco (DATABASE_URL) ---

    fn service(pool: &PgPool) -> TenantService {
        crate::config::AppState::from_pool(pool.clone(), crate::config::AppConfig::for_tests()).tenant_service
    }

    #[sqlx::test]
    #[ignore = "requer PostgreSQL em DATABASE_URL"]
    async fn onboarding_creates_the_whole_footprint(pool: PgPool) {
        let result = service(&pool).onboard(payload()).await.unwrap();

        assert_eq!(result.branches.len(), 2);
        assert_eq!(result.leave_types.len(), 3);
        assert!(result.roles.iter().any(|r| r.role.name == SUPER_ADMIN_ROLE));

        let balances: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leave_balances WHERE employee_id = $1")
            .bind(result.admin_employee_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(balances, 3);
    }

    #[sqlx::test]
    #[ignore = "requer PostgreSQL em DATABASE_URL"]
    async fn onboarding_with_existing_admin_email_persists_nothing(pool: PgPool) {
        let svc = service(&pool);
        svc.onboard(payload()).await.unwrap();

        let mut second = payload();
        second.slug = "other-bank".into();
        second.name = "Other Bank".into();

        let err = svc.onboard(second).await.unwrap_err();
        assert!(matches!(err, AppError::OnboardingRejected(ref p) if p.iter().any(|m| m.contains("already in use"))));

        let tenants: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenants")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(tenants, 1);
        assert!(!svc.tenant_repo.slug_exists(&pool, "other-bank").await.unwrap());
    }
}
