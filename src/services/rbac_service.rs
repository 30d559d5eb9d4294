// src/services/rbac_service.rs

use serde_json::json;
use uuid::Uuid;

use crate::{
    common::{db_utils::UnitOfWork, error::AppError},
    db::{AuditRepository, EmployeeRepository, RbacRepository},
    models::{
        audit::NewAuditEntry,
        rbac::{CreateRolePayload, Permission, RoleResponse},
    },
};

/// Slugs pedidos que não existem no catálogo.
pub fn unknown_slugs(requested: &[String], known: &[Permission]) -> Vec<String> {
    requested
        .iter()
        .filter(|slug| !known.iter().any(|p| &p.slug == *slug))
        .cloned()
        .collect()
}

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
    employee_repo: EmployeeRepository,
    audit_repo: AuditRepository,
}

impl RbacService {
    pub fn new(repo: RbacRepository, employee_repo: EmployeeRepository, audit_repo: AuditRepository) -> Self {
        Self { repo, employee_repo, audit_repo }
    }

    // Resolve slugs para IDs dentro da transação; slug desconhecido é erro.
    async fn resolve_permissions(&self, tx: &mut UnitOfWork, slugs: &[String]) -> Result<Vec<Permission>, AppError> {
        let permissions = self.repo.find_permissions_by_slugs(&mut **tx, slugs).await?;
        let unknown = unknown_slugs(slugs, &permissions);
        if !unknown.is_empty() {
            return Err(AppError::bad_request(format!("Unknown permissions: {}.", unknown.join(", "))));
        }
        Ok(permissions)
    }

    pub async fn create_role(
        &self,
        mut tx: UnitOfWork,
        tenant_id: Uuid,
        payload: CreateRolePayload,
    ) -> Result<RoleResponse, AppError> {
        // 1. Valida as permissões antes de criar qualquer coisa
        let permissions = self.resolve_permissions(&mut tx, &payload.permissions).await?;

        // 2. Cria o Cargo
        let role = self
            .repo
            .create_role(&mut *tx, tenant_id, payload.name.trim(), payload.description.as_deref())
            .await?;

        // 3. Salva o Vínculo
        let permission_ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();
        if !permission_ids.is_empty() {
            self.repo.assign_permissions(&mut *tx, role.id, &permission_ids).await?;
        }

        let slugs: Vec<String> = permissions.into_iter().map(|p| p.slug).collect();
        self.audit_repo
            .record(
                &mut *tx,
                NewAuditEntry {
                    tenant_id,
                    actor_user_id: None,
                    action: "ROLE_CREATED",
                    entity: "role",
                    entity_id: Some(role.id),
                    details: json!({ "name": role.name, "permissions": slugs }),
                },
            )
            .await?;

        // 4. Commit
        tx.commit().await?;

        Ok(RoleResponse { role, permissions: slugs })
    }

    pub async fn list_roles(&self, tenant_id: Uuid) -> Result<Vec<RoleResponse>, AppError> {
        let roles = self.repo.list_roles(self.repo.pool(), tenant_id).await?;
        let mut response = Vec::with_capacity(roles.len());
        for role in roles {
            let permissions = self.repo.role_permission_slugs(self.repo.pool(), role.id).await?;
            response.push(RoleResponse { role, permissions });
        }
        Ok(response)
    }

    /// Substitui o conjunto de permissões do cargo.
    pub async fn set_permissions(
        &self,
        mut tx: UnitOfWork,
        tenant_id: Uuid,
        role_id: Uuid,
        slugs: Vec<String>,
    ) -> Result<RoleResponse, AppError> {
        let role = self
            .repo
            .find_role(&mut *tx, tenant_id, role_id)
            .await?
            .ok_or_else(|| AppError::not_found("Role not found."))?;

        let permissions = self.resolve_permissions(&mut tx, &slugs).await?;

        self.repo.clear_permissions(&mut *tx, role.id).await?;
        let permission_ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();
        if !permission_ids.is_empty() {
            self.repo.assign_permissions(&mut *tx, role.id, &permission_ids).await?;
        }

        let slugs: Vec<String> = permissions.into_iter().map(|p| p.slug).collect();
        self.audit_repo
            .record(
                &mut *tx,
                NewAuditEntry {
                    tenant_id,
                    actor_user_id: None,
                    action: "ROLE_PERMISSIONS_REPLACED",
                    entity: "role",
                    entity_id: Some(role.id),
                    details: json!({ "permissions": slugs }),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(role_id = %role.id, "Permissões do cargo substituídas");
        Ok(RoleResponse { role, permissions: slugs })
    }

    pub async fn assign_role(
        &self,
        mut tx: UnitOfWork,
        tenant_id: Uuid,
        employee_id: Uuid,
        role_id: Uuid,
    ) -> Result<(), AppError> {
        let employee = self
            .employee_repo
            .find_by_id(&mut *tx, tenant_id, employee_id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee not found."))?;
        let role = self
            .repo
            .find_role(&mut *tx, tenant_id, role_id)
            .await?
            .ok_or_else(|| AppError::not_found("Role not found."))?;

        self.repo.assign_role_to_employee(&mut *tx, employee.id, role.id).await?;

        self.audit_repo
            .record(
                &mut *tx,
                NewAuditEntry {
                    tenant_id,
                    actor_user_id: None,
                    action: "ROLE_ASSIGNED",
                    entity: "employee",
                    entity_id: Some(employee.id),
                    details: json!({ "roleId": role.id, "role": role.name }),
                },
            )
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        self.repo.list_all_permissions(self.repo.pool()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permission(slug: &str) -> Permission {
        Permission { id: Uuid::new_v4(), slug: slug.into(), description: String::new(), module: "X".into() }
    }

    #[test]
    fn reports_slugs_missing_from_the_catalog() {
        let known = vec![permission("leave:approve"), permission("attendance:read")];
        let requested = vec!["leave:approve".to_string(), "loan:approve".to_string()];
        assert_eq!(unknown_slugs(&requested, &known), vec!["loan:approve".to_string()]);
        assert!(unknown_slugs(&[], &known).is_empty());
    }
}
