// src/db/rbac_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::{map_unique_violation, AppError};
use crate::models::rbac::{Permission, Role};

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Para leituras fora de transação com os métodos genéricos.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // 1. Criar o Cargo
    pub async fn create_role<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (tenant_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, tenant_id, name, description, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, |_| AppError::conflict(format!("A role named '{}' already exists.", name))))
    }

    pub async fn find_role<'e, E>(&self, executor: E, tenant_id: Uuid, role_id: Uuid) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, tenant_id, name, description, created_at, updated_at FROM roles WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(role_id)
        .fetch_optional(executor)
        .await?;
        Ok(role)
    }

    pub async fn list_roles<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, tenant_id, name, description, created_at, updated_at FROM roles WHERE tenant_id = $1 ORDER BY name",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(roles)
    }

    // 2. Buscar permissões pelos slugs ("leave:approve" -> UUID)
    pub async fn find_permissions_by_slugs<'e, E>(
        &self,
        executor: E,
        slugs: &[String],
    ) -> Result<Vec<Permission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, slug, description, module FROM permissions WHERE slug = ANY($1) ORDER BY slug",
        )
        .bind(slugs)
        .fetch_all(executor)
        .await?;
        Ok(permissions)
    }

    // 3. Vincular Cargo <-> Permissão (inserção em massa com UNNEST)
    pub async fn assign_permissions<'e, E>(
        &self,
        executor: E,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            SELECT $1, unnest($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission_ids)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn clear_permissions<'e, E>(&self, executor: E, role_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn role_permission_slugs<'e, E>(&self, executor: E, role_id: Uuid) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slugs: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT p.slug
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = $1
            ORDER BY p.slug
            "#,
        )
        .bind(role_id)
        .fetch_all(executor)
        .await?;
        Ok(slugs)
    }

    // 4. Catálogo de permissões (para o frontend montar a tela)
    pub async fn list_all_permissions<'e, E>(&self, executor: E) -> Result<Vec<Permission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, slug, description, module FROM permissions ORDER BY module, slug",
        )
        .fetch_all(executor)
        .await?;
        Ok(permissions)
    }

    pub async fn assign_role_to_employee<'e, E>(
        &self,
        executor: E,
        employee_id: Uuid,
        role_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO employee_roles (employee_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(employee_id)
        .bind(role_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find_role_by_name<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
    ) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, tenant_id, name, description, created_at, updated_at FROM roles WHERE tenant_id = $1 AND name = $2",
        )
        .bind(tenant_id)
        .bind(name)
        .fetch_optional(executor)
        .await?;
        Ok(role)
    }

    pub async fn employee_role_names(&self, employee_id: Uuid) -> Result<Vec<String>, AppError> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT r.name
            FROM employee_roles er
            JOIN roles r ON r.id = er.role_id
            WHERE er.employee_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    pub async fn employee_permission_slugs(&self, employee_id: Uuid) -> Result<Vec<String>, AppError> {
        let slugs: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT p.slug
            FROM employee_roles er
            JOIN role_permissions rp ON rp.role_id = er.role_id
            JOIN permissions p ON p.id = rp.permission_id
            WHERE er.employee_id = $1
            ORDER BY p.slug
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(slugs)
    }

    pub async fn employee_has_role(&self, employee_id: Uuid, role_name: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM employee_roles er
                JOIN roles r ON r.id = er.role_id
                WHERE er.employee_id = $1 AND r.name = $2
            )
            "#,
        )
        .bind(employee_id)
        .bind(role_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn employee_has_permission(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        permission_slug: &str,
    ) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM employee_roles er
                JOIN roles r ON er.role_id = r.id
                JOIN role_permissions rp ON r.id = rp.role_id
                JOIN permissions p ON rp.permission_id = p.id
                WHERE er.employee_id = $1
                  AND r.tenant_id = $2
                  AND p.slug = $3
            )
            "#,
        )
        .bind(employee_id)
        .bind(tenant_id)
        .bind(permission_slug)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
