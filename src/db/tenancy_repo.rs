// src/db/tenancy_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::{map_unique_violation, AppError};
use crate::models::tenancy::{Branch, Tenant};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tenant)
    }

    pub async fn list_tenants(&self) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(tenants)
    }

    pub async fn slug_exists<'e, E>(&self, executor: E, slug: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tenants WHERE slug = $1)")
            .bind(slug)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    /// Cria o tenant (organização) na base de dados.
    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        name: &str,
        slug: &str,
        plan: &str,
        subscription_expires_at: DateTime<Utc>,
        max_employees: i32,
        max_branches: i32,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, slug, plan, subscription_expires_at, max_employees, max_branches)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(plan)
        .bind(subscription_expires_at)
        .bind(max_employees)
        .bind(max_branches)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, |_| AppError::conflict(format!("Slug '{}' is already taken.", slug))))
    }

    pub async fn renew<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        plan: &str,
        subscription_expires_at: DateTime<Utc>,
        max_employees: Option<i32>,
        max_branches: Option<i32>,
        is_active: Option<bool>,
    ) -> Result<Option<Tenant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            UPDATE tenants SET
                plan = $2,
                subscription_expires_at = $3,
                max_employees = COALESCE($4, max_employees),
                max_branches = COALESCE($5, max_branches),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(plan)
        .bind(subscription_expires_at)
        .bind(max_employees)
        .bind(max_branches)
        .bind(is_active)
        .fetch_optional(executor)
        .await?;
        Ok(tenant)
    }

    // =========================================================================
    //  FILIAIS
    // =========================================================================

    pub async fn create_branch<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        code: &str,
        address: Option<&str>,
    ) -> Result<Branch, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Branch>(
            r#"
            INSERT INTO branches (tenant_id, name, code, address)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(code)
        .bind(address)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, |_| AppError::conflict(format!("Branch code '{}' already exists.", code))))
    }

    pub async fn list_branches<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Branch>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let branches = sqlx::query_as::<_, Branch>(
            "SELECT * FROM branches WHERE tenant_id = $1 ORDER BY code",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(branches)
    }

    pub async fn find_branch<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        branch_id: Uuid,
    ) -> Result<Option<Branch>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let branch = sqlx::query_as::<_, Branch>("SELECT * FROM branches WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(branch_id)
            .fetch_optional(executor)
            .await?;
        Ok(branch)
    }

    pub async fn count_branches<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM branches WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    /// Trava a linha do tenant até o fim da transação (checagem de limites).
    pub async fn lock_tenant<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1 FOR UPDATE")
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::not_found("Tenant not found."))
    }
}
