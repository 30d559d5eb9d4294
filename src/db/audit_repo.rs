// src/db/audit_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::audit::{AuditLog, NewAuditEntry},
};

#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Sem autor explícito, usa o `app.user_id` da transação.
    pub async fn record<'e, E>(&self, executor: E, entry: NewAuditEntry<'_>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (tenant_id, actor_user_id, action, entity, entity_id, details)
            VALUES ($1, COALESCE($2, NULLIF(current_setting('app.user_id', true), '')::uuid), $3, $4, $5, $6)
            "#,
        )
        .bind(entry.tenant_id)
        .bind(entry.actor_user_id)
        .bind(entry.action)
        .bind(entry.entity)
        .bind(entry.entity_id)
        .bind(entry.details)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn list(&self, tenant_id: Uuid, entity: Option<&str>, limit: i64) -> Result<Vec<AuditLog>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM audit_logs WHERE tenant_id = ");
        qb.push_bind(tenant_id);

        if let Some(entity) = entity {
            qb.push(" AND entity = ").push_bind(entity.to_string());
        }
        qb.push(" ORDER BY created_at DESC LIMIT ").push_bind(limit);

        let logs = qb.build_query_as::<AuditLog>().fetch_all(&self.pool).await?;
        Ok(logs)
    }
}
