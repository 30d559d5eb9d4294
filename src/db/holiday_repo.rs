// src/db/holiday_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::holiday::Holiday,
};

#[derive(Clone)]
pub struct HolidayRepository {
    pool: PgPool,
}

impl HolidayRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Existe feriado que colide com o escopo pedido na mesma data?
    /// Feriado geral colide com qualquer um; feriado de filial colide com o geral e com o da mesma filial.
    pub async fn conflicting_exists<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        branch_id: Option<Uuid>,
        date: NaiveDate,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM holidays
                WHERE tenant_id = $1
                  AND date = $3
                  AND ($2::uuid IS NULL OR branch_id IS NULL OR branch_id = $2)
            )
            "#,
        )
        .bind(tenant_id)
        .bind(branch_id)
        .bind(date)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        branch_id: Option<Uuid>,
        date: NaiveDate,
        name: &str,
    ) -> Result<Holiday, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Holiday>(
            r#"
            INSERT INTO holidays (tenant_id, branch_id, date, name)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(branch_id)
        .bind(date)
        .bind(name)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, |_| AppError::conflict(format!("A holiday already exists on {}.", date))))
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, holiday_id: Uuid) -> Result<Option<Holiday>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deleted = sqlx::query_as::<_, Holiday>(
            "DELETE FROM holidays WHERE tenant_id = $1 AND id = $2 RETURNING *",
        )
        .bind(tenant_id)
        .bind(holiday_id)
        .fetch_optional(executor)
        .await?;
        Ok(deleted)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        year: Option<i32>,
        branch_id: Option<Uuid>,
    ) -> Result<Vec<Holiday>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM holidays WHERE tenant_id = ");
        qb.push_bind(tenant_id);

        if let Some(year) = year {
            qb.push(" AND EXTRACT(YEAR FROM date)::int = ").push_bind(year);
        }
        if let Some(branch_id) = branch_id {
            // Filial inclui os feriados gerais
            qb.push(" AND (branch_id IS NULL OR branch_id = ").push_bind(branch_id).push(")");
        }
        qb.push(" ORDER BY date");

        let holidays = qb.build_query_as::<Holiday>().fetch_all(&self.pool).await?;
        Ok(holidays)
    }

    /// Todos os feriados do tenant no intervalo (gerais e de qualquer filial).
    pub async fn list_in_range<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Holiday>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let holidays = sqlx::query_as::<_, Holiday>(
            "SELECT * FROM holidays WHERE tenant_id = $1 AND date BETWEEN $2 AND $3 ORDER BY date",
        )
        .bind(tenant_id)
        .bind(from)
        .bind(to)
        .fetch_all(executor)
        .await?;
        Ok(holidays)
    }
}
