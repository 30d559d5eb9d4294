// src/db/attendance_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::attendance::{Attendance, AttendanceStatus},
};

#[derive(Clone)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_for_day<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Attendance>(
            "SELECT * FROM attendance WHERE tenant_id = $1 AND employee_id = $2 AND date = $3",
        )
        .bind(tenant_id)
        .bind(employee_id)
        .bind(date)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    /// Primeiro check-in do dia. A chave única barra o segundo.
    pub async fn insert_check_in<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        employee_id: Uuid,
        date: NaiveDate,
        check_in: DateTime<Utc>,
        status: AttendanceStatus,
        notes: Option<&str>,
    ) -> Result<Attendance, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Attendance>(
            r#"
            INSERT INTO attendance (tenant_id, employee_id, date, check_in, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(employee_id)
        .bind(date)
        .bind(check_in)
        .bind(status)
        .bind(notes)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, |_| AppError::bad_request("Already checked in today")))
    }

    /// Fecha o dia. `None` quando já havia check-out gravado.
    pub async fn record_check_out<'e, E>(
        &self,
        executor: E,
        attendance_id: Uuid,
        check_out: DateTime<Utc>,
        work_hours: f64,
        productivity_rating: Option<i16>,
        notes: Option<&str>,
    ) -> Result<Option<Attendance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Attendance>(
            r#"
            UPDATE attendance SET
                check_out = $2,
                work_hours = $3,
                productivity_rating = $4,
                notes = COALESCE($5, notes),
                updated_at = NOW()
            WHERE id = $1 AND check_out IS NULL
            RETURNING *
            "#,
        )
        .bind(attendance_id)
        .bind(check_out)
        .bind(work_hours)
        .bind(productivity_rating)
        .bind(notes)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    /// Registros do intervalo para um conjunto de colaboradores.
    pub async fn list_in_range(
        &self,
        tenant_id: Uuid,
        employee_ids: &[Uuid],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Attendance>, AppError> {
        let rows = sqlx::query_as::<_, Attendance>(
            r#"
            SELECT * FROM attendance
            WHERE tenant_id = $1
              AND employee_id = ANY($2)
              AND date BETWEEN $3 AND $4
            ORDER BY date
            "#,
        )
        .bind(tenant_id)
        .bind(employee_ids)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
