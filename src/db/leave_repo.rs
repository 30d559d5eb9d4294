// src/db/leave_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::leave::{
        LeaveBalance, LeaveBalanceView, LeaveRequest, LeaveRequestView, LeaveStatus, LeaveType,
    },
};

const REQUEST_VIEW_SELECT: &str = r#"
    SELECT lr.*,
           e.full_name AS employee_name,
           e.employee_code,
           e.branch_id,
           lt.name AS leave_type_name
    FROM leave_requests lr
    JOIN employees e ON e.id = lr.employee_id
    JOIN leave_types lt ON lt.id = lr.leave_type_id
"#;

#[derive(Clone)]
pub struct LeaveRepository {
    pool: PgPool,
}

pub struct NewLeaveRequest<'a> {
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub leave_type_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_half_day: bool,
    pub total_days: Decimal,
    pub reason: Option<&'a str>,
    pub held_balance_id: Option<Uuid>,
}

impl LeaveRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  TIPOS
    // =========================================================================

    pub async fn create_type<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        max_days_per_year: Decimal,
        is_paid: bool,
        requires_approval: bool,
    ) -> Result<LeaveType, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, LeaveType>(
            r#"
            INSERT INTO leave_types (tenant_id, name, max_days_per_year, is_paid, requires_approval)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(max_days_per_year)
        .bind(is_paid)
        .bind(requires_approval)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, |_| AppError::conflict(format!("Leave type '{}' already exists.", name))))
    }

    pub async fn list_types(&self, tenant_id: Uuid, active_only: bool) -> Result<Vec<LeaveType>, AppError> {
        let types = sqlx::query_as::<_, LeaveType>(
            "SELECT * FROM leave_types WHERE tenant_id = $1 AND (is_active OR NOT $2) ORDER BY name",
        )
        .bind(tenant_id)
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(types)
    }

    pub async fn find_type<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<LeaveType>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let leave_type = sqlx::query_as::<_, LeaveType>(
            "SELECT * FROM leave_types WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(leave_type)
    }

    // =========================================================================
    //  SALDOS
    // =========================================================================

    pub async fn find_balance<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        employee_id: Uuid,
        leave_type_id: Uuid,
        year: i32,
    ) -> Result<Option<LeaveBalance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let balance = sqlx::query_as::<_, LeaveBalance>(
            r#"
            SELECT * FROM leave_balances
            WHERE tenant_id = $1 AND employee_id = $2 AND leave_type_id = $3 AND year = $4
            "#,
        )
        .bind(tenant_id)
        .bind(employee_id)
        .bind(leave_type_id)
        .bind(year)
        .fetch_optional(executor)
        .await?;
        Ok(balance)
    }

    /// Reserva dias como pendentes. `false` se o saldo não comporta.
    pub async fn hold_pending<'e, E>(&self, executor: E, balance_id: Uuid, days: Decimal) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE leave_balances
            SET pending = pending + $2, updated_at = NOW()
            WHERE id = $1 AND used + pending + $2 <= total_allocated
            "#,
        )
        .bind(balance_id)
        .bind(days)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Move dias reservados de pendente para usado.
    /// `false` se a reserva não está lá ou se `used + days` passaria do alocado.
    pub async fn commit_pending<'e, E>(&self, executor: E, balance_id: Uuid, days: Decimal) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE leave_balances
            SET pending = pending - $2,
                used = used + $2,
                updated_at = NOW()
            WHERE id = $1 AND pending >= $2 AND used + $2 <= total_allocated
            "#,
        )
        .bind(balance_id)
        .bind(days)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Debita direto em usado um pedido que foi enviado sem reserva.
    /// Conta o pendente dos outros pedidos, então `false` se não cabe no disponível.
    pub async fn consume_unheld<'e, E>(&self, executor: E, balance_id: Uuid, days: Decimal) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE leave_balances
            SET used = used + $2, updated_at = NOW()
            WHERE id = $1 AND used + pending + $2 <= total_allocated
            "#,
        )
        .bind(balance_id)
        .bind(days)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Devolve uma reserva. `false` se o pendente não cobre os dias.
    pub async fn release_pending<'e, E>(&self, executor: E, balance_id: Uuid, days: Decimal) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE leave_balances
            SET pending = pending - $2, updated_at = NOW()
            WHERE id = $1 AND pending >= $2
            "#,
        )
        .bind(balance_id)
        .bind(days)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Cria (ou ajusta) o alocado. `None` se o novo valor ficaria abaixo de usado + pendente.
    pub async fn upsert_allocation<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        employee_id: Uuid,
        leave_type_id: Uuid,
        year: i32,
        total_allocated: Decimal,
    ) -> Result<Option<LeaveBalance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let balance = sqlx::query_as::<_, LeaveBalance>(
            r#"
            INSERT INTO leave_balances (tenant_id, employee_id, leave_type_id, year, total_allocated)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (employee_id, leave_type_id, year)
            DO UPDATE SET total_allocated = EXCLUDED.total_allocated, updated_at = NOW()
            WHERE leave_balances.used + leave_balances.pending <= EXCLUDED.total_allocated
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(employee_id)
        .bind(leave_type_id)
        .bind(year)
        .bind(total_allocated)
        .fetch_optional(executor)
        .await?;
        Ok(balance)
    }

    /// Um saldo por tipo ativo, alocando o máximo anual. Saldos existentes ficam como estão.
    pub async fn allocate_defaults<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        employee_id: Uuid,
        year: i32,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_balances (tenant_id, employee_id, leave_type_id, year, total_allocated)
            SELECT $1, $2, lt.id, $3, lt.max_days_per_year
            FROM leave_types lt
            WHERE lt.tenant_id = $1 AND lt.is_active
            ON CONFLICT (employee_id, leave_type_id, year) DO NOTHING
            "#,
        )
        .bind(tenant_id)
        .bind(employee_id)
        .bind(year)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn balances_for_employee(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        year: i32,
    ) -> Result<Vec<LeaveBalanceView>, AppError> {
        let balances = sqlx::query_as::<_, LeaveBalanceView>(
            r#"
            SELECT lb.leave_type_id,
                   lt.name AS leave_type_name,
                   lb.year,
                   lb.total_allocated,
                   lb.used,
                   lb.pending,
                   lb.total_allocated - lb.used - lb.pending AS available
            FROM leave_balances lb
            JOIN leave_types lt ON lt.id = lb.leave_type_id
            WHERE lb.tenant_id = $1 AND lb.employee_id = $2 AND lb.year = $3
            ORDER BY lt.name
            "#,
        )
        .bind(tenant_id)
        .bind(employee_id)
        .bind(year)
        .fetch_all(&self.pool)
        .await?;
        Ok(balances)
    }

    // =========================================================================
    //  PEDIDOS
    // =========================================================================

    /// Pedidos Pending/Approved do colaborador que tocam o intervalo.
    pub async fn overlapping_exists<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        employee_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM leave_requests
                WHERE tenant_id = $1
                  AND employee_id = $2
                  AND status IN ('PENDING', 'APPROVED')
                  AND start_date <= $4
                  AND end_date >= $3
            )
            "#,
        )
        .bind(tenant_id)
        .bind(employee_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn create_request<'e, E>(&self, executor: E, new: NewLeaveRequest<'_>) -> Result<LeaveRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, LeaveRequest>(
            r#"
            INSERT INTO leave_requests (
                tenant_id, employee_id, leave_type_id, start_date, end_date,
                is_half_day, total_days, reason, held_balance_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(new.tenant_id)
        .bind(new.employee_id)
        .bind(new.leave_type_id)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.is_half_day)
        .bind(new.total_days)
        .bind(new.reason)
        .bind(new.held_balance_id)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }

    /// Carrega e trava o pedido para revisão.
    pub async fn lock_request<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        request_id: Uuid,
    ) -> Result<Option<LeaveRequestView>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let view = sqlx::query_as::<_, LeaveRequestView>(&format!(
            "{REQUEST_VIEW_SELECT} WHERE lr.tenant_id = $1 AND lr.id = $2 FOR UPDATE OF lr"
        ))
        .bind(tenant_id)
        .bind(request_id)
        .fetch_optional(executor)
        .await?;
        Ok(view)
    }

    /// Pending → Approved/Rejected. `None` se o pedido já não estava pendente.
    pub async fn mark_reviewed<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
        status: LeaveStatus,
        reviewed_by: Uuid,
        rejection_reason: Option<&str>,
    ) -> Result<Option<LeaveRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, LeaveRequest>(
            r#"
            UPDATE leave_requests SET
                status = $2,
                reviewed_by = $3,
                reviewed_at = NOW(),
                rejection_reason = $4
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(status)
        .bind(reviewed_by)
        .bind(rejection_reason)
        .fetch_optional(executor)
        .await?;
        Ok(request)
    }

    pub async fn list_for_employee(&self, tenant_id: Uuid, employee_id: Uuid) -> Result<Vec<LeaveRequestView>, AppError> {
        let requests = sqlx::query_as::<_, LeaveRequestView>(&format!(
            "{REQUEST_VIEW_SELECT} WHERE lr.tenant_id = $1 AND lr.employee_id = $2 ORDER BY lr.created_at DESC"
        ))
        .bind(tenant_id)
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    pub async fn list_requests(
        &self,
        tenant_id: Uuid,
        status: Option<LeaveStatus>,
        branch_id: Option<Uuid>,
    ) -> Result<Vec<LeaveRequestView>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(REQUEST_VIEW_SELECT);
        qb.push(" WHERE lr.tenant_id = ").push_bind(tenant_id);

        if let Some(status) = status {
            qb.push(" AND lr.status = ").push_bind(status);
        }
        if let Some(branch_id) = branch_id {
            qb.push(" AND e.branch_id = ").push_bind(branch_id);
        }
        qb.push(" ORDER BY lr.created_at DESC");

        let requests = qb.build_query_as::<LeaveRequestView>().fetch_all(&self.pool).await?;
        Ok(requests)
    }

    /// Licenças aprovadas que tocam o intervalo.
    pub async fn approved_in_range(
        &self,
        tenant_id: Uuid,
        employee_ids: &[Uuid],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LeaveRequest>, AppError> {
        let requests = sqlx::query_as::<_, LeaveRequest>(
            r#"
            SELECT * FROM leave_requests
            WHERE tenant_id = $1
              AND employee_id = ANY($2)
              AND status = 'APPROVED'
              AND start_date <= $4
              AND end_date >= $3
            "#,
        )
        .bind(tenant_id)
        .bind(employee_ids)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }
}
