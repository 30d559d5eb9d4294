// src/db/payslip_repo.rs

use rust_decimal::Decimal;
use sqlx::{types::Json, Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::payslip::{PayComponent, PayTotals, Payslip, PayslipQuery},
};

#[derive(Clone)]
pub struct PayslipRepository {
    pool: PgPool,
}

pub struct NewPayslip<'a> {
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub month: i32,
    pub year: i32,
    pub basic_salary: Decimal,
    pub earnings: &'a [PayComponent],
    pub deductions: &'a [PayComponent],
    pub totals: PayTotals,
    pub generated_by: Uuid,
}

impl PayslipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(&self, executor: E, new: NewPayslip<'_>) -> Result<Payslip, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Payslip>(
            r#"
            INSERT INTO payslips (
                tenant_id, employee_id, month, year, basic_salary, earnings, deductions,
                gross_pay, total_deductions, net_pay, generated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(new.tenant_id)
        .bind(new.employee_id)
        .bind(new.month)
        .bind(new.year)
        .bind(new.basic_salary)
        .bind(Json(new.earnings))
        .bind(Json(new.deductions))
        .bind(new.totals.gross_pay)
        .bind(new.totals.total_deductions)
        .bind(new.totals.net_pay)
        .bind(new.generated_by)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| {
                AppError::conflict(format!(
                    "A payslip for {:02}/{} already exists for this employee.",
                    new.month, new.year
                ))
            })
        })
    }

    pub async fn find(&self, tenant_id: Uuid, payslip_id: Uuid) -> Result<Option<Payslip>, AppError> {
        let payslip = sqlx::query_as::<_, Payslip>("SELECT * FROM payslips WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(payslip_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(payslip)
    }

    pub async fn list(&self, tenant_id: Uuid, filter: &PayslipQuery) -> Result<Vec<Payslip>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM payslips WHERE tenant_id = ");
        qb.push_bind(tenant_id);

        if let Some(employee_id) = filter.employee_id {
            qb.push(" AND employee_id = ").push_bind(employee_id);
        }
        if let Some(month) = filter.month {
            qb.push(" AND month = ").push_bind(month);
        }
        if let Some(year) = filter.year {
            qb.push(" AND year = ").push_bind(year);
        }
        qb.push(" ORDER BY year DESC, month DESC");

        let payslips = qb.build_query_as::<Payslip>().fetch_all(&self.pool).await?;
        Ok(payslips)
    }
}
