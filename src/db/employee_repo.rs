// src/db/employee_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::employee::{Employee, EmployeeScope},
};

#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

pub struct NewEmployee<'a> {
    pub tenant_id: Uuid,
    pub branch_id: Uuid,
    pub user_id: Uuid,
    pub employee_code: &'a str,
    pub full_name: &'a str,
    pub email: &'a str,
    pub department: Option<&'a str>,
    pub designation: Option<&'a str>,
    pub joined_on: NaiveDate,
    pub base_salary: Decimal,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_employee<'e, E>(&self, executor: E, new: NewEmployee<'_>) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (
                tenant_id, branch_id, user_id, employee_code, full_name, email,
                department, designation, joined_on, base_salary
            )
            VALUES ($1, $2, $3, $4, $5, lower($6), $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(new.tenant_id)
        .bind(new.branch_id)
        .bind(new.user_id)
        .bind(new.employee_code)
        .bind(new.full_name)
        .bind(new.email)
        .bind(new.department)
        .bind(new.designation)
        .bind(new.joined_on)
        .bind(new.base_salary)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |constraint| match constraint {
                "employees_tenant_code_key" => {
                    AppError::conflict(format!("Employee code '{}' already exists.", new.employee_code))
                }
                "employees_tenant_email_key" => AppError::EmailAlreadyExists,
                other => AppError::conflict(format!("Unique constraint violated: {}", other)),
            })
        })
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(employee_id)
        .fetch_optional(executor)
        .await?;
        Ok(employee)
    }

    pub async fn get(&self, tenant_id: Uuid, employee_id: Uuid) -> Result<Option<Employee>, AppError> {
        self.find_by_id(&self.pool, tenant_id, employee_id).await
    }

    /// Usado no login, antes de existir contexto de tenant.
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    /// Colaboradores do tenant dentro do escopo (filial / departamento / colaborador).
    pub async fn list_in_scope<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        scope: &EmployeeScope,
        include_inactive: bool,
    ) -> Result<Vec<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM employees WHERE tenant_id = ");
        qb.push_bind(tenant_id);

        if !include_inactive {
            qb.push(" AND is_active = TRUE");
        }
        if let Some(branch_id) = scope.branch_id {
            qb.push(" AND branch_id = ").push_bind(branch_id);
        }
        if let Some(department) = &scope.department {
            qb.push(" AND department = ").push_bind(department.clone());
        }
        if let Some(employee_id) = scope.employee_id {
            qb.push(" AND id = ").push_bind(employee_id);
        }
        qb.push(" ORDER BY employee_code");

        let employees = qb.build_query_as::<Employee>().fetch_all(executor).await?;
        Ok(employees)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        scope: &EmployeeScope,
        include_inactive: bool,
    ) -> Result<Vec<Employee>, AppError> {
        self.list_in_scope(&self.pool, tenant_id, scope, include_inactive).await
    }

    pub async fn count_active<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM employees WHERE tenant_id = $1 AND is_active = TRUE",
        )
        .bind(tenant_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }
}
