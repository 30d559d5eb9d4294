// src/db/ticket_repo.rs
// Reclamações e chamados técnicos: mesma forma, tabelas distintas.

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::tickets::{Ticket, TicketKind, TicketPriority, TicketStatus},
};

#[derive(Clone)]
pub struct TicketRepository {
    pool: PgPool,
}

pub struct NewTicket<'a> {
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub display_number: i64,
    pub category: &'a str,
    pub subject: &'a str,
    pub description: &'a str,
    pub priority: TicketPriority,
}

pub struct StatusChange<'a> {
    pub status: TicketStatus,
    pub resolution: Option<&'a str>,
    pub resolved_by: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
}

impl TicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Próximo número do contador do tenant, numa única instrução.
    pub async fn next_number<'e, E>(&self, executor: E, tenant_id: Uuid, counter: &str) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tenant_counters (tenant_id, name, value)
            VALUES ($1, $2, 1)
            ON CONFLICT (tenant_id, name)
            DO UPDATE SET value = tenant_counters.value + 1
            RETURNING value
            "#,
        )
        .bind(tenant_id)
        .bind(counter)
        .fetch_one(executor)
        .await?;
        Ok(value)
    }

    pub async fn create<'e, E>(&self, executor: E, kind: TicketKind, new: NewTicket<'_>) -> Result<Ticket, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            r#"
            INSERT INTO {} (tenant_id, employee_id, display_number, category, subject, description, priority)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
            kind.table()
        ))
        .bind(new.tenant_id)
        .bind(new.employee_id)
        .bind(new.display_number)
        .bind(new.category)
        .bind(new.subject)
        .bind(new.description)
        .bind(new.priority)
        .fetch_one(executor)
        .await?;
        Ok(ticket.with_code(kind))
    }

    pub async fn lock<'e, E>(
        &self,
        executor: E,
        kind: TicketKind,
        tenant_id: Uuid,
        ticket_id: Uuid,
    ) -> Result<Option<Ticket>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            "SELECT * FROM {} WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
            kind.table()
        ))
        .bind(tenant_id)
        .bind(ticket_id)
        .fetch_optional(executor)
        .await?;
        Ok(ticket.map(|t| t.with_code(kind)))
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        kind: TicketKind,
        ticket_id: Uuid,
        change: StatusChange<'_>,
    ) -> Result<Ticket, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let assignment = match kind {
            TicketKind::TechIssue => ", assigned_to = COALESCE($5, assigned_to)",
            TicketKind::Complaint => "",
        };
        let sql = format!(
            r#"
            UPDATE {} SET
                status = $2,
                resolution = COALESCE($3, resolution),
                resolved_by = COALESCE($4, resolved_by),
                resolved_at = CASE WHEN $4::uuid IS NOT NULL THEN NOW() ELSE resolved_at END,
                updated_at = NOW(){}
            WHERE id = $1
            RETURNING *
            "#,
            kind.table(),
            assignment
        );

        let mut query = sqlx::query_as::<_, Ticket>(&sql)
            .bind(ticket_id)
            .bind(change.status)
            .bind(change.resolution)
            .bind(change.resolved_by);
        if kind == TicketKind::TechIssue {
            query = query.bind(change.assigned_to);
        }

        let ticket = query.fetch_one(executor).await?;
        Ok(ticket.with_code(kind))
    }

    /// Lista do tenant (`employee_id = None`) ou só de um colaborador.
    pub async fn list(
        &self,
        kind: TicketKind,
        tenant_id: Uuid,
        employee_id: Option<Uuid>,
        status: Option<TicketStatus>,
        priority: Option<TicketPriority>,
    ) -> Result<Vec<Ticket>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT * FROM {} WHERE tenant_id = ", kind.table()));
        qb.push_bind(tenant_id);

        if let Some(employee_id) = employee_id {
            qb.push(" AND employee_id = ").push_bind(employee_id);
        }
        if let Some(status) = status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(priority) = priority {
            qb.push(" AND priority = ").push_bind(priority);
        }
        qb.push(" ORDER BY created_at DESC");

        let tickets = qb.build_query_as::<Ticket>().fetch_all(&self.pool).await?;
        Ok(tickets.into_iter().map(|t| t.with_code(kind)).collect())
    }
}
