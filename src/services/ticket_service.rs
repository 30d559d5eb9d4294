// src/services/ticket_service.rs
// Reclamações e chamados técnicos: abertura pelo colaborador, triagem pelo admin.

use serde_json::json;
use uuid::Uuid;

use crate::{
    common::{db_utils::UnitOfWork, error::AppError},
    db::{
        ticket_repo::{NewTicket, StatusChange},
        AuditRepository, EmployeeRepository, TicketRepository,
    },
    models::{
        audit::NewAuditEntry,
        tickets::{CreateTicketPayload, Ticket, TicketKind, TicketQuery, TicketStatus, UpdateTicketStatusPayload},
    },
};

#[derive(Clone)]
pub struct TicketService {
    ticket_repo: TicketRepository,
    employee_repo: EmployeeRepository,
    audit_repo: AuditRepository,
}

/// Valida a mudança de status antes de tocar no banco.
pub fn check_status_change(
    kind: TicketKind,
    current: TicketStatus,
    payload: &UpdateTicketStatusPayload,
) -> Result<(), AppError> {
    if !current.can_transition_to(payload.status) {
        return Err(AppError::bad_request(format!(
            "Cannot move a ticket from {:?} to {:?}.",
            current, payload.status
        )));
    }
    if payload.status == TicketStatus::Resolved
        && payload.resolution.as_deref().map(str::trim).unwrap_or_default().is_empty()
    {
        return Err(AppError::bad_request("Resolution notes are required to resolve a ticket."));
    }
    if kind == TicketKind::Complaint && payload.assigned_to.is_some() {
        return Err(AppError::bad_request("Complaints cannot be assigned."));
    }
    Ok(())
}

impl TicketService {
    pub fn new(ticket_repo: TicketRepository, employee_repo: EmployeeRepository, audit_repo: AuditRepository) -> Self {
        Self { ticket_repo, employee_repo, audit_repo }
    }

    pub async fn create(
        &self,
        mut tx: UnitOfWork,
        kind: TicketKind,
        tenant_id: Uuid,
        employee_id: Uuid,
        payload: CreateTicketPayload,
    ) -> Result<Ticket, AppError> {
        let number = self.ticket_repo.next_number(&mut *tx, tenant_id, kind.counter_name()).await?;

        let ticket = self
            .ticket_repo
            .create(
                &mut *tx,
                kind,
                NewTicket {
                    tenant_id,
                    employee_id,
                    display_number: number,
                    category: payload.category.trim(),
                    subject: payload.subject.trim(),
                    description: &payload.description,
                    priority: payload.priority,
                },
            )
            .await?;

        self.audit_repo
            .record(
                &mut *tx,
                NewAuditEntry {
                    tenant_id,
                    actor_user_id: None,
                    action: "TICKET_CREATED",
                    entity: kind.table(),
                    entity_id: Some(ticket.id),
                    details: json!({ "code": ticket.code, "priority": ticket.priority }),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(code = %ticket.code, "{} aberto", kind.label());
        Ok(ticket)
    }

    pub async fn list_own(
        &self,
        kind: TicketKind,
        tenant_id: Uuid,
        employee_id: Uuid,
        query: TicketQuery,
    ) -> Result<Vec<Ticket>, AppError> {
        self.ticket_repo
            .list(kind, tenant_id, Some(employee_id), query.status, query.priority)
            .await
    }

    pub async fn list_all(&self, kind: TicketKind, tenant_id: Uuid, query: TicketQuery) -> Result<Vec<Ticket>, AppError> {
        self.ticket_repo.list(kind, tenant_id, None, query.status, query.priority).await
    }

    pub async fn update_status(
        &self,
        mut tx: UnitOfWork,
        kind: TicketKind,
        tenant_id: Uuid,
        actor_employee_id: Uuid,
        ticket_id: Uuid,
        payload: UpdateTicketStatusPayload,
    ) -> Result<Ticket, AppError> {
        let current = self
            .ticket_repo
            .lock(&mut *tx, kind, tenant_id, ticket_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{} not found.", kind.label())))?;

        check_status_change(kind, current.status, &payload)?;

        if let Some(assignee) = payload.assigned_to {
            self.employee_repo
                .find_by_id(&mut *tx, tenant_id, assignee)
                .await?
                .filter(|e| e.is_active)
                .ok_or_else(|| AppError::bad_request("The assignee must be an active employee."))?;
        }

        let resolved_by = (payload.status == TicketStatus::Resolved).then_some(actor_employee_id);
        let updated = self
            .ticket_repo
            .update_status(
                &mut *tx,
                kind,
                current.id,
                StatusChange {
                    status: payload.status,
                    resolution: payload.resolution.as_deref().map(str::trim),
                    resolved_by,
                    assigned_to: payload.assigned_to,
                },
            )
            .await?;

        self.audit_repo
            .record(
                &mut *tx,
                NewAuditEntry {
                    tenant_id,
                    actor_user_id: None,
                    action: "TICKET_STATUS_CHANGED",
                    entity: kind.table(),
                    entity_id: Some(updated.id),
                    details: json!({ "code": updated.code, "from": current.status, "to": updated.status }),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(code = %updated.code, from = ?current.status, to = ?updated.status, "Status de chamado alterado");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(status: TicketStatus, resolution: Option<&str>, assigned_to: Option<Uuid>) -> UpdateTicketStatusPayload {
        UpdateTicketStatusPayload { status, resolution: resolution.map(String::from), assigned_to }
    }

    #[test]
    fn resolving_requires_notes() {
        let err = check_status_change(
            TicketKind::Complaint,
            TicketStatus::InProgress,
            &change(TicketStatus::Resolved, Some("   "), None),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m.contains("Resolution notes")));

        assert!(check_status_change(
            TicketKind::Complaint,
            TicketStatus::InProgress,
            &change(TicketStatus::Resolved, Some("Replaced badge reader"), None),
        )
        .is_ok());
    }

    #[test]
    fn open_ticket_cannot_skip_to_resolved() {
        let err = check_status_change(
            TicketKind::TechIssue,
            TicketStatus::Open,
            &change(TicketStatus::Resolved, Some("Rebooted"), None),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Cannot move a ticket from Open to Resolved.");
    }

    #[test]
    fn closed_tickets_stay_closed() {
        let err = check_status_change(
            TicketKind::TechIssue,
            TicketStatus::Closed,
            &change(TicketStatus::InProgress, None, None),
        )
        .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn only_tech_issues_take_an_assignee() {
        let someone = Some(Uuid::new_v4());
        assert!(check_status_change(
            TicketKind::Complaint,
            TicketStatus::Open,
            &change(TicketStatus::InProgress, None, someone)
        )
        .is_err());
        assert!(check_status_change(
            TicketKind::TechIssue,
            TicketStatus::Open,
            &change(TicketStatus::InProgress, None, someone)
        )
        .is_ok());
    }
}
