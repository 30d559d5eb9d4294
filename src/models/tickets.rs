// src/models/tickets.rs
// Reclamações e chamados técnicos compartilham o mesmo ciclo de vida.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "ticket_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    /// Open → InProgress → Resolved → Closed; qualquer estado aberto pode ser fechado.
    pub fn can_transition_to(self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        matches!((self, next), (Open, InProgress) | (InProgress, Resolved)) || (next == Closed && self != Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "ticket_priority", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Qual tabela de chamados. Define prefixo de exibição e contador.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketKind {
    Complaint,
    TechIssue,
}

impl TicketKind {
    pub fn prefix(self) -> &'static str {
        match self {
            TicketKind::Complaint => "CMP",
            TicketKind::TechIssue => "TKT",
        }
    }

    pub fn counter_name(self) -> &'static str {
        match self {
            TicketKind::Complaint => "complaint",
            TicketKind::TechIssue => "tech_issue",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            TicketKind::Complaint => "complaints",
            TicketKind::TechIssue => "tech_issues",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TicketKind::Complaint => "Complaint",
            TicketKind::TechIssue => "Tech issue",
        }
    }

    pub fn display_code(self, number: i64) -> String {
        format!("{}-{:06}", self.prefix(), number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    #[serde(skip)]
    #[schema(ignore)]
    pub display_number: i64,
    #[sqlx(default)]
    #[schema(example = "CMP-000042")]
    pub code: String,
    #[schema(example = "Workplace")]
    pub category: String,
    pub subject: String,
    pub description: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    /// Só chamados técnicos têm responsável.
    #[sqlx(default)]
    pub assigned_to: Option<Uuid>,
    pub resolution: Option<String>,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn with_code(mut self, kind: TicketKind) -> Self {
        self.code = kind.display_code(self.display_number);
        self
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketPayload {
    #[validate(length(min = 1, max = 60, message = "Category is required."))]
    pub category: String,

    #[validate(length(min = 3, max = 200, message = "Subject must have between 3 and 200 characters."))]
    pub subject: String,

    #[validate(length(min = 1, max = 5000, message = "Description is required."))]
    pub description: String,

    #[serde(default)]
    pub priority: TicketPriority,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketStatusPayload {
    pub status: TicketStatus,

    #[validate(length(max = 5000, message = "Resolution is limited to 5000 characters."))]
    pub resolution: Option<String>,

    /// Só para chamados técnicos.
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct TicketQuery {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use TicketStatus::*;

    #[test]
    fn display_codes_are_zero_padded() {
        assert_eq!(TicketKind::Complaint.display_code(42), "CMP-000042");
        assert_eq!(TicketKind::TechIssue.display_code(1_234_567), "TKT-1234567");
    }

    #[test]
    fn lifecycle_transitions() {
        assert!(Open.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Resolved));
        assert!(Resolved.can_transition_to(Closed));
        assert!(Open.can_transition_to(Closed));
        assert!(InProgress.can_transition_to(Closed));

        assert!(!Closed.can_transition_to(Open));
        assert!(!Closed.can_transition_to(Closed));
        assert!(!Resolved.can_transition_to(Open));
        assert!(!InProgress.can_transition_to(Open));
        // Sem atalhos nem reabertura
        assert!(!Open.can_transition_to(Resolved));
        assert!(!Resolved.can_transition_to(InProgress));
    }
}
