// src/models/audit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub actor_user_id: Option<Uuid>,
    #[schema(example = "LEAVE_APPROVED")]
    pub action: String,
    #[schema(example = "leave_request")]
    pub entity: String,
    pub entity_id: Option<Uuid>,
    pub details: Value,
    pub created_at: DateTime<Utc>,
}

/// Entrada a gravar. O autor vem de `app.user_id` quando não informado.
#[derive(Debug, Clone)]
pub struct NewAuditEntry<'a> {
    pub tenant_id: Uuid,
    pub actor_user_id: Option<Uuid>,
    pub action: &'a str,
    pub entity: &'a str,
    pub entity_id: Option<Uuid>,
    pub details: Value,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub entity: Option<String>,
    /// Padrão 50, máximo 200.
    pub limit: Option<i64>,
}
