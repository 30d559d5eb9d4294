// src/models/rbac.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use sqlx::FromRow;
use chrono::{DateTime, Utc};
use utoipa::ToSchema;
use validator::Validate;

/// Cargo que ignora a restrição por filial nas aprovações.
pub const SUPER_ADMIN_ROLE: &str = "Super Admin";
pub const BRANCH_MANAGER_ROLE: &str = "Branch Manager";
pub const EMPLOYEE_ROLE: &str = "Employee";

// O que sai do banco (Tabela Roles)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(ignore)] // Ocultamos tenant_id da documentação pública
    pub tenant_id: Uuid,

    #[schema(example = "Branch Manager")]
    pub name: String,

    #[schema(example = "Approves leave and triages tickets for one branch")]
    pub description: Option<String>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// O que sai do banco (Tabela Permissions)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440001")]
    pub id: Uuid,

    #[schema(example = "leave:approve")]
    pub slug: String,

    #[schema(example = "Approve or reject leave requests")]
    pub description: String,

    #[schema(example = "LEAVE")]
    pub module: String,
}

// O Payload para criar um cargo
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolePayload {
    #[validate(length(min = 1, max = 60, message = "Role name is required."))]
    #[schema(example = "Payroll Officer")]
    pub name: String,

    #[schema(example = "Generates payslips")]
    pub description: Option<String>,

    #[schema(example = json!(["payslip:generate"]))]
    #[serde(default)]
    pub permissions: Vec<String>, // Slugs das permissões
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetRolePermissionsPayload {
    #[schema(example = json!(["leave:approve", "attendance:read"]))]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignRolePayload {
    pub role_id: Uuid,
}

// Resposta completa (Cargo + Lista de Permissões)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    #[serde(flatten)]
    pub role: Role,

    #[schema(example = json!(["leave:approve", "attendance:read"]))]
    pub permissions: Vec<String>,
}

/// Cargos criados quando o onboarding não informa nenhum.
/// `None` nas permissões = todas as permissões do catálogo.
pub fn default_roles() -> Vec<(&'static str, &'static str, Option<Vec<&'static str>>)> {
    vec![
        (SUPER_ADMIN_ROLE, "Full administrative access (generated at onboarding)", None),
        (
            BRANCH_MANAGER_ROLE,
            "Branch-scoped approvals and triage",
            Some(vec![
                "attendance:read",
                "leave:approve",
                "complaint:manage",
                "techissue:manage",
                "holiday:manage",
            ]),
        ),
        (EMPLOYEE_ROLE, "Self-service access", Some(vec![])),
    ]
}
