// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{
    employee::validate_not_negative,
    leave::LeaveType,
    rbac::RoleResponse,
    settings::{TenantSettings, UpdateSettingsRequest},
};

// ---
// 1. Tenant (a organização cliente)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    #[schema(example = "Acme Bank")]
    pub name: String,
    #[schema(example = "acme-bank")]
    pub slug: String,
    #[schema(example = "PROFESSIONAL")]
    pub plan: String,
    pub subscription_expires_at: DateTime<Utc>,
    pub max_employees: i32,
    pub max_branches: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    pub fn subscription_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.subscription_expires_at > now
    }
}

// ---
// 2. Branch (agência / filial)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Downtown")]
    pub name: String,
    #[schema(example = "BR-001")]
    pub code: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBranchPayload {
    #[validate(length(min = 1, message = "Branch name is required."))]
    pub name: String,

    #[validate(length(min = 1, max = 16, message = "Branch code is required (max 16 characters)."))]
    pub code: String,

    pub address: Option<String>,
}

// ---
// 3. Onboarding
// ---

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let ok = !slug.is_empty()
        && slug.len() <= 63
        && slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-');
    if ok {
        Ok(())
    } else {
        let mut err = ValidationError::new("slug");
        err.message = Some("The slug may only contain lowercase letters, digits and inner hyphens.".into());
        Err(err)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnboardAdminPayload {
    #[validate(length(min = 1, message = "Admin full name is required."))]
    pub full_name: String,

    #[validate(email(message = "The admin e-mail address is invalid."))]
    pub email: String,

    #[validate(length(min = 8, message = "The admin password must have at least 8 characters."))]
    pub password: String,

    #[validate(length(min = 1, message = "Admin employee code is required."))]
    pub employee_code: String,

    /// Código de uma das filiais do próprio payload.
    #[validate(length(min = 1, message = "Admin branch code is required."))]
    pub branch_code: String,

    pub department: Option<String>,
    pub designation: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnboardRolePayload {
    #[validate(length(min = 1, message = "Role name is required."))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnboardLeaveTypePayload {
    #[validate(length(min = 1, message = "Leave type name is required."))]
    pub name: String,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "18")]
    pub max_days_per_year: Decimal,
    #[serde(default = "default_true")]
    pub is_paid: bool,
    #[serde(default = "default_true")]
    pub requires_approval: bool,
}

fn default_true() -> bool {
    true
}

impl OnboardLeaveTypePayload {
    /// Tipos criados quando o onboarding não informa nenhum.
    pub fn defaults() -> Vec<Self> {
        [("Annual Leave", 18), ("Sick Leave", 12), ("Casual Leave", 10)]
            .into_iter()
            .map(|(name, days)| Self {
                name: name.to_string(),
                max_days_per_year: Decimal::from(days),
                is_paid: true,
                requires_approval: true,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnboardTenantPayload {
    #[validate(length(min = 1, message = "Tenant name is required."))]
    pub name: String,

    #[validate(custom(function = "validate_slug"))]
    pub slug: String,

    #[validate(length(min = 1, message = "Plan is required."))]
    pub plan: String,

    pub subscription_expires_at: DateTime<Utc>,

    #[validate(range(min = 1, message = "maxEmployees must be at least 1."))]
    pub max_employees: i32,

    #[validate(range(min = 1, message = "maxBranches must be at least 1."))]
    pub max_branches: i32,

    #[validate(nested)]
    pub branches: Vec<CreateBranchPayload>,

    #[validate(nested)]
    pub admin: OnboardAdminPayload,

    #[validate(nested)]
    #[serde(default)]
    pub roles: Vec<OnboardRolePayload>,

    #[validate(nested)]
    #[serde(default)]
    pub leave_types: Vec<OnboardLeaveTypePayload>,

    #[validate(nested)]
    pub settings: Option<UpdateSettingsRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingResult {
    pub tenant: Tenant,
    pub branches: Vec<Branch>,
    pub admin_user_id: Uuid,
    pub admin_employee_id: Uuid,
    pub roles: Vec<RoleResponse>,
    pub leave_types: Vec<LeaveType>,
    pub settings: TenantSettings,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenewTenantPayload {
    #[validate(length(min = 1, message = "Plan is required."))]
    pub plan: String,
    pub subscription_expires_at: DateTime<Utc>,
    #[validate(range(min = 1, message = "maxEmployees must be at least 1."))]
    pub max_employees: Option<i32>,
    #[validate(range(min = 1, message = "maxBranches must be at least 1."))]
    pub max_branches: Option<i32>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_rules() {
        assert!(validate_slug("acme-bank-01").is_ok());
        assert!(validate_slug("Acme").is_err());
        assert!(validate_slug("-acme").is_err());
        assert!(validate_slug("acme bank").is_err());
        assert!(validate_slug("").is_err());
    }
}
