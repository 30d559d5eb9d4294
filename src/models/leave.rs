// src/models/leave.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::employee::validate_not_negative;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "leave_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveType {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Annual Leave")]
    pub name: String,
    #[schema(example = "18")]
    pub max_days_per_year: Decimal,
    pub is_paid: bool,
    pub requires_approval: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Contadores por colaborador, tipo e ano.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBalance {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub leave_type_id: Uuid,
    pub year: i32,
    pub total_allocated: Decimal,
    pub used: Decimal,
    pub pending: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl LeaveBalance {
    pub fn available(&self) -> Decimal {
        self.total_allocated - self.used - self.pending
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBalanceView {
    pub leave_type_id: Uuid,
    pub leave_type_name: String,
    pub year: i32,
    pub total_allocated: Decimal,
    pub used: Decimal,
    pub pending: Decimal,
    pub available: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub leave_type_id: Uuid,
    #[schema(value_type = String, format = Date)]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub end_date: NaiveDate,
    pub is_half_day: bool,
    #[schema(example = "3")]
    pub total_days: Decimal,
    pub reason: Option<String>,
    pub status: LeaveStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    #[serde(skip)]
    #[schema(ignore)]
    pub held_balance_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Pedido com nomes resolvidos, para as telas de aprovação.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequestView {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub request: LeaveRequest,
    pub employee_name: String,
    pub employee_code: String,
    pub branch_id: Uuid,
    pub leave_type_name: String,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitLeavePayload {
    pub leave_type_id: Uuid,

    #[schema(value_type = String, format = Date, example = "2024-05-06")]
    pub start_date: NaiveDate,

    #[schema(value_type = String, format = Date, example = "2024-05-08")]
    pub end_date: NaiveDate,

    #[serde(default)]
    pub is_half_day: bool,

    #[validate(length(max = 1000, message = "Reason is limited to 1000 characters."))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectLeavePayload {
    #[validate(length(min = 1, max = 1000, message = "A rejection reason is required."))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeaveTypePayload {
    #[validate(length(min = 1, message = "Leave type name is required."))]
    pub name: String,

    #[validate(custom(function = "validate_not_negative"))]
    pub max_days_per_year: Decimal,

    #[serde(default = "default_true")]
    pub is_paid: bool,

    #[serde(default = "default_true")]
    pub requires_approval: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocateBalancePayload {
    pub employee_id: Uuid,
    pub leave_type_id: Uuid,

    #[validate(range(min = 2000, max = 2100, message = "year is out of range."))]
    pub year: i32,

    #[validate(custom(function = "validate_not_negative"))]
    pub total_allocated: Decimal,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct BalanceQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequestQuery {
    pub status: Option<LeaveStatus>,
    pub branch_id: Option<Uuid>,
}
