// src/models/employee.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub branch_id: Uuid,
    pub user_id: Uuid,

    #[schema(example = "EMP-0001")]
    pub employee_code: String,
    #[schema(example = "Maria Souza")]
    pub full_name: String,
    pub email: String,
    #[schema(example = "Retail Banking")]
    pub department: Option<String>,
    #[schema(example = "Teller")]
    pub designation: Option<String>,

    #[schema(value_type = String, format = Date, example = "2024-01-15")]
    pub joined_on: NaiveDate,
    #[schema(example = "4500.00")]
    pub base_salary: Decimal,
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("The value cannot be negative.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeePayload {
    pub branch_id: Uuid,

    #[validate(length(min = 1, max = 32, message = "Employee code is required."))]
    pub employee_code: String,

    #[validate(length(min = 1, message = "Full name is required."))]
    pub full_name: String,

    #[validate(email(message = "The e-mail address is invalid."))]
    pub email: String,

    #[validate(length(min = 8, message = "The password must have at least 8 characters."))]
    pub password: String,

    pub department: Option<String>,
    pub designation: Option<String>,

    #[schema(value_type = Option<String>, format = Date)]
    pub joined_on: Option<NaiveDate>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub base_salary: Decimal,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeQuery {
    pub branch_id: Option<Uuid>,
    pub department: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

/// Filtro de escopo usado pelos relatórios e listagens administrativas.
#[derive(Debug, Clone, Default)]
pub struct EmployeeScope {
    pub branch_id: Option<Uuid>,
    pub department: Option<String>,
    pub employee_id: Option<Uuid>,
}
