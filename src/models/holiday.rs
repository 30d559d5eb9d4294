// src/models/holiday.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Feriado. `branch_id = None` vale para todas as filiais do tenant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub branch_id: Option<Uuid>,
    #[schema(value_type = String, format = Date, example = "2024-12-25")]
    pub date: NaiveDate,
    #[schema(example = "Christmas")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Holiday {
    /// O feriado vale para um colaborador desta filial?
    pub fn applies_to_branch(&self, branch_id: Uuid) -> bool {
        self.branch_id.is_none_or(|b| b == branch_id)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateHolidayPayload {
    /// Omitido = feriado do tenant inteiro.
    pub branch_id: Option<Uuid>,

    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,

    #[validate(length(min = 1, max = 120, message = "Holiday name is required."))]
    pub name: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct HolidayQuery {
    pub year: Option<i32>,
    pub branch_id: Option<Uuid>,
}
