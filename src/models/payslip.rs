// src/models/payslip.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::employee::validate_not_negative;

/// Linha de provento ou desconto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayComponent {
    #[validate(length(min = 1, max = 80, message = "Every line needs a label."))]
    #[schema(example = "Housing allowance")]
    pub label: String,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "350.00")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payslip {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub month: i32,
    pub year: i32,
    pub basic_salary: Decimal,
    #[schema(value_type = Vec<PayComponent>)]
    pub earnings: Json<Vec<PayComponent>>,
    #[schema(value_type = Vec<PayComponent>)]
    pub deductions: Json<Vec<PayComponent>>,
    pub gross_pay: Decimal,
    pub total_deductions: Decimal,
    pub net_pay: Decimal,
    pub generated_by: Option<Uuid>,
    pub generated_at: DateTime<Utc>,
}

/// Totais derivados das linhas. O líquido pode ser negativo se os descontos
/// superarem o bruto; isso é recusado na geração.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayTotals {
    pub gross_pay: Decimal,
    pub total_deductions: Decimal,
    pub net_pay: Decimal,
}

impl PayTotals {
    pub fn compute(basic_salary: Decimal, earnings: &[PayComponent], deductions: &[PayComponent]) -> Self {
        let gross_pay = basic_salary + earnings.iter().map(|c| c.amount).sum::<Decimal>();
        let total_deductions = deductions.iter().map(|c| c.amount).sum::<Decimal>();
        Self {
            gross_pay: gross_pay.round_dp(2),
            total_deductions: total_deductions.round_dp(2),
            net_pay: (gross_pay - total_deductions).round_dp(2),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePayslipPayload {
    pub employee_id: Uuid,

    #[validate(range(min = 1, max = 12, message = "month must be between 1 and 12."))]
    pub month: i32,

    #[validate(range(min = 2000, max = 2100, message = "year is out of range."))]
    pub year: i32,

    /// Omitido = salário-base do cadastro do colaborador.
    pub basic_salary: Option<Decimal>,

    #[validate(nested)]
    #[serde(default)]
    pub earnings: Vec<PayComponent>,

    #[validate(nested)]
    #[serde(default)]
    pub deductions: Vec<PayComponent>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct PayslipQuery {
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub employee_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    fn line(label: &str, amount: f64) -> PayComponent {
        PayComponent { label: label.into(), amount: Decimal::from_f64(amount).unwrap() }
    }

    #[test]
    fn totals_add_earnings_and_subtract_deductions() {
        let totals = PayTotals::compute(
            Decimal::new(4000_00, 2),
            &[line("Housing", 350.0), line("Overtime", 120.5)],
            &[line("Tax", 610.25), line("Pension", 200.0)],
        );
        assert_eq!(totals.gross_pay, Decimal::new(4470_50, 2));
        assert_eq!(totals.total_deductions, Decimal::new(810_25, 2));
        assert_eq!(totals.net_pay, Decimal::new(3660_25, 2));
    }

    #[test]
    fn month_must_be_calendar_month() {
        let payload = |month| GeneratePayslipPayload {
            employee_id: Uuid::new_v4(),
            month,
            year: 2024,
            basic_salary: None,
            earnings: vec![],
            deductions: vec![line("", 1.0)],
        };
        assert!(payload(13).validate().is_err());

        let errors = payload(12).validate().unwrap_err();
        assert!(!errors.field_errors().contains_key("month"));
        assert!(matches!(errors.errors().get("deductions"), Some(validator::ValidationErrorsKind::List(_))));
    }
}
