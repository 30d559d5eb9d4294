// src/models/settings.rs

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_WORK_START: (u32, u32) = (9, 0);
pub const DEFAULT_GRACE_MINUTES: i32 = 15;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantSettings {
    #[schema(ignore)] // O contexto (token) já define o tenant
    pub tenant_id: Uuid,

    #[schema(value_type = String, example = "09:00:00")]
    pub work_start_time: NaiveTime,

    #[schema(example = 15)]
    pub grace_minutes: i32,

    pub utc_offset_minutes: i32,

    /// Sábados e domingos contam como dias úteis nos relatórios.
    #[schema(example = true)]
    pub count_weekends: bool,

    #[schema(example = "USD")]
    pub currency: String,

    pub payslip_footer: Option<String>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl TenantSettings {
    pub fn defaults(tenant_id: Uuid) -> Self {
        Self {
            tenant_id,
            work_start_time: NaiveTime::from_hms_opt(DEFAULT_WORK_START.0, DEFAULT_WORK_START.1, 0)
                .unwrap_or(NaiveTime::MIN),
            grace_minutes: DEFAULT_GRACE_MINUTES,
            utc_offset_minutes: 0,
            count_weekends: true,
            currency: "USD".to_string(),
            payslip_footer: None,
            updated_at: None,
        }
    }

    /// Aplica só os campos presentes na requisição.
    pub fn merged_with(mut self, input: &UpdateSettingsRequest) -> Self {
        if let Some(t) = input.work_start_time {
            self.work_start_time = t;
        }
        if let Some(g) = input.grace_minutes {
            self.grace_minutes = g;
        }
        if let Some(o) = input.utc_offset_minutes {
            self.utc_offset_minutes = o;
        }
        if let Some(w) = input.count_weekends {
            self.count_weekends = w;
        }
        if let Some(c) = &input.currency {
            self.currency = c.clone();
        }
        if input.payslip_footer.is_some() {
            self.payslip_footer = input.payslip_footer.clone();
        }
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[schema(value_type = Option<String>, example = "08:30:00")]
    pub work_start_time: Option<NaiveTime>,

    #[validate(range(min = 0, max = 240, message = "graceMinutes must be between 0 and 240."))]
    pub grace_minutes: Option<i32>,

    #[validate(range(min = -720, max = 840, message = "utcOffsetMinutes must be between -720 and 840."))]
    pub utc_offset_minutes: Option<i32>,

    pub count_weekends: Option<bool>,

    #[validate(length(equal = 3, message = "currency must be a 3-letter ISO code."))]
    pub currency: Option<String>,

    pub payslip_footer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_only_touches_present_fields() {
        let tenant = Uuid::new_v4();
        let update = UpdateSettingsRequest {
            grace_minutes: Some(5),
            currency: Some("BRL".into()),
            ..Default::default()
        };
        let merged = TenantSettings::defaults(tenant).merged_with(&update);

        assert_eq!(merged.grace_minutes, 5);
        assert_eq!(merged.currency, "BRL");
        assert_eq!(merged.work_start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert!(merged.count_weekends);
    }
}
