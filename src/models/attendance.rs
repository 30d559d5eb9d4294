// src/models/attendance.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// --- Enums (Mapeando o Postgres) ---

/// Status gravado no registro de ponto no momento do check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "attendance_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

/// Status resolvido de um colaborador num dia (não é gravado).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum DayStatus {
    Present,
    Late,
    Absent,
    Holiday,
    Leave,
}

impl From<AttendanceStatus> for DayStatus {
    fn from(s: AttendanceStatus) -> Self {
        match s {
            AttendanceStatus::Present => DayStatus::Present,
            AttendanceStatus::Late => DayStatus::Late,
            AttendanceStatus::Absent => DayStatus::Absent,
        }
    }
}

// --- Registro ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    #[schema(value_type = String, format = Date, example = "2024-03-04")]
    pub date: NaiveDate,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
    #[schema(example = 8.25)]
    pub work_hours: Option<f64>,
    #[schema(example = 4)]
    pub productivity_rating: Option<i16>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Payloads ---

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckInPayload {
    #[validate(length(max = 500, message = "Notes are limited to 500 characters."))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutPayload {
    #[validate(range(min = 1, max = 5, message = "productivityRating must be between 1 and 5."))]
    pub productivity_rating: Option<i16>,

    #[validate(length(max = 500, message = "Notes are limited to 500 characters."))]
    pub notes: Option<String>,
}

// --- Respostas do colaborador ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStatus {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub checked_in: bool,
    pub checked_out: bool,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub status: DayStatus,
    pub work_hours: Option<f64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    /// Início (YYYY-MM-DD). Padrão: primeiro dia do mês corrente.
    pub from: Option<String>,
    /// Fim (YYYY-MM-DD). Padrão: hoje.
    pub to: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceDay {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub status: DayStatus,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub work_hours: Option<f64>,
    pub holiday_name: Option<String>,
}

// --- Relatórios administrativos ---

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct DailyReportQuery {
    /// Data (YYYY-MM-DD). Padrão: hoje.
    pub date: Option<String>,
    pub branch_id: Option<Uuid>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyReportRow {
    pub employee_id: Uuid,
    pub employee_code: String,
    pub full_name: String,
    pub branch_id: Uuid,
    pub department: Option<String>,
    pub status: DayStatus,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub work_hours: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyCounts {
    pub present: u32,
    pub late: u32,
    pub absent: u32,
    pub holiday: u32,
    pub leave: u32,
}

impl DailyCounts {
    pub fn add(&mut self, status: DayStatus) {
        match status {
            DayStatus::Present => self.present += 1,
            DayStatus::Late => self.late += 1,
            DayStatus::Absent => self.absent += 1,
            DayStatus::Holiday => self.holiday += 1,
            DayStatus::Leave => self.leave += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub counts: DailyCounts,
    pub employees: Vec<DailyReportRow>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReportQuery {
    /// Competência no formato YYYY-MM.
    pub month: String,
    pub branch_id: Option<Uuid>,
    pub department: Option<String>,
    pub employee_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeMonthlySummary {
    pub employee_id: Uuid,
    pub employee_code: String,
    pub full_name: String,
    pub branch_id: Uuid,
    pub department: Option<String>,
    pub working_days: u32,
    pub present_days: u32,
    pub late_days: u32,
    pub absent_days: u32,
    pub leave_taken: u32,
    pub attendance_percentage: f64,
    pub total_hours: f64,
    pub avg_hours: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    #[schema(example = "2024-03")]
    pub month: String,
    #[schema(value_type = Option<String>, format = Date)]
    pub window_start: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub window_end: Option<NaiveDate>,
    pub total_working_days: u32,
    pub include_weekends: bool,
    pub employees: Vec<EmployeeMonthlySummary>,
}
