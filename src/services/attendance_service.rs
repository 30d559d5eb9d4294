// src/services/attendance_service.rs

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        dates::{inclusive_day_count, local_date, parse_date, tenant_offset, YearMonth},
        db_utils::UnitOfWork,
        error::AppError,
    },
    db::{AttendanceRepository, EmployeeRepository, HolidayRepository, LeaveRepository, SettingsRepository},
    models::{
        attendance::{
            Attendance, AttendanceDay, CheckInPayload, CheckOutPayload, CurrentStatus, DailyCounts, DailyReport,
            DailyReportQuery, DailyReportRow, HistoryQuery, MonthlyReport, MonthlyReportQuery,
        },
        employee::{Employee, EmployeeScope},
        leave::LeaveRequest,
    },
    services::attendance_calc::{
        classify_check_in, day_by_day, leave_covers, month_window, monthly_summary, resolve_day_status, work_hours,
        working_days, HolidayCalendar,
    },
};

const MAX_HISTORY_DAYS: i64 = 366;

#[derive(Clone)]
pub struct AttendanceService {
    attendance_repo: AttendanceRepository,
    employee_repo: EmployeeRepository,
    holiday_repo: HolidayRepository,
    leave_repo: LeaveRepository,
    settings_repo: SettingsRepository,
    pool: PgPool,
}

// Registros e licenças agrupados por colaborador.
fn by_employee(records: &[Attendance]) -> HashMap<Uuid, HashMap<NaiveDate, &Attendance>> {
    let mut map: HashMap<Uuid, HashMap<NaiveDate, &Attendance>> = HashMap::new();
    for r in records {
        map.entry(r.employee_id).or_default().insert(r.date, r);
    }
    map
}

fn leaves_by_employee(leaves: &[LeaveRequest]) -> HashMap<Uuid, Vec<&LeaveRequest>> {
    let mut map: HashMap<Uuid, Vec<&LeaveRequest>> = HashMap::new();
    for l in leaves {
        map.entry(l.employee_id).or_default().push(l);
    }
    map
}

impl AttendanceService {
    pub fn new(
        attendance_repo: AttendanceRepository,
        employee_repo: EmployeeRepository,
        holiday_repo: HolidayRepository,
        leave_repo: LeaveRepository,
        settings_repo: SettingsRepository,
        pool: PgPool,
    ) -> Self {
        Self { attendance_repo, employee_repo, holiday_repo, leave_repo, settings_repo, pool }
    }

    async fn active_employee(&self, tenant_id: Uuid, employee_id: Uuid) -> Result<Employee, AppError> {
        self.employee_repo
            .get(tenant_id, employee_id)
            .await?
            .filter(|e| e.is_active)
            .ok_or_else(|| AppError::forbidden("Your employee profile is inactive."))
    }

    /// Situação do dia. Só leitura: nada é criado aqui.
    pub async fn current_status(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CurrentStatus, AppError> {
        let settings = self.settings_repo.get_or_default(tenant_id).await?;
        let employee = self.active_employee(tenant_id, employee_id).await?;
        let today = local_date(now, settings.utc_offset_minutes);

        let record = self
            .attendance_repo
            .find_for_day(&self.pool, tenant_id, employee_id, today)
            .await?;
        let holidays = self.holiday_repo.list_in_range(&self.pool, tenant_id, today, today).await?;
        let leaves = self.leave_repo.approved_in_range(tenant_id, &[employee_id], today, today).await?;

        let is_holiday = HolidayCalendar::new(&holidays).holiday_for(today, employee.branch_id).is_some();
        let leave_refs: Vec<&LeaveRequest> = leaves.iter().collect();
        let status = resolve_day_status(
            is_holiday,
            leave_covers(&leave_refs, today),
            record.as_ref().map(|r| r.status),
        );

        Ok(CurrentStatus {
            date: today,
            checked_in: record.as_ref().is_some_and(|r| r.check_in.is_some()),
            checked_out: record.as_ref().is_some_and(|r| r.check_out.is_some()),
            check_in: record.as_ref().and_then(|r| r.check_in),
            check_out: record.as_ref().and_then(|r| r.check_out),
            status,
            work_hours: record.as_ref().and_then(|r| r.work_hours),
        })
    }

    pub async fn check_in(
        &self,
        mut tx: UnitOfWork,
        tenant_id: Uuid,
        employee_id: Uuid,
        payload: CheckInPayload,
        now: DateTime<Utc>,
    ) -> Result<Attendance, AppError> {
        let settings = self.settings_repo.get_settings(&mut *tx, tenant_id).await?;
        self.active_employee(tenant_id, employee_id).await?;

        let local = now.with_timezone(&tenant_offset(settings.utc_offset_minutes));
        let today = local.date_naive();

        if self
            .attendance_repo
            .find_for_day(&mut *tx, tenant_id, employee_id, today)
            .await?
            .is_some()
        {
            return Err(AppError::bad_request("Already checked in today"));
        }

        let status = classify_check_in(local.time(), settings.work_start_time, settings.grace_minutes);
        let record = self
            .attendance_repo
            .insert_check_in(&mut *tx, tenant_id, employee_id, today, now, status, payload.notes.as_deref())
            .await?;

        tx.commit().await?;

        tracing::info!(employee_id = %employee_id, date = %today, status = ?status, "Check-in registrado");
        Ok(record)
    }

    pub async fn check_out(
        &self,
        mut tx: UnitOfWork,
        tenant_id: Uuid,
        employee_id: Uuid,
        payload: CheckOutPayload,
        now: DateTime<Utc>,
    ) -> Result<Attendance, AppError> {
        let settings = self.settings_repo.get_settings(&mut *tx, tenant_id).await?;
        self.active_employee(tenant_id, employee_id).await?;
        let today = local_date(now, settings.utc_offset_minutes);

        let record = self
            .attendance_repo
            .find_for_day(&mut *tx, tenant_id, employee_id, today)
            .await?
            .ok_or_else(|| AppError::bad_request("Must check in before checking out"))?;

        let check_in = record
            .check_in
            .ok_or_else(|| AppError::bad_request("Must check in before checking out"))?;
        if record.check_out.is_some() {
            return Err(AppError::bad_request("Already checked out today"));
        }

        let hours = work_hours(check_in, now);
        let updated = self
            .attendance_repo
            .record_check_out(
                &mut *tx,
                record.id,
                now,
                hours,
                payload.productivity_rating,
                payload.notes.as_deref(),
            )
            .await?
            .ok_or_else(|| AppError::bad_request("Already checked out today"))?;

        tx.commit().await?;

        tracing::info!(employee_id = %employee_id, date = %today, hours, "Check-out registrado");
        Ok(updated)
    }

    /// Histórico do próprio colaborador (padrão: mês corrente até hoje).
    pub async fn history(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        query: HistoryQuery,
        now: DateTime<Utc>,
    ) -> Result<Vec<AttendanceDay>, AppError> {
        let settings = self.settings_repo.get_or_default(tenant_id).await?;
        let employee = self.active_employee(tenant_id, employee_id).await?;
        let today = local_date(now, settings.utc_offset_minutes);

        let from = match query.from.as_deref() {
            Some(raw) => parse_date(raw)?,
            None => YearMonth::of(today).first_day(),
        };
        let to = match query.to.as_deref() {
            Some(raw) => parse_date(raw)?,
            None => today,
        };
        if from > to {
            return Err(AppError::bad_request("'from' must be on or before 'to'."));
        }
        if inclusive_day_count(from, to) > MAX_HISTORY_DAYS {
            return Err(AppError::bad_request(format!(
                "The history range is limited to {} days.",
                MAX_HISTORY_DAYS
            )));
        }

        let records = self.attendance_repo.list_in_range(tenant_id, &[employee_id], from, to).await?;
        let holidays = self.holiday_repo.list_in_range(&self.pool, tenant_id, from, to).await?;
        let leaves = self.leave_repo.approved_in_range(tenant_id, &[employee_id], from, to).await?;

        let by_date: HashMap<NaiveDate, &Attendance> = records.iter().map(|r| (r.date, r)).collect();
        let leave_refs: Vec<&LeaveRequest> = leaves.iter().collect();

        Ok(day_by_day(
            employee.branch_id,
            from,
            to,
            &HolidayCalendar::new(&holidays),
            &by_date,
            &leave_refs,
            settings.count_weekends,
        ))
    }

    pub async fn daily_report(
        &self,
        tenant_id: Uuid,
        query: DailyReportQuery,
        now: DateTime<Utc>,
    ) -> Result<DailyReport, AppError> {
        let settings = self.settings_repo.get_or_default(tenant_id).await?;
        let date = match query.date.as_deref() {
            Some(raw) => parse_date(raw)?,
            None => local_date(now, settings.utc_offset_minutes),
        };

        let scope = EmployeeScope { branch_id: query.branch_id, department: query.department, employee_id: None };
        let employees = self.employee_repo.list(tenant_id, &scope, false).await?;
        let ids: Vec<Uuid> = employees.iter().map(|e| e.id).collect();

        let records = self.attendance_repo.list_in_range(tenant_id, &ids, date, date).await?;
        let holidays = self.holiday_repo.list_in_range(&self.pool, tenant_id, date, date).await?;
        let leaves = self.leave_repo.approved_in_range(tenant_id, &ids, date, date).await?;

        let calendar = HolidayCalendar::new(&holidays);
        let records = by_employee(&records);
        let leaves = leaves_by_employee(&leaves);

        let mut counts = DailyCounts::default();
        let rows = employees
            .into_iter()
            .map(|e| {
                let record = records.get(&e.id).and_then(|m| m.get(&date)).copied();
                let on_leave = leaves.get(&e.id).is_some_and(|ls| leave_covers(ls, date));
                let status = resolve_day_status(
                    calendar.holiday_for(date, e.branch_id).is_some(),
                    on_leave,
                    record.map(|r| r.status),
                );
                counts.add(status);
                DailyReportRow {
                    employee_id: e.id,
                    employee_code: e.employee_code,
                    full_name: e.full_name,
                    branch_id: e.branch_id,
                    department: e.department,
                    status,
                    check_in: record.and_then(|r| r.check_in),
                    check_out: record.and_then(|r| r.check_out),
                    work_hours: record.and_then(|r| r.work_hours),
                }
            })
            .collect();

        Ok(DailyReport { date, counts, employees: rows })
    }

    pub async fn monthly_report(
        &self,
        tenant_id: Uuid,
        query: MonthlyReportQuery,
        now: DateTime<Utc>,
    ) -> Result<MonthlyReport, AppError> {
        let month = YearMonth::parse(&query.month)?;
        let settings = self.settings_repo.get_or_default(tenant_id).await?;
        let today = local_date(now, settings.utc_offset_minutes);

        let scope = EmployeeScope {
            branch_id: query.branch_id,
            department: query.department,
            employee_id: query.employee_id,
        };
        let employees = self.employee_repo.list(tenant_id, &scope, false).await?;

        // Mês futuro: janela vazia, tudo zerado
        let Some((start, end)) = month_window(month, today) else {
            return Ok(MonthlyReport {
                month: month.to_string(),
                window_start: None,
                window_end: None,
                total_working_days: 0,
                include_weekends: settings.count_weekends,
                employees: employees
                    .iter()
                    .map(|e| monthly_summary(e, &[], &HashMap::new(), &[]))
                    .collect(),
            });
        };

        let ids: Vec<Uuid> = employees.iter().map(|e| e.id).collect();
        let holidays = self.holiday_repo.list_in_range(&self.pool, tenant_id, start, end).await?;
        let records = self.attendance_repo.list_in_range(tenant_id, &ids, start, end).await?;
        let leaves = self.leave_repo.approved_in_range(tenant_id, &ids, start, end).await?;

        let calendar = HolidayCalendar::new(&holidays);
        let total_working_days =
            working_days(start, end, &calendar.dates_for(query.branch_id), settings.count_weekends).len() as u32;

        let records = by_employee(&records);
        let leaves = leaves_by_employee(&leaves);
        let no_records = HashMap::new();

        // Dias úteis por filial (feriados de filial mudam a conta)
        let mut days_by_branch: HashMap<Uuid, Vec<NaiveDate>> = HashMap::new();
        let summaries = employees
            .iter()
            .map(|e| {
                let days = days_by_branch.entry(e.branch_id).or_insert_with(|| {
                    working_days(start, end, &calendar.dates_for(Some(e.branch_id)), settings.count_weekends)
                });
                let employee_leaves = leaves.get(&e.id).map(Vec::as_slice).unwrap_or(&[]);
                monthly_summary(e, days, records.get(&e.id).unwrap_or(&no_records), employee_leaves)
            })
            .collect();

        Ok(MonthlyReport {
            month: month.to_string(),
            window_start: Some(start),
            window_end: Some(end),
            total_working_days,
            include_weekends: settings.count_weekends,
            employees: summaries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{AppConfig, AppState},
        models::{
            attendance::{AttendanceStatus, DayStatus},
            tenancy::{CreateBranchPayload, OnboardAdminPayload, OnboardTenantPayload},
        },
    };
    use chrono::{Duration, TimeZone};

    fn onboarding() -> OnboardTenantPayload {
        OnboardTenantPayload {
            name: "Clock Bank".into(),
            slug: "clock-bank".into(),
            plan: "BASIC".into(),
            subscription_expires_at: Utc::now() + Duration::days(30),
            max_employees: 10,
            max_branches: 1,
            branches: vec![CreateBranchPayload { name: "Main".into(), code: "MAIN".into(), address: None }],
            admin: OnboardAdminPayload {
                full_name: "Admin".into(),
                email: "admin@clock.test".into(),
                password: "admin-pass-1".into(),
                employee_code: "A-1".into(),
                branch_code: "MAIN".into(),
                department: None,
                designation: None,
            },
            roles: vec![],
            leave_types: vec![],
            settings: None,
        }
    }

    // Segunda-feira; expediente padrão 09:00 com 15 min de tolerância, UTC
    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, hour, minute, 0).unwrap()
    }

    fn check_in_payload() -> CheckInPayload {
        CheckInPayload { notes: None }
    }

    fn check_out_payload() -> CheckOutPayload {
        CheckOutPayload { productivity_rating: Some(4), notes: None }
    }

    #[sqlx::test]
    #[ignore = "requer PostgreSQL em DATABASE_URL"]
    async fn one_check_in_and_one_check_out_per_day(pool: PgPool) {
        let state = AppState::from_pool(pool.clone(), AppConfig::for_tests());
        let tenant = state.tenant_service.onboard(onboarding()).await.unwrap();
        let (tenant_id, me) = (tenant.tenant.id, tenant.admin_employee_id);
        let svc = &state.attendance_service;

        let err = svc
            .check_out(pool.begin().await.unwrap(), tenant_id, me, check_out_payload(), at(8, 0))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Must check in before checking out");

        let before = svc.current_status(tenant_id, me, at(8, 10)).await.unwrap();
        assert!(!before.checked_in);
        assert_eq!(before.status, DayStatus::Absent);

        let record = svc
            .check_in(pool.begin().await.unwrap(), tenant_id, me, check_in_payload(), at(8, 30))
            .await
            .unwrap();
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.check_in, Some(at(8, 30)));

        let err = svc
            .check_in(pool.begin().await.unwrap(), tenant_id, me, check_in_payload(), at(8, 45))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Already checked in today");

        // Consultar o status não cria nem altera nada
        let first = svc.current_status(tenant_id, me, at(12, 0)).await.unwrap();
        let second = svc.current_status(tenant_id, me, at(12, 0)).await.unwrap();
        assert_eq!(first, second);
        assert!(first.checked_in && !first.checked_out);
        assert_eq!(first.status, DayStatus::Present);

        let done = svc
            .check_out(pool.begin().await.unwrap(), tenant_id, me, check_out_payload(), at(17, 0))
            .await
            .unwrap();
        assert_eq!(done.work_hours, Some(8.5));
        assert_eq!(done.productivity_rating, Some(4));

        let err = svc
            .check_out(pool.begin().await.unwrap(), tenant_id, me, check_out_payload(), at(17, 5))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Already checked out today");
    }

    #[sqlx::test]
    #[ignore = "requer PostgreSQL em DATABASE_URL"]
    async fn late_arrival_is_classified_after_grace(pool: PgPool) {
        let state = AppState::from_pool(pool.clone(), AppConfig::for_tests());
        let tenant = state.tenant_service.onboard(onboarding()).await.unwrap();

        let record = state
            .attendance_service
            .check_in(
                pool.begin().await.unwrap(),
                tenant.tenant.id,
                tenant.admin_employee_id,
                check_in_payload(),
                at(9, 16),
            )
            .await
            .unwrap();
        assert_eq!(record.status, AttendanceStatus::Late);
    }

    #[sqlx::test]
    #[ignore = "requer PostgreSQL em DATABASE_URL"]
    async fn inactive_employee_cannot_check_out(pool: PgPool) {
        let state = AppState::from_pool(pool.clone(), AppConfig::for_tests());
        let tenant = state.tenant_service.onboard(onboarding()).await.unwrap();
        let (tenant_id, me) = (tenant.tenant.id, tenant.admin_employee_id);
        let svc = &state.attendance_service;

        svc.check_in(pool.begin().await.unwrap(), tenant_id, me, check_in_payload(), at(8, 55))
            .await
            .unwrap();

        sqlx::query("UPDATE employees SET is_active = FALSE WHERE id = $1")
            .bind(me)
            .execute(&pool)
            .await
            .unwrap();

        let err = svc
            .check_out(pool.begin().await.unwrap(), tenant_id, me, check_out_payload(), at(17, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // O registro do dia continua aberto
        let open = svc
            .attendance_repo
            .find_for_day(&pool, tenant_id, me, at(0, 0).date_naive())
            .await
            .unwrap()
            .unwrap();
        assert!(open.check_out.is_none());
    }
}
