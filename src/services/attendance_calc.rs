// src/services/attendance_calc.rs
// Regras puras de ponto: classificação do check-in, status do dia e consolidação mensal.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::common::dates::{days_between, is_weekend, YearMonth};
use crate::models::{
    attendance::{Attendance, AttendanceDay, AttendanceStatus, DayStatus, EmployeeMonthlySummary},
    employee::Employee,
    holiday::Holiday,
    leave::LeaveRequest,
};

/// Present se o horário local for estritamente anterior a início + tolerância.
pub fn classify_check_in(local_time: NaiveTime, work_start: NaiveTime, grace_minutes: i32) -> AttendanceStatus {
    let (cutoff, wrapped) = work_start.overflowing_add_signed(Duration::minutes(i64::from(grace_minutes)));
    if wrapped != 0 || local_time < cutoff {
        AttendanceStatus::Present
    } else {
        AttendanceStatus::Late
    }
}

/// Ordem de prioridade: feriado, licença aprovada, registro gravado, ausente.
pub fn resolve_day_status(is_holiday: bool, on_leave: bool, stored: Option<AttendanceStatus>) -> DayStatus {
    if is_holiday {
        DayStatus::Holiday
    } else if on_leave {
        DayStatus::Leave
    } else {
        stored.map(DayStatus::from).unwrap_or(DayStatus::Absent)
    }
}

/// Horas entre entrada e saída, com duas casas.
pub fn work_hours(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> f64 {
    let hours = (check_out - check_in).num_seconds().max(0) as f64 / 3600.0;
    round_to(hours, 2)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Janela do mês: do dia 1 ao último dia, limitada a `today`. `None` para mês futuro.
pub fn month_window(month: YearMonth, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let start = month.first_day();
    if start > today {
        return None;
    }
    Some((start, month.last_day().min(today)))
}

/// Feriados indexados por data, com o escopo de cada um.
pub struct HolidayCalendar<'a> {
    by_date: HashMap<NaiveDate, Vec<&'a Holiday>>,
}

impl<'a> HolidayCalendar<'a> {
    pub fn new(holidays: &'a [Holiday]) -> Self {
        let mut by_date: HashMap<NaiveDate, Vec<&Holiday>> = HashMap::new();
        for h in holidays {
            by_date.entry(h.date).or_default().push(h);
        }
        Self { by_date }
    }

    pub fn holiday_for(&self, date: NaiveDate, branch_id: Uuid) -> Option<&'a Holiday> {
        self.by_date
            .get(&date)
            .and_then(|hs| hs.iter().copied().find(|h| h.applies_to_branch(branch_id)))
    }

    /// Datas de feriado válidas para a filial (gerais incluídos). `None` = só gerais.
    pub fn dates_for(&self, branch_id: Option<Uuid>) -> HashSet<NaiveDate> {
        self.by_date
            .iter()
            .filter(|(_, hs)| {
                hs.iter().any(|h| match (h.branch_id, branch_id) {
                    (None, _) => true,
                    (Some(hb), Some(b)) => hb == b,
                    (Some(_), None) => false,
                })
            })
            .map(|(d, _)| *d)
            .collect()
    }
}

/// Dias úteis da janela: fora os feriados e, se o tenant não conta fim de semana, fora sábado e domingo.
pub fn working_days(
    from: NaiveDate,
    to: NaiveDate,
    holidays: &HashSet<NaiveDate>,
    count_weekends: bool,
) -> Vec<NaiveDate> {
    days_between(from, to)
        .filter(|d| !holidays.contains(d))
        .filter(|d| count_weekends || !is_weekend(*d))
        .collect()
}

pub fn leave_covers(leaves: &[&LeaveRequest], date: NaiveDate) -> bool {
    leaves.iter().any(|l| l.start_date <= date && date <= l.end_date)
}

/// Consolida o mês de um colaborador. Cada dia útil cai em exatamente uma classe:
/// licença, registro gravado (Present/Late/Absent) ou ausência.
pub fn monthly_summary(
    employee: &Employee,
    days: &[NaiveDate],
    attendance: &HashMap<NaiveDate, &Attendance>,
    leaves: &[&LeaveRequest],
) -> EmployeeMonthlySummary {
    let mut present_days = 0u32;
    let mut late_days = 0u32;
    let mut absent_days = 0u32;
    let mut leave_taken = 0u32;
    let mut total_hours = 0f64;

    for day in days {
        let record = attendance.get(day);
        match resolve_day_status(false, leave_covers(leaves, *day), record.map(|a| a.status)) {
            DayStatus::Leave => leave_taken += 1,
            DayStatus::Present => {
                present_days += 1;
                total_hours += record.and_then(|a| a.work_hours).unwrap_or(0.0);
            }
            DayStatus::Late => {
                late_days += 1;
                total_hours += record.and_then(|a| a.work_hours).unwrap_or(0.0);
            }
            DayStatus::Absent | DayStatus::Holiday => absent_days += 1,
        }
    }

    let working_days = days.len() as u32;
    let attended = present_days + late_days;
    let attendance_percentage = if working_days == 0 {
        0.0
    } else {
        round_to(f64::from(attended) / f64::from(working_days) * 100.0, 1)
    };
    let avg_hours = if attended == 0 { 0.0 } else { round_to(total_hours / f64::from(attended), 2) };

    EmployeeMonthlySummary {
        employee_id: employee.id,
        employee_code: employee.employee_code.clone(),
        full_name: employee.full_name.clone(),
        branch_id: employee.branch_id,
        department: employee.department.clone(),
        working_days,
        present_days,
        late_days,
        absent_days,
        leave_taken,
        attendance_percentage,
        total_hours: round_to(total_hours, 2),
        avg_hours,
    }
}

/// Status dia a dia de um colaborador. Fins de semana sem registro somem quando não contam.
pub fn day_by_day(
    branch_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
    calendar: &HolidayCalendar<'_>,
    attendance: &HashMap<NaiveDate, &Attendance>,
    leaves: &[&LeaveRequest],
    count_weekends: bool,
) -> Vec<AttendanceDay> {
    days_between(from, to)
        .filter_map(|date| {
            let record = attendance.get(&date);
            let holiday = calendar.holiday_for(date, branch_id);
            if !count_weekends && is_weekend(date) && record.is_none() && holiday.is_none() {
                return None;
            }
            let status = resolve_day_status(holiday.is_some(), leave_covers(leaves, date), record.map(|a| a.status));
            Some(AttendanceDay {
                date,
                status,
                check_in: record.and_then(|a| a.check_in),
                check_out: record.and_then(|a| a.check_out),
                work_hours: record.and_then(|a| a.work_hours),
                holiday_name: holiday.map(|h| h.name.clone()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use crate::models::leave::LeaveStatus;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn employee(branch_id: Uuid) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            branch_id,
            user_id: Uuid::new_v4(),
            employee_code: "EMP-1".into(),
            full_name: "Ana Lima".into(),
            email: "ana@bank.test".into(),
            department: Some("Retail".into()),
            designation: None,
            joined_on: d(1),
            base_salary: Decimal::ZERO,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn record(employee_id: Uuid, date: NaiveDate, status: AttendanceStatus, hours: Option<f64>) -> Attendance {
        Attendance {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            employee_id,
            date,
            check_in: None,
            check_out: None,
            status,
            work_hours: hours,
            productivity_rating: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn approved_leave(employee_id: Uuid, start: NaiveDate, end: NaiveDate) -> LeaveRequest {
        LeaveRequest {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            employee_id,
            leave_type_id: Uuid::new_v4(),
            start_date: start,
            end_date: end,
            is_half_day: false,
            total_days: Decimal::from((end - start).num_days() + 1),
            reason: None,
            status: LeaveStatus::Approved,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            held_balance_id: None,
            created_at: Utc::now(),
        }
    }

    fn holiday(branch_id: Option<Uuid>, date: NaiveDate) -> Holiday {
        Holiday {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            branch_id,
            date,
            name: "Bank holiday".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn check_in_cutoff_is_exclusive() {
        let start = t(9, 0, 0);
        assert_eq!(classify_check_in(t(8, 45, 0), start, 15), AttendanceStatus::Present);
        assert_eq!(classify_check_in(t(9, 14, 59), start, 15), AttendanceStatus::Present);
        assert_eq!(classify_check_in(t(9, 15, 0), start, 15), AttendanceStatus::Late);
        assert_eq!(classify_check_in(t(11, 0, 0), start, 15), AttendanceStatus::Late);
        assert_eq!(classify_check_in(t(9, 0, 0), start, 0), AttendanceStatus::Late);
    }

    #[test]
    fn day_status_priority() {
        assert_eq!(resolve_day_status(false, false, None), DayStatus::Absent);
        assert_eq!(resolve_day_status(false, true, None), DayStatus::Leave);
        assert_eq!(resolve_day_status(false, true, Some(AttendanceStatus::Present)), DayStatus::Leave);
        assert_eq!(resolve_day_status(true, true, Some(AttendanceStatus::Late)), DayStatus::Holiday);
        assert_eq!(resolve_day_status(false, false, Some(AttendanceStatus::Late)), DayStatus::Late);
        assert_eq!(resolve_day_status(false, false, Some(AttendanceStatus::Absent)), DayStatus::Absent);
    }

    #[test]
    fn work_hours_are_rounded() {
        let a = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 3, 4, 17, 20, 0).unwrap();
        assert_eq!(work_hours(a, b), 8.33);
        assert_eq!(work_hours(b, a), 0.0);
    }

    #[test]
    fn window_is_capped_at_today() {
        let march = YearMonth::parse("2024-03").unwrap();
        assert_eq!(month_window(march, d(10)), Some((d(1), d(10))));
        assert_eq!(month_window(march, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()), Some((d(1), d(31))));
        assert_eq!(month_window(march, NaiveDate::from_ymd_opt(2024, 2, 28).unwrap()), None);
    }

    #[test]
    fn branch_holidays_only_apply_to_their_branch() {
        let downtown = Uuid::new_v4();
        let uptown = Uuid::new_v4();
        let holidays = vec![holiday(None, d(1)), holiday(Some(downtown), d(4))];
        let calendar = HolidayCalendar::new(&holidays);

        assert!(calendar.holiday_for(d(1), uptown).is_some());
        assert!(calendar.holiday_for(d(4), downtown).is_some());
        assert!(calendar.holiday_for(d(4), uptown).is_none());

        assert_eq!(calendar.dates_for(None).len(), 1);
        assert_eq!(calendar.dates_for(Some(downtown)).len(), 2);
        assert_eq!(calendar.dates_for(Some(uptown)).len(), 1);
    }

    #[test]
    fn weekends_can_be_excluded() {
        // 2024-03-01 é sexta-feira
        let none = HashSet::new();
        assert_eq!(working_days(d(1), d(7), &none, true).len(), 7);
        assert_eq!(working_days(d(1), d(7), &none, false).len(), 5);

        let holidays: HashSet<_> = [d(4)].into_iter().collect();
        assert_eq!(working_days(d(1), d(7), &holidays, false).len(), 4);
    }

    #[test]
    fn monthly_days_partition_exactly() {
        let emp = employee(Uuid::new_v4());
        let days: Vec<_> = (1..=10).map(d).collect();

        let records = vec![
            record(emp.id, d(1), AttendanceStatus::Present, Some(8.0)),
            record(emp.id, d(2), AttendanceStatus::Late, Some(7.0)),
            record(emp.id, d(3), AttendanceStatus::Absent, None),
            // Registro dentro da licença: a licença prevalece
            record(emp.id, d(5), AttendanceStatus::Present, Some(4.0)),
        ];
        let by_date: HashMap<_, _> = records.iter().map(|r| (r.date, r)).collect();
        let leave = approved_leave(emp.id, d(5), d(6));

        let s = monthly_summary(&emp, &days, &by_date, &[&leave]);

        assert_eq!(s.working_days, 10);
        assert_eq!(s.present_days, 1);
        assert_eq!(s.late_days, 1);
        assert_eq!(s.leave_taken, 2);
        assert_eq!(s.absent_days, 6);
        assert_eq!(s.present_days + s.late_days + s.absent_days + s.leave_taken, s.working_days);
        assert_eq!(s.attendance_percentage, 20.0);
        assert_eq!(s.total_hours, 15.0);
        assert_eq!(s.avg_hours, 7.5);
    }

    #[test]
    fn leave_beyond_working_days_never_makes_absences_negative() {
        let emp = employee(Uuid::new_v4());
        let days = vec![d(4), d(5)];
        let leave = approved_leave(emp.id, d(1), d(31));

        let s = monthly_summary(&emp, &days, &HashMap::new(), &[&leave]);
        assert_eq!(s.leave_taken, 2);
        assert_eq!(s.absent_days, 0);
        assert_eq!(s.attendance_percentage, 0.0);
        assert_eq!(s.avg_hours, 0.0);
    }

    #[test]
    fn empty_window_yields_zeroes() {
        let emp = employee(Uuid::new_v4());
        let s = monthly_summary(&emp, &[], &HashMap::new(), &[]);
        assert_eq!(s.working_days, 0);
        assert_eq!(s.attendance_percentage, 0.0);
    }

    #[test]
    fn history_marks_holidays_and_leave() {
        let branch = Uuid::new_v4();
        let emp = employee(branch);
        let holidays = vec![holiday(Some(branch), d(4))];
        let calendar = HolidayCalendar::new(&holidays);
        let leave = approved_leave(emp.id, d(5), d(5));
        let present = record(emp.id, d(6), AttendanceStatus::Present, Some(8.0));
        let by_date: HashMap<_, _> = [(present.date, &present)].into_iter().collect();

        let days = day_by_day(branch, d(4), d(7), &calendar, &by_date, &[&leave], true);
        let statuses: Vec<_> = days.iter().map(|x| x.status).collect();
        assert_eq!(statuses, vec![DayStatus::Holiday, DayStatus::Leave, DayStatus::Present, DayStatus::Absent]);
        assert_eq!(days[0].holiday_name.as_deref(), Some("Bank holiday"));

        // 2024-03-09/10 é fim de semana
        let without_weekends = day_by_day(branch, d(8), d(11), &calendar, &HashMap::new(), &[], false);
        assert_eq!(without_weekends.len(), 2);
    }
}
