// src/services/leave_rules.rs
// Aritmética de saldo e guardas de revisão, sem banco.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::common::{dates::inclusive_day_count, error::AppError};
use crate::models::leave::{LeaveBalance, LeaveRequestView, LeaveStatus};

/// Dias debitados pelo pedido: 0.5 para meio período, senão o intervalo fechado.
pub fn requested_days(start: NaiveDate, end: NaiveDate, is_half_day: bool) -> Result<Decimal, AppError> {
    if start > end {
        return Err(AppError::bad_request("Start date must be on or before the end date."));
    }
    if is_half_day {
        if start != end {
            return Err(AppError::bad_request("A half-day leave must start and end on the same day."));
        }
        return Ok(Decimal::new(5, 1));
    }
    Ok(Decimal::from(inclusive_day_count(start, end)))
}

fn days_label(value: Decimal) -> String {
    value.normalize().to_string()
}

pub fn insufficient_balance(available: Decimal, requested: Decimal) -> AppError {
    AppError::bad_request(format!(
        "Insufficient leave balance. Available: {} day(s), requested: {} day(s).",
        days_label(available),
        days_label(requested)
    ))
}

/// Submissão: cabe em alocado − usado − pendente?
pub fn ensure_can_hold(balance: &LeaveBalance, requested: Decimal) -> Result<(), AppError> {
    let available = balance.available();
    if requested > available {
        return Err(insufficient_balance(available.max(Decimal::ZERO), requested));
    }
    Ok(())
}

/// Aprovação: o próprio pedido já está em `pending`, então só `used` conta.
pub fn ensure_can_commit(balance: &LeaveBalance, total_days: Decimal) -> Result<(), AppError> {
    let available = balance.total_allocated - balance.used;
    if balance.used + total_days > balance.total_allocated {
        return Err(insufficient_balance(available.max(Decimal::ZERO), total_days));
    }
    Ok(())
}

/// Quem revisa e de onde.
#[derive(Debug, Clone, Copy)]
pub struct Reviewer {
    pub employee_id: Uuid,
    pub branch_id: Uuid,
    pub is_super_admin: bool,
}

/// Guardas comuns a aprovar e rejeitar: sem auto-aprovação, escopo de filial, só pendentes.
pub fn ensure_reviewable(request: &LeaveRequestView, reviewer: &Reviewer) -> Result<(), AppError> {
    if request.request.employee_id == reviewer.employee_id {
        return Err(AppError::forbidden("You cannot review your own leave request."));
    }
    if !reviewer.is_super_admin && request.branch_id != reviewer.branch_id {
        return Err(AppError::forbidden("You can only review leave requests from your own branch."));
    }
    if request.request.status != LeaveStatus::Pending {
        return Err(AppError::bad_request(format!(
            "Only pending requests can be reviewed. Current status: {:?}.",
            request.request.status
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::leave::LeaveRequest;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn balance(allocated: i64, used: i64, pending: i64) -> LeaveBalance {
        LeaveBalance {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            leave_type_id: Uuid::new_v4(),
            year: 2024,
            total_allocated: Decimal::from(allocated),
            used: Decimal::from(used),
            pending: Decimal::from(pending),
            updated_at: Utc::now(),
        }
    }

    fn view(employee_id: Uuid, branch_id: Uuid, status: LeaveStatus) -> LeaveRequestView {
        LeaveRequestView {
            request: LeaveRequest {
                id: Uuid::new_v4(),
                tenant_id: Uuid::new_v4(),
                employee_id,
                leave_type_id: Uuid::new_v4(),
                start_date: d(6),
                end_date: d(8),
                is_half_day: false,
                total_days: Decimal::from(3),
                reason: None,
                status,
                reviewed_by: None,
                reviewed_at: None,
                rejection_reason: None,
                held_balance_id: None,
                created_at: Utc::now(),
            },
            employee_name: "Ana Lima".into(),
            employee_code: "EMP-1".into(),
            branch_id,
            leave_type_name: "Annual".into(),
        }
    }

    #[test]
    fn requested_days_counts_inclusive_range() {
        assert_eq!(requested_days(d(6), d(8), false).unwrap(), Decimal::from(3));
        assert_eq!(requested_days(d(6), d(6), false).unwrap(), Decimal::ONE);
        assert_eq!(requested_days(d(6), d(6), true).unwrap(), Decimal::new(5, 1));
        assert!(requested_days(d(8), d(6), false).is_err());
        assert!(requested_days(d(6), d(7), true).is_err());
    }

    #[test]
    fn over_request_quotes_available_and_requested() {
        let err = ensure_can_hold(&balance(10, 6, 2), Decimal::from(3)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient leave balance. Available: 2 day(s), requested: 3 day(s)."
        );
        assert!(ensure_can_hold(&balance(10, 6, 2), Decimal::from(2)).is_ok());
    }

    #[test]
    fn half_days_are_printed_with_one_decimal() {
        let mut b = balance(1, 0, 0);
        b.total_allocated = Decimal::new(5, 1);
        b.used = Decimal::new(5, 1);
        let err = ensure_can_hold(&b, Decimal::new(5, 1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient leave balance. Available: 0 day(s), requested: 0.5 day(s)."
        );
    }

    #[test]
    fn approval_ignores_own_pending_hold() {
        // 3 pendentes são deste próprio pedido
        assert!(ensure_can_commit(&balance(10, 7, 3), Decimal::from(3)).is_ok());
        assert!(ensure_can_commit(&balance(10, 8, 3), Decimal::from(3)).is_err());
    }

    #[test]
    fn review_guards() {
        let branch = Uuid::new_v4();
        let requester = Uuid::new_v4();
        let manager = Reviewer { employee_id: Uuid::new_v4(), branch_id: branch, is_super_admin: false };

        assert!(ensure_reviewable(&view(requester, branch, LeaveStatus::Pending), &manager).is_ok());

        let own = Reviewer { employee_id: requester, ..manager };
        assert!(matches!(
            ensure_reviewable(&view(requester, branch, LeaveStatus::Pending), &own),
            Err(AppError::Forbidden(_))
        ));

        let other_branch = view(requester, Uuid::new_v4(), LeaveStatus::Pending);
        assert!(matches!(ensure_reviewable(&other_branch, &manager), Err(AppError::Forbidden(_))));
        let admin = Reviewer { is_super_admin: true, ..manager };
        assert!(ensure_reviewable(&other_branch, &admin).is_ok());

        assert!(matches!(
            ensure_reviewable(&view(requester, branch, LeaveStatus::Approved), &manager),
            Err(AppError::BadRequest(_))
        ));
    }
}
