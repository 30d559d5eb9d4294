// src/services/leave_service.rs

use chrono::{Datelike, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::{dates::days_between, db_utils::UnitOfWork, error::AppError},
    db::{
        leave_repo::NewLeaveRequest, AuditRepository, EmployeeRepository, HolidayRepository, LeaveRepository,
        RbacRepository,
    },
    models::{
        audit::NewAuditEntry,
        leave::{
            AllocateBalancePayload, CreateLeaveTypePayload, LeaveBalance, LeaveBalanceView, LeaveRequest,
            LeaveRequestQuery, LeaveRequestView, LeaveStatus, LeaveType, RejectLeavePayload, SubmitLeavePayload,
        },
        rbac::SUPER_ADMIN_ROLE,
    },
    services::{
        attendance_calc::HolidayCalendar,
        leave_rules::{ensure_can_commit, ensure_can_hold, ensure_reviewable, insufficient_balance, requested_days, Reviewer},
    },
};

#[derive(Clone)]
pub struct LeaveService {
    leave_repo: LeaveRepository,
    employee_repo: EmployeeRepository,
    holiday_repo: HolidayRepository,
    rbac_repo: RbacRepository,
    audit_repo: AuditRepository,
}

impl LeaveService {
    pub fn new(
        leave_repo: LeaveRepository,
        employee_repo: EmployeeRepository,
        holiday_repo: HolidayRepository,
        rbac_repo: RbacRepository,
        audit_repo: AuditRepository,
    ) -> Self {
        Self { leave_repo, employee_repo, holiday_repo, rbac_repo, audit_repo }
    }

    // =========================================================================
    //  COLABORADOR
    // =========================================================================

    pub async fn submit(
        &self,
        mut tx: UnitOfWork,
        tenant_id: Uuid,
        employee_id: Uuid,
        payload: SubmitLeavePayload,
    ) -> Result<LeaveRequest, AppError> {
        let employee = self
            .employee_repo
            .find_by_id(&mut *tx, tenant_id, employee_id)
            .await?
            .filter(|e| e.is_active)
            .ok_or_else(|| AppError::bad_request("Employee not found or inactive."))?;

        let total_days = requested_days(payload.start_date, payload.end_date, payload.is_half_day)?;

        self.leave_repo
            .find_type(&mut *tx, tenant_id, payload.leave_type_id)
            .await?
            .filter(|t| t.is_active)
            .ok_or_else(|| AppError::bad_request("The selected leave type is not available."))?;

        // Nenhum dia do intervalo pode ser feriado da filial (ou do tenant todo)
        let holidays = self
            .holiday_repo
            .list_in_range(&mut *tx, tenant_id, payload.start_date, payload.end_date)
            .await?;
        let calendar = HolidayCalendar::new(&holidays);
        if let Some(holiday) = days_between(payload.start_date, payload.end_date)
            .find_map(|d| calendar.holiday_for(d, employee.branch_id))
        {
            return Err(AppError::bad_request(format!(
                "{} is a holiday ({}). Leave cannot include holidays.",
                holiday.date.format("%Y-%m-%d"),
                holiday.name
            )));
        }

        if self
            .leave_repo
            .overlapping_exists(&mut *tx, tenant_id, employee_id, payload.start_date, payload.end_date)
            .await?
        {
            return Err(AppError::bad_request(
                "This request overlaps another pending or approved leave request.",
            ));
        }

        // Sem linha de saldo o pedido passa sem checagem e sem reserva
        let year = payload.start_date.year();
        let held_balance_id = match self
            .leave_repo
            .find_balance(&mut *tx, tenant_id, employee_id, payload.leave_type_id, year)
            .await?
        {
            Some(balance) => {
                ensure_can_hold(&balance, total_days)?;
                if !self.leave_repo.hold_pending(&mut *tx, balance.id, total_days).await? {
                    return Err(insufficient_balance(balance.available(), total_days));
                }
                Some(balance.id)
            }
            None => None,
        };

        let request = self
            .leave_repo
            .create_request(
                &mut *tx,
                NewLeaveRequest {
                    tenant_id,
                    employee_id,
                    leave_type_id: payload.leave_type_id,
                    start_date: payload.start_date,
                    end_date: payload.end_date,
                    is_half_day: payload.is_half_day,
                    total_days,
                    reason: payload.reason.as_deref(),
                    held_balance_id,
                },
            )
            .await?;

        self.audit_repo
            .record(
                &mut *tx,
                NewAuditEntry {
                    tenant_id,
                    actor_user_id: None,
                    action: "LEAVE_SUBMITTED",
                    entity: "leave_request",
                    entity_id: Some(request.id),
                    details: json!({ "totalDays": total_days, "startDate": request.start_date }),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(employee_id = %employee_id, request_id = %request.id, days = %total_days, "Pedido de licença enviado");
        Ok(request)
    }

    pub async fn my_requests(&self, tenant_id: Uuid, employee_id: Uuid) -> Result<Vec<LeaveRequestView>, AppError> {
        self.leave_repo.list_for_employee(tenant_id, employee_id).await
    }

    pub async fn balances(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        year: Option<i32>,
    ) -> Result<Vec<LeaveBalanceView>, AppError> {
        let year = year.unwrap_or_else(|| Utc::now().year());
        self.leave_repo.balances_for_employee(tenant_id, employee_id, year).await
    }

    pub async fn types(&self, tenant_id: Uuid, active_only: bool) -> Result<Vec<LeaveType>, AppError> {
        self.leave_repo.list_types(tenant_id, active_only).await
    }

    // =========================================================================
    //  REVISÃO
    // =========================================================================

    pub async fn list_requests(
        &self,
        tenant_id: Uuid,
        query: LeaveRequestQuery,
    ) -> Result<Vec<LeaveRequestView>, AppError> {
        self.leave_repo.list_requests(tenant_id, query.status, query.branch_id).await
    }

    async fn reviewer(&self, tenant_id: Uuid, employee_id: Uuid) -> Result<Reviewer, AppError> {
        let employee = self
            .employee_repo
            .get(tenant_id, employee_id)
            .await?
            .ok_or_else(|| AppError::forbidden("Your employee profile was not found."))?;

        Ok(Reviewer {
            employee_id: employee.id,
            branch_id: employee.branch_id,
            is_super_admin: self.rbac_repo.employee_has_role(employee.id, SUPER_ADMIN_ROLE).await?,
        })
    }

    pub async fn approve(
        &self,
        mut tx: UnitOfWork,
        tenant_id: Uuid,
        reviewer_id: Uuid,
        request_id: Uuid,
    ) -> Result<LeaveRequest, AppError> {
        let reviewer = self.reviewer(tenant_id, reviewer_id).await?;

        let view = self
            .leave_repo
            .lock_request(&mut *tx, tenant_id, request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Leave request not found."))?;
        ensure_reviewable(&view, &reviewer)?;

        let request = &view.request;
        if let Some(balance) = self.balance_for(&mut tx, request).await? {
            let days = request.total_days;
            if request.held_balance_id == Some(balance.id) {
                ensure_can_commit(&balance, days)?;
                if !self.leave_repo.commit_pending(&mut *tx, balance.id, days).await? {
                    return Err(insufficient_balance(balance.total_allocated - balance.used, days));
                }
            } else {
                // Saldo alocado depois do envio: os dias nunca entraram em pendente
                ensure_can_hold(&balance, days)?;
                if !self.leave_repo.consume_unheld(&mut *tx, balance.id, days).await? {
                    return Err(insufficient_balance(balance.available(), days));
                }
            }
        }

        let approved = self
            .leave_repo
            .mark_reviewed(&mut *tx, request.id, LeaveStatus::Approved, reviewer.employee_id, None)
            .await?
            .ok_or_else(|| AppError::bad_request("Only pending requests can be reviewed."))?;

        self.audit_repo
            .record(
                &mut *tx,
                NewAuditEntry {
                    tenant_id,
                    actor_user_id: None,
                    action: "LEAVE_APPROVED",
                    entity: "leave_request",
                    entity_id: Some(approved.id),
                    details: json!({ "employeeId": approved.employee_id, "totalDays": approved.total_days }),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(request_id = %approved.id, reviewer = %reviewer.employee_id, "Licença aprovada");
        Ok(approved)
    }

    pub async fn reject(
        &self,
        mut tx: UnitOfWork,
        tenant_id: Uuid,
        reviewer_id: Uuid,
        request_id: Uuid,
        payload: RejectLeavePayload,
    ) -> Result<LeaveRequest, AppError> {
        let reason = payload.reason.trim();
        if reason.is_empty() {
            return Err(AppError::bad_request("A rejection reason is required."));
        }

        let reviewer = self.reviewer(tenant_id, reviewer_id).await?;

        let view = self
            .leave_repo
            .lock_request(&mut *tx, tenant_id, request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Leave request not found."))?;
        ensure_reviewable(&view, &reviewer)?;

        let request = &view.request;
        if let Some(balance_id) = request.held_balance_id {
            if !self.leave_repo.release_pending(&mut *tx, balance_id, request.total_days).await? {
                tracing::error!(request_id = %request.id, balance_id = %balance_id, "Reserva de licença não encontrada no saldo");
                return Err(anyhow::anyhow!("leave balance {balance_id} does not hold the pending days").into());
            }
        }

        let rejected = self
            .leave_repo
            .mark_reviewed(&mut *tx, request.id, LeaveStatus::Rejected, reviewer.employee_id, Some(reason))
            .await?
            .ok_or_else(|| AppError::bad_request("Only pending requests can be reviewed."))?;

        self.audit_repo
            .record(
                &mut *tx,
                NewAuditEntry {
                    tenant_id,
                    actor_user_id: None,
                    action: "LEAVE_REJECTED",
                    entity: "leave_request",
                    entity_id: Some(rejected.id),
                    details: json!({ "employeeId": rejected.employee_id, "reason": reason }),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(request_id = %rejected.id, reviewer = %reviewer.employee_id, "Licença rejeitada");
        Ok(rejected)
    }

    async fn balance_for(&self, tx: &mut UnitOfWork, request: &LeaveRequest) -> Result<Option<LeaveBalance>, AppError> {
        self.leave_repo
            .find_balance(
                &mut **tx,
                request.tenant_id,
                request.employee_id,
                request.leave_type_id,
                request.start_date.year(),
            )
            .await
    }

    // =========================================================================
    //  CONFIGURAÇÃO
    // =========================================================================

    pub async fn create_type(
        &self,
        mut tx: UnitOfWork,
        tenant_id: Uuid,
        payload: CreateLeaveTypePayload,
    ) -> Result<LeaveType, AppError> {
        let leave_type = self
            .leave_repo
            .create_type(
                &mut *tx,
                tenant_id,
                payload.name.trim(),
                payload.max_days_per_year,
                payload.is_paid,
                payload.requires_approval,
            )
            .await?;

        self.audit_repo
            .record(
                &mut *tx,
                NewAuditEntry {
                    tenant_id,
                    actor_user_id: None,
                    action: "LEAVE_TYPE_CREATED",
                    entity: "leave_type",
                    entity_id: Some(leave_type.id),
                    details: json!({ "name": leave_type.name, "maxDaysPerYear": leave_type.max_days_per_year }),
                },
            )
            .await?;

        tx.commit().await?;
        Ok(leave_type)
    }

    pub async fn allocate(
        &self,
        mut tx: UnitOfWork,
        tenant_id: Uuid,
        payload: AllocateBalancePayload,
    ) -> Result<LeaveBalance, AppError> {
        self.employee_repo
            .find_by_id(&mut *tx, tenant_id, payload.employee_id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee not found."))?;
        self.leave_repo
            .find_type(&mut *tx, tenant_id, payload.leave_type_id)
            .await?
            .ok_or_else(|| AppError::not_found("Leave type not found."))?;

        let balance = self
            .leave_repo
            .upsert_allocation(
                &mut *tx,
                tenant_id,
                payload.employee_id,
                payload.leave_type_id,
                payload.year,
                payload.total_allocated,
            )
            .await?
            .ok_or_else(|| AppError::bad_request("The allocation cannot go below used + pending days."))?;

        self.audit_repo
            .record(
                &mut *tx,
                NewAuditEntry {
                    tenant_id,
                    actor_user_id: None,
                    action: "LEAVE_BALANCE_ALLOCATED",
                    entity: "leave_balance",
                    entity_id: Some(balance.id),
                    details: json!({
                        "employeeId": balance.employee_id,
                        "year": balance.year,
                        "totalAllocated": balance.total_allocated,
                    }),
                },
            )
            .await?;

        tx.commit().await?;
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{AppConfig, AppState},
        models::{
            employee::{CreateEmployeePayload, Employee},
            tenancy::{CreateBranchPayload, OnboardAdminPayload, OnboardTenantPayload},
        },
    };
    use chrono::{Duration, NaiveDate};
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    fn onboarding() -> OnboardTenantPayload {
        OnboardTenantPayload {
            name: "Leave Bank".into(),
            slug: "leave-bank".into(),
            plan: "BASIC".into(),
            subscription_expires_at: Utc::now() + Duration::days(30),
            max_employees: 10,
            max_branches: 1,
            branches: vec![CreateBranchPayload { name: "Main".into(), code: "MAIN".into(), address: None }],
            admin: OnboardAdminPayload {
                full_name: "Admin".into(),
                email: "admin@leave.test".into(),
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

    fn day(year: i32, month: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, d).unwrap()
    }

    async fn balance_of(
        svc: &LeaveService,
        tenant_id: Uuid,
        employee_id: Uuid,
        leave_type_id: Uuid,
        year: i32,
    ) -> LeaveBalanceView {
        svc.balances(tenant_id, employee_id, Some(year))
            .await
            .unwrap()
            .into_iter()
            .find(|b| b.leave_type_id == leave_type_id)
            .unwrap()
    }

    async fn hire(state: &AppState, pool: &PgPool, tenant_id: Uuid, branch_id: Uuid) -> Employee {
        state
            .employee_service
            .create_employee(
                pool.begin().await.unwrap(),
                tenant_id,
                CreateEmployeePayload {
                    branch_id,
                    employee_code: "E-1".into(),
                    full_name: "Bruno Lima".into(),
                    email: "bruno@leave.test".into(),
                    password: "bruno-pass-1".into(),
                    department: None,
                    designation: None,
                    joined_on: None,
                    base_salary: Decimal::ZERO,
                },
            )
            .await
            .unwrap()
    }

    #[sqlx::test]
    #[ignore = "requer PostgreSQL em DATABASE_URL"]
    async fn submit_approve_and_reject_move_the_counters(pool: PgPool) {
        let state = AppState::from_pool(pool.clone(), AppConfig::for_tests());
        let tenant = state.tenant_service.onboard(onboarding()).await.unwrap();
        let tenant_id = tenant.tenant.id;
        let annual = tenant.leave_types.iter().find(|t| t.name == "Annual Leave").unwrap().id;

        let employee = hire(&state, &pool, tenant_id, tenant.branches[0].id).await;

        let year = Utc::now().year();
        let submit = |start, end| SubmitLeavePayload {
            leave_type_id: annual,
            start_date: start,
            end_date: end,
            is_half_day: false,
            reason: None,
        };
        let svc = &state.leave_service;

        // Pedido maior que o saldo (18 dias) é recusado citando os números
        let err = svc
            .submit(pool.begin().await.unwrap(), tenant_id, employee.id, submit(day(year, 6, 1), day(year, 6, 30)))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient leave balance. Available: 18 day(s), requested: 30 day(s)."
        );

        let approved = svc
            .submit(pool.begin().await.unwrap(), tenant_id, employee.id, submit(day(year, 3, 2), day(year, 3, 4)))
            .await
            .unwrap();
        let rejected = svc
            .submit(pool.begin().await.unwrap(), tenant_id, employee.id, submit(day(year, 4, 6), day(year, 4, 7)))
            .await
            .unwrap();

        let annual_balance = |balances: Vec<LeaveBalanceView>| {
            balances.into_iter().find(|b| b.leave_type_id == annual).unwrap()
        };
        let before = annual_balance(svc.balances(tenant_id, employee.id, Some(year)).await.unwrap());
        assert_eq!(before.pending, Decimal::from(5));

        // Auto-aprovação é barrada
        let err = svc
            .approve(pool.begin().await.unwrap(), tenant_id, employee.id, approved.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let reviewer = tenant.admin_employee_id;
        let done = svc
            .approve(pool.begin().await.unwrap(), tenant_id, reviewer, approved.id)
            .await
            .unwrap();
        assert_eq!(done.status, LeaveStatus::Approved);

        svc.reject(
            pool.begin().await.unwrap(),
            tenant_id,
            reviewer,
            rejected.id,
            RejectLeavePayload { reason: "Busy quarter".into() },
        )
        .await
        .unwrap();

        let after = annual_balance(svc.balances(tenant_id, employee.id, Some(year)).await.unwrap());
        assert_eq!(after.used, Decimal::from(3));
        assert_eq!(after.pending, Decimal::ZERO);
        assert_eq!(after.available, Decimal::from(15));

        // Estado terminal
        let err = svc
            .approve(pool.begin().await.unwrap(), tenant_id, reviewer, rejected.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[sqlx::test]
    #[ignore = "requer PostgreSQL em DATABASE_URL"]
    async fn approving_a_request_sent_before_allocation_keeps_other_holds(pool: PgPool) {
        let state = AppState::from_pool(pool.clone(), AppConfig::for_tests());
        let tenant = state.tenant_service.onboard(onboarding()).await.unwrap();
        let tenant_id = tenant.tenant.id;
        let employee = hire(&state, &pool, tenant_id, tenant.branches[0].id).await;
        let svc = &state.leave_service;

        // Tipo criado depois da admissão: o funcionário ainda não tem linha de saldo
        let study = svc
            .create_type(
                pool.begin().await.unwrap(),
                tenant_id,
                CreateLeaveTypePayload {
                    name: "Study Leave".into(),
                    max_days_per_year: Decimal::from(10),
                    is_paid: true,
                    requires_approval: true,
                },
            )
            .await
            .unwrap();

        let year = Utc::now().year();
        let submit = |start, end| SubmitLeavePayload {
            leave_type_id: study.id,
            start_date: start,
            end_date: end,
            is_half_day: false,
            reason: None,
        };

        let early = svc
            .submit(pool.begin().await.unwrap(), tenant_id, employee.id, submit(day(year, 2, 2), day(year, 2, 3)))
            .await
            .unwrap();
        assert_eq!(early.held_balance_id, None);

        svc.allocate(
            pool.begin().await.unwrap(),
            tenant_id,
            AllocateBalancePayload {
                employee_id: employee.id,
                leave_type_id: study.id,
                year,
                total_allocated: Decimal::from(10),
            },
        )
        .await
        .unwrap();

        let held = svc
            .submit(pool.begin().await.unwrap(), tenant_id, employee.id, submit(day(year, 5, 4), day(year, 5, 6)))
            .await
            .unwrap();
        assert!(held.held_balance_id.is_some());

        let reviewer = tenant.admin_employee_id;
        svc.approve(pool.begin().await.unwrap(), tenant_id, reviewer, early.id)
            .await
            .unwrap();

        // A reserva do outro pedido continua intacta
        let balance = balance_of(svc, tenant_id, employee.id, study.id, year).await;
        assert_eq!(balance.used, Decimal::from(2));
        assert_eq!(balance.pending, Decimal::from(3));
        assert_eq!(balance.available, Decimal::from(5));

        // Disponível já desconta pendente e usado
        let err = svc
            .submit(pool.begin().await.unwrap(), tenant_id, employee.id, submit(day(year, 8, 3), day(year, 8, 8)))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient leave balance. Available: 5 day(s), requested: 6 day(s)."
        );

        svc.reject(
            pool.begin().await.unwrap(),
            tenant_id,
            reviewer,
            held.id,
            RejectLeavePayload { reason: "Exam moved".into() },
        )
        .await
        .unwrap();

        let balance = balance_of(svc, tenant_id, employee.id, study.id, year).await;
        assert_eq!(balance.used, Decimal::from(2));
        assert_eq!(balance.pending, Decimal::ZERO);
        assert_eq!(balance.available, Decimal::from(8));
    }
}
