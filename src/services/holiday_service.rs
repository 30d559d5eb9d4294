// src/services/holiday_service.rs

use serde_json::json;
use uuid::Uuid;

use crate::{
    common::{db_utils::UnitOfWork, error::AppError},
    db::{AuditRepository, HolidayRepository, TenantRepository},
    models::{
        audit::NewAuditEntry,
        holiday::{CreateHolidayPayload, Holiday, HolidayQuery},
    },
};

#[derive(Clone)]
pub struct HolidayService {
    holiday_repo: HolidayRepository,
    tenant_repo: TenantRepository,
    audit_repo: AuditRepository,
}

impl HolidayService {
    pub fn new(holiday_repo: HolidayRepository, tenant_repo: TenantRepository, audit_repo: AuditRepository) -> Self {
        Self { holiday_repo, tenant_repo, audit_repo }
    }

    /// Um feriado de filial não pode coexistir com um do tenant todo na mesma data (e vice-versa).
    pub async fn create(
        &self,
        mut tx: UnitOfWork,
        tenant_id: Uuid,
        payload: CreateHolidayPayload,
    ) -> Result<Holiday, AppError> {
        if let Some(branch_id) = payload.branch_id {
            self.tenant_repo
                .find_branch(&mut *tx, tenant_id, branch_id)
                .await?
                .ok_or_else(|| AppError::bad_request("The selected branch does not exist."))?;
        }

        if self
            .holiday_repo
            .conflicting_exists(&mut *tx, tenant_id, payload.branch_id, payload.date)
            .await?
        {
            return Err(AppError::conflict(format!(
                "A holiday already exists on {} for this scope.",
                payload.date.format("%Y-%m-%d")
            )));
        }

        let holiday = self
            .holiday_repo
            .create(&mut *tx, tenant_id, payload.branch_id, payload.date, payload.name.trim())
            .await?;

        self.audit_repo
            .record(
                &mut *tx,
                NewAuditEntry {
                    tenant_id,
                    actor_user_id: None,
                    action: "HOLIDAY_CREATED",
                    entity: "holiday",
                    entity_id: Some(holiday.id),
                    details: json!({ "date": holiday.date, "branchId": holiday.branch_id, "name": holiday.name }),
                },
            )
            .await?;

        tx.commit().await?;
        Ok(holiday)
    }

    pub async fn list(&self, tenant_id: Uuid, query: HolidayQuery) -> Result<Vec<Holiday>, AppError> {
        self.holiday_repo.list(tenant_id, query.year, query.branch_id).await
    }

    pub async fn delete(&self, mut tx: UnitOfWork, tenant_id: Uuid, holiday_id: Uuid) -> Result<(), AppError> {
        let holiday = self
            .holiday_repo
            .delete(&mut *tx, tenant_id, holiday_id)
            .await?
            .ok_or_else(|| AppError::not_found("Holiday not found."))?;

        self.audit_repo
            .record(
                &mut *tx,
                NewAuditEntry {
                    tenant_id,
                    actor_user_id: None,
                    action: "HOLIDAY_DELETED",
                    entity: "holiday",
                    entity_id: Some(holiday.id),
                    details: json!({ "date": holiday.date, "name": holiday.name }),
                },
            )
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{AppConfig, AppState},
        models::tenancy::{CreateBranchPayload, OnboardAdminPayload, OnboardTenantPayload, OnboardingResult},
    };
    use chrono::{Duration, NaiveDate, Utc};
    use sqlx::PgPool;

    fn onboarding() -> OnboardTenantPayload {
        let branch = |code: &str| CreateBranchPayload { name: format!("Branch {code}"), code: code.into(), address: None };
        OnboardTenantPayload {
            name: "Holiday Bank".into(),
            slug: "holiday-bank".into(),
            plan: "BASIC".into(),
            subscription_expires_at: Utc::now() + Duration::days(30),
            max_employees: 10,
            max_branches: 2,
            branches: vec![branch("HQ"), branch("BR-01")],
            admin: OnboardAdminPayload {
                full_name: "Admin".into(),
                email: "admin@holiday.test".into(),
                password: "admin-pass-1".into(),
                employee_code: "A-1".into(),
                branch_code: "HQ".into(),
                department: None,
                designation: None,
            },
            roles: vec![],
            leave_types: vec![],
            settings: None,
        }
    }

    fn holiday(branch_id: Option<Uuid>, date: NaiveDate, name: &str) -> CreateHolidayPayload {
        CreateHolidayPayload { branch_id, date, name: name.into() }
    }

    async fn setup(pool: &PgPool) -> (AppState, OnboardingResult) {
        let state = AppState::from_pool(pool.clone(), AppConfig::for_tests());
        let tenant = state.tenant_service.onboard(onboarding()).await.unwrap();
        (state, tenant)
    }

    #[sqlx::test]
    #[ignore = "requer PostgreSQL em DATABASE_URL"]
    async fn tenant_wide_holiday_blocks_branch_holiday_on_same_date(pool: PgPool) {
        let (state, tenant) = setup(&pool).await;
        let svc = &state.holiday_service;
        let date = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();

        svc.create(pool.begin().await.unwrap(), tenant.tenant.id, holiday(None, date, "Christmas"))
            .await
            .unwrap();

        let err = svc
            .create(
                pool.begin().await.unwrap(),
                tenant.tenant.id,
                holiday(Some(tenant.branches[0].id), date, "Branch Christmas"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), "A holiday already exists on 2024-12-25 for this scope.");
    }

    #[sqlx::test]
    #[ignore = "requer PostgreSQL em DATABASE_URL"]
    async fn branch_holiday_blocks_tenant_wide_but_not_other_branches(pool: PgPool) {
        let (state, tenant) = setup(&pool).await;
        let svc = &state.holiday_service;
        let tenant_id = tenant.tenant.id;
        let date = NaiveDate::from_ymd_opt(2024, 7, 9).unwrap();
        let (hq, other) = (tenant.branches[0].id, tenant.branches[1].id);

        svc.create(pool.begin().await.unwrap(), tenant_id, holiday(Some(hq), date, "City Day"))
            .await
            .unwrap();

        // Outra filial pode ter o próprio feriado na mesma data
        let second = svc
            .create(pool.begin().await.unwrap(), tenant_id, holiday(Some(other), date, "Town Day"))
            .await
            .unwrap();
        assert_eq!(second.branch_id, Some(other));

        let err = svc
            .create(pool.begin().await.unwrap(), tenant_id, holiday(None, date, "National Day"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = svc
            .create(pool.begin().await.unwrap(), tenant_id, holiday(Some(hq), date, "City Day again"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
