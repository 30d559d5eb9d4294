// src/services/settings_service.rs

use serde_json::json;
use uuid::Uuid;

use crate::{
    common::{db_utils::UnitOfWork, error::AppError},
    db::{AuditRepository, SettingsRepository},
    models::{
        audit::NewAuditEntry,
        settings::{TenantSettings, UpdateSettingsRequest},
    },
};

#[derive(Clone)]
pub struct SettingsService {
    repo: SettingsRepository,
    audit_repo: AuditRepository,
}

impl SettingsService {
    pub fn new(repo: SettingsRepository, audit_repo: AuditRepository) -> Self {
        Self { repo, audit_repo }
    }

    pub async fn get(&self, tenant_id: Uuid) -> Result<TenantSettings, AppError> {
        self.repo.get_or_default(tenant_id).await
    }

    /// Atualização parcial: campos ausentes mantêm o valor atual.
    pub async fn update(
        &self,
        mut tx: UnitOfWork,
        tenant_id: Uuid,
        payload: UpdateSettingsRequest,
    ) -> Result<TenantSettings, AppError> {
        let current = self.repo.get_settings(&mut *tx, tenant_id).await?;
        let saved = self.repo.upsert_settings(&mut *tx, &current.merged_with(&payload)).await?;

        self.audit_repo
            .record(
                &mut *tx,
                NewAuditEntry {
                    tenant_id,
                    actor_user_id: None,
                    action: "SETTINGS_UPDATED",
                    entity: "tenant_settings",
                    entity_id: Some(tenant_id),
                    details: json!({
                        "workStartTime": saved.work_start_time.format("%H:%M:%S").to_string(),
                        "graceMinutes": saved.grace_minutes,
                        "utcOffsetMinutes": saved.utc_offset_minutes,
                        "countWeekends": saved.count_weekends,
                        "currency": saved.currency,
                    }),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant_id, "Configurações atualizadas");
        Ok(saved)
    }
}
