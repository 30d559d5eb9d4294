use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;
use crate::{
    common::error::AppError,
    models::settings::TenantSettings,
};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Configurações do tenant. Sem linha gravada, valem os padrões.
    pub async fn get_settings<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<TenantSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, TenantSettings>(
            "SELECT * FROM tenant_settings WHERE tenant_id = $1",
        )
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;

        Ok(settings.unwrap_or_else(|| TenantSettings::defaults(tenant_id)))
    }

    /// Leitura fora de transação (relatórios, PDF).
    pub async fn get_or_default(&self, tenant_id: Uuid) -> Result<TenantSettings, AppError> {
        self.get_settings(&self.pool, tenant_id).await
    }

    pub async fn upsert_settings<'e, E>(
        &self,
        executor: E,
        settings: &TenantSettings,
    ) -> Result<TenantSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // UPSERT (Insert or Update)
        let saved = sqlx::query_as::<_, TenantSettings>(
            r#"
            INSERT INTO tenant_settings (
                tenant_id, work_start_time, grace_minutes, utc_offset_minutes,
                count_weekends, currency, payslip_footer
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (tenant_id)
            DO UPDATE SET
                work_start_time = EXCLUDED.work_start_time,
                grace_minutes = EXCLUDED.grace_minutes,
                utc_offset_minutes = EXCLUDED.utc_offset_minutes,
                count_weekends = EXCLUDED.count_weekends,
                currency = EXCLUDED.currency,
                payslip_footer = EXCLUDED.payslip_footer,
                updated_at = NOW()
            RETURNING *
            "#,
        )
            .bind(settings.tenant_id)
            .bind(settings.work_start_time)
            .bind(settings.grace_minutes)
            .bind(settings.utc_offset_minutes)
            .bind(settings.count_weekends)
            .bind(&settings.currency)
            .bind(&settings.payslip_footer)
            .fetch_one(executor)
            .await?;

        Ok(saved)
    }
}
