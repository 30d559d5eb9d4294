use sqlx::{Postgres, Transaction};

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::tenancy::TenantContext;

/// Unidade de trabalho da requisição.
pub type UnitOfWork = Transaction<'static, Postgres>;

// ---
// Helper: a "chave" da requisição para o banco
// ---
/// Abre uma transação e grava `app.tenant_id` / `app.user_id` nela.
/// As variáveis valem só dentro da transação (`is_local = true`), então a
/// conexão volta limpa para a pool.
pub(crate) async fn begin_scoped(
    app_state: &AppState,
    tenant_ctx: &TenantContext,
    user: &AuthenticatedUser,
) -> Result<UnitOfWork, AppError> {
    let mut tx = app_state.db_pool.begin().await?;

    sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
        .bind(tenant_ctx.tenant_id.to_string())
        .execute(&mut *tx)
        .await?;

    sqlx::query("SELECT set_config('app.user_id', $1, true)")
        .bind(user.user_id.to_string())
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}
