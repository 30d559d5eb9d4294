// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState, middleware::auth::AuthenticatedUser};

// O tenant vem do token; não há cabeçalho para trocar de tenant.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext {
    pub tenant_id: Uuid,
}

/// Roda depois do `auth_guard`: barra tenant inativo ou com assinatura vencida.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let tenant_id = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|u| u.tenant_id)
        .ok_or(AppError::InvalidToken)?;

    let tenant = app_state
        .tenant_repo
        .find_by_id(tenant_id)
        .await?
        .ok_or(AppError::InvalidToken)?;

    if !tenant.is_active {
        return Err(AppError::forbidden("This organization has been deactivated."));
    }
    if !tenant.subscription_valid_at(Utc::now()) {
        return Err(AppError::forbidden(format!(
            "The subscription expired on {}. Please renew to continue.",
            tenant.subscription_expires_at.format("%Y-%m-%d")
        )));
    }

    request.extensions_mut().insert(TenantContext { tenant_id });
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .copied()
            .ok_or_else(|| AppError::forbidden("Tenant context missing."))
    }
}
