// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState};

/// Quem está chamando, resolvido a partir do token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

// O middleware em si
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::InvalidToken)?;

    let identity = app_state.auth_service.validate_token(bearer.token()).map_err(|e| {
        tracing::warn!("Token rejeitado em {}", request.uri().path());
        e
    })?;
    let user = app_state.auth_service.load_active_user(&identity).await?;

    // Insere o usuário nos "extensions" da requisição
    request.extensions_mut().insert(AuthenticatedUser {
        user_id: identity.user_id,
        tenant_id: identity.tenant_id,
        employee_id: identity.employee_id,
        email: user.email,
        expires_at: identity.expires_at,
    });

    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}
