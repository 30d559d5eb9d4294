// src/handlers/auth.rs

use axum::extract::State;

use crate::{
    common::{error::AppError, extract::ValidatedJson, response::ApiResponse},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{AuthResponse, ChangePasswordPayload, LoginUserPayload, UserProfile},
};

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Token emitido", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Credenciais inválidas"),
        (status = 403, description = "Conta desativada")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginUserPayload>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let response = app_state.auth_service.login_user(&payload.email, &payload.password).await?;
    Ok(ApiResponse::ok("Login successful.", response))
}

// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    security(("api_jwt" = [])),
    responses(
        (status = 200, description = "Perfil do usuário logado", body = ApiResponse<UserProfile>),
        (status = 401, description = "Token ausente ou inválido")
    )
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<ApiResponse<UserProfile>, AppError> {
    let profile = app_state
        .auth_service
        .get_profile(user.user_id, user.tenant_id, user.employee_id)
        .await?;
    Ok(ApiResponse::ok("OK", profile))
}

// POST /api/auth/change-password
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    tag = "Auth",
    security(("api_jwt" = [])),
    request_body = ChangePasswordPayload,
    responses(
        (status = 200, description = "Senha alterada"),
        (status = 400, description = "Senha atual incorreta")
    )
)]
pub async fn change_password(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordPayload>,
) -> Result<ApiResponse<()>, AppError> {
    app_state
        .auth_service
        .change_password(user.user_id, &payload.current_password, &payload.new_password)
        .await?;
    Ok(ApiResponse::message("Password changed successfully."))
}
