// src/middleware/platform.rs
// Rotas do operador da plataforma (onboarding e renovação de tenants).

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{common::error::AppError, config::AppState};

pub const PLATFORM_KEY_HEADER: &str = "x-platform-key";

pub async fn platform_guard(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = request
        .headers()
        .get(PLATFORM_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !keys_match(presented, &app_state.config.platform_admin_key) {
        tracing::warn!("Chave de plataforma inválida em {}", request.uri().path());
        return Err(AppError::InvalidToken);
    }

    Ok(next.run(request).await)
}

// Comparação sem saída antecipada no primeiro byte diferente.
fn keys_match(presented: &str, expected: &str) -> bool {
    if expected.is_empty() || presented.len() != expected.len() {
        return false;
    }
    presented
        .bytes()
        .zip(expected.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::keys_match;

    #[test]
    fn platform_key_comparison() {
        assert!(keys_match("op-key-123", "op-key-123"));
        assert!(!keys_match("op-key-124", "op-key-123"));
        assert!(!keys_match("op-key", "op-key-123"));
        assert!(!keys_match("", ""));
    }
}
