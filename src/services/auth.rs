// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{EmployeeRepository, RbacRepository, UserRepository},
    models::{
        auth::{AuthResponse, Claims, User, UserProfile},
        employee::Employee,
    },
};

/// O que um token válido identifica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenIdentity {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Hash fora do runtime assíncrono.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password_clone = password.to_owned();
    let password_hash_clone = password_hash.to_owned();

    // Executa a verificação em um thread separado
    let is_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(is_valid)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    employee_repo: EmployeeRepository,
    rbac_repo: RbacRepository,
    jwt_secret: String,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        employee_repo: EmployeeRepository,
        rbac_repo: RbacRepository,
        jwt_secret: String,
        token_ttl_hours: i64,
    ) -> Self {
        Self {
            user_repo,
            employee_repo,
            rbac_repo,
            jwt_secret,
            token_ttl: Duration::hours(token_ttl_hours),
        }
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            tracing::warn!(user_id = %user.id, "Senha incorreta no login");
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AppError::forbidden("This account is disabled."));
        }

        let employee = self
            .employee_repo
            .find_by_user(user.id)
            .await?
            .filter(|e| e.is_active)
            .ok_or_else(|| AppError::forbidden("No active employee profile is linked to this account."))?;

        let (token, expires_at) = self.create_token(&user, &employee, Utc::now())?;
        self.user_repo.touch_last_login(user.id).await?;

        tracing::info!(user_id = %user.id, tenant_id = %user.tenant_id, "Login efetuado");

        Ok(AuthResponse {
            token,
            expires_at,
            profile: self.build_profile(&user, employee).await?,
        })
    }

    /// Valida assinatura e expiração. Não consulta o banco.
    pub fn validate_token(&self, token: &str) -> Result<TokenIdentity, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let claims = token_data.claims;
        let expires_at = Utc
            .timestamp_opt(claims.exp as i64, 0)
            .single()
            .ok_or(AppError::InvalidToken)?;

        Ok(TokenIdentity {
            user_id: claims.sub,
            tenant_id: claims.tid,
            employee_id: claims.eid,
            expires_at,
        })
    }

    /// Carrega o usuário do token; contas desativadas deixam de autenticar.
    pub async fn load_active_user(&self, identity: &TokenIdentity) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(identity.user_id)
            .await?
            .filter(|u| u.is_active && u.tenant_id == identity.tenant_id)
            .ok_or(AppError::InvalidToken)
    }

    pub async fn get_profile(&self, user_id: Uuid, tenant_id: Uuid, employee_id: Uuid) -> Result<UserProfile, AppError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found."))?;
        let employee = self
            .employee_repo
            .get(tenant_id, employee_id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee not found."))?;
        self.build_profile(&user, employee).await
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !verify_password(current_password, &user.password_hash).await? {
            return Err(AppError::bad_request("Current password is incorrect."));
        }

        let hashed = hash_password(new_password).await?;
        self.user_repo.update_password(user.id, &hashed).await?;

        tracing::info!(user_id = %user.id, "Senha alterada");
        Ok(())
    }

    async fn build_profile(&self, user: &User, employee: Employee) -> Result<UserProfile, AppError> {
        let roles = self.rbac_repo.employee_role_names(employee.id).await?;
        let permissions = self.rbac_repo.employee_permission_slugs(employee.id).await?;
        Ok(UserProfile {
            user_id: user.id,
            email: user.email.clone(),
            employee,
            roles,
            permissions,
        })
    }

    fn create_token(
        &self,
        user: &User,
        employee: &Employee,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub: user.id,
            tid: user.tenant_id,
            eid: employee.id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?;
        Ok((token, expires_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use sqlx::postgres::PgPoolOptions;

    fn service(secret: &str, ttl_hours: i64) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        AuthService::new(
            UserRepository::new(pool.clone()),
            EmployeeRepository::new(pool.clone()),
            RbacRepository::new(pool),
            secret.to_string(),
            ttl_hours,
        )
    }

    fn fixtures() -> (User, Employee) {
        let tenant_id = Uuid::new_v4();
        let user = User {
            id: Uuid::new_v4(),
            tenant_id,
            email: "ana@bank.test".into(),
            password_hash: String::new(),
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let employee = Employee {
            id: Uuid::new_v4(),
            tenant_id,
            branch_id: Uuid::new_v4(),
            user_id: user.id,
            employee_code: "EMP-1".into(),
            full_name: "Ana Lima".into(),
            email: user.email.clone(),
            department: None,
            designation: None,
            joined_on: Utc::now().date_naive(),
            base_salary: Decimal::ZERO,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        (user, employee)
    }

    #[tokio::test]
    async fn token_round_trip_carries_identity() {
        let auth = service("test-secret", 12);
        let (user, employee) = fixtures();
        let (token, expires_at) = auth.create_token(&user, &employee, Utc::now()).unwrap();

        let identity = auth.validate_token(&token).unwrap();
        assert_eq!(identity.user_id, user.id);
        assert_eq!(identity.tenant_id, user.tenant_id);
        assert_eq!(identity.employee_id, employee.id);
        assert_eq!(identity.expires_at.timestamp(), expires_at.timestamp());
    }

    #[tokio::test]
    async fn tampered_or_foreign_tokens_are_rejected() {
        let auth = service("test-secret", 12);
        let other = service("another-secret", 12);
        let (user, employee) = fixtures();
        let (token, _) = other.create_token(&user, &employee, Utc::now()).unwrap();

        assert!(matches!(auth.validate_token(&token), Err(AppError::InvalidToken)));
        assert!(matches!(auth.validate_token("not-a-jwt"), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn expired_tokens_are_rejected() {
        let auth = service("test-secret", 1);
        let (user, employee) = fixtures();
        let issued = Utc::now() - Duration::hours(3);
        let (token, _) = auth.create_token(&user, &employee, issued).unwrap();

        assert!(matches!(auth.validate_token(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hashed = hash_password("s3cret-pass").await.unwrap();
        assert!(verify_password("s3cret-pass", &hashed).await.unwrap());
        assert!(!verify_password("wrong", &hashed).await.unwrap());
    }
}
