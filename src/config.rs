// src/config.rs

use std::{env, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        AttendanceRepository, AuditRepository, EmployeeRepository, HolidayRepository, LeaveRepository,
        PayslipRepository, RbacRepository, SettingsRepository, TenantRepository, TicketRepository,
        UserRepository,
    },
    services::{
        attendance_service::AttendanceService, auth::AuthService, document_service::DocumentService,
        employee_service::EmployeeService, holiday_service::HolidayService, leave_service::LeaveService,
        payslip_service::PayslipService, rbac_service::RbacService, settings_service::SettingsService,
        tenancy_service::TenantService, ticket_service::TicketService,
    },
};

/// Configuração lida do ambiente (`.env` incluído).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub platform_admin_key: String,
    pub bind_addr: SocketAddr,
    pub database_max_connections: u32,
    pub fonts_dir: PathBuf,
}

fn var_or<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválida ({}): {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            jwt_ttl_hours: var_or("JWT_TTL_HOURS", 12)?,
            platform_admin_key: env::var("PLATFORM_ADMIN_KEY").context("PLATFORM_ADMIN_KEY deve ser definida")?,
            bind_addr: var_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            database_max_connections: var_or("DATABASE_MAX_CONNECTIONS", 5)?,
            fonts_dir: var_or("FONTS_DIR", PathBuf::from("./fonts"))?,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: String::new(),
            jwt_secret: "test-secret".into(),
            jwt_ttl_hours: 1,
            platform_admin_key: "platform-key".into(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            database_max_connections: 1,
            fonts_dir: PathBuf::from("./fonts"),
        }
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,

    // Repositórios usados direto pelos middlewares
    pub tenant_repo: TenantRepository,
    pub rbac_repo: RbacRepository,
    pub audit_repo: AuditRepository,

    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub employee_service: EmployeeService,
    pub attendance_service: AttendanceService,
    pub holiday_service: HolidayService,
    pub leave_service: LeaveService,
    pub ticket_service: TicketService,
    pub payslip_service: PayslipService,
    pub rbac_service: RbacService,
    pub settings_service: SettingsService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, config))
    }

    /// Monta o gráfico de dependências sobre uma pool já criada.
    pub fn from_pool(db_pool: PgPool, config: AppConfig) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let employee_repo = EmployeeRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let attendance_repo = AttendanceRepository::new(db_pool.clone());
        let holiday_repo = HolidayRepository::new(db_pool.clone());
        let leave_repo = LeaveRepository::new(db_pool.clone());
        let ticket_repo = TicketRepository::new(db_pool.clone());
        let payslip_repo = PayslipRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());
        let audit_repo = AuditRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            employee_repo.clone(),
            rbac_repo.clone(),
            config.jwt_secret.clone(),
            config.jwt_ttl_hours,
        );
        let tenant_service = TenantService::new(
            tenant_repo.clone(),
            user_repo.clone(),
            employee_repo.clone(),
            rbac_repo.clone(),
            leave_repo.clone(),
            settings_repo.clone(),
            audit_repo.clone(),
            db_pool.clone(),
        );
        let employee_service = EmployeeService::new(
            employee_repo.clone(),
            user_repo,
            tenant_repo.clone(),
            rbac_repo.clone(),
            leave_repo.clone(),
            audit_repo.clone(),
        );
        let attendance_service = AttendanceService::new(
            attendance_repo,
            employee_repo.clone(),
            holiday_repo.clone(),
            leave_repo.clone(),
            settings_repo.clone(),
            db_pool.clone(),
        );
        let holiday_service = HolidayService::new(holiday_repo.clone(), tenant_repo.clone(), audit_repo.clone());
        let leave_service = LeaveService::new(
            leave_repo,
            employee_repo.clone(),
            holiday_repo,
            rbac_repo.clone(),
            audit_repo.clone(),
        );
        let ticket_service = TicketService::new(ticket_repo, employee_repo.clone(), audit_repo.clone());
        let document_service = DocumentService::new(config.fonts_dir.clone());
        let payslip_service = PayslipService::new(
            payslip_repo,
            employee_repo.clone(),
            tenant_repo.clone(),
            settings_repo.clone(),
            audit_repo.clone(),
            document_service,
        );
        let rbac_service = RbacService::new(rbac_repo.clone(), employee_repo, audit_repo.clone());
        let settings_service = SettingsService::new(settings_repo, audit_repo.clone());

        Self {
            db_pool,
            config: Arc::new(config),
            tenant_repo,
            rbac_repo,
            audit_repo,
            auth_service,
            tenant_service,
            employee_service,
            attendance_service,
            holiday_service,
            leave_service,
            ticket_service,
            payslip_service,
            rbac_service,
            settings_service,
        }
    }
}
