// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::rbac::SUPER_ADMIN_ROLE,
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        // A. Extrai Usuário
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)?;

        // B. Extrai Tenant
        let tenant = parts
            .extensions
            .get::<TenantContext>()
            .ok_or_else(|| AppError::forbidden("Tenant context missing."))?;

        // C. Pega o slug da permissão
        let required_perm = T::slug();

        // D. Verifica no Banco (Super Admin passa sempre)
        let has_permission = app_state
            .rbac_repo
            .employee_has_permission(tenant.tenant_id, user.employee_id, required_perm)
            .await?
            || app_state
                .rbac_repo
                .employee_has_role(user.employee_id, SUPER_ADMIN_ROLE)
                .await?;

        if !has_permission {
            tracing::warn!(employee_id = %user.employee_id, permission = required_perm, "Permissão negada");
            return Err(AppError::forbidden(format!(
                "You need the '{}' permission to perform this action.",
                required_perm
            )));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission {
    ($name:ident, $slug:literal) => {
        pub struct $name;
        impl PermissionDef for $name {
            fn slug() -> &'static str {
                $slug
            }
        }
    };
}

permission!(PermAttendanceRead, "attendance:read");
permission!(PermHolidayManage, "holiday:manage");
permission!(PermLeaveApprove, "leave:approve");
permission!(PermLeaveManage, "leave:manage");
permission!(PermComplaintManage, "complaint:manage");
permission!(PermTechIssueManage, "techissue:manage");
permission!(PermRoleManage, "role:manage");
permission!(PermEmployeeManage, "employee:manage");
permission!(PermBranchManage, "branch:manage");
permission!(PermPayslipGenerate, "payslip:generate");
permission!(PermSettingsManage, "settings:manage");
permission!(PermAuditRead, "audit:read");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_match_seeded_catalog() {
        let slugs = [
            PermAttendanceRead::slug(),
            PermHolidayManage::slug(),
            PermLeaveApprove::slug(),
            PermLeaveManage::slug(),
            PermComplaintManage::slug(),
            PermTechIssueManage::slug(),
            PermRoleManage::slug(),
            PermEmployeeManage::slug(),
            PermBranchManage::slug(),
            PermPayslipGenerate::slug(),
            PermSettingsManage::slug(),
            PermAuditRead::slug(),
        ];
        let migration = include_str!("../../migrations/20250101000000_initial_schema.sql");
        for slug in slugs {
            assert!(migration.contains(&format!("'{}'", slug)), "{slug} missing from migration seed");
        }
    }
}
