// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::middleware::platform::PLATFORM_KEY_HEADER;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::change_password,

        // --- Attendance ---
        handlers::attendance::current_status,
        handlers::attendance::check_in,
        handlers::attendance::check_out,
        handlers::attendance::history,

        // --- Reports ---
        handlers::reports::daily_report,
        handlers::reports::monthly_report,

        // --- Leave ---
        handlers::leave::submit_leave,
        handlers::leave::my_requests,
        handlers::leave::my_balances,
        handlers::leave::leave_types,
        handlers::leave::list_requests,
        handlers::leave::approve_request,
        handlers::leave::reject_request,
        handlers::leave::list_all_types,
        handlers::leave::create_type,
        handlers::leave::allocate_balance,

        // --- Holidays ---
        handlers::holidays::list_holidays,
        handlers::holidays::create_holiday,
        handlers::holidays::delete_holiday,

        // --- Complaints / Tech issues ---
        handlers::tickets::create_complaint,
        handlers::tickets::my_complaints,
        handlers::tickets::list_complaints,
        handlers::tickets::update_complaint_status,
        handlers::tickets::create_tech_issue,
        handlers::tickets::my_tech_issues,
        handlers::tickets::list_tech_issues,
        handlers::tickets::update_tech_issue_status,

        // --- Payslips ---
        handlers::payslips::my_payslips,
        handlers::payslips::download_my_payslip,
        handlers::payslips::generate_payslip,
        handlers::payslips::list_payslips,
        handlers::payslips::download_payslip,

        // --- Employees ---
        handlers::employees::create_employee,
        handlers::employees::list_employees,
        handlers::employees::get_employee,

        // --- RBAC ---
        handlers::rbac::list_roles,
        handlers::rbac::create_role,
        handlers::rbac::set_role_permissions,
        handlers::rbac::assign_role,
        handlers::rbac::list_permissions,

        // --- Settings / Audit ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,
        handlers::audit::list_audit_logs,

        // --- Tenancy ---
        handlers::tenancy::onboard_tenant,
        handlers::tenancy::list_tenants,
        handlers::tenancy::renew_tenant,
        handlers::tenancy::create_branch,
        handlers::tenancy::list_branches,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::ChangePasswordPayload,
            models::auth::AuthResponse,
            models::auth::UserProfile,

            // --- Attendance ---
            models::attendance::AttendanceStatus,
            models::attendance::DayStatus,
            models::attendance::Attendance,
            models::attendance::CheckInPayload,
            models::attendance::CheckOutPayload,
            models::attendance::CurrentStatus,
            models::attendance::AttendanceDay,
            models::attendance::DailyReportRow,
            models::attendance::DailyCounts,
            models::attendance::DailyReport,
            models::attendance::EmployeeMonthlySummary,
            models::attendance::MonthlyReport,

            // --- Leave ---
            models::leave::LeaveStatus,
            models::leave::LeaveType,
            models::leave::LeaveBalance,
            models::leave::LeaveBalanceView,
            models::leave::LeaveRequest,
            models::leave::LeaveRequestView,
            models::leave::SubmitLeavePayload,
            models::leave::RejectLeavePayload,
            models::leave::CreateLeaveTypePayload,
            models::leave::AllocateBalancePayload,

            // --- Holidays ---
            models::holiday::Holiday,
            models::holiday::CreateHolidayPayload,

            // --- Tickets ---
            models::tickets::TicketStatus,
            models::tickets::TicketPriority,
            models::tickets::Ticket,
            models::tickets::CreateTicketPayload,
            models::tickets::UpdateTicketStatusPayload,

            // --- Payslips ---
            models::payslip::PayComponent,
            models::payslip::Payslip,
            models::payslip::GeneratePayslipPayload,

            // --- Employees ---
            models::employee::Employee,
            models::employee::CreateEmployeePayload,

            // --- RBAC ---
            models::rbac::Role,
            models::rbac::Permission,
            models::rbac::CreateRolePayload,
            models::rbac::SetRolePermissionsPayload,
            models::rbac::AssignRolePayload,
            models::rbac::RoleResponse,

            // --- Settings / Audit ---
            models::settings::TenantSettings,
            models::settings::UpdateSettingsRequest,
            models::audit::AuditLog,

            // --- Tenancy ---
            models::tenancy::Tenant,
            models::tenancy::Branch,
            models::tenancy::CreateBranchPayload,
            models::tenancy::OnboardAdminPayload,
            models::tenancy::OnboardRolePayload,
            models::tenancy::OnboardLeaveTypePayload,
            models::tenancy::OnboardTenantPayload,
            models::tenancy::OnboardingResult,
            models::tenancy::RenewTenantPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Login e Perfil"),
        (name = "Attendance", description = "Ponto do Colaborador"),
        (name = "Reports", description = "Relatórios de Presença"),
        (name = "Leave", description = "Licenças do Colaborador"),
        (name = "Leave Admin", description = "Aprovação, Tipos e Saldos de Licença"),
        (name = "Holidays", description = "Calendário de Feriados"),
        (name = "Complaints", description = "Reclamações"),
        (name = "Tech Issues", description = "Chamados Técnicos"),
        (name = "Payslips", description = "Holerites e PDF"),
        (name = "Employees", description = "Cadastro de Colaboradores"),
        (name = "RBAC", description = "Controle de Acesso (Cargos e Permissões)"),
        (name = "Settings", description = "Configurações do Tenant"),
        (name = "Audit", description = "Trilha de Auditoria"),
        (name = "Branches", description = "Filiais"),
        (name = "Platform", description = "Onboarding e Assinaturas (operador da plataforma)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
        components.add_security_scheme(
            "platform_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(PLATFORM_KEY_HEADER))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_admin_and_platform_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/admin/leave/requests/{id}/approve"));
        assert!(paths.contains_key("/api/platform/tenants"));
        assert!(paths.contains_key("/api/payslips/{id}/pdf"));

        let schemes = doc.components.as_ref().map(|c| c.security_schemes.len()).unwrap_or_default();
        assert_eq!(schemes, 2);
    }
}
