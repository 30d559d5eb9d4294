pub mod attendance_calc;
pub mod attendance_service;
pub mod auth;
pub mod document_service;
pub mod employee_service;
pub mod holiday_service;
pub mod leave_rules;
pub mod leave_service;
pub mod payslip_service;
pub mod rbac_service;
pub mod settings_service;
pub mod tenancy_service;
pub mod ticket_service;
