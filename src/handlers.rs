pub mod attendance;
pub mod audit;
pub mod auth;
pub mod employees;
pub mod holidays;
pub mod leave;
pub mod payslips;
pub mod rbac;
pub mod reports;
pub mod settings;
pub mod tenancy;
pub mod tickets;
