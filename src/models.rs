pub mod attendance;
pub mod audit;
pub mod auth;
pub mod employee;
pub mod holiday;
pub mod leave;
pub mod payslip;
pub mod rbac;
pub mod settings;
pub mod tenancy;
pub mod tickets;
