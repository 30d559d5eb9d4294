pub mod auth;
pub mod platform;
pub mod rbac;
pub mod tenancy;
