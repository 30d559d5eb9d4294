pub mod attendance_repo;
pub use attendance_repo::AttendanceRepository;
pub mod audit_repo;
pub use audit_repo::AuditRepository;
pub mod employee_repo;
pub use employee_repo::EmployeeRepository;
pub mod holiday_repo;
pub use holiday_repo::HolidayRepository;
pub mod leave_repo;
pub use leave_repo::LeaveRepository;
pub mod payslip_repo;
pub use payslip_repo::PayslipRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod ticket_repo;
pub use ticket_repo::TicketRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
