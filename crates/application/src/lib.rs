//! Application services and ports.

#![forbid(unsafe_code)]

mod grant_service;
mod ports;
mod provisioning_service;

pub use grant_service::RoleGrantService;
pub use ports::{
    AuditEvent, AuditRepository, RoleAssignmentRepository, RoleRepository, UserRepository,
};
pub use provisioning_service::ProvisioningService;
