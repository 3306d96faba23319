//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod assignment;
mod grant;
mod role;
mod user;

pub use assignment::Assignment;
pub use grant::{AuditAction, GrantError};
pub use role::{
    ADMIN_ROLE, PERMISSIONS_USER_ROLE, Role, RoleName, RoleRegistry, STUDENT_ROLE,
    SUPER_ADMIN_ROLE, TEACHER_ROLE, default_school_roles,
};
pub use user::{EmailAddress, USERNAME_MAX_LENGTH, User, UserId, Username};
