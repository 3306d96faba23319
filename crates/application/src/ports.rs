//! Repository ports implemented by infrastructure adapters.

use async_trait::async_trait;
use campus_core::AppResult;
use chrono::{DateTime, Utc};

use campus_domain::{Assignment, AuditAction, Role, RoleName, User, UserId, Username};

/// Port for persisting role definitions.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Persists one role definition, overwriting an existing row with the
    /// same name.
    async fn save_role(&self, role: Role) -> AppResult<()>;

    /// Lists all persisted role definitions in name order.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;
}

/// Port for the assignment ledger: who holds which role, until when.
///
/// The `(user_id, role_name)` pair is unique; `upsert` overwrites the
/// previous record so racing grants to the same pair serialize
/// last-writer-wins at the storage layer.
#[async_trait]
pub trait RoleAssignmentRepository: Send + Sync {
    /// Returns whether the user holds an assignment of the role that is
    /// active at `now` (no expiry, or expiry strictly after `now`).
    async fn has_active_assignment(
        &self,
        user_id: UserId,
        role_name: &RoleName,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Inserts or overwrites the assignment for its `(user, role)` key and
    /// returns the persisted record.
    async fn upsert(&self, assignment: Assignment) -> AppResult<Assignment>;

    /// Lists the names of all roles the user actively holds at `now`, in
    /// name order.
    async fn list_active_roles(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<RoleName>>;
}

/// Port for persisting platform user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persists a new user. Fails with a conflict when the username or
    /// email is already taken.
    async fn create(&self, user: User) -> AppResult<User>;

    /// Finds a user by login name.
    async fn find_by_username(&self, username: &Username) -> AppResult<Option<User>>;

    /// Finds a user by identifier.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>>;
}

/// Immutable audit event payload emitted by application services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// User that performed the action. `None` marks the provisioning routine.
    pub actor: Option<UserId>,
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// User affected by the action, when the action targets one.
    pub target_user_id: Option<UserId>,
    /// Role involved in the action, when the action involves one.
    pub role_name: Option<RoleName>,
    /// Optional audit detail payload.
    pub detail: Option<String>,
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
