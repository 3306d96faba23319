//! Provisioning: persists the role registry and grants bootstrap roles.
//!
//! This is the only path that may use the unconditional grant case; it
//! runs outside normal authorization, before any end-user grant flow can
//! function.

use std::sync::Arc;

use campus_core::AppResult;
use campus_domain::{Assignment, AuditAction, GrantError, RoleName, RoleRegistry, UserId};
use chrono::{DateTime, Utc};

use crate::ports::{AuditEvent, AuditRepository, RoleAssignmentRepository, RoleRepository};

/// Application service seeding roles and root assignments.
#[derive(Clone)]
pub struct ProvisioningService {
    registry: Arc<RoleRegistry>,
    roles: Arc<dyn RoleRepository>,
    assignments: Arc<dyn RoleAssignmentRepository>,
    audit: Arc<dyn AuditRepository>,
}

impl ProvisioningService {
    /// Creates a provisioning service over the registry and stores.
    #[must_use]
    pub fn new(
        registry: Arc<RoleRegistry>,
        roles: Arc<dyn RoleRepository>,
        assignments: Arc<dyn RoleAssignmentRepository>,
        audit: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            registry,
            roles,
            assignments,
            audit,
        }
    }

    /// Persists every registry role definition. Idempotent: existing rows
    /// are overwritten with the registry values.
    pub async fn provision_registry(&self) -> AppResult<()> {
        let mut count = 0usize;
        for role in self.registry.roles() {
            self.roles.save_role(role.clone()).await?;
            count += 1;
        }

        self.audit
            .append_event(AuditEvent {
                actor: None,
                action: AuditAction::RoleRegistryProvisioned,
                target_user_id: None,
                role_name: None,
                detail: Some(format!("persisted {count} role definitions")),
            })
            .await
    }

    /// Grants a prerequisite-free role to `user_id` without an authorization
    /// check, recording a non-expiring assignment with no grantor.
    ///
    /// Refuses roles that carry a prerequisite; those must go through the
    /// authorized grant flow.
    pub async fn bootstrap_grant(
        &self,
        user_id: UserId,
        role_name: &RoleName,
        now: DateTime<Utc>,
    ) -> Result<Assignment, GrantError> {
        if let Some(required) = self.registry.required_grantor_role(role_name)? {
            return Err(GrantError::InsufficientRole {
                role: role_name.to_string(),
                missing: required.name.to_string(),
            });
        }

        let assignment = self
            .assignments
            .upsert(Assignment::new(user_id, role_name.clone(), None, now, None))
            .await?;

        self.audit
            .append_event(AuditEvent {
                actor: None,
                action: AuditAction::RoleBootstrapGranted,
                target_user_id: Some(user_id),
                role_name: Some(role_name.clone()),
                detail: None,
            })
            .await?;

        Ok(assignment)
    }
}
