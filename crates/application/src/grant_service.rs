//! Grant authorization check and the grant flow built on top of it.

use std::sync::Arc;

use campus_core::AppResult;
use campus_domain::{Assignment, AuditAction, GrantError, RoleName, RoleRegistry, UserId};
use chrono::{DateTime, Utc};

use crate::ports::{AuditEvent, AuditRepository, RoleAssignmentRepository};

/// Application service deciding "may actor A grant role R" and recording
/// the grant when the answer is yes.
///
/// The check and the ledger write are one logical operation from the
/// caller's perspective; no locking beyond the ledger's upsert-by-key is
/// needed because expiry is the only deactivation path.
#[derive(Clone)]
pub struct RoleGrantService {
    registry: Arc<RoleRegistry>,
    assignments: Arc<dyn RoleAssignmentRepository>,
    audit: Arc<dyn AuditRepository>,
}

impl RoleGrantService {
    /// Creates a grant service over a role registry and ledger.
    #[must_use]
    pub fn new(
        registry: Arc<RoleRegistry>,
        assignments: Arc<dyn RoleAssignmentRepository>,
        audit: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            registry,
            assignments,
            audit,
        }
    }

    /// Decides whether `actor` is permitted to grant `role_name` to someone.
    ///
    /// A role with no prerequisite resolves as authorized here; the
    /// end-user grant flow in [`RoleGrantService::grant_role`] still refuses
    /// such roles, reserving the unconditional path for provisioning.
    pub async fn authorize_grant(
        &self,
        actor: UserId,
        role_name: &RoleName,
        now: DateTime<Utc>,
    ) -> Result<(), GrantError> {
        match self.resolve_grant(actor, role_name, now).await? {
            GrantResolution::Unconditional | GrantResolution::Authorized => Ok(()),
            GrantResolution::Denied { missing } => Err(GrantError::InsufficientRole {
                role: role_name.to_string(),
                missing,
            }),
        }
    }

    /// Grants `role_name` to `target` on behalf of `actor`.
    ///
    /// Validates the expiry, runs the authorization check, upserts the
    /// ledger record and appends an audit event. Re-granting an existing
    /// `(user, role)` pair overwrites the previous record.
    pub async fn grant_role(
        &self,
        actor: UserId,
        target: UserId,
        role_name: &RoleName,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Assignment, GrantError> {
        if let Some(expires_at) = expires_at
            && expires_at <= now
        {
            return Err(GrantError::InvalidExpiry { expires_at, now });
        }

        match self.resolve_grant(actor, role_name, now).await? {
            GrantResolution::Authorized => {}
            // Prerequisite-free roles are reachable only through the
            // provisioning routine, never through an end-user grant.
            GrantResolution::Unconditional => {
                return Err(GrantError::RoleNotAssignable(role_name.to_string()));
            }
            GrantResolution::Denied { missing } => {
                return Err(GrantError::InsufficientRole {
                    role: role_name.to_string(),
                    missing,
                });
            }
        }

        let assignment = self
            .assignments
            .upsert(Assignment::new(
                target,
                role_name.clone(),
                Some(actor),
                now,
                expires_at,
            ))
            .await?;

        self.audit
            .append_event(AuditEvent {
                actor: Some(actor),
                action: AuditAction::RoleGranted,
                target_user_id: Some(target),
                role_name: Some(role_name.clone()),
                detail: expires_at.map(|expires_at| format!("expires_at='{expires_at}'")),
            })
            .await?;

        Ok(assignment)
    }

    /// Lists the roles `user_id` actively holds at `now`.
    pub async fn active_roles(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<RoleName>> {
        self.assignments.list_active_roles(user_id, now).await
    }

    async fn resolve_grant(
        &self,
        actor: UserId,
        role_name: &RoleName,
        now: DateTime<Utc>,
    ) -> Result<GrantResolution, GrantError> {
        if !self.registry.is_assignable(role_name)? {
            return Err(GrantError::RoleNotAssignable(role_name.to_string()));
        }

        let Some(required) = self.registry.required_grantor_role(role_name)? else {
            return Ok(GrantResolution::Unconditional);
        };

        let holds_required = self
            .assignments
            .has_active_assignment(actor, &required.name, now)
            .await?;

        if holds_required {
            Ok(GrantResolution::Authorized)
        } else {
            Ok(GrantResolution::Denied {
                missing: required.name.to_string(),
            })
        }
    }
}

enum GrantResolution {
    Unconditional,
    Authorized,
    Denied { missing: String },
}
