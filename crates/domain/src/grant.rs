//! Grant policy errors and audit actions.

use campus_core::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::user::UserId;

/// Reasons a role grant is refused.
///
/// None of these are transient; the caller never retries. The surrounding
/// application layer decides status mapping and user-facing messages.
#[derive(Debug, Error)]
pub enum GrantError {
    /// Referenced role name does not exist in the registry.
    #[error("role '{0}' was not found")]
    RoleNotFound(String),

    /// Role exists but is not grantable through the assignment flow.
    #[error("role '{0}' cannot be granted through the assignment flow")]
    RoleNotAssignable(String),

    /// Actor lacks the active prerequisite role. Carries the missing role
    /// name so the caller can present an actionable message.
    #[error("granting role '{role}' requires an active '{missing}' assignment")]
    InsufficientRole {
        /// Role the actor attempted to grant.
        role: String,
        /// Prerequisite role the actor does not actively hold.
        missing: String,
    },

    /// Grant requested with an expiry that is not strictly in the future.
    #[error("expiry {expires_at} is not after grant time {now}")]
    InvalidExpiry {
        /// Requested expiry timestamp.
        expires_at: DateTime<Utc>,
        /// Evaluation time of the grant.
        now: DateTime<Utc>,
    },

    /// Reserved for stores that reject a racing duplicate write instead of
    /// upserting; upsert-by-key is the default ledger policy.
    #[error("user '{user_id}' already holds an assignment of role '{role}'")]
    DuplicateAssignment {
        /// User already holding the role.
        user_id: UserId,
        /// Role already assigned.
        role: String,
    },

    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<GrantError> for AppError {
    fn from(value: GrantError) -> Self {
        match value {
            GrantError::RoleNotFound(_) => AppError::NotFound(value.to_string()),
            GrantError::RoleNotAssignable(_) | GrantError::InsufficientRole { .. } => {
                AppError::Forbidden(value.to_string())
            }
            GrantError::InvalidExpiry { .. } => AppError::Validation(value.to_string()),
            GrantError::DuplicateAssignment { .. } => AppError::Conflict(value.to_string()),
            GrantError::Repository(inner) => inner,
        }
    }
}

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a role is granted through the authorized flow.
    RoleGranted,
    /// Emitted when the provisioning routine grants a bootstrap role.
    RoleBootstrapGranted,
    /// Emitted when the provisioning routine persists the role registry.
    RoleRegistryProvisioned,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleGranted => "role.granted",
            Self::RoleBootstrapGranted => "role.bootstrap_granted",
            Self::RoleRegistryProvisioned => "role.registry_provisioned",
        }
    }
}

#[cfg(test)]
mod tests {
    use campus_core::AppError;
    use chrono::Utc;

    use super::GrantError;

    #[test]
    fn insufficient_role_maps_to_forbidden() {
        let error = GrantError::InsufficientRole {
            role: "ADMIN".to_owned(),
            missing: "SUPER_ADMIN".to_owned(),
        };

        assert!(matches!(AppError::from(error), AppError::Forbidden(_)));
    }

    #[test]
    fn invalid_expiry_maps_to_validation() {
        let now = Utc::now();
        let error = GrantError::InvalidExpiry {
            expires_at: now,
            now,
        };

        assert!(matches!(AppError::from(error), AppError::Validation(_)));
    }
}
