//! Role assignments: who holds which role, granted by whom, until when.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::role::RoleName;
use crate::user::UserId;

/// A record that a user holds a role, optionally time-bounded.
///
/// Keyed by `(user_id, role_name)`: a user holds at most one assignment
/// record per role, and a re-grant overwrites the previous record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// User holding the role.
    pub user_id: UserId,
    /// Role held.
    pub role_name: RoleName,
    /// User who granted the role. `None` marks a bootstrap grant made by
    /// the provisioning routine.
    pub assigned_by: Option<UserId>,
    /// When the grant was recorded.
    pub assigned_at: DateTime<Utc>,
    /// When the grant stops being active. `None` means non-expiring.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Assignment {
    /// Creates an assignment record stamped at `assigned_at`.
    #[must_use]
    pub fn new(
        user_id: UserId,
        role_name: RoleName,
        assigned_by: Option<UserId>,
        assigned_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            user_id,
            role_name,
            assigned_by,
            assigned_at,
            expires_at,
        }
    }

    /// Returns whether the assignment is active at `now`.
    ///
    /// An assignment expiring exactly at `now` is already expired; only a
    /// strictly future `expires_at` (or no expiry at all) counts as active.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use proptest::prelude::*;

    use super::Assignment;
    use crate::role::RoleName;
    use crate::user::UserId;

    fn assignment(expires_in_seconds: Option<i64>) -> Assignment {
        let now = Utc::now();
        let role_name = match RoleName::new("STUDENT") {
            Ok(name) => name,
            Err(error) => panic!("role name must be valid: {error}"),
        };

        Assignment::new(
            UserId::new(),
            role_name,
            None,
            now,
            expires_in_seconds.map(|seconds| now + Duration::seconds(seconds)),
        )
    }

    #[test]
    fn assignment_without_expiry_is_always_active() {
        let assignment = assignment(None);
        assert!(assignment.is_active(Utc::now() + Duration::days(3650)));
    }

    #[test]
    fn expiry_equal_to_now_is_expired() {
        let assignment = assignment(Some(0));
        let expires_at = match assignment.expires_at {
            Some(value) => value,
            None => panic!("assignment must carry an expiry"),
        };

        assert!(!assignment.is_active(expires_at));
        assert!(assignment.is_active(expires_at - Duration::seconds(1)));
        assert!(!assignment.is_active(expires_at + Duration::seconds(1)));
    }

    proptest! {
        #[test]
        fn strictly_future_expiry_is_active(offset_seconds in 1i64..31_536_000) {
            let assignment = assignment(Some(offset_seconds));
            prop_assert!(assignment.is_active(assignment.assigned_at));
        }

        #[test]
        fn past_expiry_is_inactive(offset_seconds in 1i64..31_536_000) {
            let assignment = assignment(Some(-offset_seconds));
            prop_assert!(!assignment.is_active(assignment.assigned_at));
        }
    }
}
