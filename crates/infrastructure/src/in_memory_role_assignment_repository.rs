use std::collections::HashMap;

use async_trait::async_trait;
use campus_application::RoleAssignmentRepository;
use campus_core::AppResult;
use campus_domain::{Assignment, RoleName, UserId};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// In-memory assignment ledger for tests and local runs.
///
/// Mirrors the storage-layer contract: the `(user, role)` key is unique
/// and an upsert overwrites the previous record.
#[derive(Debug, Default)]
pub struct InMemoryRoleAssignmentRepository {
    records: RwLock<HashMap<(UserId, RoleName), Assignment>>,
}

impl InMemoryRoleAssignmentRepository {
    /// Creates an empty in-memory ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RoleAssignmentRepository for InMemoryRoleAssignmentRepository {
    async fn has_active_assignment(
        &self,
        user_id: UserId,
        role_name: &RoleName,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let records = self.records.read().await;
        Ok(records
            .get(&(user_id, role_name.clone()))
            .is_some_and(|assignment| assignment.is_active(now)))
    }

    async fn upsert(&self, assignment: Assignment) -> AppResult<Assignment> {
        let mut records = self.records.write().await;
        records.insert(
            (assignment.user_id, assignment.role_name.clone()),
            assignment.clone(),
        );
        Ok(assignment)
    }

    async fn list_active_roles(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<RoleName>> {
        let records = self.records.read().await;
        let mut names: Vec<RoleName> = records
            .values()
            .filter(|assignment| assignment.user_id == user_id && assignment.is_active(now))
            .map(|assignment| assignment.role_name.clone())
            .collect();
        names.sort_by(|left, right| left.as_str().cmp(right.as_str()));
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use campus_application::RoleAssignmentRepository;
    use campus_domain::{Assignment, RoleName, UserId};
    use chrono::{Duration, Utc};

    use super::InMemoryRoleAssignmentRepository;

    fn role_name(value: &str) -> RoleName {
        match RoleName::new(value) {
            Ok(name) => name,
            Err(error) => panic!("role name '{value}' must be valid: {error}"),
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_the_same_pair() {
        let repository = InMemoryRoleAssignmentRepository::new();
        let user = UserId::new();
        let now = Utc::now();

        let first = repository
            .upsert(Assignment::new(
                user,
                role_name("STUDENT"),
                None,
                now,
                Some(now + Duration::days(30)),
            ))
            .await;
        assert!(first.is_ok());

        let second = repository
            .upsert(Assignment::new(
                user,
                role_name("STUDENT"),
                Some(UserId::new()),
                now,
                Some(now + Duration::days(365)),
            ))
            .await;
        assert!(second.is_ok());

        let active = repository.list_active_roles(user, now).await;
        assert_eq!(active.ok().map(|names| names.len()), Some(1));

        let records = repository.records.read().await;
        let stored = records.get(&(user, role_name("STUDENT")));
        assert_eq!(
            stored.and_then(|assignment| assignment.expires_at),
            Some(now + Duration::days(365))
        );
    }

    #[tokio::test]
    async fn expiry_boundary_is_exclusive() {
        let repository = InMemoryRoleAssignmentRepository::new();
        let user = UserId::new();
        let now = Utc::now();
        let expires_at = now + Duration::days(1);

        let stored = repository
            .upsert(Assignment::new(
                user,
                role_name("TEACHER"),
                None,
                now,
                Some(expires_at),
            ))
            .await;
        assert!(stored.is_ok());

        let at_expiry = repository
            .has_active_assignment(user, &role_name("TEACHER"), expires_at)
            .await;
        assert_eq!(at_expiry.ok(), Some(false));

        let just_before = repository
            .has_active_assignment(user, &role_name("TEACHER"), expires_at - Duration::seconds(1))
            .await;
        assert_eq!(just_before.ok(), Some(true));
    }

    #[tokio::test]
    async fn active_roles_are_sorted_and_filtered() {
        let repository = InMemoryRoleAssignmentRepository::new();
        let user = UserId::new();
        let now = Utc::now();

        for (role, expires_at) in [
            ("TEACHER", None),
            ("ADMIN", None),
            ("STUDENT", Some(now - Duration::seconds(1))),
        ] {
            let stored = repository
                .upsert(Assignment::new(user, role_name(role), None, now, expires_at))
                .await;
            assert!(stored.is_ok());
        }

        let active = repository.list_active_roles(user, now).await;
        assert_eq!(
            active.ok().map(|names| names
                .iter()
                .map(|name| name.as_str().to_owned())
                .collect::<Vec<_>>()),
            Some(vec!["ADMIN".to_owned(), "TEACHER".to_owned()])
        );
    }
}
