use std::collections::HashMap;

use async_trait::async_trait;
use campus_application::RoleRepository;
use campus_core::AppResult;
use campus_domain::{Role, RoleName};
use tokio::sync::RwLock;

/// In-memory role store for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    roles: RwLock<HashMap<RoleName, Role>>,
}

impl InMemoryRoleRepository {
    /// Creates an empty in-memory role store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            roles: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn save_role(&self, role: Role) -> AppResult<()> {
        let mut roles = self.roles.write().await;
        roles.insert(role.name.clone(), role);
        Ok(())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let roles = self.roles.read().await;
        let mut values: Vec<Role> = roles.values().cloned().collect();
        values.sort_by(|left, right| left.name.as_str().cmp(right.name.as_str()));
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use campus_application::RoleRepository;
    use campus_domain::default_school_roles;

    use super::InMemoryRoleRepository;

    #[tokio::test]
    async fn save_role_is_idempotent() {
        let repository = InMemoryRoleRepository::new();
        let registry = match default_school_roles() {
            Ok(registry) => registry,
            Err(error) => panic!("default roles must be valid: {error}"),
        };

        for _ in 0..2 {
            for role in registry.roles() {
                let saved = repository.save_role(role.clone()).await;
                assert!(saved.is_ok());
            }
        }

        let stored = repository.list_roles().await;
        assert_eq!(stored.ok().map(|values| values.len()), Some(5));
    }
}
