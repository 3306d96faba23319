use std::collections::HashMap;

use async_trait::async_trait;
use campus_application::UserRepository;
use campus_core::{AppError, AppResult};
use campus_domain::{User, UserId, Username};
use tokio::sync::RwLock;

/// In-memory user store for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    /// Creates an empty in-memory user store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;

        let taken = users.values().any(|existing| {
            existing.username == user.username || existing.email == user.email
        });
        if taken {
            return Err(AppError::Conflict(format!(
                "username '{}' or email '{}' is already taken",
                user.username,
                user.email.as_str()
            )));
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &Username) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|user| &user.username == username)
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use campus_application::UserRepository;
    use campus_core::AppError;
    use campus_domain::{EmailAddress, User, Username};

    use super::InMemoryUserRepository;

    fn user(username: &str, email: &str) -> User {
        let username = match Username::new(username) {
            Ok(value) => value,
            Err(error) => panic!("username must be valid: {error}"),
        };
        let email = match EmailAddress::new(email) {
            Ok(value) => value,
            Err(error) => panic!("email must be valid: {error}"),
        };

        User::new(username, email, "Test", "User", "hash")
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let repository = InMemoryUserRepository::new();

        let first = repository
            .create(user("admin", "admin@school.example"))
            .await;
        assert!(first.is_ok());

        let second = repository
            .create(user("admin", "other@school.example"))
            .await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn find_by_username_returns_the_stored_user() {
        let repository = InMemoryUserRepository::new();
        let created = repository
            .create(user("teacher", "teacher@school.example"))
            .await;
        assert!(created.is_ok());

        let username = match Username::new("teacher") {
            Ok(value) => value,
            Err(error) => panic!("username must be valid: {error}"),
        };
        let found = repository.find_by_username(&username).await;
        assert!(found.is_ok_and(|value| value.is_some()));
    }
}
