//! User domain types and validation rules.

use campus_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Maximum username length accepted at registration.
pub const USERNAME_MAX_LENGTH: usize = 32;

/// Validated login name, stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Creates a validated username.
    ///
    /// Usernames are trimmed, lowercased and restricted to ASCII
    /// alphanumerics plus `.`, `_` and `-`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation("username must not be empty".to_owned()));
        }

        if trimmed.len() > USERNAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "username must not exceed {USERNAME_MAX_LENGTH} characters"
            )));
        }

        let valid = trimmed
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || matches!(character, '.' | '_' | '-'));
        if !valid {
            return Err(AppError::Validation(format!(
                "username '{trimmed}' contains characters outside [a-z0-9._-]"
            )));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated username string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one `@`,
    /// local part and domain are non-empty, domain contains at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let parts: Vec<&str> = trimmed.splitn(2, '@').collect();
        if parts.len() != 2 {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        let local = parts[0];
        let domain = parts[1];

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// A platform account that can hold role assignments.
///
/// The password hash is carried as an opaque string; hashing and
/// verification happen outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable user identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: Username,
    /// Unique contact address.
    pub email: EmailAddress,
    /// Given name shown on profile surfaces.
    pub given_name: String,
    /// Family name shown on profile surfaces.
    pub family_name: String,
    /// Opaque password hash produced by the authentication layer.
    pub password_hash: String,
}

impl User {
    /// Creates a user record with a fresh identifier.
    pub fn new(
        username: Username,
        email: EmailAddress,
        given_name: impl Into<String>,
        family_name: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: UserId::new(),
            username,
            email,
            given_name: given_name.into(),
            family_name: family_name.into(),
            password_hash: password_hash.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EmailAddress, Username};

    #[test]
    fn username_is_lowercased_and_trimmed() {
        let username = Username::new("  StudentOne  ");
        assert_eq!(username.ok().map(|value| value.as_str().to_owned()).as_deref(), Some("studentone"));
    }

    #[test]
    fn username_rejects_invalid_characters() {
        assert!(Username::new("student one").is_err());
        assert!(Username::new("student@one").is_err());
    }

    #[test]
    fn username_rejects_overlong_value() {
        let value = "a".repeat(33);
        assert!(Username::new(value).is_err());
    }

    #[test]
    fn email_requires_single_at_and_dotted_domain() {
        assert!(EmailAddress::new("student@school.example").is_ok());
        assert!(EmailAddress::new("student.school.example").is_err());
        assert!(EmailAddress::new("student@school").is_err());
    }
}
