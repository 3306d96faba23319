//! Role registry: the set of grantable roles and their grant prerequisites.
//!
//! Roles form a chain through `required_by`: an actor must hold an active
//! assignment of `required_by` to grant the role. The registry validates at
//! construction time that this relation is acyclic, so authorization checks
//! terminate in a bounded number of hops.

use std::collections::{HashMap, HashSet};

use campus_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::grant::GrantError;

/// Root role created only through provisioning, never granted in the normal flow.
pub const SUPER_ADMIN_ROLE: &str = "SUPER_ADMIN";
/// School administrator role, granted by a super admin.
pub const ADMIN_ROLE: &str = "ADMIN";
/// Delegated permissions manager, granted by an admin.
pub const PERMISSIONS_USER_ROLE: &str = "PERMISSIONS_USER";
/// Teaching staff role, granted by a permissions user.
pub const TEACHER_ROLE: &str = "TEACHER";
/// Enrolled student role, granted by a permissions user.
pub const STUDENT_ROLE: &str = "STUDENT";

/// Validated role name, stored uppercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleName(String);

impl RoleName {
    /// Creates a validated role name.
    ///
    /// Role names are trimmed, uppercased and restricted to ASCII
    /// alphanumerics plus `_`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = NonEmptyString::new(value)?;
        let normalized = value.as_str().trim().to_uppercase();

        let valid = normalized
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || character == '_');
        if !valid {
            return Err(AppError::Validation(format!(
                "role name '{normalized}' contains characters outside [A-Z0-9_]"
            )));
        }

        Ok(Self(normalized))
    }

    /// Returns the normalized role name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A named permission level that users can hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique role name.
    pub name: RoleName,
    /// Human-readable description.
    pub description: NonEmptyString,
    /// Whether the role can be granted through the assignment flow at all.
    pub is_assignable: bool,
    /// Role an actor must actively hold to grant this role. `None` marks a
    /// bootstrap role reachable only through provisioning.
    pub required_by: Option<RoleName>,
}

impl Role {
    /// Creates a role definition.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        is_assignable: bool,
        required_by: Option<&str>,
    ) -> AppResult<Self> {
        Ok(Self {
            name: RoleName::new(name)?,
            description: NonEmptyString::new(description)?,
            is_assignable,
            required_by: required_by.map(RoleName::new).transpose()?,
        })
    }
}

/// Process-wide, read-only registry of role definitions.
///
/// Roles are immutable after provisioning, so a shared `Arc<RoleRegistry>`
/// can be cached for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    roles: HashMap<RoleName, Role>,
}

impl RoleRegistry {
    /// Builds a registry from role definitions.
    ///
    /// Rejects duplicate names, `required_by` references to unknown roles,
    /// and cycles in the `required_by` relation.
    pub fn new(definitions: Vec<Role>) -> AppResult<Self> {
        let mut roles = HashMap::with_capacity(definitions.len());

        for role in definitions {
            if roles.insert(role.name.clone(), role.clone()).is_some() {
                return Err(AppError::Validation(format!(
                    "role '{}' is defined more than once",
                    role.name
                )));
            }
        }

        for role in roles.values() {
            if let Some(required) = &role.required_by
                && !roles.contains_key(required)
            {
                return Err(AppError::Validation(format!(
                    "role '{}' requires unknown role '{required}'",
                    role.name
                )));
            }
        }

        ensure_acyclic(&roles)?;

        Ok(Self { roles })
    }

    /// Looks up a role by name.
    pub fn get(&self, name: &RoleName) -> Result<&Role, GrantError> {
        self.roles
            .get(name)
            .ok_or_else(|| GrantError::RoleNotFound(name.to_string()))
    }

    /// Returns the role an actor must hold to grant `name`, if any.
    pub fn required_grantor_role(&self, name: &RoleName) -> Result<Option<&Role>, GrantError> {
        let role = self.get(name)?;
        role.required_by
            .as_ref()
            .map(|required| self.get(required))
            .transpose()
    }

    /// Returns whether the role can be granted through the assignment flow.
    pub fn is_assignable(&self, name: &RoleName) -> Result<bool, GrantError> {
        Ok(self.get(name)?.is_assignable)
    }

    /// Iterates over all role definitions in name order.
    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        let mut values: Vec<&Role> = self.roles.values().collect();
        values.sort_by(|left, right| left.name.as_str().cmp(right.name.as_str()));
        values.into_iter()
    }
}

fn ensure_acyclic(roles: &HashMap<RoleName, Role>) -> AppResult<()> {
    for start in roles.keys() {
        let mut visited = HashSet::new();
        let mut current = Some(start);

        while let Some(name) = current {
            if !visited.insert(name) {
                return Err(AppError::Validation(format!(
                    "role '{start}' participates in a required_by cycle"
                )));
            }

            current = roles.get(name).and_then(|role| role.required_by.as_ref());
        }
    }

    Ok(())
}

/// Builds the platform's default role chain:
/// `SUPER_ADMIN` ⊐ `ADMIN` ⊐ `PERMISSIONS_USER` ⊐ `TEACHER` / `STUDENT`.
pub fn default_school_roles() -> AppResult<RoleRegistry> {
    RoleRegistry::new(vec![
        Role::new(
            SUPER_ADMIN_ROLE,
            "Platform owner, created only through provisioning",
            false,
            None,
        )?,
        Role::new(
            ADMIN_ROLE,
            "School administrator",
            true,
            Some(SUPER_ADMIN_ROLE),
        )?,
        Role::new(
            PERMISSIONS_USER_ROLE,
            "Delegated permissions manager",
            true,
            Some(ADMIN_ROLE),
        )?,
        Role::new(
            TEACHER_ROLE,
            "Teaching staff member",
            true,
            Some(PERMISSIONS_USER_ROLE),
        )?,
        Role::new(
            STUDENT_ROLE,
            "Enrolled student",
            true,
            Some(PERMISSIONS_USER_ROLE),
        )?,
    ])
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{Role, RoleName, RoleRegistry, SUPER_ADMIN_ROLE, default_school_roles};
    use crate::grant::GrantError;

    fn role(name: &str, required_by: Option<&str>) -> Role {
        match Role::new(name, format!("test role {name}"), true, required_by) {
            Ok(role) => role,
            Err(error) => panic!("role '{name}' must be valid: {error}"),
        }
    }

    #[test]
    fn role_name_is_normalized() {
        let name = RoleName::new("  admin ");
        assert_eq!(name.ok().map(|value| value.to_string()).as_deref(), Some("ADMIN"));
    }

    #[test]
    fn role_name_rejects_punctuation() {
        assert!(RoleName::new("SUPER-ADMIN!").is_err());
    }

    #[test]
    fn registry_rejects_duplicate_names() {
        let result = RoleRegistry::new(vec![role("ADMIN", None), role("ADMIN", None)]);
        assert!(result.is_err());
    }

    #[test]
    fn registry_rejects_unknown_required_role() {
        let result = RoleRegistry::new(vec![role("ADMIN", Some("MISSING"))]);
        assert!(result.is_err());
    }

    #[test]
    fn registry_rejects_required_by_cycle() {
        let result = RoleRegistry::new(vec![
            role("A", Some("B")),
            role("B", Some("C")),
            role("C", Some("A")),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn registry_rejects_self_requirement() {
        let result = RoleRegistry::new(vec![role("A", Some("A"))]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_role_lookup_is_role_not_found() {
        let registry = match default_school_roles() {
            Ok(registry) => registry,
            Err(error) => panic!("default roles must be valid: {error}"),
        };
        let name = match RoleName::new("JANITOR") {
            Ok(name) => name,
            Err(error) => panic!("name must be valid: {error}"),
        };

        assert!(matches!(
            registry.get(&name),
            Err(GrantError::RoleNotFound(missing)) if missing == "JANITOR"
        ));
    }

    #[test]
    fn default_roles_form_a_chain_rooted_at_super_admin() {
        let registry = match default_school_roles() {
            Ok(registry) => registry,
            Err(error) => panic!("default roles must be valid: {error}"),
        };

        let roots: Vec<&Role> = registry
            .roles()
            .filter(|role| role.required_by.is_none())
            .collect();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].name.as_str(), SUPER_ADMIN_ROLE);
        assert!(!roots[0].is_assignable);
    }

    proptest! {
        #[test]
        fn linear_chains_are_always_accepted(length in 1usize..24) {
            let mut definitions = Vec::with_capacity(length);
            for index in 0..length {
                let required = (index > 0).then(|| format!("LEVEL_{}", index - 1));
                definitions.push(role(
                    format!("LEVEL_{index}").as_str(),
                    required.as_deref(),
                ));
            }

            prop_assert!(RoleRegistry::new(definitions).is_ok());
        }
    }
}
