use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use campus_application::RoleRepository;
use campus_core::{AppError, AppResult};
use campus_domain::Role;

/// PostgreSQL-backed store for role definitions.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    name: String,
    description: String,
    is_assignable: bool,
    required_by: Option<String>,
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn save_role(&self, role: Role) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO roles (name, description, is_assignable)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE
            SET description = EXCLUDED.description,
                is_assignable = EXCLUDED.is_assignable
            "#,
        )
        .bind(role.name.as_str())
        .bind(role.description.as_str())
        .bind(role.is_assignable)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to save role: {error}")))?;

        if let Some(required) = &role.required_by {
            // The prerequisite may not be provisioned yet; a stub row keeps
            // the foreign key satisfied and is overwritten by its own save.
            sqlx::query(
                r#"
                INSERT INTO roles (name, description, is_assignable)
                VALUES ($1, '(pending provisioning)', false)
                ON CONFLICT (name) DO NOTHING
                "#,
            )
            .bind(required.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to ensure prerequisite role: {error}"))
            })?;
        }

        sqlx::query(
            r#"
            UPDATE roles
            SET required_by_role_id = (SELECT id FROM roles WHERE name = $2)
            WHERE name = $1
            "#,
        )
        .bind(role.name.as_str())
        .bind(role.required_by.as_ref().map(|name| name.as_str()))
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to link prerequisite role: {error}"))
        })?;

        transaction
            .commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.name,
                roles.description,
                roles.is_assignable,
                required.name AS required_by
            FROM roles
            LEFT JOIN roles AS required
                ON required.id = roles.required_by_role_id
            ORDER BY roles.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        rows.into_iter()
            .map(|row| {
                Role::new(
                    row.name.as_str(),
                    row.description.as_str(),
                    row.is_assignable,
                    row.required_by.as_deref(),
                )
                .map_err(|error| {
                    AppError::Internal(format!("invalid stored role '{}': {error}", row.name))
                })
            })
            .collect()
    }
}
