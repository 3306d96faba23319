use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use campus_application::RoleAssignmentRepository;
use campus_core::{AppError, AppResult};
use campus_domain::{Assignment, RoleName, UserId};
use chrono::{DateTime, Utc};

/// PostgreSQL-backed assignment ledger.
///
/// The `(user_id, role_id)` primary key plus `ON CONFLICT ... DO UPDATE`
/// makes racing grants to the same pair serialize last-writer-wins instead
/// of creating duplicate rows.
#[derive(Clone)]
pub struct PostgresRoleAssignmentRepository {
    pool: PgPool,
}

impl PostgresRoleAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ActiveRoleRow {
    name: String,
}

#[async_trait]
impl RoleAssignmentRepository for PostgresRoleAssignmentRepository {
    async fn has_active_assignment(
        &self,
        user_id: UserId,
        role_name: &RoleName,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM role_assignments AS assignments
                INNER JOIN roles
                    ON roles.id = assignments.role_id
                WHERE assignments.user_id = $1
                  AND roles.name = $2
                  AND (assignments.expires_at IS NULL OR assignments.expires_at > $3)
            )
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_name.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to check assignment '{user_id}:{role_name}': {error}"
            ))
        })
    }

    async fn upsert(&self, assignment: Assignment) -> AppResult<Assignment> {
        let role_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT id
            FROM roles
            WHERE name = $1
            LIMIT 1
            "#,
        )
        .bind(assignment.role_name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?
        .ok_or_else(|| {
            AppError::NotFound(format!("role '{}' was not found", assignment.role_name))
        })?;

        sqlx::query(
            r#"
            INSERT INTO role_assignments (user_id, role_id, assigned_by, assigned_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, role_id) DO UPDATE
            SET assigned_by = EXCLUDED.assigned_by,
                assigned_at = EXCLUDED.assigned_at,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(assignment.user_id.as_uuid())
        .bind(role_id)
        .bind(assignment.assigned_by.map(|user_id| user_id.as_uuid()))
        .bind(assignment.assigned_at)
        .bind(assignment.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to upsert assignment: {error}")))?;

        debug!(
            user_id = %assignment.user_id,
            role = %assignment.role_name,
            "assignment upserted"
        );

        Ok(assignment)
    }

    async fn list_active_roles(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<RoleName>> {
        let rows = sqlx::query_as::<_, ActiveRoleRow>(
            r#"
            SELECT roles.name
            FROM role_assignments AS assignments
            INNER JOIN roles
                ON roles.id = assignments.role_id
            WHERE assignments.user_id = $1
              AND (assignments.expires_at IS NULL OR assignments.expires_at > $2)
            ORDER BY roles.name
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list active roles for '{user_id}': {error}"))
        })?;

        rows.into_iter()
            .map(|row| {
                RoleName::new(row.name.as_str()).map_err(|error| {
                    AppError::Internal(format!("invalid stored role name '{}': {error}", row.name))
                })
            })
            .collect()
    }
}
