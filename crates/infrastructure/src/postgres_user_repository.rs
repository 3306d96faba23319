use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use campus_application::UserRepository;
use campus_core::{AppError, AppResult};
use campus_domain::{EmailAddress, User, UserId, Username};

/// PostgreSQL-backed store for platform user accounts.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: uuid::Uuid,
    username: String,
    email: String,
    given_name: String,
    family_name: String,
    password_hash: String,
}

fn decode_user(row: UserRow) -> AppResult<User> {
    let username = Username::new(row.username.as_str()).map_err(|error| {
        AppError::Internal(format!("invalid stored username '{}': {error}", row.username))
    })?;
    let email = EmailAddress::new(row.email.as_str()).map_err(|error| {
        AppError::Internal(format!("invalid stored email '{}': {error}", row.email))
    })?;

    Ok(User {
        id: UserId::from_uuid(row.id),
        username,
        email,
        given_name: row.given_name,
        family_name: row.family_name,
        password_hash: row.password_hash,
    })
}

fn map_user_conflict(error: sqlx::Error, username: &Username) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!(
            "username '{username}' or email is already taken"
        ));
    }

    AppError::Internal(format!("failed to create user: {error}"))
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> AppResult<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, given_name, family_name, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(user.given_name.as_str())
        .bind(user.family_name.as_str())
        .bind(user.password_hash.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| map_user_conflict(error, &user.username))?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &Username) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, given_name, family_name, password_hash
            FROM users
            WHERE username = $1
            LIMIT 1
            "#,
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user: {error}")))?;

        row.map(decode_user).transpose()
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, given_name, family_name, password_hash
            FROM users
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user: {error}")))?;

        row.map(decode_user).transpose()
    }
}
