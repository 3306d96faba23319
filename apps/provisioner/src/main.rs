//! Campus provisioning runtime.
//!
//! Seeds the role registry into the relational store and grants the
//! bootstrap `SUPER_ADMIN` role to the configured root account. This is
//! the only entry point allowed to use the unconditional grant path; every
//! other grant goes through the authorized flow.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;

use campus_application::{ProvisioningService, UserRepository};
use campus_core::{AppError, AppResult};
use campus_domain::{
    EmailAddress, RoleName, SUPER_ADMIN_ROLE, User, Username, default_school_roles,
};
use campus_infrastructure::{
    PostgresAuditRepository, PostgresRoleAssignmentRepository, PostgresRoleRepository,
    PostgresUserRepository,
};

use chrono::Utc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct ProvisionerConfig {
    database_url: String,
    admin_username: String,
    admin_email: String,
    admin_given_name: String,
    admin_family_name: String,
    admin_password_hash: String,
}

impl ProvisionerConfig {
    fn load() -> AppResult<Self> {
        Ok(Self {
            database_url: required_env("DATABASE_URL")?,
            admin_username: optional_env("BOOTSTRAP_ADMIN_USERNAME", "root"),
            admin_email: optional_env("BOOTSTRAP_ADMIN_EMAIL", "root@campus.local"),
            admin_given_name: optional_env("BOOTSTRAP_ADMIN_GIVEN_NAME", "Platform"),
            admin_family_name: optional_env("BOOTSTRAP_ADMIN_FAMILY_NAME", "Owner"),
            // Hashing happens outside this core; the operator supplies an
            // already-hashed credential.
            admin_password_hash: required_env("BOOTSTRAP_ADMIN_PASSWORD_HASH")?,
        })
    }
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name)
        .map_err(|_| AppError::Validation(format!("environment variable {name} is required")))
}

fn optional_env(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_owned())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ProvisionerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;

    provision(pool, &config).await
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

async fn provision(pool: PgPool, config: &ProvisionerConfig) -> Result<(), AppError> {
    let registry = Arc::new(default_school_roles()?);
    let roles = Arc::new(PostgresRoleRepository::new(pool.clone()));
    let assignments = Arc::new(PostgresRoleAssignmentRepository::new(pool.clone()));
    let audit = Arc::new(PostgresAuditRepository::new(pool.clone()));
    let users = PostgresUserRepository::new(pool);

    let service = ProvisioningService::new(registry, roles, assignments, audit);

    service.provision_registry().await?;
    info!("role registry provisioned");

    let root = ensure_root_user(&users, config).await?;
    let super_admin = RoleName::new(SUPER_ADMIN_ROLE)?;
    service
        .bootstrap_grant(root.id, &super_admin, Utc::now())
        .await?;
    info!(user_id = %root.id, username = %root.username, "bootstrap SUPER_ADMIN granted");

    Ok(())
}

async fn ensure_root_user(
    users: &PostgresUserRepository,
    config: &ProvisionerConfig,
) -> AppResult<User> {
    let username = Username::new(config.admin_username.as_str())?;

    if let Some(existing) = users.find_by_username(&username).await? {
        info!(user_id = %existing.id, "root user already present");
        return Ok(existing);
    }

    let user = User::new(
        username,
        EmailAddress::new(config.admin_email.as_str())?,
        config.admin_given_name.as_str(),
        config.admin_family_name.as_str(),
        config.admin_password_hash.as_str(),
    );
    let created = users.create(user).await?;
    info!(user_id = %created.id, "root user created");

    Ok(created)
}
