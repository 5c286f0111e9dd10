// src/db.rs

use std::{str::FromStr, time::Duration};

use chrono::Utc;
use sqlx::{
    SqlitePool,
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

use crate::{
    config::Config,
    error::AppError,
    models::user::ROLE_ADMIN,
    utils::hash::hash_password,
};

/// Opens a SQLite pool for `database_url`.
///
/// The database file is created when missing, runs in WAL mode and enforces
/// foreign keys on every connection. Writers wait up to five seconds for the
/// write lock before SQLite reports busy. Idle connections are never reaped, which keeps
/// `sqlite::memory:` databases alive for the lifetime of the pool.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

/// Applies the embedded schema migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Creates the configured admin account unless a user with that email exists.
///
/// Does nothing when the admin email or password is not configured.
pub async fn seed_admin(pool: &SqlitePool, config: &Config) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };
    let email = email.trim().to_lowercase();
    let name = config.admin_name.as_deref().unwrap_or("Administrator");

    let existing = sqlx::query("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(pool)
        .await?;

    if existing.is_none() {
        tracing::info!("Seeding admin user: {}", email);
        let hashed_password = hash_password(password)?;

        sqlx::query(
            "INSERT INTO users (name, email, password, role, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(&email)
        .bind(hashed_password)
        .bind(ROLE_ADMIN)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        tracing::info!("Admin user created successfully.");
    }

    Ok(())
}
