// src/seed.rs

use sqlx::SqlitePool;

use crate::{error::AppError, utils::hash::hash_password};

/// Startup migration: makes sure an admin account exists.
///
/// Idempotent. Returns `true` when an account was created. Refuses to
/// promote an existing non-admin account that holds the configured username.
pub async fn ensure_admin(pool: &SqlitePool, username: &str, password: &str) -> Result<bool, AppError> {
    let admin: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE is_admin = TRUE LIMIT 1")
        .fetch_optional(pool)
        .await?;
    if admin.is_some() {
        return Ok(false);
    }

    let taken: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    if taken.is_some() {
        return Err(AppError::InvalidInput(format!(
            "Cannot seed admin: username '{}' belongs to a regular account",
            username
        )));
    }

    tracing::info!("Seeding admin user: {}", username);
    let hashed_password = hash_password(password)?;

    sqlx::query("INSERT INTO users (username, password_hash, is_admin) VALUES (?, ?, TRUE)")
        .bind(username)
        .bind(hashed_password)
        .execute(pool)
        .await?;
    tracing::info!("Admin user created successfully.");

    Ok(true)
}
