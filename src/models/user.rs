// src/models/user.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    pub full_name: String,

    pub qualification: String,

    pub dob: Option<NaiveDate>,

    pub is_admin: bool,
}

/// DTO for creating a new user (Registration).
///
/// `dob` stays a raw string here; it is parsed separately so a malformed
/// date surfaces as its own message.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 1,
        max = 64,
        message = "Username cannot be empty and must be at most 64 characters."
    ))]
    pub username: String,
    #[validate(length(
        min = 1,
        max = 128,
        message = "Password cannot be empty and must be at most 128 characters."
    ))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub full_name: String,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub qualification: String,
    #[serde(default)]
    pub dob: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Identity handed back after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub is_admin: bool,
    pub redirect: &'static str,
}
