// src/handlers/auth.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::{
        quiz::parse_iso_date,
        user::{LoginRequest, LoginResponse, RegisterRequest, User},
    },
    utils::{
        hash::{hash_password, verify_password},
        html::clean_text,
        session::{
            CurrentSession, SessionData, SessionStore, clear_session_cookie, session_cookie,
            session_id_from_headers,
        },
    },
};

fn dashboard_for(is_admin: bool) -> &'static str {
    if is_admin { "/admin" } else { "/user_dashboard" }
}

/// Registers a new (non-admin) user.
///
/// An existing username is reported before any other field is looked at.
/// Returns 201 Created with the new id.
pub async fn register(
    State(pool): State<SqlitePool>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !payload.username.is_empty() {
        let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
            .bind(&payload.username)
            .fetch_optional(&pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::DuplicateUser(
                "User with this username already exists!".to_string(),
            ));
        }
    }

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::InvalidInput(validation_errors.to_string()));
    }

    let dob = parse_iso_date(&payload.dob).ok_or_else(|| {
        AppError::InvalidInput("Invalid date format. Please use 'YYYY-MM-DD'.".to_string())
    })?;

    let hashed_password = hash_password(&payload.password)?;

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (username, password_hash, full_name, qualification, dob, is_admin)
        VALUES (?, ?, ?, ?, ?, FALSE)
        RETURNING id
        "#,
    )
    .bind(&payload.username)
    .bind(hashed_password)
    .bind(payload.full_name.trim())
    .bind(clean_text(&payload.qualification))
    .bind(dob)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::DuplicateUser("User with this username already exists!".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!("Registered user {} ({})", payload.username, id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "message": "Registration successful!" })),
    ))
}

/// Authenticates a user and establishes a server-side session.
///
/// No session is created unless the password matches the stored hash.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    State(sessions): State<Arc<dyn SessionStore>>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(AppError::InvalidInput(
            "Username or password cannot be empty!".to_string(),
        ));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, full_name, qualification, dob, is_admin
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(&payload.username)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::from(e)
    })?
    .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        tracing::info!("Rejected login for {}", user.username);
        return Err(AppError::InvalidCredentials("Incorrect password".to_string()));
    }

    // A fresh login replaces whatever session the browser carried.
    if let Some(previous) = session_id_from_headers(&headers) {
        sessions.destroy(previous).await?;
    }

    let session_id = sessions.create(&SessionData::new(user.id, user.is_admin)).await?;
    let cookie = session_cookie(
        &session_id,
        config.session_ttl(),
        config.cookie_secure,
    );

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            user_id: user.id,
            is_admin: user.is_admin,
            redirect: dashboard_for(user.is_admin),
        }),
    ))
}

/// Destroys the current session, including any in-flight quiz attempt.
pub async fn logout(
    State(sessions): State<Arc<dyn SessionStore>>,
    Extension(session): Extension<CurrentSession>,
) -> Result<impl IntoResponse, AppError> {
    sessions.destroy(&session.id).await?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(json!({ "message": "Logged out" })),
    ))
}

/// Landing page: points admins and users at their dashboards.
pub async fn index(Extension(session): Extension<CurrentSession>) -> impl IntoResponse {
    Json(json!({ "redirect": dashboard_for(session.data.is_admin) }))
}
