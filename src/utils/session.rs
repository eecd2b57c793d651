// src/utils/session.rs

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{error::AppError, models::attempt::AttemptState};

pub const SESSION_COOKIE: &str = "session";

/// Everything the server remembers about one logged-in browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: i64,
    pub is_admin: bool,
    /// In-flight quiz attempt, if any.
    #[serde(default)]
    pub quiz: Option<AttemptState>,
}

impl SessionData {
    pub fn new(user_id: i64, is_admin: bool) -> Self {
        Self {
            user_id,
            is_admin,
            quiz: None,
        }
    }
}

/// Injected into request extensions by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub id: String,
    pub data: SessionData,
}

/// Key-value storage for sessions, keyed by an opaque session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores `data` under a new id and returns the id.
    async fn create(&self, data: &SessionData) -> Result<String, AppError>;

    /// Returns `None` for unknown or expired ids.
    async fn load(&self, id: &str) -> Result<Option<SessionData>, AppError>;

    /// Overwrites the data of an existing session. Last write wins.
    async fn save(&self, id: &str, data: &SessionData) -> Result<(), AppError>;

    async fn destroy(&self, id: &str) -> Result<(), AppError>;
}

/// Sessions persisted in the `sessions` table as JSON blobs.
pub struct SqliteSessionStore {
    pool: SqlitePool,
    ttl: Duration,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create(&self, data: &SessionData) -> Result<String, AppError> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        let purged = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if purged > 0 {
            tracing::debug!("Purged {} expired sessions", purged);
        }

        sqlx::query("INSERT INTO sessions (id, user_id, data, expires_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(data.user_id)
            .bind(serde_json::to_string(data)?)
            .bind(now + self.ttl)
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    async fn load(&self, id: &str) -> Result<Option<SessionData>, AppError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM sessions WHERE id = ? AND expires_at > ?")
                .bind(id)
                .bind(Utc::now())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(data,)| serde_json::from_str(&data).map_err(AppError::from))
            .transpose()
    }

    async fn save(&self, id: &str, data: &SessionData) -> Result<(), AppError> {
        sqlx::query("UPDATE sessions SET data = ? WHERE id = ?")
            .bind(serde_json::to_string(data)?)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Process-local sessions. Lost on restart.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, (SessionData, DateTime<Utc>)>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, data: &SessionData) -> Result<String, AppError> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, (_, expires_at)| *expires_at > now);
        sessions.insert(id.clone(), (data.clone(), now + self.ttl));
        Ok(id)
    }

    async fn load(&self, id: &str) -> Result<Option<SessionData>, AppError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(id)
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(data, _)| data.clone()))
    }

    async fn save(&self, id: &str, data: &SessionData) -> Result<(), AppError> {
        if let Some(entry) = self.sessions.write().await.get_mut(id) {
            entry.0 = data.clone();
        }
        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<(), AppError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}

/// Builds the `Set-Cookie` value for a new session.
pub fn session_cookie(id: &str, ttl: Duration, secure: bool) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        SESSION_COOKIE,
        id,
        ttl.num_seconds(),
        if secure { "; Secure" } else { "" }
    )
}

/// `Set-Cookie` value that expires the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}

/// Extracts the session id from the `Cookie` header.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())?
        .split(';')
        .find_map(|pair| {
            pair.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|id| !id.is_empty())
}

/// Axum Middleware: Authentication.
///
/// Resolves the session cookie against the store and injects `CurrentSession`
/// into the request extensions. Missing, unknown or expired sessions get 401.
pub async fn auth_middleware(
    State(sessions): State<Arc<dyn SessionStore>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let id = session_id_from_headers(req.headers())
        .ok_or_else(|| AppError::Unauthorized("You need to log in first!".to_string()))?
        .to_string();

    let data = sessions
        .load(&id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("You need to log in first!".to_string()))?;

    req.extensions_mut().insert(CurrentSession { id, data });
    Ok(next.run(req).await)
}

/// Axum Middleware: Admin Authorization.
///
/// Must be used AFTER `auth_middleware`.
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let session = req
        .extensions()
        .get::<CurrentSession>()
        .ok_or_else(|| AppError::Unauthorized("You need to log in first!".to_string()))?;

    if !session.data.is_admin {
        return Err(AppError::Forbidden(
            "You are not authorized to view this page!".to_string(),
        ));
    }

    Ok(next.run(req).await)
}
