// src/config.rs

use std::env;
use std::str::FromStr;

use chrono::Duration;
use dotenvy::dotenv;

const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
/// One year.
const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

/// Backing storage for server-side sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Database,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: String,
    pub rust_log: String,
    pub log_dir: String,
    pub admin_username: String,
    pub admin_password: Option<String>,
    pub session_ttl_hours: i64,
    pub session_backend: SessionBackend,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://quizhub.db".to_string());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let session_backend = match env::var("SESSION_STORE").as_deref() {
            Ok("memory") => SessionBackend::Memory,
            _ => SessionBackend::Database,
        };

        let requested_ttl = parse_or("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS);
        let session_ttl_hours = clamp_ttl_hours(requested_ttl);
        if session_ttl_hours != requested_ttl {
            eprintln!("SESSION_TTL_HOURS={requested_ttl} is out of range, using {session_ttl_hours}");
        }

        Self {
            database_url,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            rust_log,
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
            session_ttl_hours,
            session_backend,
            cookie_secure: parse_or("COOKIE_SECURE", false),
        }
    }

    /// Session lifetime for cookies and stores; out-of-range values are clamped.
    pub fn session_ttl(&self) -> Duration {
        Duration::hours(clamp_ttl_hours(self.session_ttl_hours))
    }
}

/// Keeps the session lifetime between one hour and one year.
fn clamp_ttl_hours(hours: i64) -> i64 {
    hours.clamp(1, MAX_SESSION_TTL_HOURS)
}

/// Reads an environment variable, falling back to `default` when it is
/// missing or cannot be parsed.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            eprintln!("Ignoring unparseable {key}={raw:?}, using default");
            default
        }),
        Err(_) => default,
    }
}
