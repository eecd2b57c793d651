// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use quizhub::config::{Config, SessionBackend};
use quizhub::state::AppState;
use quizhub::utils::session::{MemorySessionStore, SessionStore, SqliteSessionStore};
use quizhub::{db, routes, seed};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment (.env honoured)
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "quizhub.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match db::init_pool(&config.database_url, config.database_max_connections).await {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    tracing::error!("Failed to open database after 5 retries: {}", e);
                    return Err(e.into());
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    tracing::info!("Running migrations...");
    db::migrate(&pool).await?;
    tracing::info!("Migrations applied successfully.");

    // Seed Admin User
    let admin_password = match &config.admin_password {
        Some(password) => password.clone(),
        None => Uuid::new_v4().simple().to_string(),
    };
    match seed::ensure_admin(&pool, &config.admin_username, &admin_password).await {
        Ok(true) if config.admin_password.is_none() => tracing::warn!(
            "ADMIN_PASSWORD not set; generated password for '{}': {}",
            config.admin_username,
            admin_password
        ),
        Ok(_) => {}
        Err(e) => tracing::error!("Failed to seed admin user: {}", e),
    }

    let ttl = config.session_ttl();
    let sessions: Arc<dyn SessionStore> = match config.session_backend {
        SessionBackend::Database => Arc::new(SqliteSessionStore::new(pool.clone(), ttl)),
        SessionBackend::Memory => Arc::new(MemorySessionStore::new(ttl)),
    };

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        pool,
        config,
        sessions,
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
