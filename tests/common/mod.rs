// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use quizhub::{
    config::{Config, SessionBackend},
    db, routes, seed,
    state::AppState,
    utils::session::{MemorySessionStore, SessionStore, SqliteSessionStore},
};
use serde_json::{Value, json};
use sqlx::SqlitePool;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "adminpass";

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

pub fn test_config(backend: SessionBackend) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        database_max_connections: 1,
        bind_addr: "127.0.0.1:0".to_string(),
        rust_log: "error".to_string(),
        log_dir: "logs".to_string(),
        admin_username: ADMIN_USERNAME.to_string(),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        session_ttl_hours: 1,
        session_backend: backend,
        cookie_secure: false,
    }
}

/// Builds the application state over a fresh in-memory database.
pub async fn test_state(backend: SessionBackend) -> AppState {
    let config = test_config(backend);

    // 1. One connection, so every query sees the same in-memory database
    let pool = db::init_pool(&config.database_url, config.database_max_connections)
        .await
        .expect("Failed to open in-memory SQLite");

    // 2. Run migrations and seed the admin
    db::migrate(&pool).await.expect("Failed to migrate database");
    seed::ensure_admin(&pool, ADMIN_USERNAME, ADMIN_PASSWORD)
        .await
        .expect("Failed to seed admin");

    // 3. Session store
    let ttl = config.session_ttl();
    let sessions: Arc<dyn SessionStore> = match backend {
        SessionBackend::Database => Arc::new(SqliteSessionStore::new(pool.clone(), ttl)),
        SessionBackend::Memory => Arc::new(MemorySessionStore::new(ttl)),
    };

    AppState {
        pool,
        config,
        sessions,
    }
}

/// Spawns the app on a random port with database-backed sessions.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(SessionBackend::Database).await
}

pub async fn spawn_app_with(backend: SessionBackend) -> TestApp {
    spawn_state(test_state(backend).await).await
}

/// Spawns the app over a prepared state.
pub async fn spawn_state(state: AppState) -> TestApp {
    let pool = state.pool.clone();
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp { address, pool }
}

/// A client that keeps the session cookie between requests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client")
}

pub async fn register(app: &TestApp, client: &reqwest::Client, username: &str, full_name: &str) -> i64 {
    let response = client
        .post(app.url("/register"))
        .json(&json!({
            "username": username,
            "password": "password123",
            "full_name": full_name,
            "qualification": "B.Sc",
            "dob": "2000-01-15"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    body["id"].as_i64().unwrap()
}

pub async fn login(app: &TestApp, client: &reqwest::Client, username: &str, password: &str) -> reqwest::Response {
    client
        .post(app.url("/login"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to execute request")
}

/// A logged-in admin client.
pub async fn admin_client(app: &TestApp) -> reqwest::Client {
    let client = client();
    let response = login(app, &client, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    assert_eq!(response.status().as_u16(), 200);
    client
}

/// Registers and logs in a regular user; returns the client and the user id.
pub async fn user_client(app: &TestApp, username: &str) -> (reqwest::Client, i64) {
    let client = client();
    let id = register(app, &client, username, &format!("{} Example", username)).await;
    let response = login(app, &client, username, "password123").await;
    assert_eq!(response.status().as_u16(), 200);
    (client, id)
}

/// POSTs JSON and returns the created id, asserting 201.
pub async fn create(app: &TestApp, client: &reqwest::Client, path: &str, body: Value) -> i64 {
    let response = client
        .post(app.url(path))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201, "creating via {}", path);
    let body: Value = response.json().await.unwrap();
    body["id"].as_i64().unwrap()
}

pub struct QuizFixture {
    pub subject_id: i64,
    pub chapter_id: i64,
    pub quiz_id: i64,
    pub question_ids: Vec<i64>,
}

/// Subject → chapter → quiz with three questions whose correct answer is
/// always option 1.
pub async fn quiz_fixture(app: &TestApp, admin: &reqwest::Client, subject: &str) -> QuizFixture {
    let subject_id = create(
        app,
        admin,
        "/add_subject",
        json!({ "name": subject, "description": "Numbers and shapes" }),
    )
    .await;
    let chapter_id = create(
        app,
        admin,
        &format!("/add_chapter/{}", subject_id),
        json!({ "name": "Basics", "description": "" }),
    )
    .await;
    let quiz_id = create(
        app,
        admin,
        &format!("/add_quiz/{}", chapter_id),
        json!({
            "title": format!("{} Quiz", subject),
            "date_of_quiz": "2024-03-01",
            "time_duration": "00:30",
            "remarks": "Warm-up"
        }),
    )
    .await;

    let mut question_ids = Vec::new();
    for n in 1..=3 {
        let id = create(
            app,
            admin,
            &format!("/quiz/{}/add_question", quiz_id),
            json!({
                "question_statement": format!("Question {}?", n),
                "option1": format!("right {}", n),
                "option2": "wrong a",
                "option3": "wrong b",
                "option4": "wrong c",
                "correct_answer": format!("right {}", n)
            }),
        )
        .await;
        question_ids.push(id);
    }

    QuizFixture {
        subject_id,
        chapter_id,
        quiz_id,
        question_ids,
    }
}

/// Submits one step of an attempt and returns the view.
pub async fn answer(
    app: &TestApp,
    client: &reqwest::Client,
    quiz_id: i64,
    selected: Option<u8>,
    action: &str,
) -> Value {
    let response = client
        .post(app.url(&format!("/start_quiz/{}", quiz_id)))
        .json(&json!({ "selected_option": selected, "action": action }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    response.json().await.unwrap()
}
