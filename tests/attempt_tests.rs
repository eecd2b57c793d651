// tests/attempt_tests.rs

mod common;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use common::{
    TestApp, admin_client, answer, create, quiz_fixture, spawn_app, spawn_app_with, spawn_state,
    test_state, user_client,
};
use quizhub::{
    config::SessionBackend,
    error::AppError,
    utils::session::{MemorySessionStore, SessionData, SessionStore},
};
use serde_json::{Value, json};

async fn score_rows(app: &TestApp, user_id: i64) -> Vec<(i64, i64)> {
    sqlx::query_as("SELECT quiz_id, total_scored FROM scores WHERE user_id = ? ORDER BY id")
        .bind(user_id)
        .fetch_all(&app.pool)
        .await
        .unwrap()
}

async fn correct_wrong_blank_scores_one(backend: SessionBackend) {
    let app = spawn_app_with(backend).await;
    let admin = admin_client(&app).await;
    let fixture = quiz_fixture(&app, &admin, "Maths").await;
    let (user, user_id) = user_client(&app, "grace").await;

    let first: Value = user
        .get(app.url(&format!("/start_quiz/{}", fixture.quiz_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["status"], "in_progress");
    assert_eq!(first["current_question_index"], 0);
    assert_eq!(first["total_questions"], 3);
    assert_eq!(first["question"]["id"], fixture.question_ids[0]);
    assert!(first["question"].get("correct_answer").is_none());

    let second = answer(&app, &user, fixture.quiz_id, Some(1), "save_next").await;
    assert_eq!(second["status"], "in_progress");
    assert_eq!(second["current_question_index"], 1);

    let third = answer(&app, &user, fixture.quiz_id, Some(2), "save_next").await;
    assert_eq!(third["current_question_index"], 2);

    let done = answer(&app, &user, fixture.quiz_id, None, "submit").await;
    assert_eq!(done["status"], "completed");
    assert_eq!(done["total_scored"], 1);
    assert_eq!(done["redirect"], "/scoreboard");

    assert_eq!(score_rows(&app, user_id).await, vec![(fixture.quiz_id, 1)]);

    // Replaying the completion step writes nothing
    let replay: Value = user
        .post(app.url(&format!("/save_score/{}", fixture.quiz_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(replay["saved"], false);
    assert_eq!(score_rows(&app, user_id).await.len(), 1);

    let board: Value = user.get(app.url("/scoreboard")).send().await.unwrap().json().await.unwrap();
    assert_eq!(board["scores"][0]["total_scored"], 1);
    assert_eq!(board["scores"][0]["num_questions"], 3);
    assert_eq!(board["scores"][0]["quiz_title"], "Maths Quiz");
}

#[tokio::test]
async fn attempt_with_database_sessions() {
    correct_wrong_blank_scores_one(SessionBackend::Database).await;
}

#[tokio::test]
async fn attempt_with_memory_sessions() {
    correct_wrong_blank_scores_one(SessionBackend::Memory).await;
}

#[tokio::test]
async fn revisiting_resumes_and_another_quiz_resets() {
    let app = spawn_app().await;
    let admin = admin_client(&app).await;
    let maths = quiz_fixture(&app, &admin, "Maths").await;
    let physics = quiz_fixture(&app, &admin, "Physics").await;
    let (user, user_id) = user_client(&app, "heidi").await;

    user.get(app.url(&format!("/start_quiz/{}", maths.quiz_id))).send().await.unwrap();
    answer(&app, &user, maths.quiz_id, Some(1), "save_next").await;

    let resumed: Value = user
        .get(app.url(&format!("/start_quiz/{}", maths.quiz_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resumed["current_question_index"], 1);
    assert_eq!(resumed["question"]["id"], maths.question_ids[1]);
    assert_eq!(resumed["selected_option"], Value::Null);

    // Switching quizzes discards the maths attempt without scoring it
    let other: Value = user
        .get(app.url(&format!("/start_quiz/{}", physics.quiz_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(other["current_question_index"], 0);

    let back: Value = user
        .get(app.url(&format!("/start_quiz/{}", maths.quiz_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(back["current_question_index"], 0);

    assert!(score_rows(&app, user_id).await.is_empty());
}

#[tokio::test]
async fn saving_through_every_question_completes() {
    let app = spawn_app().await;
    let admin = admin_client(&app).await;
    let fixture = quiz_fixture(&app, &admin, "Maths").await;
    let (user, user_id) = user_client(&app, "ivan").await;

    user.get(app.url(&format!("/start_quiz/{}", fixture.quiz_id))).send().await.unwrap();
    answer(&app, &user, fixture.quiz_id, Some(1), "save_next").await;
    answer(&app, &user, fixture.quiz_id, Some(1), "save_next").await;
    let done = answer(&app, &user, fixture.quiz_id, Some(1), "save_next").await;

    assert_eq!(done["status"], "completed");
    assert_eq!(done["total_scored"], 3);
    assert_eq!(score_rows(&app, user_id).await, vec![(fixture.quiz_id, 3)]);

    // A new visit starts a fresh attempt
    let again: Value = user
        .get(app.url(&format!("/start_quiz/{}", fixture.quiz_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(again["status"], "in_progress");
    assert_eq!(again["current_question_index"], 0);
}

#[tokio::test]
async fn out_of_range_option_is_rejected() {
    let app = spawn_app().await;
    let admin = admin_client(&app).await;
    let fixture = quiz_fixture(&app, &admin, "Maths").await;
    let (user, _) = user_client(&app, "judy").await;

    user.get(app.url(&format!("/start_quiz/{}", fixture.quiz_id))).send().await.unwrap();
    let response = user
        .post(app.url(&format!("/start_quiz/{}", fixture.quiz_id)))
        .json(&json!({ "selected_option": 5, "action": "save_next" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // The attempt did not move
    let view: Value = user
        .get(app.url(&format!("/start_quiz/{}", fixture.quiz_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["current_question_index"], 0);
}

#[tokio::test]
async fn quiz_without_questions_scores_zero() {
    let app = spawn_app().await;
    let admin = admin_client(&app).await;
    let fixture = quiz_fixture(&app, &admin, "Maths").await;
    let empty_quiz = create(
        &app,
        &admin,
        &format!("/add_quiz/{}", fixture.chapter_id),
        json!({ "title": "Empty", "date_of_quiz": "2024-04-01", "time_duration": "00:10" }),
    )
    .await;
    let (user, user_id) = user_client(&app, "ken").await;

    let view: Value = user
        .get(app.url(&format!("/start_quiz/{}", empty_quiz)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["status"], "completed");
    assert_eq!(view["total_scored"], 0);
    assert_eq!(score_rows(&app, user_id).await, vec![(empty_quiz, 0)]);
}

#[tokio::test]
async fn missing_quiz_is_404() {
    let app = spawn_app().await;
    let (user, _) = user_client(&app, "leo").await;

    let response = user.get(app.url("/start_quiz/4242")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = user.get(app.url("/quiz/4242/view")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn user_dashboard_lists_quiz_cards() {
    let app = spawn_app().await;
    let admin = admin_client(&app).await;
    let fixture = quiz_fixture(&app, &admin, "Maths").await;
    let (user, _) = user_client(&app, "mallory").await;

    let dashboard: Value = user.get(app.url("/user_dashboard")).send().await.unwrap().json().await.unwrap();
    let card = &dashboard["quizzes"][0];
    assert_eq!(card["id"], fixture.quiz_id);
    assert_eq!(card["num_questions"], 3);
    assert_eq!(card["subject_name"], "Maths");
    assert_eq!(card["chapter_name"], "Basics");
    assert_eq!(card["time_duration"], "00:30");

    let view: Value = user
        .get(app.url(&format!("/quiz/{}/view", fixture.quiz_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["title"], "Maths Quiz");
}

/// Memory sessions whose saves fail while `broken` is set and the data carries
/// no attempt, i.e. exactly when a finished attempt is being cleared.
struct FlakyClearStore {
    inner: MemorySessionStore,
    broken: Arc<AtomicBool>,
}

#[async_trait]
impl SessionStore for FlakyClearStore {
    async fn create(&self, data: &SessionData) -> Result<String, AppError> {
        self.inner.create(data).await
    }

    async fn load(&self, id: &str) -> Result<Option<SessionData>, AppError> {
        self.inner.load(id).await
    }

    async fn save(&self, id: &str, data: &SessionData) -> Result<(), AppError> {
        if data.quiz.is_none() && self.broken.load(Ordering::SeqCst) {
            return Err(AppError::InternalServerError("session store unavailable".to_string()));
        }
        self.inner.save(id, data).await
    }

    async fn destroy(&self, id: &str) -> Result<(), AppError> {
        self.inner.destroy(id).await
    }
}

#[tokio::test]
async fn failed_session_clear_never_duplicates_scores() {
    let broken = Arc::new(AtomicBool::new(false));
    let mut state = test_state(SessionBackend::Memory).await;
    state.sessions = Arc::new(FlakyClearStore {
        inner: MemorySessionStore::new(chrono::Duration::hours(1)),
        broken: broken.clone(),
    });
    let app = spawn_state(state).await;

    let admin = admin_client(&app).await;
    let fixture = quiz_fixture(&app, &admin, "Maths").await;
    let (user, user_id) = user_client(&app, "olivia").await;
    user.get(app.url(&format!("/start_quiz/{}", fixture.quiz_id))).send().await.unwrap();

    broken.store(true, Ordering::SeqCst);
    let response = user
        .post(app.url(&format!("/start_quiz/{}", fixture.quiz_id)))
        .json(&json!({ "selected_option": 1, "action": "submit" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 500);

    let retry = user.get(app.url(&format!("/start_quiz/{}", fixture.quiz_id))).send().await.unwrap();
    assert_eq!(retry.status().as_u16(), 500);
    assert!(score_rows(&app, user_id).await.is_empty());

    // Once the store recovers, the finished attempt is recorded exactly once
    broken.store(false, Ordering::SeqCst);
    let view: Value = user
        .get(app.url(&format!("/start_quiz/{}", fixture.quiz_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["status"], "completed");
    assert_eq!(view["total_scored"], 1);
    assert_eq!(score_rows(&app, user_id).await, vec![(fixture.quiz_id, 1)]);

    let replay: Value = user
        .get(app.url(&format!("/save_score/{}", fixture.quiz_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(replay["saved"], false);
    assert_eq!(score_rows(&app, user_id).await.len(), 1);
}
