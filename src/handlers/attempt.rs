// src/handlers/attempt.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    handlers::{question::fetch_questions, quiz::fetch_quiz},
    models::{
        attempt::{AttemptAction, AttemptState},
        question::{PublicQuestion, Question},
        quiz::Quiz,
        score::Score,
    },
    utils::session::{CurrentSession, SessionStore},
};

/// DTO for submitting the current question.
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    /// Option number 1..=4; absent when the taker skipped the question.
    #[serde(default)]
    pub selected_option: Option<u8>,
    pub action: AttemptAction,
}

/// What the quiz taker sees after each step.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptView {
    InProgress {
        quiz_id: i64,
        quiz_title: String,
        question: PublicQuestion,
        current_question_index: usize,
        total_questions: usize,
        selected_option: Option<u8>,
    },
    Completed {
        quiz_id: i64,
        total_scored: i64,
        total_questions: usize,
        redirect: &'static str,
    },
}

/// Writes the ledger entry for a completed attempt on `quiz_id` and clears it
/// from the session.
///
/// Returns `None` (and writes nothing) when the session holds no completed
/// attempt for that quiz, which makes replays harmless. The cleared session is
/// persisted before the score row is written.
async fn finalize_attempt(
    pool: &SqlitePool,
    sessions: &dyn SessionStore,
    session: &mut CurrentSession,
    quiz_id: i64,
) -> Result<Option<Score>, AppError> {
    let Some(state) = session
        .data
        .quiz
        .take_if(|state| state.quiz_id == quiz_id && state.is_completed())
    else {
        return Ok(None);
    };

    if let Err(e) = sessions.save(&session.id, &session.data).await {
        session.data.quiz = Some(state);
        return Err(e);
    }

    let new_score = state.clone().into_score(session.data.user_id, Utc::now());

    let inserted = sqlx::query_as::<_, Score>(
        r#"
        INSERT INTO scores (quiz_id, user_id, time_stamp_of_attempt, total_scored)
        VALUES (?, ?, ?, ?)
        RETURNING id, quiz_id, user_id, time_stamp_of_attempt, total_scored
        "#,
    )
    .bind(new_score.quiz_id)
    .bind(new_score.user_id)
    .bind(new_score.time_stamp_of_attempt)
    .bind(new_score.total_scored)
    .fetch_one(pool)
    .await;

    let score = match inserted {
        Ok(score) => score,
        Err(e) => {
            tracing::error!("Failed to record score: {:?}", e);
            // Put the attempt back so the next visit can record it.
            session.data.quiz = Some(state);
            if let Err(restore) = sessions.save(&session.id, &session.data).await {
                tracing::error!("Failed to restore completed attempt: {}", restore);
            }
            return Err(AppError::from(e));
        }
    };

    tracing::info!(
        "Recorded score {}: user {} finished quiz {} with {} correct",
        score.id,
        score.user_id,
        score.quiz_id,
        score.total_scored
    );
    Ok(Some(score))
}

/// Stores `state` in the session and renders it, finalising the attempt when
/// there is no question left to show.
async fn present(
    pool: &SqlitePool,
    sessions: &dyn SessionStore,
    mut session: CurrentSession,
    quiz: &Quiz,
    questions: &[Question],
    mut state: AttemptState,
) -> Result<AttemptView, AppError> {
    let current = questions
        .get(state.current_question_index)
        .filter(|_| !state.is_completed());

    if let Some(question) = current {
        let view = AttemptView::InProgress {
            quiz_id: quiz.id,
            quiz_title: quiz.title.clone(),
            question: question.to_public(),
            current_question_index: state.current_question_index,
            total_questions: state.total_questions,
            selected_option: state.selected_for(question.id),
        };
        session.data.quiz = Some(state);
        sessions.save(&session.id, &session.data).await?;
        return Ok(view);
    }

    // Questions deleted mid-attempt leave the index past the end: that ends it too.
    state.current_question_index = state.current_question_index.max(state.total_questions);
    let total_questions = state.total_questions;
    session.data.quiz = Some(state);
    // A finished attempt outlives a failed finalisation and is retried on the next visit.
    sessions.save(&session.id, &session.data).await?;

    let score = finalize_attempt(pool, sessions, &mut session, quiz.id)
        .await?
        .ok_or_else(|| AppError::InternalServerError("completed attempt was not recorded".to_string()))?;

    Ok(AttemptView::Completed {
        quiz_id: quiz.id,
        total_scored: score.total_scored,
        total_questions,
        redirect: "/scoreboard",
    })
}

/// Starts or resumes an attempt and shows the current question.
///
/// Visiting a different quiz discards any attempt in progress.
pub async fn show_question(
    State(pool): State<SqlitePool>,
    State(sessions): State<Arc<dyn SessionStore>>,
    Extension(mut session): Extension<CurrentSession>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, quiz_id).await?;
    let questions = fetch_questions(&pool, quiz_id).await?;

    let state = AttemptState::enter(session.data.quiz.take(), quiz_id, questions.len());

    let view = present(&pool, sessions.as_ref(), session, &quiz, &questions, state).await?;
    Ok(Json(view))
}

/// Records the answer to the current question, then moves on or finishes.
pub async fn answer_question(
    State(pool): State<SqlitePool>,
    State(sessions): State<Arc<dyn SessionStore>>,
    Extension(mut session): Extension<CurrentSession>,
    Path(quiz_id): Path<i64>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.selected_option.is_some_and(|n| !(1..=4).contains(&n)) {
        return Err(AppError::InvalidInput(
            "Selected option must be between 1 and 4.".to_string(),
        ));
    }

    let quiz = fetch_quiz(&pool, quiz_id).await?;
    let questions = fetch_questions(&pool, quiz_id).await?;

    let state = AttemptState::enter(session.data.quiz.take(), quiz_id, questions.len());
    let state = match questions.get(state.current_question_index) {
        Some(question) if !state.is_completed() => {
            tracing::debug!(
                "User {} answered question {} of quiz {} with {:?} ({:?})",
                session.data.user_id,
                question.id,
                quiz_id,
                req.selected_option,
                req.action
            );
            state.apply(question, req.selected_option, req.action)
        }
        _ => state,
    };

    let view = present(&pool, sessions.as_ref(), session, &quiz, &questions, state).await?;
    Ok(Json(view))
}

/// Records the score of a completed attempt, if one is pending for this quiz.
pub async fn save_score(
    State(pool): State<SqlitePool>,
    State(sessions): State<Arc<dyn SessionStore>>,
    Extension(mut session): Extension<CurrentSession>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    fetch_quiz(&pool, quiz_id).await?;

    let saved = finalize_attempt(&pool, sessions.as_ref(), &mut session, quiz_id).await?;

    Ok(Json(json!({
        "saved": saved.is_some(),
        "total_scored": saved.map(|score| score.total_scored),
        "redirect": "/scoreboard",
    })))
}
