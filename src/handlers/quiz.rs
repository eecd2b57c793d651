// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    handlers::chapter::fetch_chapter,
    models::quiz::{Quiz, QuizRequest},
    utils::html::clean_text,
};

pub(crate) async fn fetch_quiz(pool: &SqlitePool, id: i64) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, chapter_id, title, date_of_quiz, duration_minutes, remarks
        FROM quizzes
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

/// Schedules a new quiz in a chapter.
///
/// `time_duration` must be `HH:MM`, `date_of_quiz` must be `YYYY-MM-DD`.
/// Admin only.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    Path(chapter_id): Path<i64>,
    Json(payload): Json<QuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    fetch_chapter(&pool, chapter_id).await?;
    let fields = payload.into_fields()?;

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO quizzes (chapter_id, title, date_of_quiz, duration_minutes, remarks)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(chapter_id)
    .bind(&fields.title)
    .bind(fields.date_of_quiz)
    .bind(fields.time_duration.total_minutes())
    .bind(clean_text(&fields.remarks))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::from(e)
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "message": "Quiz added successfully!" })),
    ))
}

pub async fn get_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(fetch_quiz(&pool, id).await?))
}

/// Replaces a quiz's schedule and remarks.
/// Admin only.
pub async fn update_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<QuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let fields = payload.into_fields()?;

    let result = sqlx::query(
        r#"
        UPDATE quizzes
        SET title = ?, date_of_quiz = ?, duration_minutes = ?, remarks = ?
        WHERE id = ?
        "#,
    )
    .bind(&fields.title)
    .bind(fields.date_of_quiz)
    .bind(fields.time_duration.total_minutes())
    .bind(clean_text(&fields.remarks))
    .bind(id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(Json(json!({ "id": id, "message": "Quiz updated successfully!" })))
}

/// Deletes a quiz with its questions and scores.
/// Admin only.
pub async fn delete_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM quizzes WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete quiz: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
