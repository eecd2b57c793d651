// src/handlers/chapter.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::subject::fetch_subject,
    models::{
        chapter::{Chapter, ChapterRequest},
        quiz::Quiz,
    },
    utils::html::clean_text,
};

pub(crate) async fn fetch_chapter(pool: &SqlitePool, id: i64) -> Result<Chapter, AppError> {
    sqlx::query_as::<_, Chapter>(
        "SELECT id, subject_id, name, description FROM chapters WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Chapter not found".to_string()))
}

/// Adds a chapter to a subject.
/// Admin only.
pub async fn create_chapter(
    State(pool): State<SqlitePool>,
    Path(subject_id): Path<i64>,
    Json(payload): Json<ChapterRequest>,
) -> Result<impl IntoResponse, AppError> {
    fetch_subject(&pool, subject_id).await?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::InvalidInput(validation_errors.to_string()));
    }

    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO chapters (subject_id, name, description) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(subject_id)
    .bind(&payload.name)
    .bind(clean_text(&payload.description))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create chapter: {:?}", e);
        AppError::from(e)
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "message": "Chapter added successfully!" })),
    ))
}

pub async fn get_chapter(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(fetch_chapter(&pool, id).await?))
}

/// Replaces a chapter's name and description. The owning subject never changes.
/// Admin only.
pub async fn update_chapter(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<ChapterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::InvalidInput(validation_errors.to_string()));
    }

    let result = sqlx::query("UPDATE chapters SET name = ?, description = ? WHERE id = ?")
        .bind(&payload.name)
        .bind(clean_text(&payload.description))
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Chapter not found".to_string()));
    }

    Ok(Json(json!({ "id": id, "message": "Chapter updated successfully!" })))
}

/// Deletes a chapter and everything below it.
/// Admin only.
pub async fn delete_chapter(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM chapters WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete chapter: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Chapter not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Lists the quizzes of a chapter.
pub async fn list_quizzes(
    State(pool): State<SqlitePool>,
    Path(chapter_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let chapter = fetch_chapter(&pool, chapter_id).await?;

    let quizzes = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, chapter_id, title, date_of_quiz, duration_minutes, remarks
        FROM quizzes
        WHERE chapter_id = ?
        ORDER BY date_of_quiz, id
        "#,
    )
    .bind(chapter_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "chapter": chapter, "quizzes": quizzes })))
}
