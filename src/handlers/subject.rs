// src/handlers/subject.rs

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
    error::{AppError, is_unique_violation},
    models::{
        chapter::Chapter,
        subject::{Subject, SubjectRequest},
    },
    utils::html::clean_text,
};

pub(crate) async fn fetch_subject(pool: &SqlitePool, id: i64) -> Result<Subject, AppError> {
    sqlx::query_as::<_, Subject>("SELECT id, name, description FROM subjects WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Subject not found".to_string()))
}

fn duplicate_name(e: sqlx::Error, name: &str) -> AppError {
    if is_unique_violation(&e) {
        AppError::Conflict(format!("Subject '{}' already exists", name))
    } else {
        tracing::error!("Failed to write subject: {:?}", e);
        AppError::from(e)
    }
}

/// Creates a new subject.
/// Admin only.
pub async fn create_subject(
    State(pool): State<SqlitePool>,
    Json(payload): Json<SubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::InvalidInput(validation_errors.to_string()));
    }

    let (id,): (i64,) =
        sqlx::query_as("INSERT INTO subjects (name, description) VALUES (?, ?) RETURNING id")
            .bind(&payload.name)
            .bind(clean_text(&payload.description))
            .fetch_one(&pool)
            .await
            .map_err(|e| duplicate_name(e, &payload.name))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "message": "Subject added successfully!" })),
    ))
}

/// Retrieves a single subject by ID.
pub async fn get_subject(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(fetch_subject(&pool, id).await?))
}

/// Replaces a subject's name and description.
/// Admin only.
pub async fn update_subject(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<SubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::InvalidInput(validation_errors.to_string()));
    }

    let result = sqlx::query("UPDATE subjects SET name = ?, description = ? WHERE id = ?")
        .bind(&payload.name)
        .bind(clean_text(&payload.description))
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| duplicate_name(e, &payload.name))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }

    Ok(Json(json!({ "id": id, "message": "Subject updated successfully!" })))
}

/// Deletes a subject together with its chapters, quizzes, questions and scores.
/// Admin only.
pub async fn delete_subject(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM subjects WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete subject: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }

    tracing::info!("Deleted subject {} and its descendants", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Lists the chapters of a subject.
pub async fn list_chapters(
    State(pool): State<SqlitePool>,
    Path(subject_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let subject = fetch_subject(&pool, subject_id).await?;

    let chapters = sqlx::query_as::<_, Chapter>(
        "SELECT id, subject_id, name, description FROM chapters WHERE subject_id = ? ORDER BY id",
    )
    .bind(subject_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "subject": subject, "chapters": chapters })))
}
