// src/models/chapter.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'chapters' table. Always owned by a subject.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Chapter {
    pub id: i64,
    pub subject_id: i64,
    pub name: String,
    pub description: String,
}

/// DTO for creating or replacing a chapter.
#[derive(Debug, Deserialize, Validate)]
pub struct ChapterRequest {
    #[validate(length(
        min = 1,
        max = 120,
        message = "Chapter name cannot be empty and must be less than or equal to 120 characters."
    ))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
}
