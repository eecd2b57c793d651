// src/models/subject.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'subjects' table: the root of the content hierarchy.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    /// Unique across all subjects.
    pub name: String,
    pub description: String,
}

/// Admin dashboard row.
#[derive(Debug, Serialize, FromRow)]
pub struct SubjectOverview {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub chapter_count: i64,
}

/// DTO for creating or replacing a subject.
#[derive(Debug, Deserialize, Validate)]
pub struct SubjectRequest {
    #[validate(length(
        min = 1,
        max = 120,
        message = "Subject name cannot be empty and must be less than or equal to 120 characters."
    ))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
}
