// src/models/score.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'scores' table: the append-only ledger of finished attempts.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Score {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    pub time_stamp_of_attempt: DateTime<Utc>,
    pub total_scored: i64,
}

/// A ledger entry that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScore {
    pub quiz_id: i64,
    pub user_id: i64,
    pub time_stamp_of_attempt: DateTime<Utc>,
    pub total_scored: i64,
}

/// Scoreboard row joined with the quiz.
#[derive(Debug, Serialize, FromRow)]
pub struct ScoreboardEntry {
    pub id: i64,
    pub quiz_id: i64,
    pub quiz_title: String,
    pub num_questions: i64,
    pub time_stamp_of_attempt: DateTime<Utc>,
    pub total_scored: i64,
}
