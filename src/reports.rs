// src/reports.rs

//! Read-side aggregation over the score ledger and the content hierarchy.
//!
//! Nothing here writes. Empty ledgers produce empty series (or `None`
//! extremes) rather than errors.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::error::AppError;

/// A named aggregate, e.g. average score per subject.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct LabeledValue {
    pub label: String,
    pub value: f64,
}

/// One attempt on the score trend line.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TrendPoint {
    pub time_stamp_of_attempt: DateTime<Utc>,
    pub total_scored: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyAttempts {
    /// `%Y-%W`: year and Monday-based week number.
    pub week: String,
    pub attempts: usize,
}

/// Highest and lowest score among a set of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, FromRow)]
pub struct ScoreRange {
    pub highest: Option<i64>,
    pub lowest: Option<i64>,
}

impl ScoreRange {
    pub fn is_empty(&self) -> bool {
        self.highest.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectSummary {
    pub subject_id: i64,
    pub subject_name: String,
    /// Best attempt's correct fraction, in percent.
    pub top_score_percent: f64,
    /// Mean raw score over all attempts.
    pub average_score: f64,
    /// Share of all users with at least one attempt in the subject, in percent.
    pub users_attempted_percent: f64,
}

pub fn labeled(pairs: Vec<LabeledValue>) -> Vec<(String, f64)> {
    pairs.into_iter().map(|p| (p.label, p.value)).collect()
}

/// Average score per subject for one user.
pub async fn user_subject_averages(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<LabeledValue>, AppError> {
    let rows = sqlx::query_as::<_, LabeledValue>(
        r#"
        SELECT s.name AS label, AVG(sc.total_scored) AS value
        FROM scores sc
        JOIN quizzes q ON sc.quiz_id = q.id
        JOIN chapters c ON q.chapter_id = c.id
        JOIN subjects s ON c.subject_id = s.id
        WHERE sc.user_id = ?
        GROUP BY s.id, s.name
        ORDER BY s.name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Every attempt of one user, oldest first.
pub async fn user_score_trend(pool: &SqlitePool, user_id: i64) -> Result<Vec<TrendPoint>, AppError> {
    let rows = sqlx::query_as::<_, TrendPoint>(
        r#"
        SELECT time_stamp_of_attempt, total_scored
        FROM scores
        WHERE user_id = ?
        ORDER BY time_stamp_of_attempt, id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Average score per quiz for one user.
pub async fn user_quiz_averages(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<LabeledValue>, AppError> {
    let rows = sqlx::query_as::<_, LabeledValue>(
        r#"
        SELECT q.title AS label, AVG(sc.total_scored) AS value
        FROM scores sc
        JOIN quizzes q ON sc.quiz_id = q.id
        WHERE sc.user_id = ?
        GROUP BY q.id, q.title
        ORDER BY q.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Attempts per week for one user.
pub async fn user_weekly_attempts(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<WeeklyAttempts>, AppError> {
    let trend = user_score_trend(pool, user_id).await?;
    Ok(weekly_attempts(trend.iter().map(|p| p.time_stamp_of_attempt)))
}

/// Buckets timestamps by `%Y-%W`, in chronological order.
pub fn weekly_attempts(stamps: impl IntoIterator<Item = DateTime<Utc>>) -> Vec<WeeklyAttempts> {
    let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
    for stamp in stamps {
        *buckets.entry(stamp.format("%Y-%W").to_string()).or_default() += 1;
    }
    buckets
        .into_iter()
        .map(|(week, attempts)| WeeklyAttempts { week, attempts })
        .collect()
}

/// Chapter and quiz counts of a subject.
pub async fn subject_counts(pool: &SqlitePool, subject_id: i64) -> Result<(i64, i64), AppError> {
    let counts: (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM chapters WHERE subject_id = ?1),
            (SELECT COUNT(*) FROM quizzes q JOIN chapters c ON q.chapter_id = c.id
             WHERE c.subject_id = ?1)
        "#,
    )
    .bind(subject_id)
    .fetch_one(pool)
    .await?;

    Ok(counts)
}

/// Extremes over all attempts on quizzes in a subject.
pub async fn subject_score_range(pool: &SqlitePool, subject_id: i64) -> Result<ScoreRange, AppError> {
    let range = sqlx::query_as::<_, ScoreRange>(
        r#"
        SELECT MAX(sc.total_scored) AS highest, MIN(sc.total_scored) AS lowest
        FROM scores sc
        JOIN quizzes q ON sc.quiz_id = q.id
        JOIN chapters c ON q.chapter_id = c.id
        WHERE c.subject_id = ?
        "#,
    )
    .bind(subject_id)
    .fetch_one(pool)
    .await?;

    Ok(range)
}

/// Extremes over all attempts on one quiz.
pub async fn quiz_score_range(pool: &SqlitePool, quiz_id: i64) -> Result<ScoreRange, AppError> {
    let range = sqlx::query_as::<_, ScoreRange>(
        "SELECT MAX(total_scored) AS highest, MIN(total_scored) AS lowest FROM scores WHERE quiz_id = ?",
    )
    .bind(quiz_id)
    .fetch_one(pool)
    .await?;

    Ok(range)
}

#[derive(FromRow)]
struct SubjectSummaryRow {
    id: i64,
    name: String,
    best_scored: Option<i64>,
    best_quiz_questions: Option<i64>,
    average_score: Option<f64>,
    users_attempted: i64,
}

/// Per-subject figures for the admin summary, one entry per subject.
pub async fn subject_summaries(pool: &SqlitePool) -> Result<Vec<SubjectSummary>, AppError> {
    let (total_users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    // The best attempt is the highest total; ties go to the earliest row.
    let rows = sqlx::query_as::<_, SubjectSummaryRow>(
        r#"
        WITH subject_scores AS (
            SELECT c.subject_id, sc.id, sc.user_id, sc.total_scored, sc.quiz_id
            FROM scores sc
            JOIN quizzes q ON sc.quiz_id = q.id
            JOIN chapters c ON q.chapter_id = c.id
        ),
        best AS (
            SELECT subject_id, total_scored, quiz_id,
                   ROW_NUMBER() OVER (PARTITION BY subject_id ORDER BY total_scored DESC, id ASC) AS rn
            FROM subject_scores
        )
        SELECT
            s.id,
            s.name,
            b.total_scored AS best_scored,
            (SELECT COUNT(*) FROM questions WHERE quiz_id = b.quiz_id) AS best_quiz_questions,
            (SELECT AVG(total_scored) FROM subject_scores WHERE subject_id = s.id) AS average_score,
            (SELECT COUNT(DISTINCT user_id) FROM subject_scores WHERE subject_id = s.id) AS users_attempted
        FROM subjects s
        LEFT JOIN best b ON b.subject_id = s.id AND b.rn = 1
        ORDER BY s.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| SubjectSummary {
            subject_id: row.id,
            subject_name: row.name,
            top_score_percent: percent(row.best_scored.unwrap_or(0), row.best_quiz_questions.unwrap_or(0)),
            average_score: row.average_score.unwrap_or(0.0),
            users_attempted_percent: percent(row.users_attempted, total_users),
        })
        .collect())
}

/// `part / whole` in percent; zero when `whole` is zero.
pub fn percent(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
