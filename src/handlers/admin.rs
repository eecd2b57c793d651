// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use plotters::style::RGBColor;
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    handlers::{quiz::fetch_quiz, subject::fetch_subject, svg_response},
    models::{
        quiz::Quiz,
        subject::{Subject, SubjectOverview},
        user::User,
    },
    reports::{self, ScoreRange, labeled},
    utils::chart::{self, ChartLabels, HIGH_GREEN, LIGHT_GREEN, LOW_RED, SKY_BLUE},
};

/// Subjects with their chapter counts.
/// Admin only.
pub async fn dashboard(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let subjects = sqlx::query_as::<_, SubjectOverview>(
        r#"
        SELECT s.id, s.name, s.description,
               (SELECT COUNT(*) FROM chapters WHERE subject_id = s.id) AS chapter_count
        FROM subjects s
        ORDER BY s.id
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "subjects": subjects })))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "users".to_string()
}

/// Substring search over users, subjects or quizzes.
/// Admin only.
pub async fn search(
    State(pool): State<SqlitePool>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let pattern = format!("%{}%", params.query.trim());

    let results: Value = match params.filter.as_str() {
        "users" => json!(
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, username, password_hash, full_name, qualification, dob, is_admin
                FROM users
                WHERE is_admin = FALSE AND (username LIKE ?1 OR full_name LIKE ?1)
                ORDER BY id
                "#,
            )
            .bind(&pattern)
            .fetch_all(&pool)
            .await?
        ),
        "subjects" => json!(
            sqlx::query_as::<_, Subject>(
                "SELECT id, name, description FROM subjects WHERE name LIKE ? ORDER BY id",
            )
            .bind(&pattern)
            .fetch_all(&pool)
            .await?
        ),
        "quizzes" => json!(
            sqlx::query_as::<_, Quiz>(
                r#"
                SELECT id, chapter_id, title, date_of_quiz, duration_minutes, remarks
                FROM quizzes
                WHERE title LIKE ?
                ORDER BY id
                "#,
            )
            .bind(&pattern)
            .fetch_all(&pool)
            .await?
        ),
        other => {
            tracing::debug!("Ignoring unknown search filter {:?}", other);
            json!([])
        }
    };

    Ok(Json(json!({
        "query": params.query,
        "filter": params.filter,
        "results": results,
    })))
}

async fn fetch_user(pool: &SqlitePool, id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, full_name, qualification, dob, is_admin
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))
}

/// A user's profile and their average score per subject.
/// Admin only.
pub async fn show_user(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = fetch_user(&pool, id).await?;
    let averages = reports::user_subject_averages(&pool, id).await?;
    let chart_url = (!averages.is_empty()).then(|| format!("/admin/user/{id}/chart.svg"));

    Ok(Json(json!({
        "user": user,
        "subject_averages": averages,
        "chart_url": chart_url,
    })))
}

pub async fn user_chart(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let user = fetch_user(&pool, id).await?;
    let bars = labeled(reports::user_subject_averages(&pool, id).await?);

    let title = format!("Average Scores per Subject for {}", user.full_name);
    let labels = ChartLabels {
        title: &title,
        x_desc: "Subject",
        y_desc: "Average Score",
    };
    Ok(svg_response(chart::bar_chart(&labels, &bars, &[SKY_BLUE])?))
}

/// Highest/lowest bars for a score range; nothing when no attempts exist.
fn range_chart(title: &str, range: ScoreRange) -> Result<Option<String>, AppError> {
    let (Some(highest), Some(lowest)) = (range.highest, range.lowest) else {
        return Ok(None);
    };
    let bars = [
        ("Highest".to_string(), highest as f64),
        ("Lowest".to_string(), lowest as f64),
    ];
    let labels = ChartLabels {
        title,
        x_desc: "",
        y_desc: "Score",
    };
    chart::bar_chart(&labels, &bars, &[HIGH_GREEN, LOW_RED])
}

/// Chapter and quiz counts of a subject with its score extremes.
/// Admin only.
pub async fn show_subject(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let subject = fetch_subject(&pool, id).await?;
    let (num_chapters, num_quizzes) = reports::subject_counts(&pool, id).await?;
    let range = reports::subject_score_range(&pool, id).await?;
    let chart_url = (!range.is_empty()).then(|| format!("/admin/subject/{id}/chart.svg"));

    Ok(Json(json!({
        "subject": subject,
        "num_chapters": num_chapters,
        "num_quizzes": num_quizzes,
        "highest_score": range.highest,
        "lowest_score": range.lowest,
        "chart_url": chart_url,
    })))
}

pub async fn subject_chart(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let subject = fetch_subject(&pool, id).await?;
    let range = reports::subject_score_range(&pool, id).await?;
    let title = format!("Scores for {}", subject.name);
    Ok(svg_response(range_chart(&title, range)?))
}

/// Question count of a quiz with its score extremes.
/// Admin only.
pub async fn show_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, id).await?;
    let (num_questions,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM questions WHERE quiz_id = ?")
        .bind(id)
        .fetch_one(&pool)
        .await?;
    let range = reports::quiz_score_range(&pool, id).await?;
    let chart_url = (!range.is_empty()).then(|| format!("/admin/quiz/{id}/chart.svg"));

    Ok(Json(json!({
        "quiz": quiz,
        "num_questions": num_questions,
        "highest_score": range.highest,
        "lowest_score": range.lowest,
        "chart_url": chart_url,
    })))
}

pub async fn quiz_chart(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let quiz = fetch_quiz(&pool, id).await?;
    let range = reports::quiz_score_range(&pool, id).await?;
    let title = format!("Scores for {}", quiz.title);
    Ok(svg_response(range_chart(&title, range)?))
}

/// True once anybody has finished any quiz.
async fn any_scores(pool: &SqlitePool) -> Result<bool, AppError> {
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM scores)")
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Per-subject top score, average score and participation.
/// Admin only.
pub async fn summary(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let subjects = reports::subject_summaries(&pool).await?;
    let has_charts = any_scores(&pool).await? && !subjects.is_empty();
    let link = |path: &str| has_charts.then(|| path.to_string());

    Ok(Json(json!({
        "subjects": subjects,
        "top_scores_chart": link("/admin/summary/top_scores.svg"),
        "average_scores_chart": link("/admin/summary/average_scores.svg"),
        "users_attempted_chart": link("/admin/summary/users_attempted.svg"),
    })))
}

/// One bar per subject, drawn only once any score exists.
async fn summary_chart(
    pool: &SqlitePool,
    labels: ChartLabels<'_>,
    color: RGBColor,
    value: impl Fn(&reports::SubjectSummary) -> f64,
) -> Result<Response, AppError> {
    if !any_scores(pool).await? {
        return Ok(svg_response(None));
    }
    let bars: Vec<(String, f64)> = reports::subject_summaries(pool)
        .await?
        .iter()
        .map(|s| (s.subject_name.clone(), value(s)))
        .collect();
    Ok(svg_response(chart::bar_chart(&labels, &bars, &[color])?))
}

pub async fn top_scores_chart(State(pool): State<SqlitePool>) -> Result<Response, AppError> {
    let labels = ChartLabels {
        title: "Top Scores per Subject",
        x_desc: "Subject",
        y_desc: "Top Score (%)",
    };
    summary_chart(&pool, labels, SKY_BLUE, |s| s.top_score_percent).await
}

pub async fn average_scores_chart(State(pool): State<SqlitePool>) -> Result<Response, AppError> {
    let labels = ChartLabels {
        title: "Average Scores per Subject",
        x_desc: "Subject",
        y_desc: "Average Score",
    };
    summary_chart(&pool, labels, LIGHT_GREEN, |s| s.average_score).await
}

pub async fn users_attempted_chart(State(pool): State<SqlitePool>) -> Result<Response, AppError> {
    let labels = ChartLabels {
        title: "Users Attempted per Subject",
        x_desc: "Subject",
        y_desc: "Users Attempted (%)",
    };
    summary_chart(&pool, labels, HIGH_GREEN, |s| s.users_attempted_percent).await
}
