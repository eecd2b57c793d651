// src/handlers/dashboard.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    handlers::svg_response,
    models::{quiz::QuizCard, score::ScoreboardEntry},
    reports::{self, labeled},
    utils::{
        chart::{self, ChartLabels, LIGHT_GREEN, SKY_BLUE},
        session::CurrentSession,
    },
};

const QUIZ_CARD_SELECT: &str = r#"
    SELECT
        q.id, q.title, q.date_of_quiz, q.duration_minutes, q.remarks,
        c.name AS chapter_name,
        s.name AS subject_name,
        (SELECT COUNT(*) FROM questions WHERE quiz_id = q.id) AS num_questions
    FROM quizzes q
    JOIN chapters c ON q.chapter_id = c.id
    JOIN subjects s ON c.subject_id = s.id
"#;

/// Every quiz a user can take.
pub async fn user_dashboard(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let quizzes = sqlx::query_as::<_, QuizCard>(&format!(
        "{QUIZ_CARD_SELECT} ORDER BY q.date_of_quiz, q.id"
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "quizzes": quizzes })))
}

/// Quiz details shown before starting an attempt.
pub async fn view_quiz(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = sqlx::query_as::<_, QuizCard>(&format!("{QUIZ_CARD_SELECT} WHERE q.id = ?"))
        .bind(quiz_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    Ok(Json(quiz))
}

/// The current user's attempts, newest first.
pub async fn scoreboard(
    State(pool): State<SqlitePool>,
    Extension(session): Extension<CurrentSession>,
) -> Result<impl IntoResponse, AppError> {
    let scores = sqlx::query_as::<_, ScoreboardEntry>(
        r#"
        SELECT
            sc.id, sc.quiz_id, q.title AS quiz_title,
            (SELECT COUNT(*) FROM questions WHERE quiz_id = q.id) AS num_questions,
            sc.time_stamp_of_attempt, sc.total_scored
        FROM scores sc
        JOIN quizzes q ON sc.quiz_id = q.id
        WHERE sc.user_id = ?
        ORDER BY sc.time_stamp_of_attempt DESC, sc.id DESC
        "#,
    )
    .bind(session.data.user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "scores": scores })))
}

/// Personal statistics with links to the matching charts (null when empty).
pub async fn user_summary(
    State(pool): State<SqlitePool>,
    Extension(session): Extension<CurrentSession>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = session.data.user_id;
    let trend = reports::user_score_trend(&pool, user_id).await?;
    let averages = reports::user_quiz_averages(&pool, user_id).await?;
    let weekly = reports::user_weekly_attempts(&pool, user_id).await?;

    let link = |has_data: bool, path: &str| has_data.then(|| path.to_string());

    Ok(Json(json!({
        "score_trend": trend,
        "quiz_averages": averages,
        "weekly_attempts": weekly,
        "score_trend_chart": link(!trend.is_empty(), "/user_summary/score_trend.svg"),
        "average_score_chart": link(!averages.is_empty(), "/user_summary/quiz_averages.svg"),
        "quizzes_attempted_chart": link(!weekly.is_empty(), "/user_summary/weekly_attempts.svg"),
    })))
}

pub async fn score_trend_chart(
    State(pool): State<SqlitePool>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Response, AppError> {
    let points: Vec<(String, f64)> = reports::user_score_trend(&pool, session.data.user_id)
        .await?
        .into_iter()
        .map(|p| {
            (
                p.time_stamp_of_attempt.format("%Y-%m-%d").to_string(),
                p.total_scored as f64,
            )
        })
        .collect();

    let labels = ChartLabels {
        title: "Score Trend Over Time",
        x_desc: "Date",
        y_desc: "Score",
    };
    Ok(svg_response(chart::line_chart(&labels, &points)?))
}

pub async fn quiz_averages_chart(
    State(pool): State<SqlitePool>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Response, AppError> {
    let bars = labeled(reports::user_quiz_averages(&pool, session.data.user_id).await?);

    let labels = ChartLabels {
        title: "Average Score per Quiz",
        x_desc: "Quiz",
        y_desc: "Average Score",
    };
    Ok(svg_response(chart::bar_chart(&labels, &bars, &[SKY_BLUE])?))
}

pub async fn weekly_attempts_chart(
    State(pool): State<SqlitePool>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Response, AppError> {
    let bars: Vec<(String, f64)> = reports::user_weekly_attempts(&pool, session.data.user_id)
        .await?
        .into_iter()
        .map(|w| (w.week, w.attempts as f64))
        .collect();

    let labels = ChartLabels {
        title: "Quizzes Attempted per Week",
        x_desc: "Week (Year-Week)",
        y_desc: "Number of Quizzes Attempted",
    };
    Ok(svg_response(chart::bar_chart(&labels, &bars, &[LIGHT_GREEN])?))
}
