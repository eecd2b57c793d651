// src/models/quiz.rs

use std::{fmt, str::FromStr, sync::LazyLock};

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("valid duration regex"));

/// How long a quiz runs, entered and displayed as `HH:MM`.
///
/// Bounded like a wall-clock time: hours in 0..=23, minutes in 0..=59.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizDuration {
    hours: u8,
    minutes: u8,
}

impl QuizDuration {
    pub fn new(hours: u8, minutes: u8) -> Option<Self> {
        (hours < 24 && minutes < 60).then_some(Self { hours, minutes })
    }

    pub fn hours(&self) -> u8 {
        self.hours
    }

    pub fn minutes(&self) -> u8 {
        self.minutes
    }

    /// Storage representation.
    pub fn total_minutes(&self) -> i64 {
        i64::from(self.hours) * 60 + i64::from(self.minutes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDurationError(String);

impl fmt::Display for ParseDurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid quiz duration: {}", self.0)
    }
}

impl std::error::Error for ParseDurationError {}

impl FromStr for QuizDuration {
    type Err = ParseDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = DURATION_RE
            .captures(s.trim())
            .ok_or_else(|| ParseDurationError(s.to_string()))?;
        let hours = caps[1]
            .parse::<u8>()
            .map_err(|_| ParseDurationError(s.to_string()))?;
        let minutes = caps[2]
            .parse::<u8>()
            .map_err(|_| ParseDurationError(s.to_string()))?;
        QuizDuration::new(hours, minutes).ok_or_else(|| ParseDurationError(s.to_string()))
    }
}

impl TryFrom<i64> for QuizDuration {
    type Error = ParseDurationError;

    fn try_from(total: i64) -> Result<Self, Self::Error> {
        let hours = u8::try_from(total / 60).map_err(|_| ParseDurationError(total.to_string()))?;
        let minutes = u8::try_from(total % 60).map_err(|_| ParseDurationError(total.to_string()))?;
        QuizDuration::new(hours, minutes).ok_or_else(|| ParseDurationError(total.to_string()))
    }
}

impl fmt::Display for QuizDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours, self.minutes)
    }
}

impl Serialize for QuizDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Quiz {
    pub id: i64,
    pub chapter_id: i64,
    pub title: String,
    pub date_of_quiz: NaiveDate,
    #[sqlx(rename = "duration_minutes", try_from = "i64")]
    pub time_duration: QuizDuration,
    pub remarks: String,
}

/// Quiz listing row for the user dashboard and quiz view.
#[derive(Debug, Serialize, FromRow)]
pub struct QuizCard {
    pub id: i64,
    pub title: String,
    pub date_of_quiz: NaiveDate,
    #[sqlx(rename = "duration_minutes", try_from = "i64")]
    pub time_duration: QuizDuration,
    pub remarks: String,
    pub chapter_name: String,
    pub subject_name: String,
    pub num_questions: i64,
}

/// DTO for creating or replacing a quiz. Date and duration arrive as text.
#[derive(Debug, Deserialize, Validate)]
pub struct QuizRequest {
    #[validate(length(
        min = 1,
        max = 120,
        message = "Quiz title cannot be empty and must be less than or equal to 120 characters."
    ))]
    pub title: String,
    #[serde(default)]
    pub date_of_quiz: String,
    #[serde(default)]
    pub time_duration: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub remarks: String,
}

/// Quiz fields after parsing.
#[derive(Debug, Clone)]
pub struct QuizFields {
    pub title: String,
    pub date_of_quiz: NaiveDate,
    pub time_duration: QuizDuration,
    pub remarks: String,
}

impl QuizRequest {
    /// Validates lengths and parses the date and duration strings.
    pub fn into_fields(self) -> Result<QuizFields, AppError> {
        self.validate()?;

        let time_duration = self
            .time_duration
            .parse::<QuizDuration>()
            .map_err(|_| AppError::InvalidInput("Invalid time duration format. Use HH:MM.".to_string()))?;
        let date_of_quiz = parse_iso_date(&self.date_of_quiz)
            .ok_or_else(|| AppError::InvalidInput("Invalid date format. Use YYYY-MM-DD.".to_string()))?;

        Ok(QuizFields {
            title: self.title,
            date_of_quiz,
            time_duration,
            remarks: self.remarks,
        })
    }
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_parses_hours_and_minutes() {
        let d: QuizDuration = "01:30".parse().unwrap();
        assert_eq!((d.hours(), d.minutes()), (1, 30));
        assert_eq!(d.total_minutes(), 90);
        assert_eq!(d.to_string(), "01:30");

        let short: QuizDuration = "0:45".parse().unwrap();
        assert_eq!(short.to_string(), "00:45");
    }

    #[test]
    fn duration_rejects_malformed_input() {
        for raw in ["", "90", "1:5", "24:00", "12:60", "aa:bb", "1:30:00", "-1:30"] {
            assert!(raw.parse::<QuizDuration>().is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn duration_survives_storage() {
        let d: QuizDuration = "23:59".parse().unwrap();
        assert_eq!(QuizDuration::try_from(d.total_minutes()).unwrap(), d);
        assert!(QuizDuration::try_from(24 * 60).is_err());
    }

    #[test]
    fn quiz_request_rejects_bad_date() {
        let req = QuizRequest {
            title: "Algebra basics".to_string(),
            date_of_quiz: "2024/01/31".to_string(),
            time_duration: "00:30".to_string(),
            remarks: String::new(),
        };
        assert!(matches!(req.into_fields(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn quiz_request_parses_valid_fields() {
        let req = QuizRequest {
            title: "Algebra basics".to_string(),
            date_of_quiz: "2024-01-31".to_string(),
            time_duration: "00:30".to_string(),
            remarks: "open book".to_string(),
        };
        let fields = req.into_fields().unwrap();
        assert_eq!(fields.date_of_quiz, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert_eq!(fields.time_duration.total_minutes(), 30);
    }
}
