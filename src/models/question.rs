// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::error::AppError;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub quiz_id: i64,

    /// The text content of the question.
    pub question_statement: String,

    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,

    /// The correct answer, stored as the text of one of the options.
    pub correct_answer: String,
}

impl Question {
    /// Text of option `number` (1..=4).
    pub fn option_text(&self, number: u8) -> Option<&str> {
        match number {
            1 => Some(&self.option1),
            2 => Some(&self.option2),
            3 => Some(&self.option3),
            4 => Some(&self.option4),
            _ => None,
        }
    }

    /// Exact, case-sensitive comparison against the stored answer text.
    pub fn is_correct(&self, selected: u8) -> bool {
        self.option_text(selected) == Some(self.correct_answer.as_str())
    }

    /// The question as shown to a quiz taker.
    pub fn to_public(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id,
            question_statement: self.question_statement.clone(),
            options: (1..=4)
                .filter_map(|n| {
                    self.option_text(n).map(|text| QuestionOption {
                        id: n,
                        text: text.to_string(),
                    })
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuestionOption {
    pub id: u8,
    pub text: String,
}

/// DTO for sending a question to a quiz taker (excludes the answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_statement: String,
    pub options: Vec<QuestionOption>,
}

/// DTO for creating or replacing a question.
#[derive(Debug, Deserialize, Validate)]
pub struct QuestionRequest {
    #[validate(length(min = 1, max = 2000, message = "Question statement cannot be empty."))]
    pub question_statement: String,
    #[validate(length(min = 1, max = 255))]
    pub option1: String,
    #[validate(length(min = 1, max = 255))]
    pub option2: String,
    #[validate(length(min = 1, max = 255))]
    pub option3: String,
    #[validate(length(min = 1, max = 255))]
    pub option4: String,
    #[validate(length(min = 1, max = 255))]
    pub correct_answer: String,
}

impl QuestionRequest {
    /// Field rules plus the requirement that the answer is one of the options.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;

        let options = [&self.option1, &self.option2, &self.option3, &self.option4];
        if !options.contains(&&self.correct_answer) {
            return Err(AppError::InvalidInput(
                "Correct answer must match one of the four options.".to_string(),
            ));
        }
        Ok(())
    }
}
