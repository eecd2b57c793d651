// src/models/attempt.rs

//! Quiz-attempt state machine.
//!
//! An attempt lives inside the user's server-side session. Every transition is
//! a pure function of the current state and the submitted input; the handlers
//! own loading, saving and the single ledger write on completion.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{question::Question, score::NewScore};

/// What the quiz taker asked for when submitting a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptAction {
    /// Record the answer and move to the next question.
    SaveNext,
    /// Record the answer and finish the attempt immediately.
    Submit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    NotStarted,
    InProgress(usize),
    Completed,
}

/// Per-session progress through one quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptState {
    pub quiz_id: i64,
    pub current_question_index: usize,
    pub total_marks: u32,
    /// Question id -> selected option number. `None` records a question that
    /// was submitted without a selection.
    pub answers: BTreeMap<i64, Option<u8>>,
    pub total_questions: usize,
    pub questions_attempted: u32,
}

impl AttemptState {
    pub fn new(quiz_id: i64, total_questions: usize) -> Self {
        Self {
            quiz_id,
            current_question_index: 0,
            total_marks: 0,
            answers: BTreeMap::new(),
            total_questions,
            questions_attempted: 0,
        }
    }

    /// Resumes `prior` when it belongs to `quiz_id`, otherwise starts over.
    /// An attempt on a different quiz is discarded without notice.
    pub fn enter(prior: Option<AttemptState>, quiz_id: i64, total_questions: usize) -> Self {
        match prior {
            Some(state) if state.quiz_id == quiz_id => state,
            _ => Self::new(quiz_id, total_questions),
        }
    }

    pub fn phase(state: Option<&AttemptState>) -> AttemptPhase {
        match state {
            None => AttemptPhase::NotStarted,
            Some(s) if s.is_completed() => AttemptPhase::Completed,
            Some(s) => AttemptPhase::InProgress(s.current_question_index),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.current_question_index >= self.total_questions
    }

    /// The option previously recorded for `question_id`, if any.
    pub fn selected_for(&self, question_id: i64) -> Option<u8> {
        self.answers.get(&question_id).copied().flatten()
    }

    /// Records the answer to the current question and advances.
    ///
    /// A missing selection still counts as attempted. A completed attempt
    /// ignores further input.
    pub fn apply(mut self, question: &Question, selected: Option<u8>, action: AttemptAction) -> Self {
        if self.is_completed() {
            return self;
        }

        self.answers.insert(question.id, selected);
        self.questions_attempted += 1;
        if selected.is_some_and(|n| question.is_correct(n)) {
            self.total_marks += 1;
        }

        match action {
            AttemptAction::SaveNext => self.current_question_index += 1,
            AttemptAction::Submit => self.current_question_index = self.total_questions,
        }
        self
    }

    /// The ledger entry for this attempt.
    pub fn into_score(self, user_id: i64, now: DateTime<Utc>) -> NewScore {
        NewScore {
            quiz_id: self.quiz_id,
            user_id,
            time_stamp_of_attempt: now,
            total_scored: i64::from(self.total_marks),
        }
    }
}
