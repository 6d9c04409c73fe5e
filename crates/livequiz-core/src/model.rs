//! Quiz feedback and response records.
//!
//! Drafts (`NewFeedback`, `NewResponse`) are what callers submit; stores turn
//! them into records by assigning an id. Records are never modified afterwards.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Storage-assigned row identifier.
pub type RecordId = i64;

/// How difficult a user found a quiz question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum DifficultyRating {
    Easy,
    Difficult,
    Challenging,
    Impossible,
}

impl DifficultyRating {
    pub const ALL: [Self; 4] = [
        Self::Easy,
        Self::Difficult,
        Self::Challenging,
        Self::Impossible,
    ];

    /// Ordinal stored and averaged by the stores.
    pub const fn value(self) -> i64 {
        match self {
            Self::Easy => 0,
            Self::Difficult => 1,
            Self::Challenging => 2,
            Self::Impossible => 3,
        }
    }
}

impl TryFrom<i64> for DifficultyRating {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Easy),
            1 => Ok(Self::Difficult),
            2 => Ok(Self::Challenging),
            3 => Ok(Self::Impossible),
            _ => Err(ValidationError::UnknownRating { value }),
        }
    }
}

impl From<DifficultyRating> for i64 {
    fn from(rating: DifficultyRating) -> Self {
        rating.value()
    }
}

/// Feedback submitted for a quiz question, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    pub quiz_id: String,
    pub username: String,
    pub question_number: u32,
    pub difficulty_rating: DifficultyRating,
    #[serde(default)]
    pub message: Option<String>,
}

/// Stored feedback for a quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: RecordId,
    pub quiz_id: String,
    pub username: String,
    pub question_number: u32,
    pub difficulty_rating: DifficultyRating,
    pub message: Option<String>,
}

impl Feedback {
    pub fn from_draft(draft: NewFeedback, id: RecordId) -> Self {
        let NewFeedback {
            quiz_id,
            username,
            question_number,
            difficulty_rating,
            message,
        } = draft;
        Self {
            id,
            quiz_id,
            username,
            question_number,
            difficulty_rating,
            message,
        }
    }
}

/// A scored response to a quiz question, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResponse {
    pub quiz_id: String,
    pub username: String,
    pub question_number: u32,
    /// The user's answer as text; multiple-choice answers arrive as their
    /// numeric choice.
    pub value: String,
    pub score: i64,
}

/// A stored, scored response to a quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResponse {
    pub id: RecordId,
    pub quiz_id: String,
    pub username: String,
    pub question_number: u32,
    pub value: String,
    pub score: i64,
}

impl QuizResponse {
    pub fn from_draft(draft: NewResponse, id: RecordId) -> Self {
        let NewResponse {
            quiz_id,
            username,
            question_number,
            value,
            score,
        } = draft;
        Self {
            id,
            quiz_id,
            username,
            question_number,
            value,
            score,
        }
    }
}

/// A user's total score over every response to one quiz. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserScore {
    pub username: String,
    pub total_score: i64,
}

impl UserScore {
    pub fn new(username: impl Into<String>, total_score: i64) -> Self {
        Self {
            username: username.into(),
            total_score,
        }
    }
}
