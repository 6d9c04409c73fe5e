//! Storage capabilities consumed by the aggregation services.
//!
//! The services never talk to a database directly; they call a
//! [`RecordStore`] (and for responses, a [`ScoreStore`]) from inside envelope
//! producers. `MemoryStore` is the in-process implementation; the
//! `livequiz-store` crate provides a SQLite one.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::filter::Filter;
use crate::model::{
    Feedback, NewFeedback, NewResponse, QuizResponse, RecordId, UserScore,
};
use crate::page::PageSpec;

pub mod memory;

pub use memory::MemoryStore;

/// A persisted record family.
pub trait Record: Clone + Send + Sync + 'static {
    /// The record before storage assigned its id.
    type Draft: Send + 'static;

    /// Family name used in logs.
    const KIND: &'static str;

    fn id(&self) -> RecordId;

    fn from_draft(draft: Self::Draft, id: RecordId) -> Self;

    /// Whether this record satisfies every constraint of `filter`.
    ///
    /// A constraint on a field the family does not have matches nothing.
    fn matches(&self, filter: &Filter) -> bool;

    /// The integer that sums and averages aggregate over.
    fn metric(&self) -> i64;
}

impl Record for Feedback {
    type Draft = NewFeedback;

    const KIND: &'static str = "feedback";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(draft: NewFeedback, id: RecordId) -> Self {
        Feedback::from_draft(draft, id)
    }

    fn matches(&self, filter: &Filter) -> bool {
        filter.value.is_none()
            && filter.quiz_id.as_ref().map_or(true, |q| *q == self.quiz_id)
            && filter
                .question_number
                .map_or(true, |n| n == self.question_number)
            && filter.username.as_ref().map_or(true, |u| *u == self.username)
            && filter.rating.map_or(true, |r| r == self.difficulty_rating)
    }

    fn metric(&self) -> i64 {
        self.difficulty_rating.value()
    }
}

impl Record for QuizResponse {
    type Draft = NewResponse;

    const KIND: &'static str = "response";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(draft: NewResponse, id: RecordId) -> Self {
        QuizResponse::from_draft(draft, id)
    }

    fn matches(&self, filter: &Filter) -> bool {
        filter.rating.is_none()
            && filter.quiz_id.as_ref().map_or(true, |q| *q == self.quiz_id)
            && filter
                .question_number
                .map_or(true, |n| n == self.question_number)
            && filter.username.as_ref().map_or(true, |u| *u == self.username)
            && filter.value.as_ref().map_or(true, |v| *v == self.value)
    }

    fn metric(&self) -> i64 {
        self.score
    }
}

/// Sum and row count of a record family's metric over a filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub sum: i64,
    pub count: u64,
}

impl Aggregate {
    /// `sum / max(1, count)`: an empty match set averages to zero.
    pub fn floored_average(&self) -> f64 {
        self.sum as f64 / self.count.max(1) as f64
    }
}

/// Filtered access to one record family.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// Matching records, restricted to `page` when it is sized.
    async fn list(&self, filter: &Filter, page: PageSpec) -> StorageResult<Vec<R>>;

    async fn count(&self, filter: &Filter) -> StorageResult<u64>;

    /// Raw sum and count of [`Record::metric`] over matching records.
    async fn aggregate(&self, filter: &Filter) -> StorageResult<Aggregate>;

    /// Remove matching records, returning how many were removed.
    async fn delete(&self, filter: &Filter) -> StorageResult<u64>;

    /// First matching record, if any.
    async fn find_one(&self, filter: &Filter) -> StorageResult<Option<R>>;

    /// Persist a draft and return it with its assigned id.
    async fn insert(&self, draft: R::Draft) -> StorageResult<R>;
}

/// Response storage that can also rank users by total score.
#[async_trait]
pub trait ScoreStore: RecordStore<QuizResponse> {
    /// Per-user score totals for a quiz.
    ///
    /// Must be ordered by total descending, ties by username ascending,
    /// before `page` is applied.
    async fn ranked_scores(&self, quiz_id: &str, page: PageSpec) -> StorageResult<Vec<UserScore>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DifficultyRating;

    fn feedback() -> Feedback {
        Feedback {
            id: 1,
            quiz_id: "Q1".to_string(),
            username: "amy".to_string(),
            question_number: 2,
            difficulty_rating: DifficultyRating::Challenging,
            message: None,
        }
    }

    #[test]
    fn test_feedback_matches_conjunction() {
        let row = feedback();
        assert!(row.matches(&Filter::default()));
        assert!(row.matches(&Filter::quiz("Q1").question(2).by_user("amy")));
        assert!(row.matches(&Filter::quiz("Q1").rated(DifficultyRating::Challenging)));
        assert!(!row.matches(&Filter::quiz("Q1").question(3)));
        assert!(!row.matches(&Filter::quiz("Q2")));
    }

    #[test]
    fn test_foreign_constraint_matches_nothing() {
        assert!(!feedback().matches(&Filter::quiz("Q1").with_value("2")));
    }

    #[test]
    fn test_floored_average_of_empty_set_is_zero() {
        assert_eq!(Aggregate::default().floored_average(), 0.0);
        let agg = Aggregate { sum: 20, count: 3 };
        assert!((agg.floored_average() - 20.0 / 3.0).abs() < f64::EPSILON);
    }
}
