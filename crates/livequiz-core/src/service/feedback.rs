use std::sync::Arc;

use super::AggregationService;
use crate::envelope::{Single, Unpaged};
use crate::filter::Filter;
use crate::model::{DifficultyRating, Feedback, NewFeedback};
use crate::storage::RecordStore;

/// Queries and writes over quiz question feedback.
///
/// Every method returns an envelope. Its only failure mode is a
/// [`PersistenceFailure`](crate::error::PersistenceFailure) from the store.
pub struct FeedbackService<S: ?Sized> {
    inner: AggregationService<Feedback, S>,
}

impl<S: ?Sized> Clone for FeedbackService<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S> FeedbackService<S>
where
    S: RecordStore<Feedback> + ?Sized + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            inner: AggregationService::new(store),
        }
    }

    /// All feedback for a quiz.
    pub fn for_quiz(&self, quiz_id: &str) -> Unpaged<Vec<Feedback>> {
        self.inner.list("feedback.for_quiz", Filter::quiz(quiz_id))
    }

    /// Feedback a user submitted for a quiz.
    pub fn for_quiz_by_user(&self, quiz_id: &str, username: &str) -> Unpaged<Vec<Feedback>> {
        self.inner.list(
            "feedback.for_quiz_by_user",
            Filter::quiz(quiz_id).by_user(username),
        )
    }

    /// Feedback for a quiz with a given difficulty rating.
    pub fn for_quiz_with_rating(
        &self,
        quiz_id: &str,
        rating: DifficultyRating,
    ) -> Unpaged<Vec<Feedback>> {
        self.inner.list(
            "feedback.for_quiz_with_rating",
            Filter::quiz(quiz_id).rated(rating),
        )
    }

    /// Feedback for one question of a quiz.
    pub fn for_question(&self, quiz_id: &str, question_number: u32) -> Unpaged<Vec<Feedback>> {
        self.inner.list(
            "feedback.for_question",
            Filter::quiz(quiz_id).question(question_number),
        )
    }

    pub fn for_question_by_user(
        &self,
        quiz_id: &str,
        question_number: u32,
        username: &str,
    ) -> Unpaged<Vec<Feedback>> {
        self.inner.list(
            "feedback.for_question_by_user",
            Filter::quiz(quiz_id)
                .question(question_number)
                .by_user(username),
        )
    }

    pub fn for_question_with_rating(
        &self,
        quiz_id: &str,
        question_number: u32,
        rating: DifficultyRating,
    ) -> Unpaged<Vec<Feedback>> {
        self.inner.list(
            "feedback.for_question_with_rating",
            Filter::quiz(quiz_id).question(question_number).rated(rating),
        )
    }

    pub async fn count_for_quiz(&self, quiz_id: &str) -> Single<u64> {
        self.inner
            .count("feedback.count_for_quiz", Filter::quiz(quiz_id))
            .await
    }

    pub async fn count_for_quiz_with_rating(
        &self,
        quiz_id: &str,
        rating: DifficultyRating,
    ) -> Single<u64> {
        self.inner
            .count(
                "feedback.count_for_quiz_with_rating",
                Filter::quiz(quiz_id).rated(rating),
            )
            .await
    }

    /// Feedback a user submitted across every quiz.
    pub async fn count_for_user(&self, username: &str) -> Single<u64> {
        self.inner
            .count("feedback.count_for_user", Filter::user(username))
            .await
    }

    /// Mean difficulty rating for a quiz; `0.0` without feedback.
    pub async fn average_rating(&self, quiz_id: &str) -> Single<f64> {
        self.inner
            .average("feedback.average_rating", Filter::quiz(quiz_id))
            .await
    }

    /// Mean difficulty rating for one question; `0.0` without feedback.
    pub async fn average_rating_for_question(
        &self,
        quiz_id: &str,
        question_number: u32,
    ) -> Single<f64> {
        self.inner
            .average(
                "feedback.average_rating_for_question",
                Filter::quiz(quiz_id).question(question_number),
            )
            .await
    }

    /// Persist new feedback; the envelope holds the stored record.
    pub async fn save(&self, feedback: NewFeedback) -> Single<Feedback> {
        self.inner.insert("feedback.save", feedback).await
    }

    pub async fn remove_for_quiz(&self, quiz_id: &str) -> Single<u64> {
        self.inner
            .delete("feedback.remove_for_quiz", Filter::quiz(quiz_id))
            .await
    }

    /// Remove everything a user submitted, across every quiz.
    pub async fn remove_by_user(&self, username: &str) -> Single<u64> {
        self.inner
            .delete("feedback.remove_by_user", Filter::user(username))
            .await
    }

    pub async fn remove_for_question(&self, quiz_id: &str, question_number: u32) -> Single<u64> {
        self.inner
            .delete(
                "feedback.remove_for_question",
                Filter::quiz(quiz_id).question(question_number),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn draft(quiz: &str, user: &str, question: u32, rating: DifficultyRating) -> NewFeedback {
        NewFeedback {
            quiz_id: quiz.to_string(),
            username: user.to_string(),
            question_number: question,
            difficulty_rating: rating,
            message: Some(format!("{user} on {question}")),
        }
    }

    async fn seeded() -> FeedbackService<MemoryStore<Feedback>> {
        let service = FeedbackService::new(Arc::new(MemoryStore::new()));
        for (quiz, user, question, rating) in [
            ("Q1", "amy", 0, DifficultyRating::Easy),
            ("Q1", "bob", 0, DifficultyRating::Impossible),
            ("Q1", "amy", 1, DifficultyRating::Challenging),
            ("Q1", "cat", 1, DifficultyRating::Challenging),
            ("Q2", "amy", 0, DifficultyRating::Difficult),
        ] {
            service
                .save(draft(quiz, user, question, rating))
                .await
                .into_result()
                .unwrap();
        }
        service
    }

    #[tokio::test]
    async fn test_listings_apply_every_constraint() {
        let service = seeded().await;

        let all = service.for_quiz("Q1").into_result().await.unwrap();
        assert_eq!(all.len(), 4);

        let amy = service.for_quiz_by_user("Q1", "amy").into_result().await.unwrap();
        assert!(amy.iter().all(|f| f.username == "amy" && f.quiz_id == "Q1"));
        assert_eq!(amy.len(), 2);

        let hard = service
            .for_quiz_with_rating("Q1", DifficultyRating::Challenging)
            .into_result()
            .await
            .unwrap();
        assert_eq!(hard.len(), 2);

        let q1 = service.for_question("Q1", 1).into_result().await.unwrap();
        assert_eq!(q1.len(), 2);

        let amy_q1 = service
            .for_question_by_user("Q1", 1, "amy")
            .into_result()
            .await
            .unwrap();
        assert_eq!(amy_q1.len(), 1);

        let impossible_q0 = service
            .for_question_with_rating("Q1", 0, DifficultyRating::Impossible)
            .into_result()
            .await
            .unwrap();
        assert_eq!(impossible_q0.len(), 1);
        assert_eq!(impossible_q0[0].username, "bob");
    }

    #[tokio::test]
    async fn test_counts() {
        let service = seeded().await;
        assert_eq!(service.count_for_quiz("Q1").await.into_result().unwrap(), 4);
        assert_eq!(
            service
                .count_for_quiz_with_rating("Q1", DifficultyRating::Challenging)
                .await
                .into_result()
                .unwrap(),
            2
        );
        assert_eq!(service.count_for_user("amy").await.into_result().unwrap(), 3);
        assert_eq!(service.count_for_quiz("nope").await.into_result().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_average_ratings() {
        let service = seeded().await;
        // (0 + 3 + 2 + 2) / 4
        let avg = service.average_rating("Q1").await.into_result().unwrap();
        assert!((avg - 1.75).abs() < 1e-9);

        let q0 = service
            .average_rating_for_question("Q1", 0)
            .await
            .into_result()
            .unwrap();
        assert!((q0 - 1.5).abs() < 1e-9);

        let empty = service
            .average_rating_for_question("Q1", 42)
            .await
            .into_result()
            .unwrap();
        assert_eq!(empty, 0.0);
    }

    #[tokio::test]
    async fn test_removals_return_counts() {
        let service = seeded().await;
        assert_eq!(
            service.remove_for_question("Q1", 1).await.into_result().unwrap(),
            2
        );
        assert_eq!(service.remove_by_user("amy").await.into_result().unwrap(), 2);
        assert_eq!(service.remove_for_quiz("Q1").await.into_result().unwrap(), 1);
        assert_eq!(service.count_for_quiz("Q2").await.into_result().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_save_returns_assigned_id() {
        let service = FeedbackService::new(Arc::new(MemoryStore::<Feedback>::new()));
        let saved = service
            .save(draft("Q9", "dan", 4, DifficultyRating::Easy))
            .await
            .into_result()
            .unwrap();
        assert_eq!(saved.id, 1);
        assert_eq!(saved.message.as_deref(), Some("dan on 4"));
    }
}
