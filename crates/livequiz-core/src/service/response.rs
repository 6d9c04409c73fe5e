use std::sync::Arc;

use tracing::debug;

use super::AggregationService;
use crate::envelope::{Single, Unpaged};
use crate::filter::Filter;
use crate::model::{NewResponse, QuizResponse, UserScore};
use crate::storage::ScoreStore;

/// Queries and writes over scored quiz responses.
pub struct ResponseService<S: ?Sized> {
    inner: AggregationService<QuizResponse, S>,
}

impl<S: ?Sized> Clone for ResponseService<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S> ResponseService<S>
where
    S: ScoreStore + ?Sized + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            inner: AggregationService::new(store),
        }
    }

    pub fn for_quiz(&self, quiz_id: &str) -> Unpaged<Vec<QuizResponse>> {
        self.inner.list("response.for_quiz", Filter::quiz(quiz_id))
    }

    pub fn for_quiz_by_user(&self, quiz_id: &str, username: &str) -> Unpaged<Vec<QuizResponse>> {
        self.inner.list(
            "response.for_quiz_by_user",
            Filter::quiz(quiz_id).by_user(username),
        )
    }

    pub fn for_question(&self, quiz_id: &str, question_number: u32) -> Unpaged<Vec<QuizResponse>> {
        self.inner.list(
            "response.for_question",
            Filter::quiz(quiz_id).question(question_number),
        )
    }

    /// The response a user gave to one question, if any.
    pub async fn for_question_by_user(
        &self,
        quiz_id: &str,
        question_number: u32,
        username: &str,
    ) -> Single<Option<QuizResponse>> {
        self.inner
            .find_one(
                "response.for_question_by_user",
                Filter::quiz(quiz_id)
                    .question(question_number)
                    .by_user(username),
            )
            .await
    }

    pub async fn count_for_quiz(&self, quiz_id: &str) -> Single<u64> {
        self.inner
            .count("response.count_for_quiz", Filter::quiz(quiz_id))
            .await
    }

    pub async fn count_for_question(&self, quiz_id: &str, question_number: u32) -> Single<u64> {
        self.inner
            .count(
                "response.count_for_question",
                Filter::quiz(quiz_id).question(question_number),
            )
            .await
    }

    /// How many users gave exactly `value` as their answer.
    pub async fn count_for_question_with_value(
        &self,
        quiz_id: &str,
        question_number: u32,
        value: &str,
    ) -> Single<u64> {
        self.inner
            .count(
                "response.count_for_question_with_value",
                Filter::quiz(quiz_id)
                    .question(question_number)
                    .with_value(value),
            )
            .await
    }

    /// Per-user score totals for a quiz, highest first.
    ///
    /// Ties are ordered by username. Use [`Unpaged::with_size`] to read the
    /// ranking a page at a time.
    pub fn highest_scores(&self, quiz_id: &str) -> Unpaged<Vec<UserScore>> {
        const OP: &str = "response.highest_scores";
        debug!(op = OP, quiz_id, "ranking");
        let store = Arc::clone(self.inner.store());
        let quiz_id = quiz_id.to_string();
        Unpaged::new(OP, move |page| {
            let store = Arc::clone(&store);
            let quiz_id = quiz_id.clone();
            async move { store.ranked_scores(&quiz_id, page).await }
        })
    }

    /// Sum of a user's scores for a quiz; zero when they never answered.
    pub async fn total_score_for_user(&self, quiz_id: &str, username: &str) -> Single<i64> {
        self.inner
            .sum(
                "response.total_score_for_user",
                Filter::quiz(quiz_id).by_user(username),
            )
            .await
    }

    pub async fn average_score_for_question(
        &self,
        quiz_id: &str,
        question_number: u32,
    ) -> Single<f64> {
        self.inner
            .average(
                "response.average_score_for_question",
                Filter::quiz(quiz_id).question(question_number),
            )
            .await
    }

    pub async fn average_score_for_user(&self, quiz_id: &str, username: &str) -> Single<f64> {
        self.inner
            .average(
                "response.average_score_for_user",
                Filter::quiz(quiz_id).by_user(username),
            )
            .await
    }

    pub async fn save(&self, response: NewResponse) -> Single<QuizResponse> {
        self.inner.insert("response.save", response).await
    }

    pub async fn remove_for_quiz(&self, quiz_id: &str) -> Single<u64> {
        self.inner
            .delete("response.remove_for_quiz", Filter::quiz(quiz_id))
            .await
    }

    /// Remove a user's responses for one quiz.
    pub async fn remove_by_user(&self, quiz_id: &str, username: &str) -> Single<u64> {
        self.inner
            .delete(
                "response.remove_by_user",
                Filter::quiz(quiz_id).by_user(username),
            )
            .await
    }

    pub async fn remove_for_question(&self, quiz_id: &str, question_number: u32) -> Single<u64> {
        self.inner
            .delete(
                "response.remove_for_question",
                Filter::quiz(quiz_id).question(question_number),
            )
            .await
    }
}
