//! End-to-end scenarios for the feedback and response services over the
//! in-memory store, plus a store that always fails.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use livequiz_core::{
    Aggregate, DifficultyRating, Feedback, FeedbackService, Filter, MemoryStore, NewFeedback,
    NewResponse, PageSpec, QuizResponse, RecordStore, ResponseService, ScoreStore, ServiceError,
    ServiceResult, StorageError, StorageResult, UserScore,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn response(user: &str, question: u32, score: i64) -> NewResponse {
    NewResponse {
        quiz_id: "Q1".to_string(),
        username: user.to_string(),
        question_number: question,
        value: format!("answer-{score}"),
        score,
    }
}

fn feedback(user: &str, question: u32, rating: DifficultyRating) -> NewFeedback {
    NewFeedback {
        quiz_id: "Q1".to_string(),
        username: user.to_string(),
        question_number: question,
        difficulty_rating: rating,
        message: None,
    }
}

#[tokio::test]
async fn test_question_average_and_empty_question() -> anyhow::Result<()> {
    init_tracing();
    let service = ResponseService::new(Arc::new(MemoryStore::<QuizResponse>::new()));
    for (user, score) in [("amy", 4), ("bob", 6), ("cat", 10)] {
        service.save(response(user, 0, score)).await.into_result()?;
    }

    let q0 = service
        .average_score_for_question("Q1", 0)
        .await
        .into_result()?;
    assert!((q0 - 20.0 / 3.0).abs() < 1e-9);

    let q1 = service
        .average_score_for_question("Q1", 1)
        .await
        .into_result()?;
    assert_eq!(q1, 0.0);
    Ok(())
}

#[tokio::test]
async fn test_delete_returns_prior_count() -> anyhow::Result<()> {
    init_tracing();
    let service = FeedbackService::new(Arc::new(MemoryStore::<Feedback>::new()));
    for (user, question) in [("amy", 0), ("bob", 0), ("amy", 1)] {
        service
            .save(feedback(user, question, DifficultyRating::Difficult))
            .await
            .into_result()?;
    }

    let before = service.count_for_quiz("Q1").await.into_result()?;
    let removed = service.remove_for_quiz("Q1").await.into_result()?;
    assert_eq!(removed, before);
    assert_eq!(service.count_for_quiz("Q1").await.into_result()?, 0);
    Ok(())
}

#[tokio::test]
async fn test_ranking_orders_by_total_then_username() -> anyhow::Result<()> {
    let service = ResponseService::new(Arc::new(MemoryStore::<QuizResponse>::new()));
    service.save(response("bob", 0, 5)).await.into_result()?;
    service.save(response("amy", 0, 5)).await.into_result()?;
    service.save(response("zed", 0, 9)).await.into_result()?;

    let ranked = service.highest_scores("Q1").into_result().await?;
    assert_eq!(
        ranked,
        vec![
            UserScore::new("zed", 9),
            UserScore::new("amy", 5),
            UserScore::new("bob", 5),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_paging_through_listing() -> anyhow::Result<()> {
    let service = ResponseService::new(Arc::new(MemoryStore::<QuizResponse>::new()));
    for question in 0..7 {
        service.save(response("amy", question, 1)).await.into_result()?;
    }

    let listing = service.for_quiz_by_user("Q1", "amy");
    let mut page = listing.with_size(3)?;
    let mut seen = Vec::new();
    loop {
        let rows = page
            .result()
            .await
            .as_ref()
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        if rows.is_empty() {
            break;
        }
        seen.extend(rows.iter().map(|r| r.question_number));
        page = page.with_page(page.index() as i64 + 1)?;
    }
    assert_eq!(seen, (0..7).collect::<Vec<_>>());
    assert!(!listing.is_computed());
    Ok(())
}

/// Store whose every call fails, counting how often it was asked.
#[derive(Default)]
struct BrokenStore {
    calls: AtomicUsize,
}

impl BrokenStore {
    fn fail<T>(&self) -> StorageResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Unavailable {
            message: "database is locked".to_string(),
        })
    }
}

#[async_trait]
impl RecordStore<QuizResponse> for BrokenStore {
    async fn list(&self, _: &Filter, _: PageSpec) -> StorageResult<Vec<QuizResponse>> {
        self.fail()
    }

    async fn count(&self, _: &Filter) -> StorageResult<u64> {
        self.fail()
    }

    async fn aggregate(&self, _: &Filter) -> StorageResult<Aggregate> {
        self.fail()
    }

    async fn delete(&self, _: &Filter) -> StorageResult<u64> {
        self.fail()
    }

    async fn find_one(&self, _: &Filter) -> StorageResult<Option<QuizResponse>> {
        self.fail()
    }

    async fn insert(&self, _: NewResponse) -> StorageResult<QuizResponse> {
        self.fail()
    }
}

#[async_trait]
impl ScoreStore for BrokenStore {
    async fn ranked_scores(&self, _: &str, _: PageSpec) -> StorageResult<Vec<UserScore>> {
        self.fail()
    }
}

#[tokio::test]
async fn test_store_failures_surface_as_persistence_failures() {
    init_tracing();
    let store = Arc::new(BrokenStore::default());
    let service = ResponseService::new(Arc::clone(&store));

    let count = service.count_for_quiz("Q1").await;
    let failure = count.result().as_ref().unwrap_err();
    assert_eq!(failure.operation(), "response.count_for_quiz");
    assert!(failure.cause().is_transient());

    let average = service.average_score_for_user("Q1", "amy").await;
    assert!(average.into_result().is_err());

    let ranking = service.highest_scores("Q1");
    assert!(ranking.result().await.is_err());
    assert!(ranking.result().await.is_err());

    // One call each for count, average and the ranking read.
    assert_eq!(store.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_service_error_unifies_validation_and_persistence() {
    let service = ResponseService::new(Arc::new(BrokenStore::default()));

    async fn first_page(
        service: &ResponseService<BrokenStore>,
        size: i64,
    ) -> ServiceResult<Vec<QuizResponse>> {
        let page = service.for_quiz("Q1").with_size(size)?;
        Ok(page.into_result().await?)
    }

    let invalid = first_page(&service, 0).await.unwrap_err();
    assert!(matches!(invalid, ServiceError::Validation(_)));
    assert!(!invalid.is_retryable());

    let failed = first_page(&service, 10).await.unwrap_err();
    assert!(matches!(failed, ServiceError::Persistence(_)));
    assert!(failed.is_retryable());
}
