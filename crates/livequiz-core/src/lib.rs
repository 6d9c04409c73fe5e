//! Aggregation core for live quiz feedback and scored responses.
//!
//! This crate turns filtered storage calls into result envelopes:
//!
//! - Page specs with synchronous validation
//! - Deferred, memoized, failure-translating envelopes
//! - Storage capability traits plus an in-memory implementation
//! - Feedback and response services over any storage capability
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use livequiz_core::{Feedback, FeedbackService, MemoryStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let service = FeedbackService::new(Arc::new(MemoryStore::<Feedback>::new()));
//!
//! // Counts run immediately
//! let total = service.count_for_quiz("Q1").await.into_result()?;
//!
//! // Listings run on first read, one page at a time if asked
//! let first_page = service.for_quiz("Q1").with_size(20)?;
//! let rows = first_page.into_result().await?;
//! println!("{} of {} feedback rows", rows.len(), total);
//! # Ok(())
//! # }
//! ```
//!
//! A SQLite-backed storage capability lives in the `livequiz-store` crate.

pub mod envelope;
pub mod error;
pub mod filter;
pub mod model;
pub mod page;
pub mod service;
pub mod storage;

// Re-export main types
pub use envelope::{Envelope, Paged, Single, Unpaged};
pub use error::{
    Outcome, PersistenceFailure, ServiceError, ServiceResult, StorageError, StorageResult,
    ValidationError,
};
pub use filter::Filter;
pub use model::{
    DifficultyRating, Feedback, NewFeedback, NewResponse, QuizResponse, RecordId, UserScore,
};
pub use page::PageSpec;
pub use service::{AggregationService, FeedbackService, ResponseService};
pub use storage::{Aggregate, MemoryStore, Record, RecordStore, ScoreStore};
