//! Deferred, memoized result envelopes around storage calls.
//!
//! Every service operation returns one of three envelope kinds:
//!
//! - [`Single`]: the storage call already ran when the envelope was built.
//!   Used for counts, sums, averages, lookups, deletions and inserts.
//! - [`Unpaged`]: a listing that has not run yet. Reading it fetches every
//!   matching row; [`Unpaged::with_size`] derives a [`Paged`] sibling instead.
//! - [`Paged`]: a listing restricted to one page. [`Paged::with_page`] derives
//!   a sibling for another page at the same size.
//!
//! Deferred envelopes run their producer at most once, on first read, even
//! when several tasks read concurrently. Storage errors are captured as
//! [`PersistenceFailure`] and returned on every subsequent read.
//!
//! ```no_run
//! # use livequiz_core::envelope::Unpaged;
//! # use livequiz_core::page::PageSpec;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let rows = Unpaged::new("numbers", |page: PageSpec| async move {
//!     let all: Vec<u32> = (0..100).collect();
//!     Ok(match page.bounds() {
//!         Some((offset, limit)) => all.into_iter().skip(offset as usize).take(limit as usize).collect(),
//!         None => all,
//!     })
//! });
//! let second_page = rows.with_size(10)?.with_page(1)?;
//! let values = second_page.result().await.as_ref().map_err(|e| e.to_string())?;
//! assert_eq!(values[0], 10);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::{Outcome, PersistenceFailure, StorageResult, ValidationError};
use crate::page::PageSpec;

/// Boxed future returned by a page-parameterized producer.
pub type ProducerFuture<T> = Pin<Box<dyn Future<Output = StorageResult<T>> + Send + 'static>>;

type Producer<T> = Arc<dyn Fn(PageSpec) -> ProducerFuture<T> + Send + Sync>;

/// Producer plus the operation label used in logs and failures.
struct Source<T> {
    operation: &'static str,
    producer: Producer<T>,
}

impl<T> Clone for Source<T> {
    fn clone(&self) -> Self {
        Self {
            operation: self.operation,
            producer: Arc::clone(&self.producer),
        }
    }
}

impl<T: Send + 'static> Source<T> {
    fn new<F, Fut>(operation: &'static str, producer: F) -> Self
    where
        F: Fn(PageSpec) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StorageResult<T>> + Send + 'static,
    {
        let producer: Producer<T> =
            Arc::new(move |page| -> ProducerFuture<T> { Box::pin(producer(page)) });
        Self {
            operation,
            producer,
        }
    }
}

impl<T> Source<T> {
    async fn run(&self, page: PageSpec) -> Outcome<T> {
        debug!(op = self.operation, %page, "invoking producer");
        translate(self.operation, (self.producer)(page).await)
    }
}

fn translate<T>(operation: &'static str, result: StorageResult<T>) -> Outcome<T> {
    result.map_err(|cause| {
        warn!(op = operation, error = %cause, "storage call failed");
        PersistenceFailure::new(operation, cause)
    })
}

/// Outcome captured eagerly at construction.
pub struct Single<T> {
    operation: &'static str,
    outcome: Outcome<T>,
}

impl<T> Single<T> {
    /// Await `producer` once and capture its outcome.
    pub async fn capture<F>(operation: &'static str, producer: F) -> Self
    where
        F: Future<Output = StorageResult<T>>,
    {
        debug!(op = operation, "invoking producer");
        let outcome = translate(operation, producer.await);
        Self { operation, outcome }
    }

    pub fn result(&self) -> &Outcome<T> {
        &self.outcome
    }

    pub fn into_result(self) -> Outcome<T> {
        self.outcome
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl<T: fmt::Debug> fmt::Debug for Single<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Single")
            .field("operation", &self.operation)
            .field("outcome", &self.outcome)
            .finish()
    }
}

/// Deferred listing over every matching row.
pub struct Unpaged<T> {
    source: Source<T>,
    memo: OnceCell<Outcome<T>>,
}

impl<T: Send + 'static> Unpaged<T> {
    /// Wrap `producer` without calling it.
    pub fn new<F, Fut>(operation: &'static str, producer: F) -> Self
    where
        F: Fn(PageSpec) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StorageResult<T>> + Send + 'static,
    {
        Self {
            source: Source::new(operation, producer),
            memo: OnceCell::new(),
        }
    }
}

impl<T> Unpaged<T> {
    /// Outcome of the producer called with [`PageSpec::unpaged`], computed on
    /// first read.
    pub async fn result(&self) -> &Outcome<T> {
        if let Some(outcome) = self.memo.get() {
            debug!(op = self.source.operation, "reusing memoized outcome");
            return outcome;
        }
        self.memo
            .get_or_init(|| self.source.run(PageSpec::unpaged()))
            .await
    }

    /// Owned outcome; reuses the memo if a read already happened.
    pub async fn into_result(self) -> Outcome<T> {
        let Self { source, memo } = self;
        match memo.into_inner() {
            Some(outcome) => outcome,
            None => source.run(PageSpec::unpaged()).await,
        }
    }

    /// Paged sibling at index 0 sharing this producer.
    ///
    /// Independent of whether `self` was read; `self` keeps its own memo.
    pub fn with_size(&self, size: i64) -> Result<Paged<T>, ValidationError> {
        Ok(Paged {
            source: self.source.clone(),
            page: PageSpec::of_size(size)?,
            memo: OnceCell::new(),
        })
    }

    /// Memoized outcome without triggering the producer.
    pub fn peek(&self) -> Option<&Outcome<T>> {
        self.memo.get()
    }

    pub fn is_computed(&self) -> bool {
        self.memo.initialized()
    }

    pub fn operation(&self) -> &'static str {
        self.source.operation
    }
}

impl<T> fmt::Debug for Unpaged<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unpaged")
            .field("operation", &self.source.operation)
            .field("computed", &self.is_computed())
            .finish()
    }
}

/// Deferred listing restricted to one page.
pub struct Paged<T> {
    source: Source<T>,
    page: PageSpec,
    memo: OnceCell<Outcome<T>>,
}

impl<T: Send + 'static> Paged<T> {
    /// Paged envelope at index 0 for callers that already know the size.
    pub fn with_size<F, Fut>(
        operation: &'static str,
        size: i64,
        producer: F,
    ) -> Result<Self, ValidationError>
    where
        F: Fn(PageSpec) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StorageResult<T>> + Send + 'static,
    {
        Ok(Self {
            source: Source::new(operation, producer),
            page: PageSpec::of_size(size)?,
            memo: OnceCell::new(),
        })
    }
}

impl<T> Paged<T> {
    /// Outcome of the producer called with this envelope's page, computed on
    /// first read.
    pub async fn result(&self) -> &Outcome<T> {
        if let Some(outcome) = self.memo.get() {
            debug!(op = self.source.operation, page = %self.page, "reusing memoized outcome");
            return outcome;
        }
        self.memo.get_or_init(|| self.source.run(self.page)).await
    }

    /// Owned outcome; reuses the memo if a read already happened.
    pub async fn into_result(self) -> Outcome<T> {
        let Self { source, page, memo } = self;
        match memo.into_inner() {
            Some(outcome) => outcome,
            None => source.run(page).await,
        }
    }

    /// Sibling for page `index` at the same size. `self` is unaffected.
    pub fn with_page(&self, index: i64) -> Result<Self, ValidationError> {
        Ok(Self {
            source: self.source.clone(),
            page: self.page.with_page(index)?,
            memo: OnceCell::new(),
        })
    }

    pub fn page_spec(&self) -> PageSpec {
        self.page
    }

    pub fn size(&self) -> u64 {
        // Always sized by construction.
        self.page.size().unwrap_or(1)
    }

    pub fn index(&self) -> u64 {
        self.page.index().unwrap_or(0)
    }

    /// Memoized outcome without triggering the producer.
    pub fn peek(&self) -> Option<&Outcome<T>> {
        self.memo.get()
    }

    pub fn is_computed(&self) -> bool {
        self.memo.initialized()
    }

    pub fn operation(&self) -> &'static str {
        self.source.operation
    }
}

impl<T> fmt::Debug for Paged<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paged")
            .field("operation", &self.source.operation)
            .field("size", &self.size())
            .field("index", &self.index())
            .field("computed", &self.is_computed())
            .finish()
    }
}

/// Any of the three envelope kinds.
#[derive(Debug)]
pub enum Envelope<T> {
    Single(Single<T>),
    Unpaged(Unpaged<T>),
    Paged(Paged<T>),
}

impl<T> Envelope<T> {
    pub async fn result(&self) -> &Outcome<T> {
        match self {
            Self::Single(env) => env.result(),
            Self::Unpaged(env) => env.result().await,
            Self::Paged(env) => env.result().await,
        }
    }

    pub async fn into_result(self) -> Outcome<T> {
        match self {
            Self::Single(env) => env.into_result(),
            Self::Unpaged(env) => env.into_result().await,
            Self::Paged(env) => env.into_result().await,
        }
    }

    /// Page the producer is (or was) called with. Single envelopes are unpaged.
    pub fn page_spec(&self) -> PageSpec {
        match self {
            Self::Single(_) | Self::Unpaged(_) => PageSpec::unpaged(),
            Self::Paged(env) => env.page_spec(),
        }
    }

    pub fn is_computed(&self) -> bool {
        match self {
            Self::Single(_) => true,
            Self::Unpaged(env) => env.is_computed(),
            Self::Paged(env) => env.is_computed(),
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::Single(env) => env.operation(),
            Self::Unpaged(env) => env.operation(),
            Self::Paged(env) => env.operation(),
        }
    }
}

impl<T> From<Single<T>> for Envelope<T> {
    fn from(env: Single<T>) -> Self {
        Self::Single(env)
    }
}

impl<T> From<Unpaged<T>> for Envelope<T> {
    fn from(env: Unpaged<T>) -> Self {
        Self::Unpaged(env)
    }
}

impl<T> From<Paged<T>> for Envelope<T> {
    fn from(env: Paged<T>) -> Self {
        Self::Paged(env)
    }
}
