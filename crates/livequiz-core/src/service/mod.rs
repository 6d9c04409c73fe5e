//! Aggregation services over a storage capability.
//!
//! [`AggregationService`] holds the query shapes shared by every record
//! family. [`FeedbackService`] and [`ResponseService`] name the concrete
//! operations and build their filters.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::envelope::{Single, Unpaged};
use crate::filter::Filter;
use crate::storage::{Record, RecordStore};

mod feedback;
mod response;

pub use feedback::FeedbackService;
pub use response::ResponseService;

/// Query shapes over one record family, each wrapped in an envelope.
///
/// Listings are deferred; everything else calls the store before returning.
pub struct AggregationService<R, S: ?Sized> {
    store: Arc<S>,
    _record: PhantomData<fn() -> R>,
}

impl<R, S: ?Sized> Clone for AggregationService<R, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _record: PhantomData,
        }
    }
}

impl<R, S> AggregationService<R, S>
where
    R: Record,
    S: RecordStore<R> + ?Sized + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Deferred listing of records matching `filter`.
    pub fn list(&self, operation: &'static str, filter: Filter) -> Unpaged<Vec<R>> {
        debug!(op = operation, kind = R::KIND, %filter, "listing");
        let store = Arc::clone(&self.store);
        Unpaged::new(operation, move |page| {
            let store = Arc::clone(&store);
            let filter = filter.clone();
            async move { store.list(&filter, page).await }
        })
    }

    pub async fn count(&self, operation: &'static str, filter: Filter) -> Single<u64> {
        debug!(op = operation, kind = R::KIND, %filter, "counting");
        Single::capture(operation, self.store.count(&filter)).await
    }

    /// Sum of [`Record::metric`] over matching records; zero when none match.
    pub async fn sum(&self, operation: &'static str, filter: Filter) -> Single<i64> {
        debug!(op = operation, kind = R::KIND, %filter, "summing");
        Single::capture(operation, async {
            self.store.aggregate(&filter).await.map(|agg| agg.sum)
        })
        .await
    }

    /// `sum / max(1, count)` of [`Record::metric`] over matching records.
    pub async fn average(&self, operation: &'static str, filter: Filter) -> Single<f64> {
        debug!(op = operation, kind = R::KIND, %filter, "averaging");
        Single::capture(operation, async {
            self.store
                .aggregate(&filter)
                .await
                .map(|agg| agg.floored_average())
        })
        .await
    }

    /// Remove matching records; the envelope holds the removed count.
    pub async fn delete(&self, operation: &'static str, filter: Filter) -> Single<u64> {
        debug!(op = operation, kind = R::KIND, %filter, "deleting");
        Single::capture(operation, self.store.delete(&filter)).await
    }

    /// First matching record. No match is a successful `None`.
    pub async fn find_one(&self, operation: &'static str, filter: Filter) -> Single<Option<R>> {
        debug!(op = operation, kind = R::KIND, %filter, "looking up");
        Single::capture(operation, self.store.find_one(&filter)).await
    }

    pub async fn insert(&self, operation: &'static str, draft: R::Draft) -> Single<R> {
        debug!(op = operation, kind = R::KIND, "inserting");
        Single::capture(operation, self.store.insert(draft)).await
    }
}
