//! In-process storage capability backed by a mutex-guarded `Vec`.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{Aggregate, Record, RecordStore, ScoreStore};
use crate::error::{StorageError, StorageResult};
use crate::filter::Filter;
use crate::model::{QuizResponse, RecordId, UserScore};
use crate::page::PageSpec;

/// Records kept in insertion order; ids start at 1.
#[derive(Debug)]
pub struct MemoryStore<R> {
    state: Mutex<State<R>>,
}

#[derive(Debug)]
struct State<R> {
    rows: Vec<R>,
    next_id: RecordId,
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                rows: Vec::new(),
                next_id: 1,
            }),
        }
    }
}

impl<R: Record> MemoryStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, State<R>>> {
        self.state.lock().map_err(|e| {
            warn!(kind = R::KIND, "memory store lock poisoned");
            StorageError::Poisoned(e.to_string())
        })
    }
}

/// Add two metrics, failing like SQLite's `SUM` does on overflow.
fn checked_sum(a: i64, b: i64) -> StorageResult<i64> {
    a.checked_add(b)
        .ok_or_else(|| StorageError::backend("integer overflow"))
}

/// Apply a page window to an already ordered sequence.
pub(crate) fn apply_page<T>(rows: impl IntoIterator<Item = T>, page: PageSpec) -> Vec<T> {
    match page.bounds() {
        Some((offset, limit)) => rows
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect(),
        None => rows.into_iter().collect(),
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for MemoryStore<R> {
    async fn list(&self, filter: &Filter, page: PageSpec) -> StorageResult<Vec<R>> {
        let state = self.lock()?;
        let matching = state.rows.iter().filter(|r| r.matches(filter)).cloned();
        Ok(apply_page(matching, page))
    }

    async fn count(&self, filter: &Filter) -> StorageResult<u64> {
        let state = self.lock()?;
        Ok(state.rows.iter().filter(|r| r.matches(filter)).count() as u64)
    }

    async fn aggregate(&self, filter: &Filter) -> StorageResult<Aggregate> {
        let state = self.lock()?;
        state
            .rows
            .iter()
            .filter(|r| r.matches(filter))
            .try_fold(Aggregate::default(), |acc, r| {
                Ok(Aggregate {
                    sum: checked_sum(acc.sum, r.metric())?,
                    count: acc.count + 1,
                })
            })
    }

    async fn delete(&self, filter: &Filter) -> StorageResult<u64> {
        let mut state = self.lock()?;
        let before = state.rows.len();
        state.rows.retain(|r| !r.matches(filter));
        let removed = (before - state.rows.len()) as u64;
        debug!(kind = R::KIND, %filter, removed, "deleted records");
        Ok(removed)
    }

    async fn find_one(&self, filter: &Filter) -> StorageResult<Option<R>> {
        let state = self.lock()?;
        Ok(state.rows.iter().find(|r| r.matches(filter)).cloned())
    }

    async fn insert(&self, draft: R::Draft) -> StorageResult<R> {
        let mut state = self.lock()?;
        let id = state.next_id;
        state.next_id += 1;
        let record = R::from_draft(draft, id);
        state.rows.push(record.clone());
        debug!(kind = R::KIND, id, "inserted record");
        Ok(record)
    }
}

#[async_trait]
impl ScoreStore for MemoryStore<QuizResponse> {
    async fn ranked_scores(&self, quiz_id: &str, page: PageSpec) -> StorageResult<Vec<UserScore>> {
        let totals = {
            let state = self.lock()?;
            let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
            for row in state.rows.iter().filter(|r| r.quiz_id == quiz_id) {
                let total = totals.entry(row.username.as_str()).or_default();
                *total = checked_sum(*total, row.score)?;
            }
            totals
                .into_iter()
                .map(|(username, total)| UserScore::new(username, total))
                .collect::<Vec<_>>()
        };
        let mut ranked = totals;
        ranked.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then_with(|| a.username.cmp(&b.username))
        });
        Ok(apply_page(ranked, page))
    }
}
