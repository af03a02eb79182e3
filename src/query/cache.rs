//! Keyed query cache
//!
//! Each key owns one entry holding its latest state. Every fetch takes a
//! ticket carrying the entry's generation; results whose ticket is no
//! longer current (a newer fetch started, or the entry was invalidated)
//! are dropped instead of overwriting fresher data.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::{ApiError, ApiResult};

/// Current state of one query
#[derive(Debug)]
pub enum QueryState<V> {
    Pending,
    Error(Arc<ApiError>),
    Success(Arc<V>),
}

impl<V> Clone for QueryState<V> {
    fn clone(&self) -> Self {
        match self {
            QueryState::Pending => QueryState::Pending,
            QueryState::Error(e) => QueryState::Error(Arc::clone(e)),
            QueryState::Success(v) => QueryState::Success(Arc::clone(v)),
        }
    }
}

impl<V> QueryState<V> {
    pub fn is_pending(&self) -> bool {
        matches!(self, QueryState::Pending)
    }

    pub fn data(&self) -> Option<&Arc<V>> {
        match self {
            QueryState::Success(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            QueryState::Error(e) => Some(e),
            _ => None,
        }
    }

    /// True when the query failed with HTTP 401
    pub fn is_unauthorized(&self) -> bool {
        self.error().map(ApiError::is_unauthorized).unwrap_or(false)
    }
}

/// Proof of an in-flight fetch for one key
#[derive(Debug)]
pub struct QueryTicket<K> {
    key: K,
    generation: u64,
}

impl<K> QueryTicket<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

struct Entry<V> {
    state: QueryState<V>,
    generation: u64,
    stale: bool,
}

struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    next_generation: u64,
}

impl<K, V> Inner<K, V> {
    fn bump(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

/// Cache of query results keyed by `K`
pub struct QueryCache<K, V> {
    name: &'static str,
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> QueryCache<K, V>
where
    K: Clone + Eq + Hash + std::fmt::Debug,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                next_generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// State for a key, if it was ever fetched
    pub fn get(&self, key: &K) -> Option<QueryState<V>> {
        self.lock().entries.get(key).map(|e| e.state.clone())
    }

    /// Successful, non-invalidated result for a key
    pub fn fresh(&self, key: &K) -> Option<Arc<V>> {
        let inner = self.lock();
        match inner.entries.get(key) {
            Some(Entry {
                state: QueryState::Success(v),
                stale: false,
                ..
            }) => Some(Arc::clone(v)),
            _ => None,
        }
    }

    /// Mark a key pending and hand out a ticket for its result
    pub fn begin(&self, key: K) -> QueryTicket<K> {
        let mut inner = self.lock();
        let generation = inner.bump();
        inner.entries.insert(
            key.clone(),
            Entry {
                state: QueryState::Pending,
                generation,
                stale: false,
            },
        );
        QueryTicket { key, generation }
    }

    /// Store a result; returns false when the ticket was superseded
    pub fn complete(&self, ticket: QueryTicket<K>, result: ApiResult<V>) -> bool {
        let mut inner = self.lock();
        match inner.entries.get_mut(&ticket.key) {
            Some(entry) if entry.generation == ticket.generation => {
                entry.state = match result {
                    Ok(v) => QueryState::Success(Arc::new(v)),
                    Err(e) => QueryState::Error(Arc::new(e)),
                };
                true
            }
            _ => {
                tracing::debug!(cache = self.name, key = ?ticket.key, "Discarding superseded result");
                false
            }
        }
    }

    /// Return a fresh result or run `f` once to obtain one.
    ///
    /// Errors are not retried automatically; calling `fetch` again on an
    /// errored key is the user-triggered retry.
    pub async fn fetch<F, Fut>(&self, key: K, f: F) -> QueryState<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<V>>,
    {
        if let Some(v) = self.fresh(&key) {
            return QueryState::Success(v);
        }

        let ticket = self.begin(key.clone());
        let result = f().await;
        if let Err(e) = &result {
            tracing::warn!(cache = self.name, key = ?key, error = %e, "Query failed");
        }
        self.complete(ticket, result);

        self.get(&key).unwrap_or(QueryState::Pending)
    }

    /// Mark one key stale and drop any in-flight result for it
    pub fn invalidate(&self, key: &K) {
        let mut inner = self.lock();
        let generation = inner.bump();
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.stale = true;
            entry.generation = generation;
        }
    }

    /// Mark every entry stale
    pub fn invalidate_all(&self) {
        let mut inner = self.lock();
        let generation = inner.bump();
        for entry in inner.entries.values_mut() {
            entry.stale = true;
            entry.generation = generation;
        }
        tracing::debug!(cache = self.name, "Invalidated all entries");
    }

    /// Drop every entry; returns how many there were
    pub fn clear(&self) -> usize {
        let mut inner = self.lock();
        let dropped = inner.entries.len();
        inner.entries.clear();
        dropped
    }
}
