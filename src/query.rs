//! Cached read access to the full user collection.
//!
//! [`UsersQuery`] fetches the table on a background thread and keeps the last
//! good snapshot for a freshness window. Results are applied on the UI thread
//! by [`UsersQuery::poll`]; a result from a superseded fetch is dropped.
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::store::{StoreResult, User, UserStore};

/// Default freshness window for the cached snapshot.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(10 * 60);

const WAIT_LIMIT: Duration = Duration::from_secs(10);

/// Whole-table scan shared by the query and the duplicate e-mail check.
pub fn fetch_users(store: &dyn UserStore) -> StoreResult<Vec<User>> {
    store.list()
}

struct FetchOutcome {
    generation: u64,
    result: StoreResult<Vec<User>>,
}

pub struct UsersQuery {
    store: Arc<dyn UserStore>,
    stale_after: Duration,
    data: Option<Vec<User>>,
    fetched_at: Option<Instant>,
    invalidated: bool,
    /// Last generation started before the most recent invalidation.
    invalidated_at: u64,
    error: Option<String>,
    generation: u64,
    pending: Option<u64>,
    tx: Sender<FetchOutcome>,
    rx: Receiver<FetchOutcome>,
}

impl UsersQuery {
    pub fn new(store: Arc<dyn UserStore>, stale_after: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            store,
            stale_after,
            data: None,
            fetched_at: None,
            invalidated: false,
            invalidated_at: 0,
            error: None,
            generation: 0,
            pending: None,
            tx,
            rx,
        }
    }

    /// Last successful snapshot, if any.
    pub fn data(&self) -> Option<&[User]> {
        self.data.as_deref()
    }

    /// Rows the list may show and act on. Empty while the last fetch failed.
    pub fn visible(&self) -> &[User] {
        match (&self.error, &self.data) {
            (None, Some(users)) => users,
            _ => &[],
        }
    }

    /// True while the first fetch (no snapshot yet) is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some() && self.data.is_none()
    }

    /// True while any fetch is in flight, including background refreshes.
    pub fn is_fetching(&self) -> bool {
        self.pending.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_fresh(&self, now: Instant) -> bool {
        match (&self.data, self.fetched_at) {
            (Some(_), Some(at)) => !self.invalidated && now.duration_since(at) < self.stale_after,
            _ => false,
        }
    }

    /// Start a fetch unless the snapshot is still fresh or one is already running.
    /// Returns whether a fetch was started.
    pub fn ensure_fresh(&mut self, now: Instant) -> bool {
        if self.is_fetching() || self.is_fresh(now) {
            return false;
        }
        self.start_fetch();
        true
    }

    /// Always start a new fetch; an in-flight one is superseded.
    pub fn refetch(&mut self) {
        self.start_fetch();
    }

    /// Mark the snapshot stale so the next [`ensure_fresh`](Self::ensure_fresh) re-queries.
    ///
    /// A fetch already in flight may have read the table before the change,
    /// so it is superseded by a new one.
    pub fn invalidate(&mut self) {
        self.invalidated = true;
        self.invalidated_at = self.generation;
        if self.is_fetching() {
            self.start_fetch();
        }
    }

    fn start_fetch(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        self.pending = Some(generation);
        let store = Arc::clone(&self.store);
        let tx = self.tx.clone();
        tracing::debug!(generation, "fetching users");
        let spawned = thread::Builder::new()
            .name("users-fetch".into())
            .spawn(move || {
                let result = fetch_users(store.as_ref());
                // receiver gone means the app is shutting down
                let _ = tx.send(FetchOutcome { generation, result });
            });
        if let Err(e) = spawned {
            tracing::error!(error = %e, "could not start users fetch");
            self.pending = None;
            self.error = Some(e.to_string());
        }
    }

    /// Apply any finished fetches. Returns true when the snapshot or error changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(outcome) = self.rx.try_recv() {
            changed |= self.apply(outcome);
        }
        changed
    }

    /// Block until the in-flight fetch settles.
    pub fn wait(&mut self) {
        while self.pending.is_some() {
            match self.rx.recv_timeout(WAIT_LIMIT) {
                Ok(outcome) => {
                    self.apply(outcome);
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    tracing::error!("users fetch did not settle");
                    self.pending = None;
                    self.error = Some("fetch did not settle".into());
                }
            }
        }
    }

    fn apply(&mut self, outcome: FetchOutcome) -> bool {
        if self.pending != Some(outcome.generation) {
            tracing::debug!(generation = outcome.generation, "discarding superseded fetch");
            return false;
        }
        self.pending = None;
        match outcome.result {
            Ok(users) => {
                tracing::debug!(generation = outcome.generation, count = users.len(), "users fetched");
                self.data = Some(users);
                self.fetched_at = Some(Instant::now());
                if outcome.generation > self.invalidated_at {
                    self.invalidated = false;
                }
                self.error = None;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch users");
                self.error = Some(e.to_string());
            }
        }
        true
    }
}
