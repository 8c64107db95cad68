//! Incremental pagination controller.
//!
//! [`RepositoryStore`] owns the accumulated repositories, the next page to
//! request and the loading flag. Consumers never mutate it: they read a
//! [`StoreSnapshot`] or subscribe to changes, and ask for more data through
//! [`RepositoryStore::fetch_next`].

use crate::error::Result;
use crate::types::Repository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Anything that can produce one page of repositories.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    async fn fetch_page(&self, page: u32) -> Result<Vec<Repository>>;
}

#[async_trait]
impl<T: RepositorySource + ?Sized> RepositorySource for Arc<T> {
    async fn fetch_page(&self, page: u32) -> Result<Vec<Repository>> {
        (**self).fetch_page(page).await
    }
}

/// Observable controller state
#[derive(Debug, Clone, Serialize)]
pub struct StoreSnapshot {
    pub repositories: Vec<Repository>,
    /// Next page to request, starting at 1
    pub page: u32,
    pub loading: bool,
    pub failed_fetches: u64,
    pub last_loaded_at: Option<DateTime<Utc>>,
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        Self {
            repositories: Vec::new(),
            page: 1,
            loading: false,
            failed_fetches: 0,
            last_loaded_at: None,
        }
    }
}

/// Result of a single `fetch_next` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Another fetch was in flight; nothing happened
    Skipped,
    Loaded { page: u32, count: usize },
    /// The page could not be fetched; it will be requested again next time
    Failed { page: u32 },
}

pub struct RepositoryStore<S> {
    source: S,
    state: watch::Sender<StoreSnapshot>,
}

impl<S: RepositorySource> RepositoryStore<S> {
    pub fn new(source: S) -> Self {
        let (state, _) = watch::channel(StoreSnapshot::default());
        Self { source, state }
    }

    /// Request the next page unless a request is already in flight.
    ///
    /// Errors never escape: they are logged, the page cursor stays where it
    /// was and the loading flag is cleared, so the next call retries the same
    /// page.
    pub async fn fetch_next(&self) -> FetchOutcome {
        let Some(guard) = self.begin_loading() else {
            debug!("fetch already in flight, skipping");
            return FetchOutcome::Skipped;
        };
        let page = guard.page;

        debug!(page, "fetching repositories page");

        match self.source.fetch_page(page).await {
            Ok(items) => {
                let count = items.len();
                self.state.send_modify(|state| {
                    state.repositories.extend(items);
                    state.page += 1;
                    state.last_loaded_at = Some(Utc::now());
                });
                info!(page, count, "Loaded repositories page");
                FetchOutcome::Loaded { page, count }
            }
            Err(e) => {
                error!(page, error = %e, "Failed to fetch repositories");
                self.state.send_modify(|state| state.failed_fetches += 1);
                FetchOutcome::Failed { page }
            }
        }
    }

    // Test-and-set of the loading flag under the watch lock
    fn begin_loading(&self) -> Option<LoadingGuard<'_>> {
        let mut page = 0;
        let acquired = self.state.send_if_modified(|state| {
            if state.loading {
                return false;
            }
            state.loading = true;
            page = state.page;
            true
        });

        acquired.then(|| LoadingGuard {
            state: &self.state,
            page,
        })
    }
}

impl<S> RepositoryStore<S> {
    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.borrow().clone()
    }

    /// Read the current state without cloning the collection
    pub fn with_snapshot<R>(&self, f: impl FnOnce(&StoreSnapshot) -> R) -> R {
        f(&self.state.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.state.subscribe()
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.state.receiver_count()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn page(&self) -> u32 {
        self.state.borrow().page
    }

    pub fn len(&self) -> usize {
        self.state.borrow().repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Clears the loading flag when the fetch ends, whichever way it ends.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<StoreSnapshot>,
    page: u32,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|state| state.loading = false);
    }
}
