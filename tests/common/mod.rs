#![allow(dead_code)]

use async_trait::async_trait;
use popular_repos::error::{PopularReposError, Result};
use popular_repos::store::{RepositorySource, RepositoryStore, StoreSnapshot};
use popular_repos::types::{Repository, RepositoryOwner};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

pub fn repo(id: u64) -> Repository {
    Repository {
        id,
        name: format!("repo-{}", id),
        description: Some(format!("Repository number {}", id)),
        html_url: format!("https://github.com/owner/repo-{}", id),
        owner: RepositoryOwner {
            login: "owner".to_string(),
            avatar_url: "https://avatars.githubusercontent.com/u/1".to_string(),
        },
        stargazers_count: 1000 - id,
        language: if id % 2 == 0 { Some("JavaScript".to_string()) } else { None },
    }
}

/// A page of `count` repositories whose ids start at `first_id`
pub fn page_of(first_id: u64, count: u64) -> Vec<Repository> {
    (first_id..first_id + count).map(repo).collect()
}

/// In-memory source replaying scripted responses in order.
/// Once the script runs out every page is empty.
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Result<Vec<Repository>>>>,
    requested: Mutex<Vec<u32>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch waits for a permit on the returned semaphore
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let source = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (source, gate)
    }

    pub fn with_page(self, items: Vec<Repository>) -> Self {
        self.responses.lock().unwrap().push_back(Ok(items));
        self
    }

    pub fn with_failure(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(PopularReposError::UnexpectedStatus {
                status: 503,
                body: message.to_string(),
            }));
        self
    }

    pub fn requested(&self) -> Vec<u32> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositorySource for ScriptedSource {
    async fn fetch_page(&self, page: u32) -> Result<Vec<Repository>> {
        self.requested.lock().unwrap().push(page);

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .expect("gate closed")
                .forget();
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn store_with(source: ScriptedSource) -> (Arc<RepositoryStore<Arc<ScriptedSource>>>, Arc<ScriptedSource>) {
    let source = Arc::new(source);
    let store = Arc::new(RepositoryStore::new(Arc::clone(&source)));
    (store, source)
}

/// Wait (bounded) until the store reaches a state matching `predicate`
pub async fn wait_for_store<S>(
    store: &RepositoryStore<S>,
    predicate: impl FnMut(&StoreSnapshot) -> bool,
) {
    let mut updates = store.subscribe();
    tokio::time::timeout(Duration::from_secs(5), updates.wait_for(predicate))
        .await
        .expect("timed out waiting for store state")
        .expect("store dropped");
}
