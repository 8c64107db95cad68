use crate::error::{PopularReposError, Result};
use crate::store::{RepositorySource, RepositoryStore};
use crate::trigger::{Bounds, IntersectionTrigger, ObserverOptions, StoreDemand};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort, SpawnErr};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Actor holding the scroll position of the repository list and the
/// sentinel trigger that loads more pages.
pub struct ListView<S> {
    _source: PhantomData<fn() -> S>,
}

impl<S> ListView<S> {
    pub fn new() -> Self {
        Self {
            _source: PhantomData,
        }
    }
}

impl<S> Default for ListView<S> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ListViewArgs<S> {
    pub store: Arc<RepositoryStore<S>>,
    pub viewport_rows: u32,
    pub rows_per_item: u32,
    pub observer: ObserverOptions,
}

pub struct ListViewState<S> {
    store: Arc<RepositoryStore<S>>,
    trigger: IntersectionTrigger<StoreDemand<S>>,
    forwarder: JoinHandle<()>,
    offset: u32,
    viewport_rows: u32,
    rows_per_item: u32,
}

/// Messages the list view can handle
#[derive(Debug)]
pub enum ListViewMessage {
    /// Scroll by a number of rows, negative scrolls up
    ScrollBy(i64),
    /// The store published new state
    StoreChanged,
    /// Ask for the next page regardless of sentinel visibility
    Demand,
    GetStats(RpcReplyPort<ViewStats>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewStats {
    pub offset: u32,
    pub viewport_rows: u32,
    pub rows_per_item: u32,
    pub content_rows: u32,
    pub repositories: usize,
    pub page: u32,
    pub loading: bool,
    pub sentinel_visible: bool,
    pub demands_fired: u64,
}

impl ViewStats {
    /// Index one past the last repository touching the viewport
    pub fn visible_end(&self) -> usize {
        if self.rows_per_item == 0 {
            return self.repositories;
        }
        let bottom = self.offset as usize + self.viewport_rows as usize;
        let rows = self.rows_per_item as usize;
        bottom.div_ceil(rows).min(self.repositories)
    }
}

impl<S: RepositorySource + 'static> ListViewState<S> {
    fn content_rows(&self) -> u32 {
        let items = u32::try_from(self.store.len()).unwrap_or(u32::MAX);
        items.saturating_mul(self.rows_per_item)
    }

    // Sentinel sits right after the last item
    fn observe_sentinel(&mut self) -> bool {
        let root = Bounds::new(f64::from(self.offset), f64::from(self.viewport_rows));
        let sentinel = Bounds::new(f64::from(self.content_rows()), 0.0);
        self.trigger.observe_bounds(root, sentinel)
    }

    fn scroll_by(&mut self, delta: i64) {
        let max_offset = i64::from(self.content_rows());
        let offset = (i64::from(self.offset) + delta).clamp(0, max_offset);
        self.offset = u32::try_from(offset).unwrap_or(0);
    }

    fn stats(&self) -> ViewStats {
        let (repositories, page, loading) = self
            .store
            .with_snapshot(|s| (s.repositories.len(), s.page, s.loading));

        ViewStats {
            offset: self.offset,
            viewport_rows: self.viewport_rows,
            rows_per_item: self.rows_per_item,
            content_rows: self.content_rows(),
            repositories,
            page,
            loading,
            sentinel_visible: self.trigger.is_visible(),
            demands_fired: self.trigger.fired(),
        }
    }
}

impl<S: RepositorySource + 'static> ListView<S> {
    pub async fn spawn(
        args: ListViewArgs<S>,
    ) -> std::result::Result<(ActorRef<ListViewMessage>, JoinHandle<()>), SpawnErr> {
        let (actor_ref, handle) = Actor::spawn(None, ListView::new(), args).await?;
        info!("List view started");
        Ok((actor_ref, handle))
    }
}

#[ractor::async_trait]
impl<S: RepositorySource + 'static> Actor for ListView<S> {
    type Msg = ListViewMessage;
    type State = ListViewState<S>;
    type Arguments = ListViewArgs<S>;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> std::result::Result<Self::State, ActorProcessingErr> {
        if args.viewport_rows == 0 || args.rows_per_item == 0 {
            return Err(ActorProcessingErr::from(
                "viewport_rows and rows_per_item must be positive",
            ));
        }

        // Forward store updates so the sentinel is re-measured on every change
        let mut updates = args.store.subscribe();
        let myself_clone = myself.clone();
        let forwarder = tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                if let Err(e) = myself_clone.send_message(ListViewMessage::StoreChanged) {
                    debug!("List view gone, stopping store forwarder: {}", e);
                    break;
                }
            }
        });

        let demand = StoreDemand::new(Arc::clone(&args.store));
        let mut state = ListViewState {
            store: args.store,
            trigger: IntersectionTrigger::new(demand, args.observer),
            forwarder,
            offset: 0,
            viewport_rows: args.viewport_rows,
            rows_per_item: args.rows_per_item,
        };

        // Initial observation, as an observer reports on attach
        state.observe_sentinel();

        Ok(state)
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> std::result::Result<(), ActorProcessingErr> {
        match message {
            ListViewMessage::ScrollBy(delta) => {
                // Layout may have changed since the last observation
                state.observe_sentinel();
                state.scroll_by(delta);
                state.observe_sentinel();
                debug!(offset = state.offset, delta, "List scrolled");
            }
            ListViewMessage::StoreChanged => {
                state.observe_sentinel();
            }
            ListViewMessage::Demand => {
                state.trigger.demand();
            }
            ListViewMessage::GetStats(reply) => {
                if let Err(e) = reply.send(state.stats()) {
                    error!("Failed to send view stats: {:?}", e);
                }
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> std::result::Result<(), ActorProcessingErr> {
        state.forwarder.abort();
        info!(
            repositories = state.store.len(),
            demands_fired = state.trigger.fired(),
            "List view stopped"
        );
        Ok(())
    }
}

/// Ask the view for its current stats
pub async fn view_stats(view: &ActorRef<ListViewMessage>) -> Result<ViewStats> {
    match view
        .call(ListViewMessage::GetStats, Some(Duration::from_secs(5)))
        .await
    {
        Ok(ractor::rpc::CallResult::Success(stats)) => Ok(stats),
        Ok(ractor::rpc::CallResult::Timeout) => Err(PopularReposError::ViewError(
            "timed out waiting for view stats".to_string(),
        )),
        Ok(ractor::rpc::CallResult::SenderError) => Err(PopularReposError::ViewError(
            "view dropped the stats request".to_string(),
        )),
        Err(e) => Err(PopularReposError::ViewError(format!(
            "failed to contact view: {}",
            e
        ))),
    }
}
