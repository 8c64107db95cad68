//! Page-demand signalling.
//!
//! The list asks for more data through [`DemandSignal::on_demand`]. The
//! [`IntersectionTrigger`] decides when to ask: it watches a sentinel placed
//! after the last item and fires when the sentinel scrolls into view.

use crate::store::{RepositorySource, RepositoryStore};
use std::sync::Arc;
use tracing::{debug, trace};

pub const DEFAULT_ROOT_MARGIN: f64 = 20.0;
pub const DEFAULT_THRESHOLD: f64 = 1.0;

/// Signal that the consumer wants the next page
pub trait DemandSignal: Send + Sync {
    fn on_demand(&self);
}

impl<F> DemandSignal for F
where
    F: Fn() + Send + Sync,
{
    fn on_demand(&self) {
        self()
    }
}

/// Demand signal that starts a store fetch in the background when the store
/// is idle.
pub struct StoreDemand<S> {
    store: Arc<RepositoryStore<S>>,
}

impl<S> StoreDemand<S> {
    pub fn new(store: Arc<RepositoryStore<S>>) -> Self {
        Self { store }
    }
}

impl<S: RepositorySource + 'static> DemandSignal for StoreDemand<S> {
    fn on_demand(&self) {
        if self.store.is_loading() {
            trace!("store busy, ignoring demand");
            return;
        }
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            store.fetch_next().await;
        });
    }
}

/// A vertical span in list coordinates (rows)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub top: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(top: f64, height: f64) -> Self {
        Self {
            top,
            height: height.max(0.0),
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverOptions {
    /// Grows the viewport on both edges before intersecting
    pub root_margin: f64,
    /// Fraction of the sentinel that must be inside the viewport, 0.0..=1.0
    pub threshold: f64,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            root_margin: DEFAULT_ROOT_MARGIN,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub is_intersecting: bool,
    pub intersection_ratio: f64,
}

impl IntersectionEntry {
    /// Measure how much of `target` lies inside `root` grown by the margin.
    /// A zero-height target inside the root counts as fully visible.
    pub fn measure(root: Bounds, target: Bounds, options: &ObserverOptions) -> Self {
        let root_top = root.top - options.root_margin;
        let root_bottom = root.bottom() + options.root_margin;

        let top = target.top.max(root_top);
        let bottom = target.bottom().min(root_bottom);

        if bottom < top {
            return Self {
                is_intersecting: false,
                intersection_ratio: 0.0,
            };
        }

        let intersection_ratio = if target.height == 0.0 {
            1.0
        } else {
            (bottom - top) / target.height
        };

        Self {
            is_intersecting: true,
            intersection_ratio,
        }
    }

    pub fn is_visible(&self, threshold: f64) -> bool {
        self.is_intersecting && self.intersection_ratio >= threshold
    }
}

/// Fires its demand signal each time the observed sentinel becomes visible.
///
/// Like a browser intersection observer it reacts to crossings only: a
/// sentinel that stays visible does not fire again until it has left the
/// viewport and come back.
pub struct IntersectionTrigger<D> {
    demand: D,
    options: ObserverOptions,
    visible: bool,
    fired: u64,
}

impl<D: DemandSignal> IntersectionTrigger<D> {
    pub fn new(demand: D, options: ObserverOptions) -> Self {
        Self {
            demand,
            options,
            visible: false,
            fired: 0,
        }
    }

    /// Feed a batch of observations; only the first entry is considered.
    /// Returns true when the demand signal fired.
    pub fn observe(&mut self, entries: &[IntersectionEntry]) -> bool {
        let Some(entry) = entries.first() else {
            return false;
        };

        let visible = entry.is_visible(self.options.threshold);
        let crossed = visible && !self.visible;
        self.visible = visible;

        if crossed {
            debug!(ratio = entry.intersection_ratio, "sentinel in view, requesting next page");
            self.fired += 1;
            self.demand.on_demand();
        }
        crossed
    }

    pub fn observe_bounds(&mut self, root: Bounds, target: Bounds) -> bool {
        let entry = IntersectionEntry::measure(root, target, &self.options);
        self.observe(&[entry])
    }

    /// Ask for data directly, bypassing visibility
    pub fn demand(&mut self) {
        self.fired += 1;
        self.demand.on_demand();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }

    pub fn options(&self) -> &ObserverOptions {
        &self.options
    }
}
