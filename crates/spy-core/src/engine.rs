//! Synchronous scrollspy engine
//!
//! [`SpyEngine`] owns the tracker state for one navigation root and exposes
//! the three operations scheduling code drives: `refresh` (rebuild the
//! offset table), `process` (evaluate the scroll position) and `clear`.
//! It performs no scheduling of its own.

use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;

use spy_dom::{Dom, Scroller, Selector};

use crate::config::{ElementRef, SpyConfig};
use crate::reducer::{Activation, ActivationReducer};
use crate::resolver::resolve;
use crate::tracker::{decide, Decision, ScrollMetrics, TrackerState};

/// Counters for engine work
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SpyStats {
    /// Offset table rebuilds
    pub refreshes: u64,
    /// Scroll position evaluations
    pub processes: u64,
    /// Target activations
    pub activations: u64,
}

/// Tracker state, configuration and reducer for one navigation root
#[derive(Debug)]
pub struct SpyEngine<N> {
    root: N,
    config: SpyConfig<N>,
    scroller: Option<Scroller<N>>,
    state: TrackerState,
    reducer: ActivationReducer<N>,
    stats: SpyStats,
}

impl<N> SpyEngine<N>
where
    N: Copy + Eq + Hash + Debug,
{
    /// Create an engine for the links under `root`
    pub fn new(root: N, config: SpyConfig<N>) -> Self {
        Self {
            root,
            config,
            scroller: None,
            state: TrackerState::default(),
            reducer: ActivationReducer::new(),
            stats: SpyStats::default(),
        }
    }

    /// The navigation root
    pub fn root(&self) -> N {
        self.root
    }

    /// Current configuration
    pub fn config(&self) -> &SpyConfig<N> {
        &self.config
    }

    /// Replace the configuration and forget the resolved scroll container
    pub fn set_config(&mut self, config: SpyConfig<N>) {
        self.config = config;
        self.scroller = None;
    }

    /// Forget the resolved scroll container
    pub fn reset_scroller(&mut self) {
        self.scroller = None;
    }

    /// Tracker state
    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Work counters
    pub fn stats(&self) -> SpyStats {
        self.stats
    }

    /// Currently active target
    pub fn active_target(&self) -> Option<&str> {
        self.state.active_target.as_deref()
    }

    /// Resolve (and cache) the scroll container
    ///
    /// `body` resolves to the window. Returns `None` while the configured
    /// container does not exist.
    pub fn scroller<D: Dom<Node = N>>(&mut self, dom: &D) -> Option<Scroller<N>> {
        if self.scroller.is_some() {
            return self.scroller;
        }
        let element = match &self.config.element {
            ElementRef::None => return None,
            ElementRef::Node(node) | ElementRef::Component(node) => *node,
            ElementRef::Selector(source) => {
                let selector = match Selector::parse(source) {
                    Ok(selector) => selector,
                    Err(err) => {
                        tracing::warn!("{}: {}", crate::config::NAME, err);
                        return None;
                    }
                };
                dom.select(&selector)?
            }
        };
        let scroller = if dom.tag_name(element) == "BODY" {
            Scroller::Window
        } else {
            Scroller::Element(element)
        };
        self.scroller = Some(scroller);
        self.scroller
    }

    /// Rebuild the offset table from the current document
    ///
    /// An active target that is no longer tracked is cleared along with its
    /// marks.
    pub fn refresh<D: Dom<Node = N>>(&mut self, dom: &mut D) {
        let Some(scroller) = self.scroller(&*dom) else {
            tracing::debug!(root = ?self.root, "no scroll container, skipping refresh");
            return;
        };
        let resolution = resolve(&*dom, self.root, scroller, self.config.method);
        if let Some(stale) = self.state.load(resolution) {
            tracing::debug!(stale = %stale, "active target no longer tracked");
            self.reducer.clear(dom, self.root);
        }
        self.stats.refreshes += 1;
        tracing::debug!(
            targets = self.state.targets.len(),
            scroll_height = self.state.scroll_height,
            "refreshed scroll targets"
        );
    }

    /// Evaluate the scroll position and update the active target
    ///
    /// Returns an activation when a new target was applied to at least one
    /// link.
    pub fn process<D: Dom<Node = N>>(&mut self, dom: &mut D) -> Option<Activation<N>> {
        let scroller = self.scroller(&*dom)?;
        let metrics = ScrollMetrics::measure(&*dom, scroller);
        self.stats.processes += 1;

        if metrics.scroll_height != self.state.scroll_height {
            self.refresh(dom);
        }

        match decide(&self.state, &metrics, self.config.offset) {
            Decision::Keep => None,
            Decision::Clear => {
                self.clear(dom);
                None
            }
            Decision::Activate(target) => self.activate(dom, &target),
        }
    }

    /// Make `target` active and mark its links
    pub fn activate<D: Dom<Node = N>>(&mut self, dom: &mut D, target: &str) -> Option<Activation<N>> {
        self.state.active_target = Some(target.to_string());
        self.stats.activations += 1;
        let activation = self.reducer.activate(dom, self.root, target);
        (!activation.links.is_empty()).then_some(activation)
    }

    /// Clear the active target and its marks
    pub fn clear<D: Dom<Node = N>>(&mut self, dom: &mut D) {
        self.state.active_target = None;
        self.reducer.clear(dom, self.root);
    }

    /// Drop all tracked state, keeping the configuration
    pub fn reset(&mut self) {
        self.scroller = None;
        self.state = TrackerState::default();
    }
}
