//! Tracker state and the activation decision

use serde::Serialize;

use spy_dom::{Dom, Scroller};

use crate::resolver::{LinkTarget, Resolution};

/// Offset table plus the currently active target
///
/// `offsets` and `targets` always have the same length and are kept in
/// ascending offset order. `active_target` is either absent or one of
/// `targets`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackerState {
    /// Target offsets, ascending
    pub offsets: Vec<f64>,
    /// Target ids, parallel to `offsets`
    pub targets: Vec<String>,
    /// Currently active target
    pub active_target: Option<String>,
    /// Content height recorded at the last refresh
    pub scroll_height: f64,
}

impl TrackerState {
    /// Replace the offset table
    ///
    /// The active target survives only if it is still tracked; otherwise it
    /// is dropped and returned.
    pub fn load(&mut self, resolution: Resolution) -> Option<String> {
        let (offsets, targets): (Vec<f64>, Vec<String>) = resolution
            .targets
            .into_iter()
            .map(|LinkTarget { id, offset }| (offset, id))
            .unzip();
        self.offsets = offsets;
        self.targets = targets;
        self.scroll_height = resolution.scroll_height;

        let stale = self
            .active_target
            .as_ref()
            .is_some_and(|active| !self.targets.contains(active));
        if stale {
            self.active_target.take()
        } else {
            None
        }
    }

    /// Whether any target is tracked
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Whether a target is currently active
    pub fn is_tracking(&self) -> bool {
        self.active_target.is_some()
    }
}

/// Scroll measurements for one process cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    /// Current scroll offset of the container
    pub scroll_top: f64,
    /// Current content height of the container
    pub scroll_height: f64,
    /// Visible height of the container
    pub viewport_height: f64,
}

impl ScrollMetrics {
    /// Measure a scroll container
    pub fn measure<D: Dom>(dom: &D, scroller: Scroller<D::Node>) -> Self {
        Self {
            scroll_top: dom.scroller_top(scroller),
            scroll_height: dom.scroller_height(scroller),
            viewport_height: dom.scroller_viewport(scroller),
        }
    }
}

/// Outcome of evaluating the scroll position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Leave the active target unchanged
    Keep,
    /// Make this target active
    Activate(String),
    /// Clear the active target
    Clear,
}

/// Decide the active target for the given scroll position
///
/// Rules, in order:
/// 1. Once `scroll_top + offset` reaches `offset + scroll_height - viewport`
///    the last target is active, even if its own offset was never crossed.
/// 2. With a target active, a first offset above zero and the position
///    above it, activation is cleared.
/// 3. Otherwise the largest index whose offset is at or below the position
///    wins.
pub fn decide(state: &TrackerState, metrics: &ScrollMetrics, offset: f64) -> Decision {
    let scroll_top = metrics.scroll_top + offset;
    let max_scroll = offset + metrics.scroll_height - metrics.viewport_height;
    let active = state.active_target.as_deref();

    if scroll_top >= max_scroll {
        return match state.targets.last() {
            Some(last) if active != Some(last.as_str()) => Decision::Activate(last.clone()),
            Some(_) => Decision::Keep,
            None if active.is_some() => Decision::Clear,
            None => Decision::Keep,
        };
    }

    if let Some(&first) = state.offsets.first() {
        if active.is_some() && scroll_top < first && first > 0.0 {
            return Decision::Clear;
        }
    }

    let count = state.offsets.len();
    for i in (0..count).rev() {
        let within = scroll_top >= state.offsets[i]
            && state.offsets.get(i + 1).map_or(true, |next| scroll_top < *next);
        if within && active != Some(state.targets[i].as_str()) {
            return Decision::Activate(state.targets[i].clone());
        }
    }

    Decision::Keep
}
