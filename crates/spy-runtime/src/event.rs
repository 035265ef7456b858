//! Events a spy reacts to

use serde::{Deserialize, Serialize};

use spy_dom::EventKind;

/// Input to a spy's event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpyEvent {
    /// Scroll position changed
    Scroll,
    /// Window resized
    Resize,
    /// Orientation changed
    OrientationChange,
    /// CSS transition finished
    TransitionEnd,
    /// Navigation or content subtree changed
    Mutation,
    /// Explicit request to rebuild targets
    Refresh,
}

impl SpyEvent {
    /// Whether the event is coalesced by the throttle window
    pub fn is_throttled(&self) -> bool {
        !matches!(self, SpyEvent::Scroll)
    }
}

impl From<EventKind> for SpyEvent {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Scroll => SpyEvent::Scroll,
            EventKind::Resize => SpyEvent::Resize,
            EventKind::OrientationChange => SpyEvent::OrientationChange,
            EventKind::TransitionEnd => SpyEvent::TransitionEnd,
        }
    }
}
