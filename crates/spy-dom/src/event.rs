//! Event listeners and subtree change notifications

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Browser names for the transition end event, vendor prefixes included
pub const TRANSITION_END_EVENTS: [&str; 4] =
    ["webkitTransitionEnd", "transitionend", "otransitionend", "oTransitionEnd"];

/// Events the scroll tracker listens for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Scroll position changed
    Scroll,
    /// Window was resized
    Resize,
    /// Device orientation changed
    OrientationChange,
    /// A CSS transition finished (any vendor variant)
    TransitionEnd,
}

impl EventKind {
    /// Map a DOM event name to an event kind
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "scroll" => Some(EventKind::Scroll),
            "resize" => Some(EventKind::Resize),
            "orientationchange" => Some(EventKind::OrientationChange),
            n if TRANSITION_END_EVENTS.contains(&n) => Some(EventKind::TransitionEnd),
            _ => None,
        }
    }

    /// Canonical DOM event name
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Scroll => "scroll",
            EventKind::Resize => "resize",
            EventKind::OrientationChange => "orientationchange",
            EventKind::TransitionEnd => "transitionend",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where a listener is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget<N> {
    /// The top-level window
    Window,
    /// A specific element
    Element(N),
}

/// Kinds of subtree change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    /// Children were added or removed
    ChildList,
    /// An attribute changed
    Attribute(String),
    /// Text content changed
    CharacterData,
}

/// What a subtree observer wants to be told about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    /// Include descendants of the observed node
    pub subtree: bool,
    /// Report child list changes
    pub child_list: bool,
    /// Report attribute changes
    pub attributes: bool,
    /// Report text changes
    pub character_data: bool,
    /// Restrict attribute reports to these names
    pub attribute_filter: Option<Vec<String>>,
}

impl ObserveOptions {
    /// Whether a change of the given kind should be reported
    pub fn accepts(&self, kind: &MutationKind) -> bool {
        match kind {
            MutationKind::ChildList => self.child_list,
            MutationKind::CharacterData => self.character_data,
            MutationKind::Attribute(name) => {
                self.attributes
                    && self
                        .attribute_filter
                        .as_ref()
                        .map_or(true, |filter| filter.iter().any(|f| f == name))
            }
        }
    }
}

/// Listener callback
pub type EventCallback = Arc<dyn Fn(EventKind) + Send + Sync>;

/// Subtree observer callback
pub type MutationCallback = Arc<dyn Fn(&MutationKind) + Send + Sync>;

/// Handle for a registered event listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Handle for a registered subtree observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);
