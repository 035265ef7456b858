//! Scrollspy
//!
//! Tracks which section of a scrollable region is currently in view and
//! marks the navigation links pointing at it as active.
//!
//! # Crates
//!
//! - [`dom`] - Document abstraction, selectors and an in-memory document
//! - [`engine`] - Target resolution, the activation decision and marker handling
//! - [`runtime`] - Event-driven [`ScrollSpy`] instances
//!
//! # Example
//!
//! ```no_run
//! use scrollspy::{ActivationBus, Document, ScrollSpy, SpyConfig};
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let mut doc = Document::new();
//! let body = doc.body_node();
//! let nav = doc.append_element(body, "nav").unwrap();
//! let dom = Arc::new(parking_lot::Mutex::new(doc));
//!
//! let bus = ActivationBus::new();
//! let spy = ScrollSpy::new(dom, nav, SpyConfig::default(), Some(bus));
//! spy.flush().await.unwrap();
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use spy_core as engine;
pub use spy_dom as dom;
pub use spy_runtime as runtime;

pub use spy_core::{
    Activation, ConfigError, ElementRef, OffsetMethod, SpyConfig, SpyEngine, SpyStats,
    TrackerState,
};
pub use spy_dom::{Document, Dom, DomError, NodeId, Scroller, Selector};
pub use spy_runtime::{ActivationBus, ScrollSpy, SharedDom, SpyError, SpyEvent, SpySnapshot};
