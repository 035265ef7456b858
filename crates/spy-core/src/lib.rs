//! Scrollspy engine
//!
//! This crate provides the framework-independent part of scroll tracking:
//! resolving navigation links to scroll targets, deciding which target is
//! active for a scroll position, and marking the matching navigation
//! elements as active.
//!
//! # Modules
//!
//! - [`config`] - Spy configuration, options and directive binding parsing
//! - [`resolver`] - Target resolution and offset table construction
//! - [`tracker`] - Tracker state and the activation decision
//! - [`reducer`] - Active marker application and clearing
//! - [`engine`] - [`SpyEngine`] tying the pieces together
//!
//! # Example
//!
//! ```rust
//! use spy_core::{SpyConfig, SpyEngine};
//! use spy_dom::{Document, Dom};
//!
//! let mut doc = Document::new();
//! let nav = doc.append_element(doc.body_node(), "nav").unwrap();
//! let mut engine = SpyEngine::new(nav, SpyConfig::default());
//! engine.refresh(&mut doc);
//! assert!(engine.state().targets.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod reducer;
pub mod resolver;
pub mod tracker;

use thiserror::Error;

pub use config::{ElementRef, OffsetMethod, SpyConfig};
pub use engine::{SpyEngine, SpyStats};
pub use reducer::{Activation, ActivationReducer};
pub use resolver::{fragment_id, resolve, LinkTarget, Resolution};
pub use tracker::{decide, Decision, ScrollMetrics, TrackerState};

/// Engine errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Unknown offset method
    #[error("Invalid offset method: {0}")]
    InvalidMethod(String),

    /// Selector could not be parsed
    #[error("Selector error: {0}")]
    Selector(#[from] spy_dom::DomError),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, ConfigError>;
