//! Document model for the scrollspy engine
//!
//! This crate provides the narrow view of a document that scroll tracking
//! needs: element queries, geometry, scroll metrics, event listeners and
//! subtree change notifications.
//!
//! # Modules
//!
//! - [`dom`] - The [`Dom`] trait host integrations implement
//! - [`selector`] - CSS selector subset used for element queries
//! - [`event`] - Event kinds, listener and observer registrations
//! - [`document`] - In-memory [`Document`] implementing [`Dom`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod dom;
pub mod event;
pub mod selector;

use thiserror::Error;

pub use document::{Document, NodeId};
pub use dom::{Dom, Scroller};
pub use event::{
    EventCallback, EventKind, EventTarget, ListenerId, MutationCallback, MutationKind,
    ObserveOptions, ObserverId, TRANSITION_END_EVENTS,
};
pub use selector::{AttributeMatch, AttributeOp, Selector};

/// Document errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    /// Selector could not be parsed
    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector {
        /// The selector source text
        selector: String,
        /// What went wrong
        reason: String,
    },

    /// Node does not belong to this document
    #[error("Unknown node: {0}")]
    UnknownNode(String),
}

/// Result type for document operations
pub type Result<T> = std::result::Result<T, DomError>;
