//! Scrollspy runtime
//!
//! This crate drives a [`spy_core::SpyEngine`] from document events. Each
//! [`ScrollSpy`] is a single tokio task that owns its engine; listener and
//! observer callbacks only enqueue events, so processing is strictly in
//! arrival order. Layout events (resize, orientation change, transition end,
//! mutations, explicit refreshes) are coalesced by a throttle window while
//! scroll events are processed immediately.
//!
//! # Modules
//!
//! - [`bus`] - Activation notification channel
//! - [`event`] - Events a spy reacts to
//! - [`spy`] - The [`ScrollSpy`] handle and its task

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bus;
pub mod event;
pub mod spy;

use thiserror::Error;

pub use bus::ActivationBus;
pub use event::SpyEvent;
pub use spy::{ScrollSpy, SharedDom, SpySnapshot};

/// Runtime errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpyError {
    /// The spy was disposed
    #[error("Scrollspy has been disposed")]
    Disposed,

    /// The spy task is no longer running
    #[error("Scrollspy task stopped")]
    TaskStopped,
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, SpyError>;
