//! Activation notifications
//!
//! A broadcast channel carrying one [`Activation`] per process cycle that
//! marked at least one link. Several spies may share a bus.

use tokio::sync::broadcast;

use spy_core::Activation;

/// Default number of buffered activations per subscriber
pub const DEFAULT_CAPACITY: usize = 16;

/// Broadcast channel for activation notifications
#[derive(Debug)]
pub struct ActivationBus<N> {
    tx: broadcast::Sender<Activation<N>>,
}

impl<N: Clone> ActivationBus<N> {
    /// Create a bus with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus buffering up to `capacity` activations per subscriber
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to activations
    pub fn subscribe(&self) -> broadcast::Receiver<Activation<N>> {
        self.tx.subscribe()
    }

    /// Publish an activation, returning the number of subscribers reached
    pub fn emit(&self, activation: Activation<N>) -> usize {
        self.tx.send(activation).unwrap_or(0)
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<N: Clone> Default for ActivationBus<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Clone for ActivationBus<N> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}
