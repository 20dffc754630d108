//! Registry of connected observers.
//!
//! This module tracks every live realtime connection:
//! - Observer registration with capacity enforcement and id assignment
//! - Outbound delivery to one observer or to all of them
//! - Cleanup of observers whose connection went away
//!
//! The registry holds only the sending half of each observer's outbound queue.
//! Draining that queue onto the socket is the transport's job, so delivering a
//! message here never waits on the network. Queues are bounded: an observer that
//! falls [`OUTBOUND_QUEUE`] frames behind is dropped like a closed one. Snapshots
//! are full replacement sets, so nothing is lost that a reconnect cannot recover.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Frames an observer may have queued before it is considered stalled.
pub const OUTBOUND_QUEUE: usize = 32;

/// Identifier assigned to an observer for its connection lifetime.
pub type ObserverId = u32;

/// A connected client subscribed to reveal broadcasts.
#[derive(Debug)]
pub struct Observer {
    /// Unique observer identifier assigned by the registry
    pub id: ObserverId,
    /// Remote address, for logging
    pub addr: SocketAddr,
    /// When the connection was registered
    pub connected_at: Instant,
    /// Outbound text frames for this observer's writer task
    sender: mpsc::Sender<String>,
}

impl Observer {
    /// Wraps the sending half of a connection's outbound queue.
    ///
    /// The queue should be created with [`OUTBOUND_QUEUE`] slots.
    pub fn new(id: ObserverId, addr: SocketAddr, sender: mpsc::Sender<String>) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            sender,
        }
    }

    /// Queues a text frame without waiting.
    ///
    /// Returns false once the connection is gone or its queue is full. Either
    /// way the observer should be dropped.
    pub fn send(&self, text: String) -> bool {
        match self.sender.try_send(text) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Observer {} ({}) stopped reading, dropping it", self.id, self.addr);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Owns every observer of the game session.
pub struct ObserverRegistry {
    /// Connected observers indexed by id
    observers: HashMap<ObserverId, Observer>,
    /// Next id handed out on registration
    next_observer_id: ObserverId,
    /// Maximum number of concurrent observers
    max_observers: usize,
}

impl ObserverRegistry {
    /// Creates an empty registry. Ids start from 1.
    pub fn new(max_observers: usize) -> Self {
        Self {
            observers: HashMap::new(),
            next_observer_id: 1,
            max_observers,
        }
    }

    /// Registers a new observer, or returns `None` when the registry is full.
    pub fn add_observer(
        &mut self,
        addr: SocketAddr,
        sender: mpsc::Sender<String>,
    ) -> Option<ObserverId> {
        if self.observers.len() >= self.max_observers {
            return None;
        }

        let id = self.next_observer_id;
        self.next_observer_id += 1;

        info!("Observer {} connected from {}", id, addr);
        self.observers.insert(id, Observer::new(id, addr, sender));
        Some(id)
    }

    /// Removes an observer. Returns true if it was registered.
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        match self.observers.remove(&id) {
            Some(observer) => {
                info!(
                    "Observer {} disconnected after {:.1}s",
                    observer.id,
                    observer.connected_at.elapsed().as_secs_f32()
                );
                true
            }
            None => false,
        }
    }

    /// Queues `text` for a single observer.
    ///
    /// Returns false if the observer is unknown, gone, or stalled. A gone or
    /// stalled observer is removed.
    pub fn send_to(&mut self, id: ObserverId, text: String) -> bool {
        let delivered = self
            .observers
            .get(&id)
            .map(|observer| observer.send(text))
            .unwrap_or(false);

        if !delivered {
            self.remove_observer(id);
        }
        delivered
    }

    /// Queues `text` for every observer and returns how many accepted it.
    ///
    /// Observers whose connection has closed or whose queue is full are dropped
    /// from the registry so they never hold up later broadcasts.
    pub fn broadcast(&mut self, text: &str) -> usize {
        let mut closed = Vec::new();
        let mut recipients = 0;

        for observer in self.observers.values() {
            if observer.send(text.to_owned()) {
                recipients += 1;
            } else {
                closed.push(observer.id);
            }
        }

        for id in closed {
            debug!("Dropping observer {}", id);
            self.remove_observer(id);
        }

        recipients
    }

    /// Maximum number of observers this registry accepts.
    pub fn capacity(&self) -> usize {
        self.max_observers
    }

    /// Whether `id` is still registered.
    ///
    /// An observer disappears on disconnect and when a delivery to it fails.
    pub fn contains(&self, id: ObserverId) -> bool {
        self.observers.contains_key(&id)
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Returns true when no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}
