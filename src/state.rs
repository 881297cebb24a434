//! Shared relay state
//!
//! Owns the client registry and the delivery queue. Each sits behind its own
//! lock and every method holds exactly one lock for exactly one operation,
//! so a broadcast pass never blocks registrations.

use std::sync::Arc;

use tokio::sync::{Mutex, Notify};

use crate::client::ClientRecord;
use crate::error::RegistryError;
use crate::queue::{ChatMessage, DeliveryQueue};
use crate::registry::ClientRegistry;
use crate::types::{ChannelRef, ClientId};

/// Shared handle passed to the ingestion loop and the broadcast engine
pub type SharedRelayState = Arc<RelayState>;

/// Registry + queue, internally synchronized
#[derive(Debug, Default)]
pub struct RelayState {
    registry: Mutex<ClientRegistry>,
    queue: Mutex<DeliveryQueue>,
    /// Signalled on every enqueue
    queued: Notify,
}

impl RelayState {
    /// Create empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty state behind an `Arc`
    pub fn shared() -> SharedRelayState {
        Arc::new(Self::new())
    }

    /// Check if an identity has completed registration
    pub async fn is_registered(&self, id: ClientId) -> bool {
        self.registry.lock().await.is_registered(id)
    }

    /// Add a client record, rejecting a known identity
    pub async fn register(&self, record: ClientRecord) -> Result<(), RegistryError> {
        self.registry.lock().await.register(record)
    }

    /// Remove a client so its identity can register again
    pub async fn unregister(&self, id: ClientId) -> Option<ClientRecord> {
        self.registry.lock().await.unregister(id)
    }

    /// Remove every client whose outbound channel was `channel_ref`
    pub async fn unregister_channel(&self, channel_ref: ChannelRef) -> Vec<ClientRecord> {
        self.registry.lock().await.unregister_channel(channel_ref)
    }

    /// Get a copy of a client's record
    pub async fn lookup(&self, id: ClientId) -> Result<ClientRecord, RegistryError> {
        self.registry.lock().await.lookup(id).cloned()
    }

    /// Snapshot of every registered client except `id`
    pub async fn all_except(&self, id: ClientId) -> Vec<ClientRecord> {
        self.registry.lock().await.all_except(id)
    }

    /// Number of registered clients
    pub async fn client_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Queue a message and wake the broadcast engine
    pub async fn enqueue(&self, message: ChatMessage) {
        self.queue.lock().await.enqueue(message);
        self.queued.notify_one();
    }

    /// Take the oldest queued message without waiting
    pub async fn try_dequeue(&self) -> Option<ChatMessage> {
        self.queue.lock().await.try_dequeue()
    }

    /// Wait until a message is available and take it
    pub async fn next_message(&self) -> ChatMessage {
        loop {
            if let Some(message) = self.try_dequeue().await {
                return message;
            }
            self.queued.notified().await;
        }
    }

    /// Number of queued messages
    pub async fn pending(&self) -> usize {
        self.queue.lock().await.len()
    }
}
