//! Transport-facing channel plumbing
//!
//! The broker sees the transport as one shared inbound channel of raw
//! frames plus a directory of per-client outbound channels, addressed by
//! `ChannelRef`. Concrete transports (see `handler`) fill both sides.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::error::TransportError;
use crate::frame::OutboundFrame;
use crate::types::ChannelRef;

/// Producer side of the shared inbound channel (one raw frame per item)
pub type InboundSender = mpsc::Sender<Vec<u8>>;

/// Broker side of the shared inbound channel
pub type InboundReceiver = mpsc::Receiver<Vec<u8>>;

/// Create the shared inbound channel
pub fn inbound_channel(capacity: usize) -> (InboundSender, InboundReceiver) {
    mpsc::channel(capacity)
}

/// Outbound channels published by the transport
///
/// Cloning shares the same directory.
#[derive(Debug, Clone)]
pub struct ChannelDirectory {
    channels: Arc<Mutex<HashMap<ChannelRef, mpsc::Sender<OutboundFrame>>>>,
    next_ref: Arc<AtomicI32>,
}

impl Default for ChannelDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelDirectory {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            next_ref: Arc::new(AtomicI32::new(1)),
        }
    }

    /// Publish a channel under a freshly allocated reference
    pub async fn publish(&self, sender: mpsc::Sender<OutboundFrame>) -> ChannelRef {
        let channel_ref = ChannelRef(self.next_ref.fetch_add(1, Ordering::Relaxed));
        self.insert(channel_ref, sender).await;
        channel_ref
    }

    /// Publish a channel under a reference chosen by the transport
    pub async fn insert(&self, channel_ref: ChannelRef, sender: mpsc::Sender<OutboundFrame>) {
        self.channels.lock().await.insert(channel_ref, sender);
        debug!("Outbound channel {} published", channel_ref);
    }

    /// Open a published channel for writing
    pub async fn open(
        &self,
        channel_ref: ChannelRef,
    ) -> Result<mpsc::Sender<OutboundFrame>, TransportError> {
        self.channels
            .lock()
            .await
            .get(&channel_ref)
            .cloned()
            .ok_or(TransportError::ChannelUnavailable(channel_ref))
    }

    /// Withdraw a channel; already-opened handles stay usable until the
    /// transport drops its receiver
    pub async fn remove(&self, channel_ref: ChannelRef) -> bool {
        self.channels.lock().await.remove(&channel_ref).is_some()
    }

    pub async fn len(&self) -> usize {
        self.channels.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.channels.lock().await.is_empty()
    }
}
