//! Ingestion loop
//!
//! Reads raw inbound frames, registers unseen senders and queues chat
//! lines from known ones. Only a failed inbound read stops the loop;
//! malformed frames and unroutable registrations are logged and skipped.

use tracing::{debug, error, info, warn};

use crate::client::ClientRecord;
use crate::error::{DecodeError, TransportError};
use crate::frame::{decode_inbound, InboundFrame};
use crate::queue::ChatMessage;
use crate::state::SharedRelayState;
use crate::transport::{ChannelDirectory, InboundReceiver};
use crate::types::{ChannelRef, ClientId};

/// Outcome of handling one inbound frame
#[derive(Debug, PartialEq, Eq)]
pub enum Ingested {
    /// First frame from the sender; it is now registered
    Registered(ClientId),
    /// Chat line from a registered sender was queued
    Enqueued(ClientId),
    /// Frame could not be decoded and was dropped
    Malformed(DecodeError),
    /// Registration refused: the declared outbound channel does not exist
    ChannelUnavailable(ChannelRef),
    /// Registration raced with an existing record and was ignored
    Duplicate(ClientId),
}

/// The inbound side of the broker
pub struct IngestionLoop {
    state: SharedRelayState,
    directory: ChannelDirectory,
    inbound: InboundReceiver,
}

impl IngestionLoop {
    pub fn new(state: SharedRelayState, directory: ChannelDirectory, inbound: InboundReceiver) -> Self {
        Self {
            state,
            directory,
            inbound,
        }
    }

    /// Run until the inbound channel fails
    ///
    /// Waiting for a frame is not an error. The channel closing (every
    /// producer gone) is a read failure and ends the loop.
    pub async fn run(mut self) -> Result<(), TransportError> {
        info!("Ingestion loop started");

        while let Some(raw) = self.inbound.recv().await {
            self.handle_frame(&raw).await;
        }

        error!("Inbound channel closed, stopping ingestion");
        Err(TransportError::ReadFailed("inbound channel closed".to_string()))
    }

    /// Process a single raw frame
    pub async fn handle_frame(&self, raw: &[u8]) -> Ingested {
        let frame = match decode_inbound(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping inbound frame: {}", e);
                return Ingested::Malformed(e);
            }
        };

        match self.state.lookup(frame.sender).await {
            Ok(record) => self.accept_message(&record, &frame).await,
            Err(_) => self.register(&frame).await,
        }
    }

    async fn accept_message(&self, record: &ClientRecord, frame: &InboundFrame) -> Ingested {
        let message = ChatMessage::new(record.id, record.display_name.clone(), frame.payload());
        self.state.enqueue(message).await;

        debug!(
            "Queued {} bytes from client {} ({})",
            frame.payload_size(), record.id, record.display_name
        );
        Ingested::Enqueued(record.id)
    }

    async fn register(&self, frame: &InboundFrame) -> Ingested {
        let outbound = match self.directory.open(frame.channel_ref).await {
            Ok(outbound) => outbound,
            Err(e) => {
                warn!("Cannot register client {}: {}", frame.sender, e);
                return Ingested::ChannelUnavailable(frame.channel_ref);
            }
        };

        let display_name = String::from_utf8_lossy(frame.payload()).into_owned();
        let record = ClientRecord::new(frame.sender, display_name.clone(), frame.channel_ref, outbound);

        match self.state.register(record).await {
            Ok(()) => {
                info!("{} was registered (client {})", display_name, frame.sender);
                Ingested::Registered(frame.sender)
            }
            Err(e) => {
                debug!("Ignoring registration: {}", e);
                Ingested::Duplicate(frame.sender)
            }
        }
    }
}
