//! Client record definition
//!
//! Represents a registered client with its display name and delivery channel.

use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::frame::OutboundFrame;
use crate::types::{ChannelRef, ClientId};

/// Registered client information
///
/// Created from the first frame an unseen identity sends and never
/// mutated afterwards. Cloning shares the same outbound channel.
#[derive(Debug, Clone)]
pub struct ClientRecord {
    /// Sender identity
    pub id: ClientId,
    /// Name taken from the registration payload
    pub display_name: String,
    /// Transport channel the record was opened from
    pub channel_ref: ChannelRef,
    /// Broker -> client frame channel
    outbound: mpsc::Sender<OutboundFrame>,
}

impl ClientRecord {
    /// Create a new record for an opened outbound channel
    pub fn new(
        id: ClientId,
        display_name: String,
        channel_ref: ChannelRef,
        outbound: mpsc::Sender<OutboundFrame>,
    ) -> Self {
        Self {
            id,
            display_name,
            channel_ref,
            outbound,
        }
    }

    /// Write a frame to this client
    ///
    /// Waits for channel capacity, so a slow recipient stalls the caller.
    /// Returns an error if the channel is closed (client gone).
    pub async fn send(&self, frame: OutboundFrame) -> Result<(), TransportError> {
        self.outbound
            .send(frame)
            .await
            .map_err(|_| TransportError::WriteFailed(self.id))
    }

    /// Check whether the delivery channel has been closed
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode_outbound;

    #[tokio::test]
    async fn test_send_delivers_frame() {
        let (tx, mut rx) = mpsc::channel(4);
        let record = ClientRecord::new(ClientId(1), "Alice".to_string(), ChannelRef(1), tx);

        record.send(encode_outbound(b"hello").unwrap()).await.unwrap();

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.payload(), b"hello");
    }

    #[tokio::test]
    async fn test_send_to_closed_channel_fails() {
        let (tx, rx) = mpsc::channel(4);
        let record = ClientRecord::new(ClientId(2), "Bob".to_string(), ChannelRef(2), tx);
        drop(rx);

        assert!(record.is_closed());
        let err = record.send(encode_outbound(b"x").unwrap()).await.unwrap_err();
        assert_eq!(err, TransportError::WriteFailed(ClientId(2)));
    }
}
