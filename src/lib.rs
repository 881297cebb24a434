//! Fixed-Frame Chat Relay Library
//!
//! A broker that lets many clients register under a display name and
//! rebroadcasts every chat line to all other registered clients.
//!
//! # Features
//! - Fixed-size binary frame codec (payloads copied verbatim)
//! - Client registry keyed by sender identity
//! - Single global FIFO delivery queue
//! - Fan-out broadcast excluding the sender
//! - WebSocket transport adapter
//!
//! # Architecture
//! Two tasks share one `RelayState` (registry + queue, each behind its own lock):
//! - `IngestionLoop` reads inbound frames, registers unseen senders and
//!   queues chat lines from known ones
//! - `BroadcastEngine` takes one message at a time and writes it to every
//!   other client's outbound channel
//! - `Relay` supervises both and returns the first fatal error
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use chat_relay::{handle_connection, inbound_channel, ChannelDirectory, Relay, RelayConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     let (inbound_tx, inbound_rx) = inbound_channel(256);
//!     let directory = ChannelDirectory::new();
//!
//!     let relay = Relay::new(RelayConfig::default());
//!     let state = relay.state();
//!     tokio::spawn(relay.run(inbound_rx, directory.clone()));
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         tokio::spawn(handle_connection(stream, inbound_tx.clone(), directory.clone(), state.clone(), 32));
//!     }
//! }
//! ```

pub mod broadcast;
pub mod client;
pub mod config;
pub mod error;
pub mod frame;
pub mod handler;
pub mod ingest;
pub mod queue;
pub mod registry;
pub mod server;
pub mod state;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use broadcast::{BroadcastEngine, BroadcastReport};
pub use client::ClientRecord;
pub use config::{Activation, DeliveryPolicy, RelayConfig};
pub use error::{
    BroadcastError, ConnectionError, DecodeError, EncodeError, RegistryError, RelayError,
    TransportError,
};
pub use frame::{
    decode_inbound, decode_outbound, encode_outbound, render_broadcast, InboundFrame,
    OutboundFrame, MAX_PAYLOAD,
};
pub use handler::handle_connection;
pub use ingest::{Ingested, IngestionLoop};
pub use queue::{ChatMessage, DeliveryQueue};
pub use registry::ClientRegistry;
pub use server::Relay;
pub use state::{RelayState, SharedRelayState};
pub use transport::{inbound_channel, ChannelDirectory, InboundReceiver, InboundSender};
pub use types::{ChannelRef, ClientId};
