//! Error types for the relay
//!
//! One enum per concern, rolled up into `RelayError` for the supervisor.
//! Decode and registry errors are recovered where they occur; transport
//! errors always escape and stop the task that hit them.

use thiserror::Error;

use crate::types::{ChannelRef, ClientId};

/// Inbound frame decoding errors (frame rejected, ingestion continues)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Raw frame is not exactly one fixed-size record
    #[error("Frame length {actual} does not match expected {expected}")]
    Length { expected: usize, actual: usize },

    /// Declared payload size is negative
    #[error("Negative payload size: {0}")]
    NegativeSize(i32),
}

/// Outbound frame encoding errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// Payload does not fit in a frame
    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

/// Client registry errors (recovered locally)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The identity already has a record
    #[error("Client {0} is already registered")]
    AlreadyRegistered(ClientId),

    /// No record for the identity
    #[error("Client {0} not found")]
    NotFound(ClientId),
}

/// Transport errors (fatal to the owning task)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The shared inbound channel can no longer be read
    #[error("Inbound read failed: {0}")]
    ReadFailed(String),

    /// A recipient's outbound channel rejected a frame
    #[error("Write to client {0} failed: channel closed")]
    WriteFailed(ClientId),

    /// The declared outbound channel does not exist
    #[error("Outbound channel {0} is not available")]
    ChannelUnavailable(ChannelRef),
}

/// Broadcast pass errors
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// Rendered line could not be framed
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// A recipient write failed (aborts the pass)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// WebSocket connection errors (end that connection only)
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// WebSocket protocol error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The relay no longer accepts inbound frames
    #[error("Inbound channel closed")]
    InboundClosed,

    /// A connection pump task panicked
    #[error("Connection task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Top-level relay errors surfaced to the supervisor
#[derive(Debug, Error)]
pub enum RelayError {
    /// The ingestion loop stopped on a transport error
    #[error("Ingestion stopped: {0}")]
    Ingestion(TransportError),

    /// The broadcast engine stopped on a failed pass
    #[error("Broadcast stopped: {0}")]
    Broadcast(#[from] BroadcastError),

    /// A relay task panicked or was cancelled
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error (config file, listener)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
