//! Basic type definitions for the relay
//!
//! Provides newtype wrappers for type safety:
//! - `ClientId`: the sender identity carried in every inbound frame
//! - `ChannelRef`: a transport-owned outbound channel reference

/// Unique client identifier (newtype pattern)
///
/// Wraps the 32-bit sender identity a client stamps into its frames
/// (a process id in the classic named-pipe deployment).
/// Ordered so the registry iterates recipients deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(pub i32);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for ClientId {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

/// Outbound channel reference
///
/// Names a per-client delivery channel owned by the transport.
/// The broker resolves it through a `ChannelDirectory` on registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelRef(pub i32);

impl std::fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<i32> for ChannelRef {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}
