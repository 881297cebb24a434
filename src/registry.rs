//! Client registry
//!
//! Maps sender identities to their records. The ingestion loop adds
//! records, the transport removes them when a connection closes, and the
//! broadcast engine reads snapshots.

use std::collections::BTreeMap;

use crate::client::ClientRecord;
use crate::error::RegistryError;
use crate::types::{ChannelRef, ClientId};

/// Registered clients keyed by identity
///
/// Iteration follows ascending identity, so fan-out order is stable.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: BTreeMap<ClientId, ClientRecord>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if an identity has completed registration
    pub fn is_registered(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    /// Add a record
    ///
    /// A second registration for the same identity is rejected and the
    /// existing record is kept.
    pub fn register(&mut self, record: ClientRecord) -> Result<(), RegistryError> {
        if self.clients.contains_key(&record.id) {
            return Err(RegistryError::AlreadyRegistered(record.id));
        }
        self.clients.insert(record.id, record);
        Ok(())
    }

    /// Remove a record, freeing the identity for reuse
    pub fn unregister(&mut self, id: ClientId) -> Option<ClientRecord> {
        self.clients.remove(&id)
    }

    /// Remove every record opened from a transport channel
    ///
    /// Used when the transport reports that the channel is gone.
    pub fn unregister_channel(&mut self, channel_ref: ChannelRef) -> Vec<ClientRecord> {
        let ids: Vec<ClientId> = self
            .clients
            .values()
            .filter(|record| record.channel_ref == channel_ref)
            .map(|record| record.id)
            .collect();

        ids.into_iter()
            .filter_map(|id| self.clients.remove(&id))
            .collect()
    }

    /// Get the record for an identity
    pub fn lookup(&self, id: ClientId) -> Result<&ClientRecord, RegistryError> {
        self.clients.get(&id).ok_or(RegistryError::NotFound(id))
    }

    /// Snapshot every record except the given identity
    ///
    /// Clients registered after the call are not part of the snapshot.
    pub fn all_except(&self, id: ClientId) -> Vec<ClientRecord> {
        self.clients
            .values()
            .filter(|record| record.id != id)
            .cloned()
            .collect()
    }

    /// Number of registered clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Check if no client is registered
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
