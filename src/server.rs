//! Relay supervisor
//!
//! Owns the shared state and runs the two broker tasks side by side:
//! the ingestion loop and the broadcast engine. Neither task stops on its
//! own; the first one to fail ends the relay and its error is handed back
//! to the caller, which decides whether the process exits.

use tracing::{error, info};

use crate::broadcast::BroadcastEngine;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::ingest::IngestionLoop;
use crate::state::{RelayState, SharedRelayState};
use crate::transport::{ChannelDirectory, InboundReceiver};

/// The message relay broker
pub struct Relay {
    config: RelayConfig,
    state: SharedRelayState,
}

impl Relay {
    /// Create a relay with empty registry and queue
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            state: RelayState::shared(),
        }
    }

    /// Handle to the shared registry and queue
    pub fn state(&self) -> SharedRelayState {
        self.state.clone()
    }

    /// Run both broker tasks until one of them fails
    ///
    /// An invalid configuration is rejected before any task starts.
    pub async fn run(self, inbound: InboundReceiver, directory: ChannelDirectory) -> Result<(), RelayError> {
        self.config.validate()?;

        let ingestion = IngestionLoop::new(self.state.clone(), directory, inbound);
        let engine = BroadcastEngine::new(
            self.state.clone(),
            self.config.activation,
            self.config.delivery,
        );

        let mut ingestion_task = tokio::spawn(ingestion.run());
        let mut broadcast_task = tokio::spawn(engine.run());
        info!("Relay started");

        let result = tokio::select! {
            joined = &mut ingestion_task => {
                broadcast_task.abort();
                joined?.map_err(RelayError::Ingestion)
            }
            joined = &mut broadcast_task => {
                ingestion_task.abort();
                joined?.map_err(RelayError::from)
            }
        };

        if let Err(e) = &result {
            error!("Relay stopped: {}", e);
        }
        result
    }
}
