//! Chat Relay - Entry Point
//!
//! Starts the WebSocket listener and the relay broker, accepting connections
//! until the broker stops on a fatal error.

use std::env;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chat_relay::{handle_connection, inbound_channel, ChannelDirectory, Relay, RelayConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    // Config file from CHAT_RELAY_CONFIG, bind address overridable from the command line
    let mut config = RelayConfig::load()?;
    if let Some(addr) = env::args().nth(1) {
        config = config.with_bind_addr(addr);
    }

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Chat relay listening on {}", config.bind_addr);

    let (inbound_tx, inbound_rx) = inbound_channel(config.inbound_buffer);
    let directory = ChannelDirectory::new();
    let outbound_buffer = config.outbound_buffer;

    let relay = Relay::new(config);
    let state = relay.state();
    let mut relay_task = tokio::spawn(relay.run(inbound_rx, directory.clone()));

    loop {
        tokio::select! {
            joined = &mut relay_task => {
                // The relay only returns on a fatal error
                joined??;
                return Ok(());
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let inbound = inbound_tx.clone();
                    let directory = directory.clone();
                    let state = state.clone();

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, inbound, directory, state, outbound_buffer).await {
                            error!("Connection handler error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}
