//! WebSocket transport adapter
//!
//! Carries fixed-size frames over WebSocket binary messages. Each connection
//! gets its own outbound channel, published in the `ChannelDirectory`; every
//! inbound binary message is one raw client frame, stamped with that
//! connection's `ChannelRef` before it is handed to the relay.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::error::ConnectionError;
use crate::frame::{stamp_channel_ref, OutboundFrame};
use crate::state::SharedRelayState;
use crate::transport::{ChannelDirectory, InboundSender};

/// Handle a new TCP connection
///
/// Performs the WebSocket handshake, then pumps frames both ways until
/// either side closes. On exit the connection's outbound channel is
/// withdrawn from the directory and closed, and every client registered
/// through it is unregistered so its identity can join again.
pub async fn handle_connection(
    stream: TcpStream,
    inbound: InboundSender,
    directory: ChannelDirectory,
    state: SharedRelayState,
    outbound_buffer: usize,
) -> Result<(), ConnectionError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    // WebSocket handshake
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Outbound channel for relay -> client frames
    let (frame_tx, mut frame_rx) = mpsc::channel::<OutboundFrame>(outbound_buffer);
    let channel_ref = directory.publish(frame_tx).await;
    info!("Connection {} from {} opened", channel_ref, peer_addr);

    // Read task (WebSocket -> relay)
    let mut read_task = tokio::spawn(async move {
        while let Some(msg_result) = ws_receiver.next().await {
            match msg_result {
                Ok(Message::Binary(data)) => {
                    let mut raw = data.to_vec();
                    stamp_channel_ref(&mut raw, channel_ref);
                    if inbound.send(raw).await.is_err() {
                        return Err(ConnectionError::InboundClosed);
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("Connection {} sent close frame", channel_ref);
                    break;
                }
                Ok(Message::Text(_)) => {
                    warn!("Ignoring text message on connection {}", channel_ref);
                }
                Ok(_) => {
                    // Ping/Pong are answered by tungstenite
                }
                Err(e) => return Err(ConnectionError::WebSocket(e)),
            }
        }
        Ok(())
    });

    // Write task (relay -> WebSocket)
    let mut write_task = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            if ws_sender.send(Message::Binary(frame.to_bytes().into())).await.is_err() {
                debug!("WebSocket send failed, ending write task");
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    // Wait for either side to finish, then tear both down so the
    // outbound receiver is dropped and later writes fail.
    let result = tokio::select! {
        joined = &mut read_task => {
            write_task.abort();
            read_outcome(joined)
        }
        _ = &mut write_task => {
            read_task.abort();
            Ok(())
        }
    };

    // Withdraw the channel first so a registration still in flight for
    // this connection is refused instead of outliving it.
    directory.remove(channel_ref).await;
    for record in state.unregister_channel(channel_ref).await {
        info!("{} was unregistered (client {})", record.display_name, record.id);
    }
    info!("Connection {} from {} closed", channel_ref, peer_addr);

    result
}

/// Flatten the read task's result, keeping a panic as an error
fn read_outcome(joined: Result<Result<(), ConnectionError>, JoinError>) -> Result<(), ConnectionError> {
    joined.map_err(ConnectionError::from).and_then(|read| read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::frame::{decode_outbound, InboundFrame, OutboundFrame};
    use crate::server::Relay;
    use crate::transport::inbound_channel;
    use crate::types::{ChannelRef, ClientId};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    type ClientSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

    struct TestRelay {
        url: String,
        directory: ChannelDirectory,
        state: SharedRelayState,
        tasks: Vec<JoinHandle<()>>,
    }

    impl TestRelay {
        async fn start() -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = format!("ws://{}", listener.local_addr().unwrap());

            let directory = ChannelDirectory::new();
            let (inbound, rx) = inbound_channel(16);
            let relay = Relay::new(RelayConfig::default());
            let state = relay.state();
            let relay_task = tokio::spawn({
                let directory = directory.clone();
                async move {
                    let _ = relay.run(rx, directory).await;
                }
            });

            let accept_task = tokio::spawn({
                let directory = directory.clone();
                let state = state.clone();
                async move {
                    loop {
                        let (stream, _) = listener.accept().await.unwrap();
                        tokio::spawn(handle_connection(
                            stream,
                            inbound.clone(),
                            directory.clone(),
                            state.clone(),
                            8,
                        ));
                    }
                }
            });

            Self {
                url,
                directory,
                state,
                tasks: vec![relay_task, accept_task],
            }
        }

        async fn connect(&self) -> ClientSocket {
            connect_async(self.url.as_str()).await.unwrap().0
        }
    }

    impl Drop for TestRelay {
        fn drop(&mut self) {
            for task in &self.tasks {
                task.abort();
            }
        }
    }

    fn request(sender: i32, payload: &str) -> Message {
        let frame = InboundFrame::new(ClientId(sender), ChannelRef(0), payload.as_bytes()).unwrap();
        Message::Binary(frame.to_bytes().into())
    }

    async fn next_delivery(socket: &mut ClientSocket) -> OutboundFrame {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                match socket.next().await {
                    Some(Ok(Message::Binary(data))) => return decode_outbound(&data).unwrap(),
                    Some(_) => continue,
                    None => panic!("connection closed before delivery"),
                }
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_frames_round_trip_over_websocket() {
        let relay = TestRelay::start().await;
        let mut alice = relay.connect().await;
        let mut bob = relay.connect().await;

        alice.send(request(1, "Alice")).await.unwrap();
        bob.send(request(2, "Bob")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        alice.send(request(1, "hi 100%")).await.unwrap();

        assert_eq!(next_delivery(&mut bob).await.text(), "Alice : hi 100%;");
        assert_eq!(relay.directory.len().await, 2);
    }

    #[tokio::test]
    async fn test_closed_connection_frees_identity_for_reconnect() {
        let relay = TestRelay::start().await;
        let mut alice = relay.connect().await;
        let mut bob = relay.connect().await;

        alice.send(request(1, "Alice")).await.unwrap();
        bob.send(request(2, "Bob")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(relay.state.client_count().await, 2);

        bob.close(None).await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), async {
            while relay.state.is_registered(ClientId(2)).await {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(relay.state.client_count().await, 1);
        assert_eq!(relay.directory.len().await, 1);

        // Same identity on a fresh connection registers again
        let mut bob = relay.connect().await;
        bob.send(request(2, "Bob")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(relay.state.is_registered(ClientId(2)).await);

        alice.send(request(1, "welcome back")).await.unwrap();
        assert_eq!(next_delivery(&mut bob).await.text(), "Alice : welcome back;");

        // The re-registration was not relayed as chat
        let stray = tokio::time::timeout(Duration::from_millis(100), alice.next()).await;
        assert!(stray.is_err());
    }

    #[tokio::test]
    async fn test_read_task_panic_is_reported() {
        let joined = tokio::spawn(async {
            if true {
                panic!("read pump failed");
            }
            Ok::<(), ConnectionError>(())
        })
        .await;

        assert!(matches!(read_outcome(joined), Err(ConnectionError::Task(_))));
        assert!(read_outcome(Ok(Err(ConnectionError::InboundClosed))).is_err());
        assert!(read_outcome(Ok(Ok(()))).is_ok());
    }
}
