//! Broadcast engine
//!
//! Drains the delivery queue one message at a time and fans each one out to
//! every registered client except its sender. A message is fully delivered
//! (every recipient write awaited) before the next one is taken.

use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::{Activation, DeliveryPolicy};
use crate::error::{BroadcastError, TransportError};
use crate::frame::{encode_outbound, render_broadcast};
use crate::queue::ChatMessage;
use crate::state::SharedRelayState;
use crate::types::ClientId;

/// Result of one broadcast pass
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients that accepted the frame
    pub delivered: usize,
    /// Recipients skipped under `DeliveryPolicy::Continue`
    pub failed: Vec<ClientId>,
}

/// The outbound side of the broker
pub struct BroadcastEngine {
    state: SharedRelayState,
    activation: Activation,
    policy: DeliveryPolicy,
}

impl BroadcastEngine {
    pub fn new(state: SharedRelayState, activation: Activation, policy: DeliveryPolicy) -> Self {
        Self {
            state,
            activation,
            policy,
        }
    }

    /// Run until a broadcast pass fails
    pub async fn run(self) -> Result<(), BroadcastError> {
        info!(
            "Broadcast engine started ({:?}, {:?})",
            self.activation, self.policy
        );

        match self.activation.poll_interval() {
            None => loop {
                let message = self.state.next_message().await;
                self.deliver(&message).await?;
            },
            Some(period) => {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if let Some(message) = self.state.try_dequeue().await {
                        self.deliver(&message).await?;
                    }
                }
            }
        }
    }

    async fn deliver(&self, message: &ChatMessage) -> Result<(), BroadcastError> {
        match self.broadcast_one(message).await {
            Ok(report) => {
                debug!(
                    "Broadcast from client {} reached {} recipient(s)",
                    message.sender, report.delivered
                );
                Ok(())
            }
            Err(e) => {
                error!("Broadcast from client {} aborted: {}", message.sender, e);
                Err(e)
            }
        }
    }

    /// Perform a single broadcast pass
    ///
    /// Recipients are the registrants at the time of the call. Under
    /// `FailFast` a closed recipient channel aborts the pass before any
    /// frame is written; a write that fails mid-pass aborts the rest.
    pub async fn broadcast_one(&self, message: &ChatMessage) -> Result<BroadcastReport, BroadcastError> {
        let line = render_broadcast(&message.sender_name, &message.text);
        let frame = encode_outbound(&line)?;
        let recipients = self.state.all_except(message.sender).await;

        if self.policy == DeliveryPolicy::FailFast {
            if let Some(closed) = recipients.iter().find(|r| r.is_closed()) {
                return Err(TransportError::WriteFailed(closed.id).into());
            }
        }

        let mut report = BroadcastReport::default();
        for recipient in &recipients {
            match recipient.send(frame.clone()).await {
                Ok(()) => report.delivered += 1,
                Err(e) if self.policy == DeliveryPolicy::FailFast => return Err(e.into()),
                Err(e) => {
                    warn!("Skipping {} ({}): {}", recipient.display_name, recipient.id, e);
                    report.failed.push(recipient.id);
                }
            }
        }

        Ok(report)
    }
}
