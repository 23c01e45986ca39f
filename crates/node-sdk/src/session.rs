//! Session loop — owns the websocket and the correlation protocol.
//!
//! A single logical loop through four states: waiting for a credential,
//! connecting, connected (serving invocations one at a time), and recovering
//! after a failure.  There is no terminal state; only cancellation exits.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{FutureExt, SinkExt, StreamExt};
use hurozo_protocol::{Credential, Invocation, InvocationResult};
use serde_json::{Map, Value};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::credential::CredentialWatch;
use crate::error::SessionError;
use crate::handler::NodeHandler;

/// Outcome of examining one inbound text frame.
///
/// Malformed frames and frames addressed to other nodes are discarded by
/// explicit branches here, never by a swallowed error.
enum FrameAction {
    Reply(InvocationResult),
    Skip,
}

pub struct SessionLoop {
    node_name: String,
    handler: Arc<dyn NodeHandler>,
    credentials: CredentialWatch,
    recover_delay: Duration,
    keepalive_interval: Duration,
}

impl SessionLoop {
    pub fn new(
        node_name: impl Into<String>,
        handler: Arc<dyn NodeHandler>,
        credentials: CredentialWatch,
        recover_delay: Duration,
        keepalive_interval: Duration,
    ) -> Self {
        Self {
            node_name: node_name.into(),
            handler,
            credentials,
            recover_delay,
            keepalive_interval,
        }
    }

    /// Drive the session until `shutdown` is cancelled (or the credential
    /// cell's writer disappears, which only happens at teardown).
    ///
    /// Each reconnect takes a fresh credential snapshot, so a rotation
    /// performed by the registration client between sessions is picked up
    /// without re-registering.
    pub async fn run(mut self, shutdown: CancellationToken) {
        loop {
            // Waiting for credential.
            let credential = tokio::select! {
                c = self.credentials.wait_ready() => match c {
                    Some(c) => c,
                    None => {
                        tracing::info!(node = %self.node_name, "credential cell closed");
                        return;
                    }
                },
                _ = shutdown.cancelled() => return,
            };

            // Connecting / connected.
            let result = tokio::select! {
                r = self.connect_and_serve(&credential) => r,
                _ = shutdown.cancelled() => return,
            };

            match result {
                Ok(()) => {
                    tracing::info!(node = %self.node_name, "session closed by server");
                }
                Err(e) => {
                    tracing::warn!(node = %self.node_name, error = %e, "session lost");
                }
            }

            // Recovering: fixed delay, then back to the credential wait.
            tokio::select! {
                _ = tokio::time::sleep(self.recover_delay) => {}
                _ = shutdown.cancelled() => return,
            }
        }
    }

    /// One connection lifecycle: connect, then serve frames until the socket
    /// closes (`Ok`) or a transport error occurs (`Err`).
    async fn connect_and_serve(&self, credential: &Credential) -> Result<(), SessionError> {
        let url = credential.connect_url();
        tracing::info!(node = %self.node_name, url = %credential.websocket_url, "connecting");

        let (mut ws, _response) = tokio_tungstenite::connect_async(&url)
            .await
            .map_err(SessionError::Connect)?;

        tracing::info!(node = %self.node_name, "connected, serving invocations");

        let mut keepalive = tokio::time::interval(self.keepalive_interval);
        keepalive.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        keepalive.tick().await; // first tick fires immediately

        loop {
            tokio::select! {
                frame = ws.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        match self.examine(&text).await {
                            FrameAction::Reply(result) => {
                                let json = match serde_json::to_string(&result) {
                                    Ok(j) => j,
                                    Err(e) => {
                                        tracing::error!(error = %e, "failed to serialize result");
                                        continue;
                                    }
                                };
                                ws.send(Message::Text(json)).await.map_err(SessionError::Io)?;
                            }
                            FrameAction::Skip => {}
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    // Binary frames are not part of the protocol; ping/pong
                    // is answered by tungstenite itself.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(SessionError::Io(e)),
                },
                _ = keepalive.tick() => {
                    ws.send(Message::Ping(Vec::new())).await.map_err(SessionError::Io)?;
                }
            }
        }
    }

    /// Decode, filter, and (when the frame is ours) dispatch to the handler.
    async fn examine(&self, text: &str) -> FrameAction {
        let invocation = match serde_json::from_str::<Invocation>(text) {
            Ok(inv) => inv,
            Err(e) => {
                tracing::debug!(error = %e, "discarding undecodable frame");
                return FrameAction::Skip;
            }
        };

        if invocation.node != self.node_name {
            tracing::debug!(target_node = %invocation.node, "discarding frame for another node");
            return FrameAction::Skip;
        }

        let Invocation { node, inputs, uuid } = invocation;
        tracing::debug!(node = %node, uuid = ?uuid, "invocation received");

        // A failing or panicking handler still produces a correlated reply.
        let outputs = match AssertUnwindSafe(self.handler.invoke(inputs)).catch_unwind().await {
            Ok(Ok(outputs)) => outputs,
            Ok(Err(e)) => {
                tracing::warn!(node = %node, error = %e, "handler returned error");
                error_outputs(e.to_string())
            }
            Err(_panic) => {
                tracing::error!(node = %node, "handler panicked");
                error_outputs("handler panicked".into())
            }
        };

        FrameAction::Reply(InvocationResult { node, outputs, uuid })
    }
}

fn error_outputs(message: String) -> Map<String, Value> {
    let mut outputs = Map::new();
    outputs.insert("error".into(), Value::String(message));
    outputs
}
