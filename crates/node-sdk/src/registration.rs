//! Registration client — periodically trades the node's identity for a
//! websocket credential.

use std::time::Duration;

use hurozo_protocol::{Credential, RegisterRequest, RegisterResponse};
use tokio_util::sync::CancellationToken;

use crate::config::{NodeConfig, NodeIdentity};
use crate::credential::CredentialCell;
use crate::error::{NodeError, RegistrationError};

/// Registers the node with the Hurozo instance on a fixed interval and
/// publishes each credential to the shared [`CredentialCell`].
///
/// Failures never escalate: the previous credential stays in place and the
/// next cycle runs after the same interval.  No backoff, no jitter, no cap
/// on consecutive failures.
pub struct RegistrationClient {
    http: reqwest::Client,
    endpoint: String,
    api_token: String,
    request: RegisterRequest,
    interval: Duration,
    cell: CredentialCell,
}

impl RegistrationClient {
    pub fn new(
        config: &NodeConfig,
        identity: &NodeIdentity,
        cell: CredentialCell,
    ) -> Result<Self, NodeError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| NodeError::Http(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/api/remote_nodes/register", config.base_url),
            api_token: config.api_token.clone(),
            request: identity.to_register_request(),
            interval: config.register_interval,
            cell,
        })
    }

    /// Run registration cycles until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        loop {
            match self.register_once().await {
                Ok(credential) => {
                    tracing::info!(
                        node = %self.request.name,
                        websocket_url = %credential.websocket_url,
                        "registered"
                    );
                    self.cell.publish(credential);
                }
                Err(e) => {
                    tracing::warn!(node = %self.request.name, error = %e, "registration failed");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.cancelled() => return,
            }
        }
    }

    /// One registration call.  Transport failures, non-2xx statuses, and
    /// responses without a usable credential all leave the cell untouched.
    pub async fn register_once(&self) -> Result<Credential, RegistrationError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&self.request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistrationError::Protocol(format!(
                "register returned {status}: {body}"
            )));
        }

        let data: RegisterResponse = response.json().await.map_err(|e| {
            RegistrationError::Protocol(format!("register response not usable: {e}"))
        })?;

        if data.websocket_url.is_empty() || data.token.is_empty() {
            return Err(RegistrationError::Protocol(
                "register response missing websocket_url/token".into(),
            ));
        }

        Ok(data.into())
    }
}
