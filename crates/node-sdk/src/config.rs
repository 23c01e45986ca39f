//! Node configuration and identity, with environment sourcing.

use std::time::Duration;

use hurozo_protocol::RegisterRequest;

use crate::error::NodeError;

/// Public Hurozo instance used when `HUROZO_API_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://app.hurozo.com";

/// Connection settings shared by the registration client and session loop.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Bearer credential for the registration endpoint.
    pub api_token: String,
    /// Registration service origin, without a trailing slash.
    pub base_url: String,
    /// Fixed delay between registration cycles.
    pub register_interval: Duration,
    /// Fixed delay before reconnecting after a session failure.
    pub recover_delay: Duration,
    /// Interval between websocket ping frames on an idle session.
    pub keepalive_interval: Duration,
    /// Ceiling on each registration HTTP call.
    pub http_timeout: Duration,
}

impl NodeConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: DEFAULT_BASE_URL.into(),
            register_interval: Duration::from_secs(60),
            recover_delay: Duration::from_secs(5),
            keepalive_interval: Duration::from_secs(30),
            http_timeout: Duration::from_secs(60),
        }
    }

    /// Source connection settings from the environment.
    ///
    /// * `HUROZO_TOKEN`   — required API token.
    /// * `HUROZO_API_URL` — instance origin (default [`DEFAULT_BASE_URL`]).
    pub fn from_env() -> Result<Self, NodeError> {
        let api_token = std::env::var("HUROZO_TOKEN")
            .map_err(|_| NodeError::Config("HUROZO_TOKEN is not set".into()))?;
        let base_url =
            std::env::var("HUROZO_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let mut config = Self::new(api_token);
        config.base_url = normalize_base_url(&base_url);
        Ok(config)
    }
}

/// The node's declared identity: name plus input/output schema.
/// Set at startup, never mutated.
#[derive(Debug, Clone)]
pub struct NodeIdentity {
    pub name: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl NodeIdentity {
    pub fn new(
        name: impl Into<String>,
        inputs: impl IntoIterator<Item = impl Into<String>>,
        outputs: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
        }
    }

    /// Source identity from `NODE_NAME`, `NODE_INPUTS`, and `NODE_OUTPUTS`
    /// (comma-separated lists), falling back to the given defaults.
    pub fn from_env(
        default_name: &str,
        default_inputs: &[&str],
        default_outputs: &[&str],
    ) -> Self {
        let name = std::env::var("NODE_NAME").unwrap_or_else(|_| default_name.into());
        let inputs = std::env::var("NODE_INPUTS")
            .map(|raw| split_list(&raw))
            .unwrap_or_else(|_| default_inputs.iter().map(|s| s.to_string()).collect());
        let outputs = std::env::var("NODE_OUTPUTS")
            .map(|raw| split_list(&raw))
            .unwrap_or_else(|_| default_outputs.iter().map(|s| s.to_string()).collect());
        Self { name, inputs, outputs }
    }

    pub(crate) fn to_register_request(&self) -> RegisterRequest {
        RegisterRequest {
            name: self.name.clone(),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
        }
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_owned()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
