//! Builder pattern for constructing a [`Node`].

use std::time::Duration;

use crate::client::Node;
use crate::config::{NodeConfig, NodeIdentity};
use crate::error::NodeError;

/// Fluent builder for [`Node`].
///
/// # Example
///
/// ```rust,no_run
/// # use hurozo_node_sdk::NodeBuilder;
/// let node = NodeBuilder::new()
///     .name("ws_hello")
///     .inputs(["name"])
///     .outputs(["greeting", "shout"])
///     .api_token("secret")
///     .base_url("https://app.hurozo.com")
///     .build()
///     .unwrap();
/// ```
pub struct NodeBuilder {
    config: NodeConfig,
    identity: NodeIdentity,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self {
            config: NodeConfig::new(""),
            identity: NodeIdentity::new("", Vec::<String>::new(), Vec::<String>::new()),
        }
    }

    // ── Bulk setters ─────────────────────────────────────────────────

    /// Set all connection settings at once, typically from
    /// [`NodeConfig::from_env`].
    pub fn config(mut self, config: NodeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the full identity at once, typically from
    /// [`NodeIdentity::from_env`].
    pub fn identity(mut self, identity: NodeIdentity) -> Self {
        self.identity = identity;
        self
    }

    // ── Identity ─────────────────────────────────────────────────────

    /// Set the node name used for registration and inbound filtering.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.identity.name = name.into();
        self
    }

    /// Declare the node's input names, in order.
    pub fn inputs(mut self, inputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.identity.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    /// Declare the node's output names, in order.
    pub fn outputs(mut self, outputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.identity.outputs = outputs.into_iter().map(Into::into).collect();
        self
    }

    // ── Connection ───────────────────────────────────────────────────

    /// Set the registration bearer token (`HUROZO_TOKEN`).
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.config.api_token = token.into();
        self
    }

    /// Set the Hurozo instance origin (`HUROZO_API_URL`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_owned();
        self
    }

    // ── Intervals ────────────────────────────────────────────────────

    /// Override the delay between registration cycles (default 60 s).
    pub fn register_interval(mut self, d: Duration) -> Self {
        self.config.register_interval = d;
        self
    }

    /// Override the post-failure reconnect delay (default 5 s).
    pub fn recover_delay(mut self, d: Duration) -> Self {
        self.config.recover_delay = d;
        self
    }

    /// Override the websocket keepalive ping interval (default 30 s).
    pub fn keepalive_interval(mut self, d: Duration) -> Self {
        self.config.keepalive_interval = d;
        self
    }

    /// Override the registration HTTP timeout ceiling (default 60 s).
    pub fn http_timeout(mut self, d: Duration) -> Self {
        self.config.http_timeout = d;
        self
    }

    /// Build the [`Node`].
    pub fn build(self) -> Result<Node, NodeError> {
        if self.identity.name.is_empty() {
            return Err(NodeError::Config("node name is required".into()));
        }
        if self.config.api_token.is_empty() {
            return Err(NodeError::Config("api_token is required".into()));
        }
        if self.config.base_url.is_empty() {
            return Err(NodeError::Config("base_url is required".into()));
        }

        Ok(Node {
            config: self.config,
            identity: self.identity,
        })
    }
}

impl Default for NodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
