//! Reference "hello" node for Hurozo.
//!
//! Registers under `ws_hello` (override with `NODE_NAME`), declares one
//! input (`name`) and two outputs, and answers each invocation with:
//!
//! - `greeting` — `Hello {name}`
//! - `shout`    — `HELLO {NAME}`
//!
//! A missing or blank `name` falls back to `"world"`.
//!
//! Usage:
//!   HUROZO_TOKEN=YOUR_TOKEN hurozo-hello-node
//!
//! Env vars:
//!   HUROZO_TOKEN    — API token created in settings (required)
//!   HUROZO_API_URL  — instance origin (default https://app.hurozo.com)
//!   NODE_NAME       — node name (default "ws_hello")

use hurozo_node_sdk::{HandlerError, NodeBuilder, NodeConfig, NodeHandler, NodeIdentity};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

struct GreetingHandler;

#[async_trait::async_trait]
impl NodeHandler for GreetingHandler {
    async fn invoke(&self, inputs: Map<String, Value>) -> Result<Map<String, Value>, HandlerError> {
        let name = display_name(inputs.get("name"));

        let mut outputs = Map::new();
        outputs.insert("greeting".into(), Value::String(format!("Hello {name}")));
        outputs.insert(
            "shout".into(),
            Value::String(format!("HELLO {}", name.to_uppercase())),
        );
        Ok(outputs)
    }
}

/// Coerce the `name` input to a display string, defaulting to `"world"`.
///
/// Strings are trimmed; integral JSON numbers render without a trailing
/// `.0`; anything else blank or absent becomes the fallback.
fn display_name(value: Option<&Value>) -> String {
    let raw = match value {
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(Value::Number(n)) => {
            let rendered = n.to_string();
            rendered.strip_suffix(".0").unwrap_or(&rendered).to_owned()
        }
        _ => String::new(),
    };
    if raw.is_empty() {
        "world".into()
    } else {
        raw
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = NodeConfig::from_env()?;
    let identity = NodeIdentity::from_env("ws_hello", &["name"], &["greeting", "shout"]);
    tracing::info!(node = %identity.name, base_url = %config.base_url, "starting hello node");

    let node = NodeBuilder::new().config(config).identity(identity).build()?;

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            ctrl_c.cancel();
        }
    });

    node.run(GreetingHandler, shutdown).await?;
    Ok(())
}
