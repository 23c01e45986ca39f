//! The handler capability: the one seam between the SDK and node business
//! logic.

use serde_json::{Map, Value};

use crate::error::HandlerError;

/// Implement this trait to answer invocations addressed to your node.
///
/// The session loop invokes the handler serially, one in-flight call per
/// node, with the `inputs` map from each matching frame.  The returned map
/// becomes the frame's `outputs`.  Handlers should be deterministic with
/// respect to their declared inputs; the SDK does not enforce this.
///
/// A returned [`HandlerError`] (or a panic) does not tear down the session:
/// the loop answers with `outputs = {"error": <message>}` under the same
/// correlation id.
///
/// # Example
///
/// ```rust,no_run
/// use hurozo_node_sdk::{HandlerError, NodeHandler};
/// use serde_json::{Map, Value};
///
/// struct Upper;
///
/// #[async_trait::async_trait]
/// impl NodeHandler for Upper {
///     async fn invoke(&self, inputs: Map<String, Value>) -> Result<Map<String, Value>, HandlerError> {
///         let text = inputs.get("text").and_then(Value::as_str).unwrap_or_default();
///         let mut outputs = Map::new();
///         outputs.insert("upper".into(), Value::String(text.to_uppercase()));
///         Ok(outputs)
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait NodeHandler: Send + Sync + 'static {
    /// Map declared input values to declared output values.
    async fn invoke(&self, inputs: Map<String, Value>) -> Result<Map<String, Value>, HandlerError>;
}
