//! Hurozo remote-node protocol: registration exchange and websocket frames.
//!
//! A remote node registers over HTTP to obtain a websocket endpoint plus a
//! session token, then exchanges UTF-8 JSON text frames on that socket.
//! Frames are plain objects (no type tag): the server addresses a node by
//! its registered `node` name and correlates responses via `uuid`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /api/remote_nodes/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Node name, also used for inbound frame filtering.
    pub name: String,
    /// Declared input names, in order.
    pub inputs: Vec<String>,
    /// Declared output names, in order.
    pub outputs: Vec<String>,
}

/// Successful registration response.
///
/// The server may return additional fields; they are ignored here. A response
/// missing either field, or carrying an empty one, is not a usable credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub websocket_url: String,
    pub token: String,
}

/// The `{websocket_url, token}` pair granting session access.
///
/// Obtained via registration, replaced wholesale on every successful cycle,
/// and subject to rotation by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub websocket_url: String,
    pub token: String,
}

impl Credential {
    /// The full connect URL with the token as a query-string credential.
    pub fn connect_url(&self) -> String {
        let sep = if self.websocket_url.contains('?') { "&" } else { "?" };
        format!("{}{}auth={}", self.websocket_url, sep, self.token)
    }
}

impl From<RegisterResponse> for Credential {
    fn from(r: RegisterResponse) -> Self {
        Self {
            websocket_url: r.websocket_url,
            token: r.token,
        }
    }
}

/// Inbound frame: one invocation request.
///
/// `inputs` defaults to empty when absent; `uuid` is optional and must be
/// echoed back verbatim (including absence) in the [`InvocationResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    /// Target node name. Frames for other nodes are discarded.
    pub node: String,
    #[serde(default)]
    pub inputs: Map<String, Value>,
    #[serde(default)]
    pub uuid: Option<String>,
}

/// Outbound frame: the result of one invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationResult {
    /// This node's name.
    pub node: String,
    pub outputs: Map<String, Value>,
    /// Correlation id, copied from the invocation. Serialized as `null`
    /// when the inbound frame carried none.
    pub uuid: Option<String>,
}
