//! `hurozo-node-sdk` — Reusable SDK for building Hurozo remote nodes.
//!
//! A "remote node" is any process that registers with a Hurozo instance over
//! HTTP, receives invocation requests on a websocket session, and answers
//! them with correlated results.  This crate provides the building blocks so
//! node authors don't need to re-implement registration, credential handling,
//! reconnection, or the correlation protocol.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Your Node (CLI / daemon / embedded)                        │
//! │                                                             │
//! │   NodeBuilder::new()                                        │
//! │       .name("ws_hello")                                     │
//! │       .inputs(["name"])                                     │
//! │       .outputs(["greeting", "shout"])                       │
//! │       .api_token("secret")                                  │
//! │       .build()?                                             │
//! │       .run(MyHandler, shutdown)                             │
//! │       .await;                                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Runtime shape (hard-coded by the SDK)
//!
//! Two cooperating tasks share one [`CredentialCell`]:
//!
//! 1. The [`RegistrationClient`] POSTs the node's identity to
//!    `/api/remote_nodes/register` on a fixed interval (default 60 s) and
//!    publishes each returned `{websocket_url, token}` pair wholesale.
//!    Failures are logged and tolerated forever; the cell keeps its last
//!    good value.
//! 2. The [`SessionLoop`] waits for a credential, connects to
//!    `<websocket_url>?auth=<token>`, and serves invocations one at a time:
//!    frames addressed to other nodes or that fail to decode are discarded,
//!    matching frames are dispatched to your [`NodeHandler`] and answered
//!    with the inbound `uuid` echoed verbatim.  On any transport error the
//!    loop waits a fixed delay (default 5 s) and reconnects with a fresh
//!    credential snapshot, without re-registering.
//!
//! Decoupling the two loops means a credential rotation or a transient
//! registration outage never interrupts an already-open, still-valid session.

pub mod builder;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod handler;
pub mod registration;
pub mod session;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use builder::NodeBuilder;
pub use client::Node;
pub use config::{NodeConfig, NodeIdentity, DEFAULT_BASE_URL};
pub use credential::{CredentialCell, CredentialWatch};
pub use error::{HandlerError, NodeError, RegistrationError, SessionError};
pub use handler::NodeHandler;
pub use registration::RegistrationClient;
pub use session::SessionLoop;

// Re-export protocol types so nodes never need to import hurozo-protocol
// directly.
pub use hurozo_protocol::{Credential, Invocation, InvocationResult, RegisterRequest};
