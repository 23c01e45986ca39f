//! The node front door — wires the registration client and session loop to
//! one credential cell and runs them.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::builder::NodeBuilder;
use crate::config::{NodeConfig, NodeIdentity};
use crate::credential::CredentialCell;
use crate::error::NodeError;
use crate::handler::NodeHandler;
use crate::registration::RegistrationClient;
use crate::session::SessionLoop;

/// A fully-configured remote node, ready to run.
///
/// Create via [`NodeBuilder`].
pub struct Node {
    pub(crate) config: NodeConfig,
    pub(crate) identity: NodeIdentity,
}

impl Node {
    /// Start a new builder.
    pub fn builder() -> NodeBuilder {
        NodeBuilder::new()
    }

    /// Run the node: the registration client on its own task, the session
    /// loop on the current one, coupled only through the credential cell.
    ///
    /// Returns when `shutdown` is cancelled.  Registration failures and
    /// session drops are tolerated indefinitely; there is no other exit.
    pub async fn run(
        self,
        handler: impl NodeHandler,
        shutdown: CancellationToken,
    ) -> Result<(), NodeError> {
        let cell = CredentialCell::new();
        let watch = cell.watch();

        let registration = RegistrationClient::new(&self.config, &self.identity, cell)?;
        let registration_task = tokio::spawn(registration.run(shutdown.clone()));

        let handler: Arc<dyn NodeHandler> = Arc::new(handler);
        let session = SessionLoop::new(
            self.identity.name.clone(),
            handler,
            watch,
            self.config.recover_delay,
            self.config.keepalive_interval,
        );
        session.run(shutdown).await;

        registration_task.abort();
        tracing::info!(node = %self.identity.name, "node stopped");
        Ok(())
    }

    /// Same as [`run`](Self::run), but on a spawned task, returning its
    /// `JoinHandle` for embedding in other runtimes.
    pub fn spawn(
        self,
        handler: impl NodeHandler,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<Result<(), NodeError>> {
        tokio::spawn(async move { self.run(handler, shutdown).await })
    }
}
