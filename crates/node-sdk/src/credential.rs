//! Single-slot credential cell shared by the registration client and the
//! session loop.
//!
//! Built on `tokio::sync::watch`: the registration client replaces the slot
//! wholesale (url and token always move together), the session loop takes
//! snapshots on reconnect and suspends until the slot is first populated.

use hurozo_protocol::Credential;
use tokio::sync::watch;

/// Writer half, owned by the registration client.
#[derive(Debug)]
pub struct CredentialCell {
    tx: watch::Sender<Option<Credential>>,
}

impl CredentialCell {
    /// Create an empty cell.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Replace the slot with a fresh credential.
    pub fn publish(&self, credential: Credential) {
        self.tx.send_replace(Some(credential));
    }

    /// Create a reader half.
    pub fn watch(&self) -> CredentialWatch {
        CredentialWatch {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for CredentialCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader half, held by the session loop.
#[derive(Debug, Clone)]
pub struct CredentialWatch {
    rx: watch::Receiver<Option<Credential>>,
}

impl CredentialWatch {
    /// The latest credential, if any.  Always a consistent pair: the cell is
    /// only ever replaced wholesale.
    pub fn snapshot(&self) -> Option<Credential> {
        self.rx.borrow().clone()
    }

    /// Suspend until the cell holds a credential, then return it.
    ///
    /// Returns `None` if the writer half was dropped while the cell was
    /// still empty.
    pub async fn wait_ready(&mut self) -> Option<Credential> {
        match self.rx.wait_for(Option::is_some).await {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        }
    }
}
