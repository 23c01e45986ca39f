//! Error taxonomy: registration, session, handler, and top-level SDK errors.

/// A registration cycle failure.  Never fatal: the client logs it and tries
/// again on the next fixed-interval cycle.
#[derive(thiserror::Error, Debug)]
pub enum RegistrationError {
    /// Network-level failure (connect, TLS, timeout).
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered, but not with a usable credential
    /// (non-2xx status, or a body missing `websocket_url`/`token`).
    #[error("protocol: {0}")]
    Protocol(String),
}

/// A session failure.  Drops the loop into its recovery delay; in-flight
/// correlation is lost, there is no redelivery.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("connect: {0}")]
    Connect(tokio_tungstenite::tungstenite::Error),

    #[error("io: {0}")]
    Io(tokio_tungstenite::tungstenite::Error),
}

/// Errors a handler can return.
///
/// The session loop translates these into an error-shaped result frame
/// (`outputs = {"error": <message>}`) carrying the original correlation id;
/// the session itself stays up.
#[derive(thiserror::Error, Debug, Clone)]
pub enum HandlerError {
    #[error("invalid_inputs: {0}")]
    InvalidInputs(String),
    #[error("failed: {0}")]
    Failed(String),
}

/// Top-level SDK error.
#[derive(thiserror::Error, Debug)]
pub enum NodeError {
    #[error("config: {0}")]
    Config(String),
    #[error("http: {0}")]
    Http(String),
}
