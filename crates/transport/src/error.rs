use thiserror::Error;

/// Errors surfaced by the Telegram transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level failure, timeout, or undecodable response.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Telegram accepted the request but rejected it (`ok: false`).
    #[error("Telegram error: {0}")]
    Api(String),
}

impl TransportError {
    /// Whether the failure is a network/timeout condition rather than a
    /// platform rejection. Callers treat both the same (log and move on);
    /// logging keeps the distinction.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Http(e) => !e.is_decode(),
            TransportError::Api(_) => false,
        }
    }
}
