//! Error taxonomy for the client core. Nothing here is fatal to the process:
//! connection errors retry, decode errors drop the frame, fetch errors keep
//! the last good snapshot.

use thiserror::Error;

/// Transport-level failure on a push stream. Transient by definition: the
/// supervisor closes the transport and retries on a fixed delay.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid endpoint: {0}")]
    Endpoint(String),
}

/// A frame that did not decode. The frame is dropped and the stream stays open.
#[derive(Debug, Error)]
#[error("undecodable frame: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// A log or list fetch failed. The previous snapshot is kept and shown as
/// stale rather than cleared.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("daemon rejected the request: {0}")]
    Status(reqwest::StatusCode),
}

/// A lifecycle action request failed. Surfaced to the caller as a no-op;
/// retrying is manual, never automatic.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("daemon refused the action: {0}")]
    Refused(reqwest::StatusCode),
}

/// A version string that is not `[v]major.minor.patch`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed version string {input:?}")]
pub struct VersionParseError {
    pub input: String,
}
