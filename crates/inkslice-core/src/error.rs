//! Error types.

use thiserror::Error;

/// Errors reported by a remote stroke gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Remote stroke log unavailable: {0}")]
    Unavailable(String),
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("Nothing to redo")]
    NothingToRedo,
    #[error("Remote rejected the request: {0}")]
    Rejected(String),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors surfaced to the user by the editing engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A previous change is still round-tripping to the remote log.
    #[error("Please wait for the canvas to refresh before making another change")]
    Busy,
    /// The commit was abandoned; nothing changed locally.
    #[error("Could not save the change: {0}")]
    RemoteAppend(#[source] GatewayError),
    /// Local and remote history may have diverged; both stacks were cleared.
    #[error("Undo/redo history was invalidated: {0}")]
    HistoryDesynchronized(#[source] GatewayError),
    #[error("Nothing to paste: cut a selection first")]
    InvalidPasteTarget,
    #[error("Could not refresh from the remote log: {0}")]
    Resync(#[source] GatewayError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
