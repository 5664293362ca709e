//! Playback errors shared by the task queue, the players and the backends.

/// Errors surfaced by player operations.
///
/// `Clone` because a single queue cycle result is handed to every caller
/// awaiting that cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayerError {
    #[error("media backend rejected {operation}: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },

    #[error("failed to create temporary resource handle: {0}")]
    Resource(String),

    #[error("fallback backend is unavailable: {0}")]
    FallbackUnavailable(String),

    #[error("player has been disposed")]
    Disposed,
}

impl PlayerError {
    pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlayerError>;
