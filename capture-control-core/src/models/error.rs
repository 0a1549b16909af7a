use thiserror::Error;

/// Message carried by [`CaptureError::NotInitialized`]. Callers match on it.
pub const NOT_INITIALIZED_MESSAGE: &str = "engine not initialized";

/// Errors returned by the capture control plane.
///
/// Every variant belongs to one [`ErrorKind`], so callers can branch on the
/// class of failure without matching each variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("engine not initialized")]
    NotInitialized,

    #[error("engine already initialized")]
    AlreadyInitialized,

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("unknown source: {0}")]
    UnknownSource(String),

    #[error("unknown source type: {0}")]
    UnknownSourceType(String),

    #[error("source not in scene: {0}")]
    NotInScene(String),

    #[error("unknown encoder: {0}")]
    UnknownEncoder(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("engine error: {0}")]
    Engine(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Coarse classification of a [`CaptureError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The operation was issued in the wrong session or recording state.
    Precondition,
    /// The input was malformed. No state was changed.
    Validation,
    /// The engine itself failed.
    Engine,
    /// Reading or writing files failed.
    Storage,
}

impl CaptureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInitialized | Self::AlreadyInitialized | Self::InvalidState(_) => {
                ErrorKind::Precondition
            }
            Self::UnknownSource(_)
            | Self::UnknownSourceType(_)
            | Self::NotInScene(_)
            | Self::UnknownEncoder(_)
            | Self::InvalidArgument(_)
            | Self::ConfigurationFailed(_) => ErrorKind::Validation,
            Self::Engine(_) => ErrorKind::Engine,
            Self::StorageError(_) => ErrorKind::Storage,
        }
    }

    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::UnknownSource(_) => "UNKNOWN_SOURCE",
            Self::UnknownSourceType(_) => "UNKNOWN_SOURCE_TYPE",
            Self::NotInScene(_) => "NOT_IN_SCENE",
            Self::UnknownEncoder(_) => "UNKNOWN_ENCODER",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::ConfigurationFailed(_) => "CONFIGURATION_FAILED",
            Self::Engine(_) => "ENGINE_ERROR",
            Self::StorageError(_) => "STORAGE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_initialized_message_is_stable() {
        assert_eq!(CaptureError::NotInitialized.to_string(), NOT_INITIALIZED_MESSAGE);
        assert_eq!(CaptureError::NotInitialized.code(), "NOT_INITIALIZED");
    }

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            CaptureError::InvalidState("recording".into()).kind(),
            ErrorKind::Precondition
        );
        assert_eq!(CaptureError::UnknownSource("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(CaptureError::Engine("boom".into()).kind(), ErrorKind::Engine);
        assert_eq!(CaptureError::StorageError("disk".into()).kind(), ErrorKind::Storage);
    }
}
