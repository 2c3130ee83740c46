//! Coach core error types.

use thiserror::Error;

use crate::inference::InferenceError;

use super::activity::CallKind;
use super::types::Mode;

/// Errors surfaced by the coordinator and the types it owns.
#[derive(Debug, Error)]
pub enum CoachError {
    /// Blank chat input.
    #[error("message is empty")]
    EmptyMessage,

    /// A call of the same kind is already in flight for this coordinator.
    #[error("a {operation} call is already in flight")]
    Busy { operation: CallKind },

    /// The action is only valid in another mode.
    #[error("action requires {expected:?} mode, current mode is {actual:?}")]
    WrongMode { expected: Mode, actual: Mode },

    /// No plan document is available.
    #[error("no plan has been generated")]
    NoPlan,

    /// Plan parameters failed validation.
    #[error("invalid plan parameters: {reason}")]
    InvalidParameters { reason: String },

    /// Rendering or writing a plan artifact failed.
    #[error("render error: {reason}")]
    Render { reason: String },

    /// Generation service failure that was not absorbed by the coordinator.
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl From<std::io::Error> for CoachError {
    fn from(e: std::io::Error) -> Self {
        CoachError::Render {
            reason: e.to_string(),
        }
    }
}
