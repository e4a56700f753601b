use dream_formats::{ParamError, ScriptError};
use thiserror::Error;

/// Failures that abort a running cutscene.
#[derive(Debug, Error)]
pub enum CutsceneError {
    #[error("instruction {index}: no drawing named {name:?} is loaded")]
    UnknownDrawing { index: usize, name: String },
    #[error("instruction {index}: unknown button {button:?}")]
    UnknownButton { index: usize, button: String },
    #[error("instruction {index}: {source}")]
    MissingParameter {
        index: usize,
        #[source]
        source: ParamError,
    },
    #[error("instruction {index}: {command} failed")]
    Service {
        index: usize,
        command: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to load cutscene script")]
    Script(#[from] ScriptError),
}

impl CutsceneError {
    /// Index of the instruction that failed, when it came from dispatch.
    pub fn index(&self) -> Option<usize> {
        match self {
            CutsceneError::UnknownDrawing { index, .. }
            | CutsceneError::UnknownButton { index, .. }
            | CutsceneError::MissingParameter { index, .. }
            | CutsceneError::Service { index, .. } => Some(*index),
            CutsceneError::Script(_) => None,
        }
    }
}

/// Attach the instruction index to a parameter lookup.
pub(crate) trait AtInstruction<T> {
    fn at(self, index: usize) -> Result<T, CutsceneError>;
}

impl<T> AtInstruction<T> for Result<T, ParamError> {
    fn at(self, index: usize) -> Result<T, CutsceneError> {
        self.map_err(|source| CutsceneError::MissingParameter { index, source })
    }
}
