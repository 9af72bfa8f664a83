use std::path::PathBuf;
use thiserror::Error;

use crate::wire::Stage;

#[derive(Error, Debug)]
pub enum GenError {
    #[error("could not parse file plan ({reason}); raw reply was:\n{raw}")]
    PlanParse { raw: String, reason: String },

    #[error("completion failed during {stage}: {message}")]
    Completion { stage: Stage, message: String },

    #[error("write skipped for {path}: {reason}")]
    WriteSkipped { path: String, reason: String },

    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to reset {}: not a dedicated target directory", path.display())]
    UnsafeReset { path: PathBuf },
}

impl GenError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenError::Io { path: path.into(), source }
    }

    /// True for errors that end the whole run rather than a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GenError::PlanParse { .. }
                | GenError::Completion { stage: Stage::Plan | Stage::Dependencies, .. }
                | GenError::UnsafeReset { .. }
                | GenError::Io { .. }
        )
    }
}

pub type GenResult<T> = Result<T, GenError>;
