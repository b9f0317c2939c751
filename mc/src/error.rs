//! Pipeline errors and their exit codes

use std::error::Error as StdError;
use std::fmt;

use schemakit::{ValidationError, Violation};
use thiserror::Error;

use crate::latch::LatchError;
use crate::reader::ReadError;
use crate::transform::TransformError;

/// Coarse error class, one per exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Runtime,
    Parse,
    Validation,
    Transform,
    Io,
}

impl ErrorCategory {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Runtime => 1,
            Self::Parse => 3,
            Self::Validation => 4,
            Self::Transform => 5,
            Self::Io => 6,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Runtime => "runtime error",
            Self::Parse => "parse error",
            Self::Validation => "validation failed",
            Self::Transform => "transformation failed",
            Self::Io => "i/o error",
        };
        f.write_str(name)
    }
}

/// Any failure of the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Latch(#[from] LatchError),
}

impl PipelineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::Read(ReadError::Io { .. }) => ErrorCategory::Io,
            PipelineError::Read(ReadError::Parse { .. }) => ErrorCategory::Parse,
            PipelineError::Validation(_) => ErrorCategory::Validation,
            PipelineError::Transform(e) if e.is_resolution() => ErrorCategory::Io,
            PipelineError::Transform(_) => ErrorCategory::Transform,
            PipelineError::Latch(_) => ErrorCategory::Runtime,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }

    /// Every failure as `{path, message}` records
    ///
    /// Validation failures keep their paths; everything else becomes one record at the root
    /// carrying the full cause chain.
    pub fn violations(&self) -> Vec<Violation> {
        match self {
            PipelineError::Validation(e) | PipelineError::Transform(TransformError::OutputValidation(e)) => {
                e.violations.clone()
            }
            other => vec![Violation::new(Vec::new(), error_chain(other))],
        }
    }
}

/// `outer: cause: root cause`
pub fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        current = cause.source();
    }
    message
}
