//! Error types for pipeline construction and execution.

use camino::Utf8PathBuf;
use mxp_numeric::MatrixError;
use std::io;
use thiserror::Error;

/// Result alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors produced while decoding matrix text.
#[derive(Debug, Error)]
pub enum TextError {
    /// The input held no rows.
    #[error("matrix text is empty")]
    Empty,

    /// A token could not be parsed as a number.
    #[error("line {line}, column {column}: invalid number `{token}`")]
    InvalidNumber {
        /// 1-based line number.
        line: usize,
        /// 1-based token position within the line.
        column: usize,
        /// The offending token.
        token: String,
    },

    /// A row's element count differs from the first row's.
    #[error("line {line}: expected {expected} values, found {found}")]
    RowLength {
        /// 1-based line number.
        line: usize,
        /// Element count of the first row.
        expected: usize,
        /// Element count of this row.
        found: usize,
    },

    /// The decoded values could not be stored.
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    /// Reading the underlying stream failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration names an operation the dispatch table lacks.
    #[error("operation not found: `{name}`")]
    OperationNotFound {
        /// The unknown name.
        name: String,
    },

    /// A configuration line does not have exactly two fields.
    #[error("{path}:{line}: expected `<operation> <operand>`, found {found} field(s)")]
    MalformedConfig {
        /// Configuration source.
        path: Utf8PathBuf,
        /// 1-based line number.
        line: usize,
        /// Number of whitespace-separated fields on the line.
        found: usize,
    },

    /// A matrix file could not be decoded.
    #[error("malformed matrix in {path}")]
    MalformedMatrix {
        /// The matrix file.
        path: Utf8PathBuf,
        /// What was wrong with it.
        #[source]
        source: TextError,
    },

    /// A named input could not be opened or read.
    #[error("cannot read {path}")]
    ResourceUnavailable {
        /// The path that could not be read.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The result could not be written.
    #[error("cannot write output to {path}")]
    OutputWrite {
        /// The output path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// A pipeline step failed.
    #[error("step {step} (`{operation}`) failed")]
    Step {
        /// 1-based position of the step in the pipeline.
        step: usize,
        /// Operation name of the step.
        operation: String,
        /// The matrix error it raised.
        #[source]
        source: MatrixError,
    },

    /// A matrix operation failed outside of a step.
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

impl PipelineError {
    /// The matrix error at the root of this failure, if any.
    pub fn matrix_error(&self) -> Option<&MatrixError> {
        match self {
            Self::Step { source, .. } | Self::Matrix(source) => Some(source),
            Self::MalformedMatrix {
                source: TextError::Matrix(source),
                ..
            } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mxp_numeric::Shape;
    use std::error::Error as _;

    #[test]
    fn test_step_error_chain() {
        let err = PipelineError::Step {
            step: 2,
            operation: "mat_add_mat".into(),
            source: MatrixError::SizeMismatch {
                op: "add",
                lhs: Shape { rows: 2, cols: 2 },
                rhs: Shape { rows: 3, cols: 3 },
            },
        };
        assert_eq!(err.to_string(), "step 2 (`mat_add_mat`) failed");
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("matrix size mismatch in add: 2x2 vs 3x3")
        );
        assert!(err.matrix_error().is_some());
    }

    #[test]
    fn test_text_error_messages() {
        let err = TextError::InvalidNumber {
            line: 3,
            column: 2,
            token: "x1".into(),
        };
        assert_eq!(err.to_string(), "line 3, column 2: invalid number `x1`");

        let err = TextError::RowLength {
            line: 2,
            expected: 3,
            found: 1,
        };
        assert_eq!(err.to_string(), "line 2: expected 3 values, found 1");
    }

    #[test]
    fn test_config_error_message() {
        let err = PipelineError::MalformedConfig {
            path: "ops.cfg".into(),
            line: 4,
            found: 3,
        };
        assert_eq!(
            err.to_string(),
            "ops.cfg:4: expected `<operation> <operand>`, found 3 field(s)"
        );
        assert!(err.matrix_error().is_none());
    }
}
