//! Matrix error types.

use mxp_alloc::AllocError;
use std::fmt;
use thiserror::Error;

/// Result type for matrix operations.
pub type MatrixResult<T> = Result<T, MatrixError>;

/// Dimensions of a matrix, used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
}

impl From<(usize, usize)> for Shape {
    fn from((rows, cols): (usize, usize)) -> Self {
        Self { rows, cols }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Errors raised by matrix construction and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    /// Operand dimensions are incompatible for the operation.
    #[error("matrix size mismatch in {op}: {lhs} vs {rhs}")]
    SizeMismatch {
        /// Operation that rejected the operands.
        op: &'static str,
        /// Shape of the left operand.
        lhs: Shape,
        /// Shape of the right operand.
        rhs: Shape,
    },

    /// A vector operation was given something with more than one row and column.
    #[error("matrices have to be vectors, got {shape}")]
    NotAVector {
        /// Shape of the offending operand.
        shape: Shape,
    },

    /// Element data does not fill the requested shape.
    #[error("expected {expected} elements, got {found}")]
    LengthMismatch {
        /// Number of elements the shape requires.
        expected: usize,
        /// Number of elements supplied.
        found: usize,
    },

    /// Storage could not be acquired.
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

impl MatrixError {
    pub(crate) fn size_mismatch(
        op: &'static str,
        lhs: impl Into<Shape>,
        rhs: impl Into<Shape>,
    ) -> Self {
        Self::SizeMismatch {
            op,
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }
}
