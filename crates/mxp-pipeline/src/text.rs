//! Plain-text matrix codec.
//!
//! One row per line, values separated by whitespace. Every row must have the
//! same number of values as the first. A blank line holds zero values, so any
//! blank line next to a data row is a row-length error, including one after
//! the last row. The final line terminator itself is optional.

use crate::error::TextError;
use mxp_numeric::{Allocator, Global, Matrix};
use std::fmt::Display;
use std::io::{BufRead, Write};

/// Decode a matrix from text.
///
/// # Errors
///
/// Returns a [`TextError`] describing the first offending line.
pub fn read_matrix<R: BufRead>(reader: R) -> Result<Matrix<f64>, TextError> {
    read_matrix_in(reader, Global)
}

/// Decode a matrix from text into storage from `alloc`.
///
/// # Errors
///
/// Returns a [`TextError`] describing the first offending line, or
/// [`TextError::Matrix`] if storage cannot be obtained.
pub fn read_matrix_in<R, A>(reader: R, alloc: A) -> Result<Matrix<f64, A>, TextError>
where
    R: BufRead,
    A: Allocator,
{
    let mut data = Vec::new();
    let mut cols = None;
    let mut rows = 0;
    let mut gap = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = idx + 1;

        let values = line
            .split_whitespace()
            .enumerate()
            .map(|(col, token)| {
                token.parse::<f64>().map_err(|_| TextError::InvalidNumber {
                    line: lineno,
                    column: col + 1,
                    token: token.to_owned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if values.is_empty() {
            if let Some(expected) = cols {
                return Err(TextError::RowLength {
                    line: lineno,
                    expected,
                    found: 0,
                });
            }
            gap.get_or_insert(lineno);
            continue;
        }

        let expected = *cols.get_or_insert(values.len());
        if let Some(blank) = gap {
            return Err(TextError::RowLength {
                line: blank,
                expected,
                found: 0,
            });
        }
        if values.len() != expected {
            return Err(TextError::RowLength {
                line: lineno,
                expected,
                found: values.len(),
            });
        }

        data.extend(values);
        rows += 1;
    }

    let cols = cols.ok_or(TextError::Empty)?;
    Ok(Matrix::from_vec_in(rows, cols, data, alloc)?)
}

/// Encode a matrix as text, one `\n`-terminated line per row.
///
/// # Errors
///
/// Propagates write failures from `writer`.
pub fn write_matrix<W, T, A>(mut writer: W, matrix: &Matrix<T, A>) -> std::io::Result<()>
where
    W: Write,
    T: Display,
    A: Allocator,
{
    for row in matrix.row_slices() {
        let mut values = row.iter();
        if let Some(first) = values.next() {
            write!(writer, "{first}")?;
            for value in values {
                write!(writer, " {value}")?;
            }
        }
        writeln!(writer)?;
    }
    writer.flush()
}
