//! Binary matrix operations exposed through the dispatch table.
//!
//! Each operation copies its left operand and applies the matching in-place
//! operator to the copy; neither argument is modified.

use mxp_numeric::{Allocator, Matrix, MatrixResult};
use num_traits::Zero;
use std::ops::{AddAssign, Mul};

/// Matrix product `lhs * rhs`.
pub fn matrix_mul<T, A>(lhs: &Matrix<T, A>, rhs: &Matrix<T, A>) -> MatrixResult<Matrix<T, A>>
where
    T: Copy + Zero + Mul<Output = T>,
    A: Allocator,
{
    let mut result = lhs.try_clone()?;
    result.try_mul_assign(rhs)?;
    Ok(result)
}

/// Element-wise sum `lhs + rhs`.
pub fn matrix_add<T, A>(lhs: &Matrix<T, A>, rhs: &Matrix<T, A>) -> MatrixResult<Matrix<T, A>>
where
    T: Copy + AddAssign,
    A: Allocator,
{
    let mut result = lhs.try_clone()?;
    result.try_add_assign(rhs)?;
    Ok(result)
}

/// Dot product of two equal-shape vectors, as a `1x1` matrix.
pub fn vec_dot_vec<T, A>(lhs: &Matrix<T, A>, rhs: &Matrix<T, A>) -> MatrixResult<Matrix<T, A>>
where
    T: Copy + Zero + Mul<Output = T>,
    A: Allocator,
{
    let dot = lhs.dot(rhs)?;
    Matrix::filled_in(1, 1, dot, lhs.allocator().select_on_copy())
}
