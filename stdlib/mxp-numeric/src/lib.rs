//! MatrixPipe numeric library
//!
//! Dense, allocator-aware matrices with in-place arithmetic.
//!
//! # Architecture
//!
//! [`Matrix<T, A>`](matrix::Matrix) owns one contiguous row-major buffer
//! obtained from an [`Allocator`](mxp_alloc::Allocator). Construction,
//! copying and moving follow the allocator's propagation policy; see the
//! `mxp-alloc` crate for the available allocators.
//!
//! # Failure model
//!
//! | Operation | Fails with |
//! |-----------|------------|
//! | construction, copy | [`MatrixError::Alloc`] |
//! | `try_add_assign` | [`MatrixError::SizeMismatch`] unless shapes are equal |
//! | `try_mul_assign` | [`MatrixError::SizeMismatch`] unless `lhs.cols == rhs.rows` |
//! | `dot` | [`MatrixError::SizeMismatch`], then [`MatrixError::NotAVector`] |
//! | `scale_assign` | never |
//!
//! A failed operation leaves its left operand untouched.

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod error;
pub mod matrix;
pub mod scalar;

pub use error::{MatrixError, MatrixResult, Shape};
pub use matrix::Matrix;
pub use scalar::ScaleBy;
pub use mxp_alloc::{Allocator, Global};
