//! MatrixPipe prelude - function combinators
//!
//! Small, dependency-free combinators shared by the rest of the workspace.
//!
//! # Overview
//!
//! - [`function::id`] - identity
//! - [`function::compose`] - right-to-left composition of two unary callables,
//!   returned as a [`function::Composed`] value that owns both callables

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod function;

pub use function::{compose, id, Composed};
