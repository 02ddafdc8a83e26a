//! Configuration-driven matrix pipelines.
//!
//! This crate turns a configuration of `<operation> <operand>` lines into a
//! [`Pipeline`] of matrix operations and runs it over an input matrix.
//!
//! # Overview
//!
//! ```text
//! config ──▶ parse_config ──▶ DispatchTable::lookup ──▶ load operand
//!                                                          │
//!                                                          ▼
//! input ──▶ read_matrix ──▶ Pipeline::apply ◀── BoundOperation
//!                                 │
//!                                 ▼
//!                           write_matrix ──▶ output
//! ```
//!
//! Steps run strictly in configuration order, each consuming the previous
//! result. The first failure aborts the run and no output is written.
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8Path;
//! use mxp_pipeline::{run, RunOptions};
//!
//! let report = run(
//!     Utf8Path::new("ops.cfg"),
//!     Utf8Path::new("input.txt"),
//!     Utf8Path::new("output.txt"),
//!     &RunOptions::new().operand_dir("data"),
//! )?;
//! println!("{} steps, result {}", report.steps, report.output_shape);
//! # Ok::<(), mxp_pipeline::PipelineError>(())
//! ```

#![warn(missing_docs)]

pub mod binding;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ops;
pub mod pipeline;
pub mod run;
pub mod text;

pub use binding::{BoundOperation, OperandOrder};
pub use config::{parse_config, ConfigEntry};
pub use dispatch::{BinaryOp, DispatchTable, FlatMap};
pub use error::{PipelineError, PipelineResult, TextError};
pub use pipeline::Pipeline;
pub use run::{
    build_pipeline, load_matrix, load_pipeline, run, write_output, MatrixPipeline, RunOptions,
    RunReport,
};
pub use text::{read_matrix, read_matrix_in, write_matrix};
