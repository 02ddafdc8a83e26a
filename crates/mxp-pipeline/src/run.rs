//! End-to-end pipeline runs.
//!
//! A run loads the configuration, binds each operation to its operand
//! matrix, decodes the input matrix, applies the pipeline and writes the
//! result. The output file only appears if every stage succeeded: the result
//! is written to a temporary file next to the output and then persisted over
//! it in one step.

use crate::binding::BoundOperation;
use crate::config::{parse_config, ConfigEntry};
use crate::dispatch::DispatchTable;
use crate::error::{PipelineError, PipelineResult, TextError};
use crate::pipeline::Pipeline;
use crate::text::{read_matrix, write_matrix};
use camino::{Utf8Path, Utf8PathBuf};
use mxp_numeric::{Matrix, Shape};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

/// The pipeline type produced from a configuration.
pub type MatrixPipeline = Pipeline<Matrix<f64>, PipelineError>;

/// Options for building and running pipelines.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    operand_dir: Option<Utf8PathBuf>,
}

impl RunOptions {
    /// Create options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative operand sources against `dir` instead of the
    /// working directory.
    #[must_use]
    pub fn operand_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.operand_dir = Some(dir.into());
        self
    }

    /// Resolve an operand source to the path it is loaded from.
    pub fn resolve_operand(&self, source: &Utf8Path) -> Utf8PathBuf {
        match &self.operand_dir {
            Some(dir) if source.is_relative() => dir.join(source),
            _ => source.to_owned(),
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Number of pipeline steps applied.
    pub steps: usize,
    /// Shape of the input matrix.
    pub input_shape: Shape,
    /// Shape of the written result.
    pub output_shape: Shape,
}

fn open(path: &Utf8Path) -> PipelineResult<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| PipelineError::ResourceUnavailable {
            path: path.to_owned(),
            source,
        })
}

/// Load a matrix file.
///
/// # Errors
///
/// Returns [`PipelineError::ResourceUnavailable`] if the file cannot be read
/// and [`PipelineError::MalformedMatrix`] if its contents are invalid.
#[instrument(level = "debug")]
pub fn load_matrix(path: &Utf8Path) -> PipelineResult<Matrix<f64>> {
    let matrix = read_matrix(open(path)?).map_err(|err| match err {
        TextError::Io(source) => PipelineError::ResourceUnavailable {
            path: path.to_owned(),
            source,
        },
        source => PipelineError::MalformedMatrix {
            path: path.to_owned(),
            source,
        },
    })?;
    debug!(rows = matrix.rows(), cols = matrix.cols(), "loaded matrix");
    Ok(matrix)
}

/// Build a pipeline from parsed configuration entries.
///
/// Each operation name is resolved before its operand is loaded, so an
/// unknown operation is reported without touching the operand source.
///
/// # Errors
///
/// Fails on the first unknown operation or unreadable operand.
pub fn build_pipeline(entries: &[ConfigEntry], options: &RunOptions) -> PipelineResult<MatrixPipeline> {
    let table = DispatchTable::global();
    let mut pipeline = Pipeline::new();

    for (idx, entry) in entries.iter().enumerate() {
        let op = table.lookup(&entry.operation)?;
        let operand = load_matrix(&options.resolve_operand(&entry.operand))?;
        let bound = BoundOperation::new(entry.operation.as_str(), op, operand);
        debug!(
            step = idx + 1,
            operation = bound.name(),
            operand = %entry.operand,
            order = ?bound.order(),
            "bound operation"
        );

        let step = idx + 1;
        pipeline.push(move |running: &Matrix<f64>| {
            debug!(step, operation = bound.name(), "applying");
            bound.apply(running).map_err(|source| PipelineError::Step {
                step,
                operation: bound.name().to_owned(),
                source,
            })
        });
    }

    Ok(pipeline)
}

/// Parse a configuration file and build its pipeline.
///
/// # Errors
///
/// See [`parse_config`] and [`build_pipeline`].
#[instrument(level = "debug", skip(options))]
pub fn load_pipeline(config: &Utf8Path, options: &RunOptions) -> PipelineResult<MatrixPipeline> {
    let entries = parse_config(open(config)?, config)?;
    build_pipeline(&entries, options)
}

/// Write a matrix to `path`, replacing any existing file atomically.
///
/// # Errors
///
/// Returns [`PipelineError::OutputWrite`] if the file cannot be written.
pub fn write_output(path: &Utf8Path, matrix: &Matrix<f64>) -> PipelineResult<()> {
    let to_error = |source: io::Error| PipelineError::OutputWrite {
        path: path.to_owned(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let mut writer = BufWriter::new(NamedTempFile::new_in(dir).map_err(to_error)?);
    write_matrix(&mut writer, matrix).map_err(to_error)?;
    let file = writer.into_inner().map_err(|err| to_error(err.into_error()))?;
    file.persist(path).map_err(|err| to_error(err.error))?;
    Ok(())
}

/// Run the pipeline described by `config` on the matrix in `input`, writing
/// the result to `output`.
///
/// # Errors
///
/// Any failure aborts the run; `output` is left untouched in that case.
pub fn run(
    config: &Utf8Path,
    input: &Utf8Path,
    output: &Utf8Path,
    options: &RunOptions,
) -> PipelineResult<RunReport> {
    info!(%config, %input, "starting run");

    let pipeline = load_pipeline(config, options)?;
    let matrix = load_matrix(input)?;
    let input_shape = Shape::from(matrix.shape());

    let result = pipeline.apply(matrix)?;
    write_output(output, &result)?;

    let report = RunReport {
        steps: pipeline.len(),
        input_shape,
        output_shape: result.shape().into(),
    };
    info!(
        steps = report.steps,
        output = %output,
        shape = %report.output_shape,
        "run finished"
    );
    Ok(report)
}
