//! Pipeline configuration.
//!
//! A configuration is a sequence of lines of the form
//! `<operation-name> <operand-source>`. Blank lines are skipped.

use crate::error::{PipelineError, PipelineResult};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::BufRead;

/// One step of a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    /// 1-based line number in the configuration source.
    pub line: usize,
    /// Operation name, resolved through the dispatch table.
    pub operation: String,
    /// Where the operand matrix is loaded from.
    pub operand: Utf8PathBuf,
}

/// Parse a configuration stream.
///
/// `origin` names the source in error messages.
///
/// # Errors
///
/// Returns [`PipelineError::MalformedConfig`] for a line that does not hold
/// exactly two fields, and [`PipelineError::ResourceUnavailable`] if the
/// stream cannot be read.
pub fn parse_config<R: BufRead>(reader: R, origin: &Utf8Path) -> PipelineResult<Vec<ConfigEntry>> {
    let mut entries = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| PipelineError::ResourceUnavailable {
            path: origin.to_owned(),
            source,
        })?;
        let fields: Vec<&str> = line.split_whitespace().collect();

        match fields.as_slice() {
            [] => continue,
            [operation, operand] => entries.push(ConfigEntry {
                line: idx + 1,
                operation: (*operation).to_owned(),
                operand: Utf8PathBuf::from(*operand),
            }),
            _ => {
                return Err(PipelineError::MalformedConfig {
                    path: origin.to_owned(),
                    line: idx + 1,
                    found: fields.len(),
                })
            }
        }
    }

    Ok(entries)
}
