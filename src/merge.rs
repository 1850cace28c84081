//! Header-preserving file merge.
//!
//! The first input file is copied verbatim; every following file
//! contributes its trimmed lines with `#` comment lines dropped, so
//! the merged output carries exactly one header block.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Configuration for the `merge` goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub skip: bool,
    pub output_file: PathBuf,
    pub input_files: Vec<PathBuf>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            skip: false,
            output_file: PathBuf::from("target/merged.properties"),
            input_files: Vec::new(),
        }
    }
}

/// Run the `merge` goal. A no-op when skipped or when fewer than two
/// input files are given.
pub fn run(config: &MergeConfig) -> Result<(), MergeError> {
    if config.skip {
        info!("skipping file merge");
        return Ok(());
    }
    merge_files(&config.input_files, &config.output_file)
}

/// Merge `inputs` into `output`.
///
/// No-op when fewer than two inputs are given. The first file's
/// content is preserved verbatim (comments included); files 2..N are
/// appended line by line, trimmed, with lines starting with `#`
/// dropped. The writer is flushed and closed on all paths.
pub fn merge_files(inputs: &[PathBuf], output: &Path) -> Result<(), MergeError> {
    if inputs.len() < 2 {
        info!("fewer than two input files; nothing to merge");
        return Ok(());
    }

    let write_err = |source: io::Error| MergeError::Write {
        path: output.to_path_buf(),
        source,
    };

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut writer = BufWriter::new(File::create(output).map_err(write_err)?);

    for (index, input) in inputs.iter().enumerate() {
        info!(path = %input.display(), "reading input file");
        let read_err = |source: io::Error| MergeError::Read {
            path: input.clone(),
            source,
        };
        let reader = BufReader::new(File::open(input).map_err(read_err)?);
        for line in reader.lines() {
            let line = line.map_err(read_err)?;
            if index == 0 {
                writeln!(writer, "{line}").map_err(write_err)?;
            } else {
                let trimmed = line.trim();
                if trimmed.starts_with('#') {
                    continue;
                }
                writeln!(writer, "{trimmed}").map_err(write_err)?;
            }
        }
    }

    writer.flush().map_err(write_err)
}
