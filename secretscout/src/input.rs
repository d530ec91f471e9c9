//! Input enumeration: turns a CLI-supplied path (or its absence) into the
//! ordered list of sources the dispatcher fans out to workers.

use ignore::WalkBuilder;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{ScanError, ScanResult};
use crate::filters::should_scan;

/// One unit of scan work: a resolved file path, or the process's stdin.
///
/// Consumed by exactly one worker; stdin is scanned through the same chunked
/// line reader as files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Stdin,
}

impl InputSource {
    /// Identifier used in reported events.
    pub fn label(&self) -> String {
        match self {
            InputSource::File(path) => path.display().to_string(),
            InputSource::Stdin => "stdin".to_string(),
        }
    }

    /// Opens the source for reading. The handle is owned by the calling
    /// worker and dropped before it moves on to its next source.
    pub fn open(&self) -> ScanResult<Box<dyn Read>> {
        match self {
            InputSource::File(path) => {
                let file =
                    File::open(path).map_err(|e| ScanError::from_open_error(path, e))?;
                Ok(Box::new(file))
            }
            InputSource::Stdin => Ok(Box::new(std::io::stdin())),
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Resolves the input argument to the list of sources to scan.
///
/// `None` means read from stdin. A file resolves to its absolute path; a
/// directory is walked recursively with standard ignore filtering disabled,
/// so dotfiles like `.env` are scanned too. `.git` internals and files with
/// binary extensions are skipped.
pub fn resolve_input(input: Option<&Path>) -> ScanResult<Vec<InputSource>> {
    let Some(input) = input else {
        return Ok(vec![InputSource::Stdin]);
    };

    let path = input
        .canonicalize()
        .map_err(|e| ScanError::from_open_error(input, e))?;

    if path.is_file() {
        return Ok(vec![InputSource::File(path)]);
    }

    let mut sources: Vec<InputSource> = WalkBuilder::new(&path)
        .standard_filters(false)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(|entry| entry.into_path())
        .filter(|p| should_scan(p))
        .map(InputSource::File)
        .collect();
    sources.sort_by(|a, b| a.label().cmp(&b.label()));

    debug!("Resolved {} sources under {}", sources.len(), path.display());
    Ok(sources)
}
