use std::path::PathBuf;
use thiserror::Error;

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur while loading patterns or scanning sources.
///
/// Pattern compilation is fail-fast: one invalid regex aborts the whole scan
/// before any worker starts. Source-level errors (`SourceNotFound`,
/// `PermissionDenied`, read failures) are scoped to a single source and are
/// reported as events alongside normal results instead of aborting the run.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid regex for pattern '{name}': {source}")]
    InvalidPattern {
        name: String,
        source: regex::Error,
    },
    #[error("Pattern set '{0}' not found in registry")]
    PatternSetNotFound(String),
    #[error("Failed to parse pattern file {path}: {source}")]
    PatternParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ScanError {
    pub fn source_not_found(path: impl Into<PathBuf>) -> Self {
        Self::SourceNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn invalid_pattern(name: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            name: name.into(),
            source,
        }
    }

    pub fn pattern_set_not_found(name: impl Into<String>) -> Self {
        Self::PatternSetNotFound(name.into())
    }

    pub fn pattern_parse(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::PatternParse {
            path: path.into(),
            source,
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Maps an open/stat error on `path` to the matching source-scoped variant.
    pub fn from_open_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::SourceNotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::IoError(err),
        }
    }
}
