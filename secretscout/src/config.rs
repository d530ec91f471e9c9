use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::scan::engine::ScanOptions;
use crate::scan::reader::DEFAULT_CHUNK_SIZE;

/// Configuration for a scan run.
///
/// Loaded from, in order of precedence:
/// 1. A custom config file passed via `--config`
/// 2. Local `.secretscout.yaml` in the current directory
/// 3. Global `$CONFIG_DIR/secretscout/config.yaml`
///
/// CLI arguments override config file values; the merge rules live in
/// [`ScanConfig::merge_with_cli`].
///
/// Example:
/// ```yaml
/// # Named pattern set from the registry
/// pattern_set: "secrets"
///
/// # File or directory to scan (omit to read stdin)
/// input: "./src"
///
/// # Cap reported matches at this many characters (0 = no cap)
/// truncate: 400
///
/// # Worker count (default: CPU cores)
/// thread_count: 4
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "warn"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Named pattern set to resolve through the registry
    #[serde(default = "default_pattern_set")]
    pub pattern_set: String,

    /// File or directory to scan; `None` reads from stdin
    #[serde(default)]
    pub input: Option<PathBuf>,

    /// Truncation length for reported matches (0 disables truncation)
    #[serde(default = "default_truncate")]
    pub truncate: usize,

    /// Number of worker threads
    /// Defaults to number of CPU cores if not specified
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Bytes read per I/O operation
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_pattern_set() -> String {
    "secrets".to_string()
}

fn default_truncate() -> usize {
    400
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            pattern_set: default_pattern_set(),
            input: None,
            truncate: default_truncate(),
            thread_count: default_thread_count(),
            chunk_size: default_chunk_size(),
            log_level: default_log_level(),
        }
    }
}

impl ScanConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("secretscout/config.yaml")),
            // Local config
            Some(PathBuf::from(".secretscout.yaml")),
            // Custom config
            config_path.map(PathBuf::from),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values.
    /// CLI values take precedence wherever they differ from the defaults.
    pub fn merge_with_cli(mut self, cli_config: ScanConfig) -> Self {
        if cli_config.pattern_set != default_pattern_set() {
            self.pattern_set = cli_config.pattern_set;
        }
        if cli_config.input.is_some() {
            self.input = cli_config.input;
        }
        if cli_config.truncate != default_truncate() {
            self.truncate = cli_config.truncate;
        }
        // Always use CLI thread count if specified
        self.thread_count = cli_config.thread_count;
        if cli_config.chunk_size != default_chunk_size() {
            self.chunk_size = cli_config.chunk_size;
        }
        if cli_config.log_level != default_log_level() {
            self.log_level = cli_config.log_level;
        }
        self
    }

    /// The knobs the scan engine honors.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            truncate: self.truncate,
            thread_count: self.thread_count,
            chunk_size: self.chunk_size,
        }
    }
}
