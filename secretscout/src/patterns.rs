//! Pattern sets and the named-set registry.
//!
//! A pattern file is YAML in the shape produced by common secret-rule
//! collections:
//!
//! ```yaml
//! patterns:
//!   - pattern:
//!       name: AWS Access Key
//!       regex: "AKIA[0-9A-Z]{16}"
//!       confidence: high
//! ```
//!
//! The registry is a small JSON index mapping a set name (e.g. `secrets`,
//! `pii`) to the pattern file holding it. It lives at
//! `$CONFIG_DIR/secretscout/patterns.json` by default and is only ever read
//! during a scan; `add` is the one mutating operation and happens before any
//! scan starts.

use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{ScanError, ScanResult};

/// Confidence label attached to a pattern and carried through to its matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
    #[serde(other)]
    #[default]
    Unknown,
}

impl Confidence {
    /// Parses a free-form label; anything unrecognized maps to `Unknown`.
    pub fn parse(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown => "unknown",
        }
    }

    /// Terminal color for the label. Total over the enum so a new variant
    /// cannot silently fall through to string-keyed dispatch.
    pub fn colored(&self) -> ColoredString {
        match self {
            Self::High => self.as_str().red(),
            Self::Medium => self.as_str().yellow(),
            Self::Low => self.as_str().blue(),
            Self::Unknown => self.as_str().normal(),
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One uncompiled pattern: a named regex with a confidence label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSpec {
    pub name: String,
    pub regex: String,
    #[serde(default)]
    pub confidence: Confidence,
}

#[derive(Debug, Serialize, Deserialize)]
struct PatternEntry {
    pattern: PatternSpec,
}

#[derive(Debug, Serialize, Deserialize)]
struct PatternFile {
    patterns: Vec<PatternEntry>,
}

/// Loads the ordered pattern list from a YAML pattern file.
pub fn load_pattern_file(path: &Path) -> ScanResult<Vec<PatternSpec>> {
    let contents =
        fs::read_to_string(path).map_err(|e| ScanError::from_open_error(path, e))?;
    let file: PatternFile = serde_yaml::from_str(&contents)
        .map_err(|e| ScanError::pattern_parse(path, e))?;
    debug!("Loaded {} patterns from {}", file.patterns.len(), path.display());
    Ok(file.patterns.into_iter().map(|e| e.pattern).collect())
}

/// The named pattern-set index: set name -> pattern file path.
///
/// Passed into the scan session explicitly; the scan core never touches it.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    path: PathBuf,
    entries: BTreeMap<String, PathBuf>,
}

impl PatternRegistry {
    /// Default registry location under the platform config directory.
    pub fn default_path() -> ScanResult<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("secretscout").join("patterns.json"))
            .ok_or_else(|| ScanError::config_error("could not determine config directory"))
    }

    /// Loads the registry at `path`. A missing file is an empty registry,
    /// so `add` works on a fresh install.
    pub fn load(path: impl Into<PathBuf>) -> ScanResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let data = fs::read_to_string(&path)?;
            serde_json::from_str(&data)
                .map_err(|e| ScanError::config_error(format!("invalid registry {}: {e}", path.display())))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registered set names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Resolves a set name to its pattern file. Relative entries resolve
    /// against the registry file's own directory.
    pub fn resolve(&self, name: &str) -> ScanResult<PathBuf> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| ScanError::pattern_set_not_found(name))?;
        if entry.is_absolute() {
            Ok(entry.clone())
        } else {
            let base = self.path.parent().unwrap_or_else(|| Path::new("."));
            Ok(base.join(entry))
        }
    }

    /// Loads the pattern list for a named set.
    pub fn load_set(&self, name: &str) -> ScanResult<Vec<PatternSpec>> {
        load_pattern_file(&self.resolve(name)?)
    }

    /// Adds or replaces a named set and persists the index.
    pub fn add(&mut self, name: impl Into<String>, file: impl Into<PathBuf>) -> ScanResult<()> {
        self.entries.insert(name.into(), file.into());
        self.save()
    }

    fn save(&self) -> ScanResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| ScanError::config_error(format!("failed to serialize registry: {e}")))?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    const SAMPLE_YAML: &str = r#"
patterns:
  - pattern:
      name: AWS Access Key
      regex: "AKIA[0-9A-Z]{16}"
      confidence: high
  - pattern:
      name: Generic Secret
      regex: "secret[_-]?key"
      confidence: low
"#;

    #[test]
    fn test_confidence_parse() {
        assert_eq!(Confidence::parse("high"), Confidence::High);
        assert_eq!(Confidence::parse("MEDIUM"), Confidence::Medium);
        assert_eq!(Confidence::parse("low"), Confidence::Low);
        assert_eq!(Confidence::parse("certain"), Confidence::Unknown);
        assert_eq!(Confidence::parse(""), Confidence::Unknown);
    }

    #[test]
    fn test_confidence_display() {
        assert_eq!(Confidence::High.to_string(), "high");
        assert_eq!(Confidence::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_load_pattern_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.yml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(SAMPLE_YAML.as_bytes()).unwrap();

        let specs = load_pattern_file(&path).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "AWS Access Key");
        assert_eq!(specs[0].confidence, Confidence::High);
        assert_eq!(specs[1].regex, "secret[_-]?key");
        assert_eq!(specs[1].confidence, Confidence::Low);
    }

    #[test]
    fn test_load_pattern_file_unknown_confidence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.yml");
        std::fs::write(
            &path,
            "patterns:\n  - pattern:\n      name: x\n      regex: y\n      confidence: banana\n",
        )
        .unwrap();

        let specs = load_pattern_file(&path).unwrap();
        assert_eq!(specs[0].confidence, Confidence::Unknown);
    }

    #[test]
    fn test_load_pattern_file_invalid_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.yml");
        std::fs::write(&path, "patterns: [not: {valid").unwrap();

        let err = load_pattern_file(&path).unwrap_err();
        assert!(matches!(err, ScanError::PatternParse { .. }));
    }

    #[test]
    fn test_load_pattern_file_missing() {
        let err = load_pattern_file(Path::new("/nonexistent/rules.yml")).unwrap_err();
        assert!(matches!(err, ScanError::SourceNotFound(_)));
    }

    #[test]
    fn test_registry_roundtrip() {
        let dir = tempdir().unwrap();
        let rules = dir.path().join("rules.yml");
        std::fs::write(&rules, SAMPLE_YAML).unwrap();

        let registry_path = dir.path().join("patterns.json");
        let mut registry = PatternRegistry::load(&registry_path).unwrap();
        assert_eq!(registry.names().count(), 0);

        registry.add("secrets", &rules).unwrap();

        // Reload from disk and resolve through the persisted index.
        let registry = PatternRegistry::load(&registry_path).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["secrets"]);
        let specs = registry.load_set("secrets").unwrap();
        assert_eq!(specs.len(), 2);
    }

    #[test]
    fn test_registry_relative_entry() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("rules.yml"), SAMPLE_YAML).unwrap();

        let registry_path = dir.path().join("patterns.json");
        std::fs::write(&registry_path, r#"{"secrets": "rules.yml"}"#).unwrap();

        let registry = PatternRegistry::load(&registry_path).unwrap();
        let resolved = registry.resolve("secrets").unwrap();
        assert_eq!(resolved, dir.path().join("rules.yml"));
    }

    #[test]
    fn test_registry_unknown_set() {
        let dir = tempdir().unwrap();
        let registry = PatternRegistry::load(dir.path().join("patterns.json")).unwrap();
        let err = registry.resolve("pii").unwrap_err();
        assert!(matches!(err, ScanError::PatternSetNotFound(_)));
    }
}
