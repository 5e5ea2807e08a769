//! Compilation configuration.
//!
//! Defines the YAML-serializable configuration that controls which
//! definitions are compiled, how the compiler runs, and how output is written.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! exclude:
//!   - draft-case
//! compile:
//!   parallel: true
//!   jobs: 4
//! output:
//!   format: yaml
//!   include_report: true
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use definition_compiler::CompilerOptions;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::loader::DocumentFormat;

/// Settings controlling how the compiler runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileSettings {
    /// Compile independent inheritance trees concurrently.
    pub parallel: bool,
    /// Worker count for parallel runs (defaults to the number of CPUs).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

/// Settings controlling compiled output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format of the compiled package.
    pub format: DocumentFormat,
    /// Embed the removal report next to the compiled package.
    pub include_report: bool,
}

/// Top-level compilation configuration.
///
/// Loaded from a YAML file (typically `defc.yml` next to the definitions).
/// Every section except `version` is optional.
///
/// # Examples
///
/// ```
/// use definition_store::CompileConfig;
///
/// let config: CompileConfig = serde_yaml::from_str(
///     "version: \"1.0\"\nexclude: [draft]\ncompile: { parallel: true, jobs: 2 }\n",
/// )
/// .unwrap();
/// assert!(config.is_excluded("draft"));
/// assert_eq!(config.compiler_options().jobs, Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Definitions dropped from the batch before compiling.
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub compile: CompileSettings,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            exclude: Vec::new(),
            compile: CompileSettings::default(),
            output: OutputConfig::default(),
        }
    }
}

impl CompileConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot be
    /// read, or [`YamlError`](crate::StoreError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot be
    /// written, or [`YamlError`](crate::StoreError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns `true` if `identifier` is in the exclusion list.
    pub fn is_excluded(&self, identifier: &str) -> bool {
        self.exclude.iter().any(|id| id == identifier)
    }

    /// Compiler options derived from the `compile` section.
    pub fn compiler_options(&self) -> CompilerOptions {
        CompilerOptions {
            parallel: self.compile.parallel,
            jobs: self.compile.jobs,
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
version: "1.0"
exclude:
  - draft-case
  - scratch
compile:
  parallel: true
  jobs: 8
output:
  format: yaml
  include_report: true
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: CompileConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.exclude, vec!["draft-case", "scratch"]);
        assert!(config.compile.parallel);
        assert_eq!(config.compile.jobs, Some(8));
        assert_eq!(config.output.format, DocumentFormat::Yaml);
        assert!(config.output.include_report);
    }

    #[test]
    fn test_deserialize_minimal_uses_defaults() {
        let config: CompileConfig = serde_yaml::from_str("version: \"1.0\"\n").unwrap();
        assert!(config.exclude.is_empty());
        assert_eq!(config.compiler_options(), CompilerOptions::default());
        assert_eq!(config.output.format, DocumentFormat::Json);
        assert!(!config.output.include_report);
    }

    #[test]
    fn test_is_excluded() {
        let config: CompileConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert!(config.is_excluded("scratch"));
        assert!(!config.is_excluded("case"));
    }

    #[test]
    fn test_compiler_options() {
        let config: CompileConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.compiler_options(), CompilerOptions::parallel(Some(8)));
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("defc.yml");

        let original: CompileConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        let loaded = CompileConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }
}
