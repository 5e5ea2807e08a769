//! Definition set loading with builder pattern and fallback chains.
//!
//! Provides [`DefinitionSet`], an ordered batch of raw definitions ready to be
//! compiled, and [`DefinitionSetBuilder`] for loading from several sources
//! with automatic fallback.
//!
//! # Loading patterns
//!
//! ```no_run
//! use definition_store::DefinitionSet;
//!
//! // One definition per *.json / *.yaml / *.yml file
//! let set = DefinitionSet::from_dir("definitions/").unwrap();
//! assert!(set.get("case").is_some());
//!
//! // A single DefinitionPackage bundle (JSON or YAML)
//! let set = DefinitionSet::from_bundle("definitions.json").unwrap();
//!
//! // Fallback chain: the first source that loads wins
//! let set = DefinitionSet::builder()
//!     .from_dir("definitions/")
//!     .from_bundle("definitions.json")
//!     .build()
//!     .unwrap();
//! ```
//!
//! Definitions keep their load order: directory entries are read sorted by
//! file name, bundles in package order.

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use definition_core::{Definition, DefinitionPackage};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StoreError};

/// Serialization format of definition files, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Detects the format from a path extension (`json`, `yaml`, `yml`).
    ///
    /// # Examples
    ///
    /// ```
    /// use definition_store::DocumentFormat;
    ///
    /// assert_eq!(DocumentFormat::from_path("a/case.yml"), Some(DocumentFormat::Yaml));
    /// assert_eq!(DocumentFormat::from_path("case.JSON"), Some(DocumentFormat::Json));
    /// assert_eq!(DocumentFormat::from_path("notes.txt"), None);
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Describes where a [`DefinitionSet`] was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionSource {
    /// Loaded from a directory of single-definition files.
    Directory(PathBuf),
    /// Loaded from a single [`DefinitionPackage`] file.
    Bundle(PathBuf),
    /// Loaded from a file holding one definition.
    File(PathBuf),
    /// Loaded via a fallback chain or by combining several sets.
    Multiple(Vec<DefinitionSource>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Package(DefinitionPackage),
    Definition(Box<Definition>),
}

/// Ordered batch of raw definitions.
///
/// # Examples
///
/// ```no_run
/// use definition_store::DefinitionSet;
///
/// let set = DefinitionSet::from_dir("definitions/").unwrap();
/// println!("Loaded {} definitions", set.len());
/// for id in set.identifiers() {
///     println!("  {id}");
/// }
/// let batch = set.into_definitions();
/// ```
#[derive(Debug, Clone)]
pub struct DefinitionSet {
    definitions: Vec<Definition>,
    source: DefinitionSource,
}

impl DefinitionSet {
    /// Returns a new [`DefinitionSetBuilder`] for configuring a fallback chain.
    pub fn builder() -> DefinitionSetBuilder {
        DefinitionSetBuilder::new()
    }

    /// Loads one definition from every `*.json`, `*.yaml` and `*.yml` file in
    /// a directory. Other files are ignored; subdirectories are not walked.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IoError`] if the directory or a file cannot be
    /// read, a JSON/YAML error if a file does not parse, or
    /// [`StoreError::InvalidInput`] if a file yields a definition without an
    /// identifier (for example a package file).
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut files: Vec<(PathBuf, DocumentFormat)> = Vec::new();

        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if !file_path.is_file() {
                continue;
            }
            if let Some(format) = DocumentFormat::from_path(&file_path) {
                files.push((file_path, format));
            }
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut definitions = Vec::with_capacity(files.len());
        for (file_path, format) in files {
            let definition: Definition = read_document(&file_path, format)?;
            require_identifiers(&file_path, std::slice::from_ref(&definition))?;
            debug!(path = %file_path.display(), definition = %definition.identifier, "Loaded definition");
            definitions.push(definition);
        }

        Ok(Self {
            definitions,
            source: DefinitionSource::Directory(path.to_path_buf()),
        })
    }

    /// Loads the definitions of a [`DefinitionPackage`] file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidInput`] for an unsupported extension or a
    /// definition without an identifier, [`StoreError::IoError`] if the file
    /// cannot be read, or a JSON/YAML error if parsing fails.
    pub fn from_bundle(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let package: DefinitionPackage = read_document(path, format_of(path)?)?;
        require_identifiers(path, &package.definitions)?;
        debug!(
            path = %path.display(),
            definitions = package.definition_count(),
            "Loaded definition bundle"
        );

        Ok(Self {
            definitions: package.definitions,
            source: DefinitionSource::Bundle(path.to_path_buf()),
        })
    }

    /// Loads a file holding either a single definition or a package.
    ///
    /// # Errors
    ///
    /// Same as [`from_bundle`](Self::from_bundle).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match read_document(path, format_of(path)?)? {
            Document::Package(package) => {
                require_identifiers(path, &package.definitions)?;
                Ok(Self {
                    definitions: package.definitions,
                    source: DefinitionSource::Bundle(path.to_path_buf()),
                })
            }
            Document::Definition(definition) => {
                require_identifiers(path, std::slice::from_ref(&*definition))?;
                Ok(Self {
                    definitions: vec![*definition],
                    source: DefinitionSource::File(path.to_path_buf()),
                })
            }
        }
    }

    /// Loads a path that is either a directory or a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::from_dir(path)
        } else {
            Self::from_file(path)
        }
    }

    /// Loads and concatenates several paths, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidInput`] when `paths` is empty, or the
    /// first loading error.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut iter = paths.iter();
        let first = iter
            .next()
            .ok_or_else(|| StoreError::InvalidInput("no input paths given".into()))?;
        let mut set = Self::from_path(first)?;
        for path in iter {
            set.extend(Self::from_path(path)?);
        }
        Ok(set)
    }

    /// Appends the definitions of another set.
    pub fn extend(&mut self, other: DefinitionSet) {
        let current = std::mem::replace(&mut self.source, DefinitionSource::Multiple(Vec::new()));
        let mut sources = match current {
            DefinitionSource::Multiple(sources) => sources,
            single => vec![single],
        };
        sources.push(other.source);
        self.source = DefinitionSource::Multiple(sources);
        self.definitions.extend(other.definitions);
    }

    /// Drops every definition whose identifier is listed, returning how many
    /// were removed.
    pub fn exclude(&mut self, identifiers: &[String]) -> usize {
        let before = self.definitions.len();
        self.definitions
            .retain(|d| !identifiers.iter().any(|id| *id == d.identifier));
        before - self.definitions.len()
    }

    /// Looks up a definition by identifier.
    pub fn get(&self, identifier: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.identifier == identifier)
    }

    /// Returns `true` if the set contains `identifier`.
    pub fn contains(&self, identifier: &str) -> bool {
        self.get(identifier).is_some()
    }

    /// Returns the number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if the set holds no definitions.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Iterates over definition identifiers in load order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.identifier.as_str())
    }

    /// Borrows the definitions in load order.
    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    /// Consumes the set, returning the definitions in load order.
    pub fn into_definitions(self) -> Vec<Definition> {
        self.definitions
    }

    /// Returns a reference to the source metadata.
    pub fn source(&self) -> &DefinitionSource {
        &self.source
    }
}

/// Builder for constructing a [`DefinitionSet`] with a fallback chain.
///
/// Sources are tried in the order they are added. The first successful load
/// wins; if all fail, [`StoreError::NoSourcesAvailable`] is returned.
pub struct DefinitionSetBuilder {
    sources: Vec<DefinitionSource>,
}

impl DefinitionSetBuilder {
    /// Creates a new builder with no sources.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Adds a directory of definition files as a source.
    pub fn from_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(DefinitionSource::Directory(path.into()));
        self
    }

    /// Adds a [`DefinitionPackage`] bundle file as a source.
    pub fn from_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(DefinitionSource::Bundle(path.into()));
        self
    }

    /// Adds a single-definition or package file as a source.
    pub fn from_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(DefinitionSource::File(path.into()));
        self
    }

    /// Attempts to load definitions from configured sources in order.
    ///
    /// Returns the first successfully loaded set. If all sources fail,
    /// returns [`StoreError::NoSourcesAvailable`].
    pub fn build(self) -> Result<DefinitionSet> {
        if self.sources.is_empty() {
            return Err(StoreError::NoSourcesAvailable);
        }

        let all_sources = self.sources.clone();

        for source in &self.sources {
            let result = match source {
                DefinitionSource::Directory(path) => DefinitionSet::from_dir(path),
                DefinitionSource::Bundle(path) => DefinitionSet::from_bundle(path),
                DefinitionSource::File(path) => DefinitionSet::from_file(path),
                DefinitionSource::Multiple(_) => continue,
            };

            match result {
                Ok(mut set) => {
                    set.source = DefinitionSource::Multiple(all_sources);
                    return Ok(set);
                }
                Err(err) => debug!(source = ?source, error = %err, "Definition source failed"),
            }
        }

        Err(StoreError::NoSourcesAvailable)
    }
}

impl Default for DefinitionSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes a package as JSON (pretty-printed) or YAML.
///
/// # Errors
///
/// Returns [`StoreError::IoError`] if the file cannot be created, or a
/// JSON/YAML error if serialization fails.
pub fn save_package(
    package: &DefinitionPackage,
    path: impl AsRef<Path>,
    format: DocumentFormat,
) -> Result<()> {
    write_document(package, path, format)
}

/// Writes any serializable value as JSON (pretty-printed) or YAML.
pub fn write_document<T: Serialize>(
    value: &T,
    path: impl AsRef<Path>,
    format: DocumentFormat,
) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);
    match format {
        DocumentFormat::Json => serde_json::to_writer_pretty(writer, value)?,
        DocumentFormat::Yaml => serde_yaml::to_writer(writer, value)?,
    }
    Ok(())
}

fn format_of(path: &Path) -> Result<DocumentFormat> {
    DocumentFormat::from_path(path).ok_or_else(|| {
        StoreError::InvalidInput(format!(
            "unsupported file extension: {} (expected .json, .yaml or .yml)",
            path.display()
        ))
    })
}

/// Rejects definitions without an identifier. Any map deserializes into a
/// [`Definition`], so this is what catches files of another shape.
fn require_identifiers(path: &Path, definitions: &[Definition]) -> Result<()> {
    match definitions.iter().position(|d| d.identifier.trim().is_empty()) {
        Some(index) => Err(StoreError::InvalidInput(format!(
            "definition #{} in {} has no identifier",
            index + 1,
            path.display()
        ))),
        None => Ok(()),
    }
}

fn read_document<T: DeserializeOwned>(path: &Path, format: DocumentFormat) -> Result<T> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let value = match format {
        DocumentFormat::Json => serde_json::from_reader(reader)?,
        DocumentFormat::Yaml => serde_yaml::from_reader(reader)?,
    };
    Ok(value)
}
