//! Loading, configuration and bundle hashing for definition sets.
//!
//! This crate is the file-system boundary of the definition compiler:
//!
//! - [`DefinitionSet`] loads raw definitions from directories, single files
//!   and [`DefinitionPackage`](definition_core::DefinitionPackage) bundles,
//!   with a [`DefinitionSetBuilder`] for fallback chains.
//! - [`CompileConfig`] is the YAML configuration of a compilation run.
//! - [`compute_bundle_hash`] fingerprints the definitions of a package.
//! - [`save_package`] writes compiled packages as JSON or YAML.
//!
//! # Quick start
//!
//! ```no_run
//! use definition_store::{CompileConfig, DefinitionSet};
//!
//! let config = CompileConfig::load("defc.yml").unwrap();
//! let mut set = DefinitionSet::builder()
//!     .from_dir("definitions/")
//!     .from_bundle("definitions.json")
//!     .build()
//!     .unwrap();
//! set.exclude(&config.exclude);
//!
//! let compiled = definition_compiler::Compiler::new(definition_compiler::DefaultCallback)
//!     .with_options(config.compiler_options())
//!     .compile(set.into_definitions())
//!     .unwrap();
//! println!("compiled {} definitions", compiled.definitions.len());
//! ```

mod config;
mod error;
mod hash;
mod loader;

pub use config::{CompileConfig, CompileSettings, OutputConfig};
pub use error::{Result, StoreError};
pub use hash::compute_bundle_hash;
pub use loader::{
    DefinitionSet, DefinitionSetBuilder, DefinitionSource, DocumentFormat, save_package,
    write_document,
};
