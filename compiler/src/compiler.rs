use definition_core::{Definition, validate_definition};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::callback::{DefaultCallback, DefinitionCallback};
use crate::cleanup::{self, CompiledDefinition};
use crate::engine;
use crate::error::{CompileError, Result};
use crate::report::CompilationReport;
use crate::tree::{DefinitionNode, build_forest};

/// Execution options for a compilation run.
///
/// # Examples
///
/// ```
/// use definition_compiler::CompilerOptions;
///
/// let options = CompilerOptions::default();
/// assert!(!options.parallel);
///
/// let options = CompilerOptions::parallel(Some(4));
/// assert_eq!(options.jobs, Some(4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompilerOptions {
    /// Process independent root trees on a worker pool.
    pub parallel: bool,
    /// Worker count for parallel runs; `None` uses the number of CPUs.
    pub jobs: Option<usize>,
}

impl CompilerOptions {
    /// Parallel options with an optional worker count.
    pub fn parallel(jobs: Option<usize>) -> Self {
        Self {
            parallel: true,
            jobs,
        }
    }
}

/// Output of a successful compilation.
#[derive(Debug, Clone, Default)]
pub struct Compilation {
    /// Compiled definitions, in input order.
    pub definitions: Vec<Definition>,
    /// Elements stripped during cleanup.
    pub report: CompilationReport,
}

impl Compilation {
    /// Finds a compiled definition by identifier.
    pub fn get(&self, identifier: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.identifier == identifier)
    }
}

/// Compiles batches of definitions with a given callback.
#[derive(Debug, Clone, Default)]
pub struct Compiler<C = DefaultCallback> {
    callback: C,
    options: CompilerOptions,
}

impl<C: DefinitionCallback> Compiler<C> {
    /// Creates a sequential compiler using `callback`.
    pub fn new(callback: C) -> Self {
        Self {
            callback,
            options: CompilerOptions::default(),
        }
    }

    /// Replaces the execution options.
    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the callback.
    pub fn callback(&self) -> &C {
        &self.callback
    }

    /// Returns the execution options.
    pub fn options(&self) -> CompilerOptions {
        self.options
    }

    /// Compiles a batch of definitions.
    ///
    /// Builds the inheritance forest, merges every tree parent before child,
    /// then runs the cleanup pipeline on each definition. The batch is
    /// all-or-nothing: the first error aborts the run. In parallel mode the
    /// reported error is the one of the first failing tree in input order.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] for structural problems, definitions with
    /// empty or repeated element identifiers, merge conflicts, callback
    /// failures, or when the worker pool cannot be created.
    pub fn compile(&self, definitions: Vec<Definition>) -> Result<Compilation> {
        let total = definitions.len();
        let forest = build_forest(definitions)?;
        check_elements(&forest)?;
        debug!(
            definitions = total,
            roots = forest.len(),
            parallel = self.options.parallel,
            "Built inheritance forest"
        );

        let trees = if self.options.parallel && forest.len() > 1 {
            self.compile_parallel(forest)?
        } else {
            forest
                .into_iter()
                .map(|root| self.compile_tree(root))
                .collect::<Result<Vec<_>>>()?
        };

        let mut compiled: Vec<CompiledDefinition> = trees.into_iter().flatten().collect();
        compiled.sort_by_key(|c| c.position);

        let mut compilation = Compilation {
            definitions: Vec::with_capacity(compiled.len()),
            report: CompilationReport::default(),
        };
        for entry in compiled {
            compilation.report.removals.extend(entry.removals);
            compilation.definitions.push(entry.definition);
        }

        info!(
            definitions = compilation.definitions.len(),
            removed = compilation.report.removals.len(),
            "Compiled definitions"
        );
        Ok(compilation)
    }

    fn compile_tree(&self, mut root: DefinitionNode) -> Result<Vec<CompiledDefinition>> {
        engine::merge_tree(&mut root, &self.callback)?;
        let mut out = Vec::with_capacity(root.len());
        cleanup::clean_tree(root, &self.callback, &mut out)?;
        Ok(out)
    }

    fn compile_parallel(&self, forest: Vec<DefinitionNode>) -> Result<Vec<Vec<CompiledDefinition>>> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(jobs) = self.options.jobs {
            builder = builder.num_threads(jobs.max(1));
        }
        let pool = builder
            .build()
            .map_err(|err| CompileError::WorkerPool(err.to_string()))?;

        let results: Vec<Result<Vec<CompiledDefinition>>> = pool.install(|| {
            forest
                .into_par_iter()
                .map(|root| self.compile_tree(root))
                .collect()
        });
        results.into_iter().collect()
    }
}

/// Rejects definitions whose element identifiers are empty or repeated
/// within a scope. The first offender in input order is reported.
fn check_elements(forest: &[DefinitionNode]) -> Result<()> {
    let first = forest
        .iter()
        .flat_map(DefinitionNode::walk)
        .filter_map(|(_, node)| {
            let error = validate_definition(node.definition()).into_iter().next()?;
            Some((node.position(), node.identifier().to_string(), error))
        })
        .min_by_key(|(position, ..)| *position);

    match first {
        Some((_, definition, source)) => Err(CompileError::InvalidDefinition { definition, source }),
        None => Ok(()),
    }
}

/// Compiles a batch with the built-in callback, sequentially.
///
/// # Examples
///
/// ```
/// use definition_compiler::compile;
/// use definition_core::{Definition, DisplayType, Field, Region};
///
/// let base = Definition::new("base")
///     .with_field(Field::new("title"))
///     .with_region(Region::new("audit").with_display_type(DisplayType::System));
/// let case = Definition::new("case")
///     .with_parent("base")
///     .with_field(Field::new("caseNumber"));
///
/// let compiled = compile(vec![base, case]).unwrap();
/// let case = compiled.get("case").unwrap();
/// assert!(case.find_field("title").is_some());
/// assert!(case.find_region("audit").is_none());
/// assert_eq!(compiled.report.removals.len(), 2);
/// ```
pub fn compile(definitions: Vec<Definition>) -> Result<Compilation> {
    Compiler::new(DefaultCallback).compile(definitions)
}
