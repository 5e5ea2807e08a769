use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use definition_compiler::{Compiler, CompilerOptions, DefaultCallback, DefinitionNode, build_forest};
use definition_core::{DefinitionPackage, validate_definitions};
use definition_store::{
    CompileConfig, DefinitionSet, DocumentFormat, compute_bundle_hash, save_package,
    write_document,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

impl From<CliOutputFormat> for DocumentFormat {
    fn from(fmt: CliOutputFormat) -> Self {
        match fmt {
            CliOutputFormat::Json => Self::Json,
            CliOutputFormat::Yaml => Self::Yaml,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "defc")]
#[command(about = "Compile hierarchical content-type definitions")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve inheritance and write a compiled definition package.
    Compile(CompileArgs),
    /// Check definitions and their inheritance forest without compiling.
    Validate(InputArgs),
    /// Print the inheritance forest.
    Tree(InputArgs),
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Definition files, package bundles and/or directories of definition files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct CompileArgs {
    /// Definition files, package bundles and/or directories of definition files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Output path for the compiled package.
    #[arg(long)]
    output: PathBuf,
    /// Output format (default: from config, else json).
    #[arg(long)]
    format: Option<CliOutputFormat>,
    /// Write the removal report to this path.
    #[arg(long)]
    report: Option<PathBuf>,
    /// Path to a defc.yml compile configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Compile independent inheritance trees in parallel.
    #[arg(long)]
    parallel: bool,
    /// Number of parallel jobs (implies --parallel; default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    /// Optional package name metadata.
    #[arg(long)]
    name: Option<String>,
    /// Optional package description metadata.
    #[arg(long)]
    description: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Compile(args) => run_compile(args),
        Command::Validate(args) => run_validate(args),
        Command::Tree(args) => run_tree(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_compile(args: CompileArgs) -> Result<(), String> {
    let config = match &args.config {
        Some(path) => CompileConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => CompileConfig::default(),
    };

    let mut set = load_inputs(&args.inputs)?;
    let excluded = set.exclude(&config.exclude);
    if excluded > 0 {
        info!(excluded, "Excluded definitions by config");
    }
    check_definitions(&set)?;

    let options = resolve_options(&config, args.parallel, args.jobs);
    debug!(parallel = options.parallel, jobs = ?options.jobs, "Compiler options");

    let compilation = Compiler::new(DefaultCallback)
        .with_options(options)
        .compile(set.into_definitions())
        .map_err(|err| err.to_string())?;

    let generated_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let mut package = DefinitionPackage::new(PACKAGE_VERSION, generated_at);
    package.name = args.name;
    package.description = args.description;
    package.definitions = compilation.definitions;
    package.bundle_hash = Some(compute_bundle_hash(&package).map_err(|err| err.to_string())?);

    let format = args
        .format
        .map(DocumentFormat::from)
        .unwrap_or(config.output.format);

    ensure_parent_dir(&args.output)?;
    save_package(&package, &args.output, format)
        .map_err(|err| format!("Failed to write '{}': {err}", args.output.display()))?;

    let report_path = args.report.or_else(|| {
        config
            .output
            .include_report
            .then(|| default_report_path(&args.output, format))
    });
    if let Some(path) = &report_path {
        let report_format = DocumentFormat::from_path(path).unwrap_or(format);
        ensure_parent_dir(path)?;
        write_document(&compilation.report, path, report_format)
            .map_err(|err| format!("Failed to write '{}': {err}", path.display()))?;
    }

    println!(
        "Compiled {} definition(s) into '{}' ({} element(s) removed).",
        package.definition_count(),
        args.output.display(),
        compilation.report.removals.len()
    );
    if let Some(path) = report_path {
        println!("Wrote removal report to '{}'.", path.display());
    }

    Ok(())
}

fn run_validate(args: InputArgs) -> Result<(), String> {
    let set = load_inputs(&args.inputs)?;
    check_definitions(&set)?;

    let count = set.len();
    let forest = build_forest(set.into_definitions()).map_err(|err| err.to_string())?;
    println!(
        "Validated {} definition(s) in {} inheritance tree(s).",
        count,
        forest.len()
    );
    Ok(())
}

fn run_tree(args: InputArgs) -> Result<(), String> {
    let set = load_inputs(&args.inputs)?;
    let forest = build_forest(set.into_definitions()).map_err(|err| err.to_string())?;
    print!("{}", render_forest(&forest));
    Ok(())
}

fn load_inputs(inputs: &[PathBuf]) -> Result<DefinitionSet, String> {
    let set = DefinitionSet::from_paths(inputs).map_err(|err| err.to_string())?;
    info!(definitions = set.len(), inputs = inputs.len(), "Loaded definitions");
    Ok(set)
}

fn check_definitions(set: &DefinitionSet) -> Result<(), String> {
    let errors = validate_definitions(set.definitions());
    if errors.is_empty() {
        return Ok(());
    }
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    Err(messages.join("; "))
}

fn resolve_options(config: &CompileConfig, parallel: bool, jobs: Option<usize>) -> CompilerOptions {
    let from_config = config.compiler_options();
    CompilerOptions {
        parallel: parallel || jobs.is_some() || from_config.parallel,
        jobs: jobs.or(from_config.jobs),
    }
}

fn render_forest(forest: &[DefinitionNode]) -> String {
    let mut out = String::new();
    for root in forest {
        for (depth, node) in root.walk() {
            let definition = node.definition();
            out.push_str(&"  ".repeat(depth));
            out.push_str(&definition.identifier);
            if definition.is_abstract {
                out.push_str(" (abstract)");
            }
            out.push('\n');
        }
    }
    out
}

fn default_report_path(output: &Path, format: DocumentFormat) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("compiled");
    output.with_file_name(format!("{stem}.report.{}", format_extension(format)))
}

fn format_extension(format: DocumentFormat) -> &'static str {
    match format {
        DocumentFormat::Json => "json",
        DocumentFormat::Yaml => "yaml",
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                format!(
                    "Failed to create output directory '{}': {err}",
                    parent.display()
                )
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use definition_core::Definition;

    use super::*;

    #[test]
    fn test_render_forest_indents_children() {
        let mut base = Definition::new("base");
        base.is_abstract = true;
        let forest = build_forest(vec![
            Definition::new("case").with_parent("base"),
            base,
            Definition::new("task"),
        ])
        .unwrap();
        assert_eq!(render_forest(&forest), "base (abstract)\n  case\ntask\n");
    }

    #[test]
    fn test_cli_flags_override_config() {
        let config: CompileConfig =
            serde_yaml::from_str("version: \"1.0\"\ncompile: { parallel: false, jobs: 2 }\n")
                .unwrap();
        assert_eq!(
            resolve_options(&config, false, None),
            CompilerOptions {
                parallel: false,
                jobs: Some(2),
            }
        );
        assert_eq!(
            resolve_options(&config, false, Some(6)),
            CompilerOptions::parallel(Some(6))
        );
    }

    #[test]
    fn test_default_report_path_sits_next_to_output() {
        assert_eq!(
            default_report_path(Path::new("out/compiled.json"), DocumentFormat::Yaml),
            PathBuf::from("out/compiled.report.yaml")
        );
    }
}
