//! caos-query CLI - generate C++ query headers from YAML definitions

use std::error::Error as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use caos_query_lib::loader::{diagnose_structure, find_definition_files};
use caos_query_lib::schema::{BatchReport, SchemaValidator};
use caos_query_lib::{FeatureFlags, GeneratorConfig, QueryGenError, SchemaPolicy, generate};
use clap::{Parser, Subcommand};
use colored::Colorize;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "caos-query")]
#[command(author, version, about = "Generate C++ query headers from YAML definitions", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the six query artifacts
    Generate {
        /// Query definitions YAML file
        #[arg(long, value_name = "FILE")]
        definitions: PathBuf,

        /// Output directory for generated files
        #[arg(long, value_name = "DIR")]
        output_dir: PathBuf,

        /// JSON Schema to validate against [default: built-in schema]
        #[arg(long, value_name = "FILE")]
        schema: Option<PathBuf>,

        /// Enable example queries (IQuery_Example_*)
        #[arg(long)]
        caos_example_query: bool,

        /// Enable template queries (IQuery_Template_*)
        #[arg(long)]
        caos_template_query: bool,

        /// Disable JSON schema validation
        #[arg(long, conflicts_with = "require_schema")]
        no_schema_validation: bool,

        /// Fail if the schema cannot be loaded
        #[arg(long)]
        require_schema: bool,

        /// Print generated files without writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate query definitions against the JSON Schema
    Validate {
        /// YAML files or directories to validate [default: queries.yaml]
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,

        /// JSON Schema to validate against [default: built-in schema]
        #[arg(short, long, value_name = "FILE")]
        schema: Option<PathBuf>,

        /// Exit with an error code on validation failure
        #[arg(long)]
        strict: bool,

        /// Diagnose YAML structure issues instead of validating
        #[arg(short, long)]
        diagnose: bool,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Query(#[from] QueryGenError),

    #[error("no YAML files found in {}", .paths.join(", "))]
    NoDefinitionFiles { paths: Vec<String> },
}

/// Initialize tracing subscriber based on verbosity
fn init_tracing(verbose: u8) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "info".to_string(),
            1 => "info,caos_query_lib=debug".to_string(),
            _ => "debug,caos_query_lib=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(verbose >= 2)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            definitions,
            output_dir,
            schema,
            caos_example_query,
            caos_template_query,
            no_schema_validation,
            require_schema,
            dry_run,
        } => {
            let policy = if no_schema_validation {
                SchemaPolicy::Disabled
            } else if require_schema {
                SchemaPolicy::Required
            } else {
                SchemaPolicy::BestEffort
            };
            let mut config = GeneratorConfig::new(definitions, output_dir)
                .schema_policy(policy)
                .features(
                    FeatureFlags::new()
                        .example(caos_example_query)
                        .template(caos_template_query),
                )
                .dry_run(dry_run);
            if let Some(schema) = schema {
                config = config.schema_path(schema);
            }
            run_generate(&config)
        }
        Commands::Validate {
            paths,
            schema,
            strict,
            diagnose,
        } => run_validate(paths, schema.as_deref(), strict, diagnose, cli.verbose),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            report_error(&err, cli.verbose);
            ExitCode::FAILURE
        }
    }
}

fn run_generate(config: &GeneratorConfig) -> Result<ExitCode, CliError> {
    let report = generate(config)?;

    if config.dry_run {
        for rendered in &report.artifacts {
            println!("// ==> {} <==", rendered.artifact.file_name());
            print!("{}", rendered.content);
            println!();
        }
        return Ok(ExitCode::SUCCESS);
    }

    for path in &report.written {
        println!("{} Generated: {}", "✓".green(), path.display());
    }
    println!(
        "{} of {} queries enabled, {} files written to {}",
        report.enabled,
        report.total,
        report.written.len(),
        config.output_dir.display()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_validate(
    paths: Vec<PathBuf>,
    schema: Option<&Path>,
    strict: bool,
    diagnose: bool,
    verbose: u8,
) -> Result<ExitCode, CliError> {
    let paths = if paths.is_empty() {
        vec![PathBuf::from("queries.yaml")]
    } else {
        paths
    };

    let files = find_definition_files(&paths)?;
    if files.is_empty() {
        return Err(CliError::NoDefinitionFiles {
            paths: paths.iter().map(|p| p.display().to_string()).collect(),
        });
    }

    if diagnose {
        let mut unreadable = false;
        for file in &files {
            match diagnose_structure(file) {
                Ok(report) => print!("{report}"),
                Err(err) => {
                    eprintln!("{} {err}", "error:".red().bold());
                    unreadable = true;
                }
            }
        }
        return Ok(if unreadable {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    let validator = match schema {
        Some(path) => SchemaValidator::from_path(path)?,
        None => SchemaValidator::embedded()?,
    };

    if verbose > 0 {
        println!("Schema: {}", validator.origin());
        println!("YAML files: {}", files.len());
        println!("{}", "─".repeat(50));
    }

    let batch: Vec<(PathBuf, String)> = files
        .into_iter()
        .map(|path| {
            let name = path.display().to_string();
            (path, name)
        })
        .collect();
    debug!("Validating {} file(s) against {}", batch.len(), validator.origin());
    let report = validator.validate_batch(&batch);
    print_batch_report(&batch, &report);

    let unreadable = report.failures.iter().any(|failure| {
        matches!(
            failure.error,
            QueryGenError::NotFound { .. } | QueryGenError::Io { .. }
        )
    });

    if unreadable || (strict && !report.all_valid()) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_batch_report(batch: &[(PathBuf, String)], report: &BatchReport) {
    for (index, (_, name)) in batch.iter().enumerate() {
        match report.failure_at(index) {
            None => println!("{} {name}: validation passed", "✓".green()),
            Some(failure) => {
                println!("{} {name}: validation failed", "✗".red());
                match &failure.error {
                    QueryGenError::SchemaViolation { violations, .. } => {
                        for (i, violation) in violations.iter().enumerate() {
                            println!();
                            println!("  Violation {}:", i + 1);
                            for line in violation.to_string().lines() {
                                println!("    {line}");
                            }
                        }
                    }
                    other => println!("    {other}"),
                }
            }
        }
    }

    if batch.len() > 1 {
        println!();
        let passed = report.checked - report.failures.len();
        let summary = format!("{passed}/{} files valid", report.checked);
        if report.all_valid() {
            println!("{}", summary.green());
        } else {
            println!("{}", summary.red());
        }
    }
}

fn report_error(err: &CliError, verbose: u8) {
    eprintln!("{} {err}", "error:".red().bold());

    if let CliError::Query(QueryGenError::SchemaViolation { violations, .. }) = err {
        for violation in violations {
            for line in violation.to_string().lines() {
                eprintln!("  {line}");
            }
        }
    }

    if verbose > 0 {
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_requires_definitions_and_output_dir() {
        let err = Cli::try_parse_from(["caos-query", "generate", "--definitions", "q.yaml"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn generate_flags_parse() {
        let cli = Cli::try_parse_from([
            "caos-query",
            "-vv",
            "generate",
            "--definitions",
            "q.yaml",
            "--output-dir",
            "out",
            "--caos-example-query",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Generate {
                caos_example_query,
                caos_template_query,
                dry_run,
                ..
            } => {
                assert!(caos_example_query);
                assert!(!caos_template_query);
                assert!(dry_run);
            }
            other => panic!("Expected Generate, got: {:?}", other),
        }
    }

    #[test]
    fn schema_toggles_conflict() {
        let err = Cli::try_parse_from([
            "caos-query",
            "generate",
            "--definitions",
            "q.yaml",
            "--output-dir",
            "out",
            "--no-schema-validation",
            "--require-schema",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn validate_defaults_to_no_paths() {
        let cli = Cli::try_parse_from(["caos-query", "validate"]).unwrap();
        match cli.command {
            Commands::Validate { paths, strict, .. } => {
                assert!(paths.is_empty());
                assert!(!strict);
            }
            other => panic!("Expected Validate, got: {:?}", other),
        }
    }
}
