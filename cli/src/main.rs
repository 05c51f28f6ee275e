use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;

use request_schema_bind::{Binder, RawRequest};
use request_schema_core::{Schema, SchemaBundle, SchemaRegistry, ValidationError};

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "schema-bind")]
#[command(about = "Offline schema bundle validation and request binding")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate one or more schema bundle files.
    Validate(ValidateArgs),
    /// Merge schema bundle files into a single bundle.
    Bundle(BundleArgs),
    /// Bind captured request fixtures against schemas from a bundle.
    Bind(BindArgs),
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Bundle files (JSON or YAML).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct BundleArgs {
    /// Bundle files (JSON or YAML) whose schemas are merged.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Output JSON bundle path.
    #[arg(long)]
    output: PathBuf,
    /// Optional bundle name metadata.
    #[arg(long)]
    name: Option<String>,
    /// Optional bundle description metadata.
    #[arg(long)]
    description: Option<String>,
}

#[derive(Debug, Args)]
struct BindArgs {
    /// Bundle file providing the schemas.
    #[arg(long)]
    bundle: PathBuf,
    /// Comma-separated schema names forming the binding set.
    #[arg(long)]
    schemas: String,
    /// Request fixture JSON files (path/query/headers/cookies/body).
    #[arg(required = true)]
    requests: Vec<PathBuf>,
    /// Output format for the bind report.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

/// Outcome of binding one request fixture.
#[derive(Debug, Serialize)]
struct BindReport {
    request: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    bound: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<ValidationError>>,
}

/// Full report for one bind run over a set of fixtures.
#[derive(Debug, Serialize)]
struct BindRunReport {
    generated_at: String,
    tool_version: String,
    schemas: Vec<String>,
    bound: usize,
    rejected: usize,
    results: Vec<BindReport>,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Validate(args) => run_validate(args),
        Command::Bundle(args) => run_bundle(args),
        Command::Bind(args) => run_bind(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let schemas = load_schemas(&args.inputs)?;
    let schema_count = schemas.len();

    match SchemaRegistry::builder().register_all(schemas).build() {
        Ok(_) => {
            println!(
                "Validated {} bundle file(s) with {} schema(s).",
                args.inputs.len(),
                schema_count
            );
            Ok(())
        }
        Err(errors) => {
            for error in &errors {
                eprintln!("configuration error: {error}");
            }
            Err(format!("{} configuration error(s) found", errors.len()))
        }
    }
}

fn run_bundle(args: BundleArgs) -> Result<(), String> {
    let schemas = load_schemas(&args.inputs)?;

    // Merged schemas must form a valid registry before they are bundled.
    if let Err(errors) = SchemaRegistry::builder()
        .register_all(schemas.clone())
        .build()
    {
        for error in &errors {
            eprintln!("configuration error: {error}");
        }
        return Err(format!("{} configuration error(s) found", errors.len()));
    }

    let mut bundle = SchemaBundle::new(PACKAGE_VERSION, Utc::now().to_rfc3339());
    bundle.name = args.name;
    bundle.description = args.description;
    bundle.schemas = schemas;

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                format!(
                    "Failed to create output directory '{}': {err}",
                    parent.display()
                )
            })?;
        }
    }

    let raw = serde_json::to_string_pretty(&bundle)
        .map_err(|err| format!("Failed to serialize bundle: {err}"))?;
    fs::write(&args.output, raw)
        .map_err(|err| format!("Failed to write '{}': {err}", args.output.display()))?;

    println!(
        "Bundled {} schema(s) into '{}'.",
        bundle.schema_count(),
        args.output.display()
    );
    Ok(())
}

fn run_bind(args: BindArgs) -> Result<(), String> {
    let schemas = load_schemas(std::slice::from_ref(&args.bundle))?;
    let registry = match SchemaRegistry::builder().register_all(schemas).build() {
        Ok(registry) => registry,
        Err(errors) => {
            for error in &errors {
                eprintln!("configuration error: {error}");
            }
            return Err(format!("{} configuration error(s) found", errors.len()));
        }
    };

    let names: Vec<&str> = args
        .schemas
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if names.is_empty() {
        return Err("--schemas must name at least one schema".to_string());
    }

    let binder = match Binder::new(&registry, &names) {
        Ok(binder) => binder,
        Err(errors) => {
            for error in &errors {
                eprintln!("configuration error: {error}");
            }
            return Err(format!("{} configuration error(s) found", errors.len()));
        }
    };

    let results: Vec<BindReport> = args
        .requests
        .par_iter()
        .map(|path| bind_fixture(&binder, path))
        .collect::<Result<_, String>>()?;

    let rejected = results.iter().filter(|r| !r.ok).count();
    let report = BindRunReport {
        generated_at: Utc::now().to_rfc3339(),
        tool_version: PACKAGE_VERSION.to_string(),
        schemas: names.iter().map(ToString::to_string).collect(),
        bound: results.len() - rejected,
        rejected,
        results,
    };

    let rendered = match args.format {
        CliOutputFormat::Json => serde_json::to_string_pretty(&report)
            .map_err(|err| format!("Failed to serialize report: {err}"))?,
        CliOutputFormat::Yaml => serde_yaml::to_string(&report)
            .map_err(|err| format!("Failed to serialize report: {err}"))?,
    };
    println!("{rendered}");

    if rejected > 0 {
        return Err(format!(
            "{rejected} of {} request(s) rejected",
            report.bound + rejected
        ));
    }
    Ok(())
}

fn bind_fixture(binder: &Binder<'_>, path: &Path) -> Result<BindReport, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
    let request: RawRequest = serde_json::from_str(&raw)
        .map_err(|err| format!("Invalid request fixture '{}': {err}", path.display()))?;

    let report = match binder.bind(&request) {
        Ok(value) => BindReport {
            request: path.display().to_string(),
            ok: true,
            bound: Some(value.to_json()),
            errors: None,
        },
        Err(errors) => BindReport {
            request: path.display().to_string(),
            ok: false,
            bound: None,
            errors: Some(errors),
        },
    };
    Ok(report)
}

/// Loads every schema from the given bundle files, JSON or YAML by
/// extension.
fn load_schemas(paths: &[PathBuf]) -> Result<Vec<Schema>, String> {
    let mut schemas = Vec::new();
    for path in paths {
        let raw = fs::read_to_string(path)
            .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
        let bundle: SchemaBundle = if is_yaml(path) {
            serde_yaml::from_str(&raw)
                .map_err(|err| format!("Invalid bundle '{}': {err}", path.display()))?
        } else {
            serde_json::from_str(&raw)
                .map_err(|err| format!("Invalid bundle '{}': {err}", path.display()))?
        };
        schemas.extend(bundle.schemas);
    }
    Ok(schemas)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}
