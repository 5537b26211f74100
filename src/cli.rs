use crate::config::{Direction, DocConfig};
use crate::engine::DocEngine;
use crate::model::source::SourceLoader;
use crate::model::{TypeCatalog, TypeRef};
use crate::serializer::{to_json, to_yaml, write_to_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// API doc materializer - render example payloads, parameter tables and form fields
/// for a type found in Rust sources or a type-model file
#[derive(Parser, Debug)]
#[command(name = "apidoc-materializer")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Directory of Rust sources, or a .yaml/.yml/.json type-model file
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Type to document, e.g. `Page<Order>` or `Vec<User>`
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub type_name: String,

    /// Whether the type is documented as a request or a response body
    #[arg(short = 'd', long = "direction", value_enum, default_value = "response")]
    pub direction: Direction,

    /// What to produce
    #[arg(short = 'k', long = "kind", value_enum, default_value = "example")]
    pub kind: OutputKind,

    /// Active validation group (repeatable)
    #[arg(short = 'g', long = "group", value_name = "GROUP")]
    pub groups: Vec<String>,

    /// Configuration file (.yaml/.yml/.json)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (json or yaml)
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputKind {
    /// Example payload
    Example,
    /// Flat parameter rows
    Params,
    /// Parameter rows nested by parent
    Tree,
    /// Multipart form entries (request only)
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.source.exists() {
        anyhow::bail!("Source path does not exist: {}", args.source.display());
    }
    if let Some(config) = &args.config {
        if !config.is_file() {
            anyhow::bail!("Configuration file does not exist: {}", config.display());
        }
    }
    if args.kind == OutputKind::Form && args.direction == Direction::Response {
        info!("Form data is always built for the request direction");
    }

    info!("Source: {}", args.source.display());
    info!("Type: {} ({:?}, {:?})", args.type_name, args.direction, args.kind);
    if !args.groups.is_empty() {
        info!("Validation groups: {}", args.groups.join(", "));
    }
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }

    Ok(args)
}

/// Load the type model found at `source`
pub fn load_catalog(source: &Path) -> Result<TypeCatalog> {
    let catalog = if source.is_dir() {
        info!("Loading types from Rust sources...");
        SourceLoader::new(source.to_path_buf())
            .load()
            .with_context(|| format!("Failed to load sources from {}", source.display()))?
    } else {
        info!("Loading type model file...");
        TypeCatalog::from_path(source)
            .with_context(|| format!("Failed to load type model {}", source.display()))?
    };
    info!("Loaded {} types", catalog.len());
    Ok(catalog)
}

/// Build the requested output and render it as text
pub fn render(args: &CliArgs, catalog: &TypeCatalog, config: &DocConfig) -> Result<String> {
    let root = TypeRef::parse(&args.type_name)
        .with_context(|| format!("Invalid type: {}", args.type_name))?;
    let engine = DocEngine::new(catalog, config);
    engine.ensure_known(&root)?;

    match args.kind {
        OutputKind::Example => {
            let example = engine.build_example(&root, args.direction, &args.groups)?;
            format_output(&example, args.output_format)
        }
        OutputKind::Params => {
            let rows = engine.build_params(&root, args.direction, &args.groups)?;
            info!("Built {} parameter rows", rows.len());
            format_output(&rows, args.output_format)
        }
        OutputKind::Tree => {
            let tree = engine.build_tree(&root, args.direction, &args.groups)?;
            format_output(&tree, args.output_format)
        }
        OutputKind::Form => {
            let entries = engine.build_form_data(&root, &args.groups)?;
            info!("Built {} form entries", entries.len());
            format_output(&entries, args.output_format)
        }
    }
}

fn format_output<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<String> {
    let content = match format {
        OutputFormat::Json => to_json(value),
        OutputFormat::Yaml => to_yaml(value),
    }
    .context("Failed to serialize output")?;
    Ok(content)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting documentation build...");

    let config = match &args.config {
        Some(path) => DocConfig::from_path(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => DocConfig::default(),
    };
    let catalog = load_catalog(&args.source)?;

    info!("Serializing to {:?} format...", args.output_format);
    let content = render(&args, &catalog, &config)?;

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
    } else {
        println!("{}", content);
    }

    info!("Build complete!");
    Ok(())
}
