//! filesig - identify files by their magic bytes

mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use filesig_core::{FileTypeRegistry, ProbeConfig, ProbeReport, probe_directory};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = ".filesig.toml";
const LOG_ENV: &str = "FILESIG_LOG";

/// Exit code when `--fail-on-unknown` is set and a file was not recognized.
const EXIT_UNKNOWN: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "filesig", version, about = "Identify files by their content")]
struct Cli {
    /// Files or directories to probe
    #[arg(required_unless_present = "list_types")]
    paths: Vec<PathBuf>,

    /// Config file (defaults to ./.filesig.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Probe every file under directory arguments
    #[arg(short, long)]
    recursive: bool,

    /// List registered file types in probe order and exit
    #[arg(long)]
    list_types: bool,

    /// Exit with status 2 if any file is not recognized
    #[arg(long)]
    fail_on_unknown: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }
    run(&cli)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("filesig=debug,filesig_core=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config_path(explicit: Option<&PathBuf>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.clone()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG);
            default.is_file().then_some(default)
        }
    }
}

fn load_config(cli: &Cli) -> Result<ProbeConfig> {
    let Some(path) = resolve_config_path(cli.config.as_ref()) else {
        return Ok(ProbeConfig::default());
    };
    // An explicit --config must load; the implicit default only warns.
    if cli.config.is_some() {
        return ProbeConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display()));
    }
    let (config, warning) = ProbeConfig::load_or_default(Some(&path));
    if let Some(warning) = warning {
        output::warn(&warning);
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = load_config(cli)?;
    for warning in config.validate() {
        output::warn(&format!("config: {warning}"));
    }

    let registry = FileTypeRegistry::new();
    for warning in config.apply(&registry) {
        tracing::debug!(%warning, "custom type skipped");
    }

    if cli.list_types {
        output::print_types(&registry.types(), cli.format)?;
        return Ok(ExitCode::SUCCESS);
    }

    let reports = collect_reports(cli, &registry, &config)?;
    output::print_reports(&reports, cli.format)?;

    if cli.fail_on_unknown && reports.iter().any(ProbeReport::is_unknown) {
        return Ok(ExitCode::from(EXIT_UNKNOWN));
    }
    Ok(ExitCode::SUCCESS)
}

fn collect_reports(
    cli: &Cli,
    registry: &FileTypeRegistry,
    config: &ProbeConfig,
) -> Result<Vec<ProbeReport>> {
    let mut reports = Vec::new();
    for path in &cli.paths {
        if cli.recursive && path.is_dir() {
            let found = probe_directory(path, registry, config)
                .with_context(|| format!("probing directory {}", path.display()))?;
            reports.extend(found);
        } else {
            if path.is_dir() {
                output::warn(&format!("{} is a directory (use -r to probe its files)", path.display()));
            }
            reports.push(probe_one(path, registry));
        }
    }
    Ok(reports)
}

fn probe_one(path: &Path, registry: &FileTypeRegistry) -> ProbeReport {
    let ft = registry.probe_by_content(path);
    ProbeReport::new(path, ft.as_ref())
}
