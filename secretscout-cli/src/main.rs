use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use secretscout::{
    config::ScanConfig,
    input::resolve_input,
    patterns::{load_pattern_file, PatternRegistry},
    run_scan, PatternSet,
};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "secretscout", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct CliScanArgs {
    /// File or directory to scan (reads standard input when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Named pattern set from the registry
    #[arg(short, long, default_value = "secrets")]
    pattern: String,

    /// Pattern file to use directly, bypassing the registry
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Truncation length for reported matches (0 for no truncation)
    #[arg(short, long, default_value = "400")]
    truncate: usize,

    /// Number of worker threads
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Path to the pattern registry file
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan files or standard input for secrets
    Scan(Box<CliScanArgs>),

    /// Register a named pattern file
    AddPattern {
        /// Name the set will be referenced by
        name: String,

        /// Path to the YAML pattern file
        path: PathBuf,

        /// Path to the pattern registry file
        #[arg(long)]
        registry: Option<PathBuf>,
    },

    /// List registered pattern sets
    ListPatterns {
        /// Path to the pattern registry file
        #[arg(long)]
        registry: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    run()
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => scan(*args),
        Commands::AddPattern {
            name,
            path,
            registry,
        } => {
            let mut registry = open_registry(registry)?;
            let path = path
                .canonicalize()
                .with_context(|| format!("cannot access pattern file {}", path.display()))?;
            // Validate before registering so a broken file fails here, not
            // at scan time.
            load_pattern_file(&path)?;
            registry.add(name.clone(), path)?;
            println!("Pattern set '{}' added to {}", name, registry.path().display());
            Ok(())
        }
        Commands::ListPatterns { registry } => {
            let registry = open_registry(registry)?;
            for name in registry.names() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn scan(args: CliScanArgs) -> Result<()> {
    let file_config = ScanConfig::load_from(args.config.as_deref())
        .context("failed to load configuration")?;

    let cli_config = ScanConfig {
        pattern_set: args.pattern,
        input: args.input,
        truncate: args.truncate,
        thread_count: args
            .threads
            .unwrap_or_else(|| file_config.thread_count),
        ..Default::default()
    };
    let config = file_config.merge_with_cli(cli_config);

    init_tracing(&config.log_level);
    if args.no_color {
        colored::control::set_override(false);
    }

    let specs = match &args.rules {
        Some(rules) => load_pattern_file(rules)?,
        None => open_registry(args.registry)?.load_set(&config.pattern_set)?,
    };
    let patterns = PatternSet::compile(&specs)?;
    let sources = resolve_input(config.input.as_deref())?;

    let summary = run_scan(sources, &patterns, &config.scan_options(), std::io::stdout())?;
    tracing::info!(
        "{} matches in {} sources ({} errors)",
        summary.matches_found,
        summary.sources_scanned,
        summary.source_errors
    );
    Ok(())
}

fn open_registry(path: Option<PathBuf>) -> Result<PatternRegistry> {
    let path = match path {
        Some(path) => path,
        None => PatternRegistry::default_path()?,
    };
    Ok(PatternRegistry::load(path)?)
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
