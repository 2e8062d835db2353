use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use indexgen::config::{
    AppConfig, DEFAULT_CONFIG_NAME, IndexerSpec, LoadedConfig, load_config, save_config,
};
use indexgen::engine::{DecisionProvider, Driver, HeadlessDecisions, RunReport};
use indexgen::io::{FsDiscovery, FsSink};
use indexgen::output::print_report;
use indexgen::progress::Spinner;
use indexgen::prompt::TerminalPrompt;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "indexgen", version)]
#[command(about = "Generate barrel index files for a JavaScript/TypeScript source tree")]
struct Cli {
    /// The source directory to scan when no automatic configuration exists
    source: Option<String>,

    /// Path to the config file (searched for when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ignore every config file
    #[arg(long, conflicts_with = "config")]
    no_config: bool,

    /// Only create the index in the root directory
    #[arg(short, long)]
    single: bool,

    /// Report what would be written without touching the disk
    #[arg(short, long, visible_alias = "dry")]
    dry_run: bool,

    /// Show empty indexes (-v) and generated content (-vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Answer prompts with defaults and save updated configuration
    #[arg(short, long)]
    yes: bool,

    /// Directory that paths in the configuration are relative to
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Disable coloured output
    #[arg(long)]
    no_color: bool,
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 | 1 => "warn",
        2 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("Cannot open root directory {}", cli.root.display()))?;

    let loaded = if cli.no_config {
        None
    } else {
        let explicit = cli.config.as_ref().map(|p| root.join(p));
        load_config(explicit.as_deref(), &root).context("Failed to load configuration")?
    };
    if let Some(loaded) = &loaded {
        tracing::info!(path = %loaded.path.display(), "loaded configuration");
    }

    let app = AppConfig {
        source: cli.source.clone(),
        dry_run: cli.dry_run,
        root_only: cli.single,
        indexer: loaded.as_ref().map(|l| l.spec.clone()),
    };

    let report = generate(&cli, &root, &app)?;
    print_report(&report, !cli.no_color, cli.verbose)?;

    if let Some(spec) = &report.result {
        if !report.dry_run {
            persist(&cli, &root, loaded.as_ref(), spec)?;
        }
    }

    if report.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn generate(cli: &Cli, root: &Path, app: &AppConfig) -> Result<RunReport> {
    let discovery = FsDiscovery::new(root);
    let sink = FsSink::new(root);

    let mut decisions: Box<dyn DecisionProvider> = if cli.yes {
        Box::new(HeadlessDecisions::default())
    } else {
        Box::new(TerminalPrompt::new(io::stdin().lock(), io::stderr()))
    };

    // prompts and a spinner would fight over stderr
    let show_spinner = matches!(app.indexer, Some(IndexerSpec::Auto(_)))
        && cli.verbose == 0
        && io::stderr().is_terminal();
    let spinner = Spinner::start("Generating indexes...", show_spinner);

    let report = Driver::new(&discovery, &sink, decisions.as_mut()).run(app);
    spinner.finish();

    report.context("Index generation failed")
}

/// Offer to write the changed configuration back to where it came from
fn persist(
    cli: &Cli,
    root: &Path,
    loaded: Option<&LoadedConfig>,
    spec: &IndexerSpec,
) -> Result<()> {
    let mut prompt = TerminalPrompt::new(io::stdin().lock(), io::stderr());

    if !cli.yes && !prompt.confirm("Do you want to save the updated configuration?", true)? {
        return Ok(());
    }

    let path = match loaded {
        Some(loaded) => loaded.path.clone(),
        None if cli.yes => root.join(DEFAULT_CONFIG_NAME),
        None => root.join(prompt.ask("Path to save config file?", DEFAULT_CONFIG_NAME)?),
    };

    save_config(&path, spec).with_context(|| format!("Failed to save {}", path.display()))?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}
