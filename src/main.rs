//! PolicyAudit - weighted privacy-policy scoring
//!
//! A CLI tool that prepares privacy-policy chunks for an LLM scorer and
//! aggregates the per-chunk JSON judgments into one weighted report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (I/O, config, malformed input, etc.)
//!   2 - Report has no usable scores, or confidence is below --min-confidence

mod analysis;
mod chunking;
mod cli;
mod config;
mod intake;
mod models;
mod prompts;
mod report;
mod scoring;

use anyhow::{Context, Result};
use chunking::{cap_chunks, TextSplitter};
use cli::{AggregateArgs, Args, ChunkArgs, Command};
use config::Config;
use report::AuditOutput;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("PolicyAudit v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .policyaudit.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  .policyaudit.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .policyaudit.toml")?;

    println!("✅ Created .policyaudit.toml with default settings.");
    println!("   Edit it to customize chunking, weights, and thresholds.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence over the CLI flags. Logs go to stderr so
/// reports written to stdout stay machine-readable.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Dispatch the subcommand. Returns the process exit code.
fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    match &args.command {
        Some(Command::Chunk(chunk)) => run_chunk(chunk, &config, args.output.as_deref()),
        Some(Command::Aggregate(aggregate)) => {
            run_aggregate(aggregate, &config, args.output.as_deref(), args.quiet)
        }
        None => Ok(0),
    }
}

/// Split a policy into chunks and emit one scoring request per line.
fn run_chunk(chunk: &ChunkArgs, config: &Config, output: Option<&Path>) -> Result<i32> {
    let text = std::fs::read_to_string(&chunk.input)
        .with_context(|| format!("Failed to read policy text: {}", chunk.input.display()))?;

    let settings = &config.chunking;
    let splitter = TextSplitter::new(settings.chunk_size, settings.chunk_overlap)
        .context("Invalid chunking settings")?;
    let chunks = cap_chunks(splitter.split(&text), settings.max_chunks)
        .context("Invalid chunking settings")?;

    if chunks.is_empty() {
        warn!("No text to chunk in {}", chunk.input.display());
        return Ok(2);
    }

    let requests = prompts::build_requests(&chunks, settings.max_excerpt_chars);
    let mut lines = String::new();
    for request in &requests {
        lines.push_str(&serde_json::to_string(request)?);
        lines.push('\n');
    }

    write_output(output, &lines)?;
    info!(
        "Prepared {} scoring requests from {}",
        requests.len(),
        chunk.input.display()
    );

    Ok(0)
}

/// Aggregate chunk results and emit the report envelope.
fn run_aggregate(
    aggregate: &AggregateArgs,
    config: &Config,
    output: Option<&Path>,
    quiet: bool,
) -> Result<i32> {
    let weights = config.weight_table()?;

    let content = std::fs::read_to_string(&aggregate.input)
        .with_context(|| format!("Failed to read chunk results: {}", aggregate.input.display()))?;
    let intake = intake::load_chunk_results(&content)
        .with_context(|| format!("Failed to parse chunk results: {}", aggregate.input.display()))?;
    info!(
        "Loaded {} of {} entries as chunk results",
        intake.results.len(),
        intake.entries
    );

    let source = aggregate.input.display().to_string();
    let audit = AuditOutput::build(&source, &intake, &weights, aggregate.report);

    write_output(output, &report::generate_json_report(&audit)?)?;

    if !quiet {
        eprintln!("\n📊 {}", report::generate_summary_text(&audit).replace('\n', "\n   "));
    }

    let Some(summary) = audit.summary() else {
        warn!("No usable chunk results in {}", source);
        return Ok(2);
    };

    if let Some(min) = config.scoring.min_confidence {
        if summary.confidence < min {
            eprintln!(
                "\n⛔ Confidence {:.2} is below the required {:.2}. Failing (exit code 2).",
                summary.confidence, min
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Write to the output file, or stdout when none is given.
fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!("Output saved to {}", path.display());
        }
        None => {
            print!("{}", content);
            if !content.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
