#![forbid(unsafe_code)]

mod fetch;
mod output;

use anyhow::Context as _;
use clap::Parser;
use output::OutputMode;
use routecycle_core::config::{self, ConfigError};
use routecycle_core::error::ErrorCode;
use routecycle_core::{IngestError, ingest_path};
use routecycle_search::{partition_lengths, select_best};
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "routecycle: find the longest routing cycle in a claim routing file",
    long_about = "Group routing records by (claim_id, status_code), find the longest simple \
                  cycle in each group, and print the group holding the longest one as \
                  `claim_id,status_code,cycle_length`.",
    after_help = "EXAMPLES:\n    # Local file\n    routecycle routes.psv\n\n    # Google Drive share link (downloaded first)\n    routecycle 'https://drive.google.com/file/d/<ID>/view'\n\n    # Machine-readable output plus per-partition lengths\n    routecycle routes.psv --json --partitions\n\nEXIT STATUS:\n    0  a cycle was found\n    1  no partition contains a cycle\n    2  the input could not be read or fetched"
)]
struct Cli {
    /// Routing file path, or an http(s) URL to download first.
    #[arg(value_name = "INPUT")]
    input: String,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Output format.
    #[arg(long, value_enum)]
    format: Option<OutputMode>,

    /// Alias for `--format json`.
    #[arg(long, hide = true)]
    json: bool,

    /// Config file (default: ROUTECYCLE_CONFIG, then the user config dir).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Field delimiter (overrides config).
    #[arg(long, value_name = "CHAR")]
    delimiter: Option<char>,

    /// Keep a downloaded input at PATH instead of a temporary file.
    #[arg(long, value_name = "PATH")]
    keep_download: Option<PathBuf>,

    /// Also print every partition's longest cycle to stderr.
    #[arg(long)]
    partitions: bool,

    /// Suppress download progress.
    #[arg(long)]
    no_progress: bool,
}

/// Non-error outcomes of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Found,
    NoCycle,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("ROUTECYCLE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "routecycle=debug,warn"
        } else {
            "routecycle=warn"
        })
    });

    let format = env::var("ROUTECYCLE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, mode: OutputMode) -> anyhow::Result<Outcome> {
    let mut config =
        config::load_config(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(delimiter) = cli.delimiter {
        config.ingest.delimiter = delimiter;
        config.ingest.validate()?;
    }
    if cli.no_progress {
        config.fetch.progress = false;
    }
    debug!(?config, "effective configuration");

    let source = fetch::resolve_input(&cli.input, cli.keep_download.as_deref(), &config.fetch)
        .with_context(|| format!("failed to fetch {}", cli.input))?;

    let ingested = ingest_path(source.path(), &config.ingest)
        .with_context(|| format!("failed to ingest {}", source.path().display()))?;
    info!(
        lines = ingested.stats.lines,
        records = ingested.stats.records,
        skipped = ingested.stats.blank + ingested.stats.malformed,
        partitions = ingested.graphs.len(),
        "input ingested"
    );

    let lengths = partition_lengths(&ingested.graphs);
    if cli.partitions {
        output::render_partitions(&mut io::stderr().lock(), &lengths, mode)?;
    }

    let Some(best) = select_best(&lengths) else {
        eprintln!("{}", ErrorCode::NoCycleFound.message());
        return Ok(Outcome::NoCycle);
    };

    let mut stdout = io::stdout().lock();
    output::render_result(&mut stdout, &best, mode)?;
    stdout.flush()?;
    Ok(Outcome::Found)
}

/// The most specific error code found in `err`'s chain.
fn error_code(err: &anyhow::Error) -> ErrorCode {
    err.chain()
        .find_map(|cause| {
            cause
                .downcast_ref::<IngestError>()
                .map(IngestError::code)
                .or_else(|| cause.downcast_ref::<ConfigError>().map(ConfigError::code))
                .or_else(|| {
                    cause
                        .downcast_ref::<fetch::FetchError>()
                        .map(fetch::FetchError::code)
                })
        })
        .unwrap_or(ErrorCode::InternalUnexpected)
}

fn report_error(err: &anyhow::Error, mode: OutputMode) {
    let detail = format!("{err:#}");
    if output::render_error(&mut io::stderr().lock(), error_code(err), &detail, mode).is_err() {
        eprintln!("error: {detail}");
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mode = output::resolve_output_mode(cli.format, cli.json);

    match run(&cli, mode) {
        Ok(Outcome::Found) => ExitCode::SUCCESS,
        Ok(Outcome::NoCycle) => ExitCode::from(1),
        Err(err) => {
            report_error(&err, mode);
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(["routecycle"]).is_err());
    }

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["routecycle", "routes.psv"]);
        assert_eq!(cli.input, "routes.psv");
        assert!(!cli.verbose);
        assert!(!cli.json);
        assert!(!cli.partitions);
        assert!(cli.format.is_none());
        assert!(cli.delimiter.is_none());
    }

    #[test]
    fn format_flag_parses() {
        let cli = Cli::parse_from(["routecycle", "--format", "json", "routes.psv"]);
        assert_eq!(cli.format, Some(OutputMode::Json));
    }

    #[test]
    fn delimiter_must_be_one_char() {
        let cli = Cli::parse_from(["routecycle", "--delimiter", ",", "r.csv"]);
        assert_eq!(cli.delimiter, Some(','));
        assert!(Cli::try_parse_from(["routecycle", "--delimiter", "||", "r.csv"]).is_err());
    }

    #[test]
    fn url_input_is_accepted_verbatim() {
        let url = "https://drive.google.com/file/d/abc/view?usp=sharing";
        let cli = Cli::parse_from(["routecycle", url, "--keep-download", "out.psv"]);
        assert_eq!(cli.input, url);
        assert_eq!(cli.keep_download, Some(PathBuf::from("out.psv")));
    }

    #[test]
    fn error_code_finds_ingest_errors_under_context() {
        let err = anyhow::Error::new(IngestError::Open {
            path: PathBuf::from("missing.psv"),
            source: io::Error::from(io::ErrorKind::NotFound),
        })
        .context("failed to ingest missing.psv");
        assert_eq!(error_code(&err), ErrorCode::InputUnreadable);
    }

    #[test]
    fn error_code_defaults_to_internal() {
        let err = anyhow::anyhow!("something odd");
        assert_eq!(error_code(&err), ErrorCode::InternalUnexpected);
    }
}
