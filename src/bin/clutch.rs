//! Clutch CLI - Command-line interface for clutch-window
//!
//! Commands:
//! - analyze: Segment a play-by-play payload and print the encoded report
//! - validate: Parse a payload and report what the engine would consume
//! - config: Print the effective engine configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clutch_window::adapters::adapter_for;
use clutch_window::encoder::ReportEncoder;
use clutch_window::pipeline::analyze_feed;
use clutch_window::types::Vendor;
use clutch_window::{ComputeError, EngineConfig, ENGINE_VERSION};

/// Clutch - Clutch-time segmentation for basketball play-by-play
#[derive(Parser)]
#[command(name = "clutch")]
#[command(author = "Blaze Sports Intel")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Find and score clutch windows in play-by-play data", long_about = None)]
struct Cli {
    /// Log pipeline decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment a play-by-play payload into clutch windows
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Payload vendor
        #[arg(long)]
        vendor: VendorArg,

        /// Engine config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Earliest period that can be clutch
        #[arg(long)]
        min_period: Option<u8>,

        /// Largest clock-remaining value (seconds) that can be clutch
        #[arg(long)]
        max_window_seconds: Option<u32>,

        /// Largest absolute score margin that can be clutch
        #[arg(long)]
        max_margin: Option<u32>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format (pretty when stdout is a terminal)
        #[arg(long)]
        output_format: Option<OutputFormat>,
    },

    /// Parse a payload and report events, actions and dropped records
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Payload vendor
        #[arg(long)]
        vendor: VendorArg,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective engine configuration
    Config {
        /// Engine config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum VendorArg {
    /// Stats API playbyplayv2 responses
    NbaStats,
    /// Live data game.actions feeds
    NbaLive,
}

impl From<VendorArg> for Vendor {
    fn from(v: VendorArg) -> Self {
        match v {
            VendorArg::NbaStats => Vendor::NbaStats,
            VendorArg::NbaLive => Vendor::NbaLive,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Reads RUST_LOG; --verbose raises the floor to debug
    env_logger::Builder::from_default_env()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ClutchCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            vendor,
            config,
            min_period,
            max_window_seconds,
            max_margin,
            output,
            output_format,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(v) = min_period {
                config.criteria.min_period = v;
            }
            if let Some(v) = max_window_seconds {
                config.criteria.max_window_seconds = v;
            }
            if let Some(v) = max_margin {
                config.criteria.max_margin = v;
            }
            config.validate()?;

            cmd_analyze(&input, vendor.into(), &config, &output, output_format)
        }

        Commands::Validate {
            input,
            vendor,
            json,
        } => cmd_validate(&input, vendor.into(), json),

        Commands::Config { config } => {
            let config = load_config(config.as_deref())?;
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

fn cmd_analyze(
    input: &Path,
    vendor: Vendor,
    config: &EngineConfig,
    output: &Path,
    output_format: Option<OutputFormat>,
) -> Result<(), ClutchCliError> {
    let input_data = read_input(input)?;

    let feed = adapter_for(vendor).parse(&input_data)?;
    if feed.events.is_empty() {
        return Err(ClutchCliError::NoEvents);
    }

    let report = analyze_feed(&feed, config);
    let payload = ReportEncoder::new().encode(&report, vendor, config);

    let to_stdout = output.to_string_lossy() == "-";
    let format = output_format.unwrap_or(if to_stdout && atty::is(atty::Stream::Stdout) {
        OutputFormat::JsonPretty
    } else {
        OutputFormat::Json
    });

    let output_data = match format {
        OutputFormat::Json => serde_json::to_string(&payload)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&payload)?,
    };

    if to_stdout {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data + "\n")?;
    }

    Ok(())
}

fn cmd_validate(input: &Path, vendor: Vendor, json: bool) -> Result<(), ClutchCliError> {
    let input_data = read_input(input)?;
    let feed = adapter_for(vendor).parse(&input_data)?;

    let report = ValidationReport {
        vendor: vendor.as_str().to_string(),
        game_id: feed.game_id.clone(),
        events: feed.events.len(),
        actions: feed.actions.len(),
        dropped_records: feed.dropped_records,
        periods: feed
            .events
            .last()
            .map(|e| e.period)
            .unwrap_or_default(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Vendor:          {}", report.vendor);
        println!(
            "Game:            {}",
            report.game_id.as_deref().unwrap_or("unknown")
        );
        println!("Events:          {}", report.events);
        println!("Actions:         {}", report.actions);
        println!("Dropped records: {}", report.dropped_records);
        println!("Periods:         {}", report.periods);
    }

    if report.events == 0 {
        Err(ClutchCliError::NoEvents)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, ClutchCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, ClutchCliError> {
    match path {
        Some(path) => Ok(EngineConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(EngineConfig::default()),
    }
}

// Error types

#[derive(Debug)]
enum ClutchCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    NoEvents,
}

impl From<io::Error> for ClutchCliError {
    fn from(e: io::Error) -> Self {
        ClutchCliError::Io(e)
    }
}

impl From<ComputeError> for ClutchCliError {
    fn from(e: ComputeError) -> Self {
        ClutchCliError::Compute(e)
    }
}

impl From<serde_json::Error> for ClutchCliError {
    fn from(e: serde_json::Error) -> Self {
        ClutchCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<ClutchCliError> for CliError {
    fn from(e: ClutchCliError) -> Self {
        match e {
            ClutchCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            ClutchCliError::Compute(e @ ComputeError::InvalidConfig(_)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'clutch config' to see the expected shape".to_string()),
            },
            ClutchCliError::Compute(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check that --vendor matches the payload".to_string()),
            },
            ClutchCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            ClutchCliError::NoEvents => CliError {
                code: "NO_EVENTS".to_string(),
                message: "No play-by-play events found in input".to_string(),
                hint: Some("Run 'clutch validate --verbose' to see dropped records".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    vendor: String,
    game_id: Option<String>,
    events: usize,
    actions: usize,
    dropped_records: usize,
    periods: u8,
}
