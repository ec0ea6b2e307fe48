//! Keyspan keyring inspection binary.
//!
//! # Usage
//!
//! ```bash
//! # Resolve a keyring now with default settings
//! keyspan-inspect --keys keyring.json
//!
//! # Evaluate at a fixed instant with a settings file and a skew override
//! keyspan-inspect --keys keyring.json --config resolver.toml \
//!     --now 2025-06-01T12:00:00Z --max-clock-skew-secs 60 --format json
//! ```

use std::{io::Write, path::PathBuf};

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use keyspan_core::{FixedClock, SystemClock};
use keyspan_inspect::{InspectError, InspectOptions, Report, ResolverSettings};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Report the default key of a keyring
#[derive(Parser, Debug)]
#[command(name = "keyspan-inspect")]
#[command(about = "Resolve the default key of a keyring snapshot")]
#[command(version)]
struct Args {
    /// Keyring file (JSON)
    #[arg(short, long)]
    keys: PathBuf,

    /// Resolver settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Evaluation instant (RFC 3339), defaults to the current time
    #[arg(long, value_parser = keyspan_inspect::parse_timestamp)]
    now: Option<DateTime<Utc>>,

    /// Key propagation window in seconds
    #[arg(long)]
    propagation_window_secs: Option<i64>,

    /// Maximum clock skew in seconds
    #[arg(long)]
    max_clock_skew_secs: Option<i64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let options = InspectOptions {
        keys_path: args.keys,
        settings_path: args.config,
        overrides: ResolverSettings {
            key_propagation_window_secs: args.propagation_window_secs,
            max_clock_skew_secs: args.max_clock_skew_secs,
        },
    };

    let report = match run(&options, args.now) {
        Ok(report) => report,
        Err(error) => {
            tracing::error!(%error, "Inspection failed");
            return Err(error.into());
        },
    };

    let rendered = match args.format {
        Format::Text => report.render_text(),
        Format::Json => report.render_json()?,
    };
    writeln!(std::io::stdout().lock(), "{}", rendered.trim_end())?;

    Ok(())
}

fn run(options: &InspectOptions, now: Option<DateTime<Utc>>) -> Result<Report, InspectError> {
    match now {
        Some(instant) => keyspan_inspect::inspect(options, &FixedClock::new(instant)),
        None => keyspan_inspect::inspect(options, &SystemClock::new()),
    }
}
