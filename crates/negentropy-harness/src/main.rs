//! Negentropy harness binary.
//!
//! # Usage
//!
//! ```bash
//! # Line protocol on stdin/stdout
//! negentropy-harness
//!
//! # Cap every message at 8 KiB
//! FRAMESIZELIMIT=8192 negentropy-harness
//!
//! # Reconcile two record sets in one process
//! negentropy-harness loopback < records.csv
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use negentropy_harness::{run_loopback, HarnessConfig, Interpreter, FRAME_SIZE_LIMIT_ENV, ID_SIZE_ENV};
use tokio::io::{stdin, stdout, BufReader, BufWriter};
use tracing_subscriber::EnvFilter;

/// Negentropy reconciliation test harness
#[derive(Parser, Debug)]
#[command(name = "negentropy-harness")]
#[command(about = "Line-oriented Negentropy conformance harness")]
#[command(version)]
struct Args {
    /// Maximum outbound message size in bytes (0 = unlimited)
    #[arg(long, env = FRAME_SIZE_LIMIT_ENV, default_value_t = 0)]
    frame_size_limit: u64,

    /// Fixed id width in bytes (default: width of the first id)
    #[arg(long, env = ID_SIZE_ENV)]
    id_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    mode: Option<Mode>,
}

impl Args {
    fn config(&self) -> HarnessConfig {
        let config = HarnessConfig::default().with_frame_size_limit(self.frame_size_limit);
        match self.id_size {
            Some(id_size) => config.with_id_size(id_size),
            None => config,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Read `<side>,<created>,<id>` records and reconcile client against
    /// server in this process
    Loopback,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = args.config();
    config.validate().context("invalid configuration")?;

    tracing::debug!(?config, "harness starting");

    let input = BufReader::new(stdin());
    let output = BufWriter::new(stdout());

    match args.mode {
        None => {
            let interpreter = Interpreter::new(config, output)?;
            interpreter.run(input).await.context("harness aborted")?;
        }
        Some(Mode::Loopback) => {
            run_loopback(&config, input, output)
                .await
                .context("loopback aborted")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_build_config() {
        let args = Args::try_parse_from([
            "negentropy-harness",
            "--frame-size-limit",
            "8192",
            "--id-size",
            "16",
            "loopback",
        ])
        .unwrap();
        assert!(matches!(args.mode, Some(Mode::Loopback)));

        let config = args.config();
        assert_eq!(config.frame_size_limit, 8192);
        assert_eq!(config.id_size, Some(16));
    }

    #[test]
    fn test_non_numeric_limit_rejected() {
        let result = Args::try_parse_from(["negentropy-harness", "--frame-size-limit", "4k"]);
        assert!(result.is_err());
    }
}
