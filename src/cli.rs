//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use fetchboard_core::config::{PartialConfig, Verbosity};

/// Accept download URLs over HTTP and fetch them concurrently.
///
/// Fetchboard serves `GET /files` and `POST /files/add`, starts a download
/// for every submitted URL immediately, and redraws live progress.
#[derive(Parser, Debug)]
#[command(name = "fetchboard")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output (also hides the status board)
    #[arg(short, long)]
    pub quiet: bool,

    /// Address to listen on [default: 127.0.0.1:8080]
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Directory downloads are written to [default: Downloads]
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Status board refresh interval in milliseconds (20-10000) [default: 200]
    #[arg(long, value_parser = clap::value_parser!(u64).range(20..=10_000))]
    pub display_interval_ms: Option<u64>,

    /// Do not draw the live status board
    #[arg(long)]
    pub no_display: bool,

    /// HTTP connect timeout in seconds (1-3600) [default: 30]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// HTTP read timeout in seconds (1-3600) [default: 300]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: Option<u64>,
}

impl Args {
    /// Converts the flags that were actually given into a config layer.
    pub fn to_partial_config(&self) -> PartialConfig {
        PartialConfig {
            bind: self.bind.clone(),
            output_dir: self.output_dir.clone(),
            display_interval_ms: self.display_interval_ms,
            display: (self.no_display || self.quiet).then_some(false),
            connect_timeout_secs: self.connect_timeout,
            read_timeout_secs: self.read_timeout,
            verbosity: self.verbosity(),
        }
    }

    fn verbosity(&self) -> Option<Verbosity> {
        if self.quiet {
            return Some(Verbosity::Quiet);
        }
        match self.verbose {
            0 => None,
            1 => Some(Verbosity::Verbose),
            _ => Some(Verbosity::Debug),
        }
    }
}
