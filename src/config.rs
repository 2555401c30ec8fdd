// ===============================
// src/config.rs
// ===============================
/*
=============================================================================
Project : pnl_marker — offline mark-to-market PnL from fills + price ticks
Module  : config.rs
Version : 0.5.0
Author  : Kukuh Tripamungkas Wicaksono (Kukuh TW)
License : MIT (see LICENSE)

Summary : Merges a time-ordered fills log with a price tick log, keeps
          per-symbol net size and cash flow, and prints one PnL line per
          price tick. Optional JSONL audit log and Prometheus text dump.

(c) 2025 Kukuh TW. All rights reserved where applicable.
=============================================================================
*/
use std::path::PathBuf;

use clap::Parser;
use dotenvy::dotenv;

/// Mark-to-market PnL per price tick from a fills file and a prices file.
#[derive(Parser, Clone, Debug)]
#[command(name = "pnl_marker", version, long_about = None)]
pub struct Args {
    /// Fills file: `F <ts_ms> <symbol> <price> <size> <B|S>` per line
    pub fills: PathBuf,

    /// Prices file: `P <ts_ms> <symbol> <price>` per line
    pub prices: PathBuf,

    /// Write a JSONL audit trail (fills applied, PnL emitted) to this path
    #[arg(long, env = "RECORD_FILE")]
    pub record_file: Option<PathBuf>,

    /// Dump Prometheus text metrics to this path after a successful run
    #[arg(long, env = "METRICS_FILE")]
    pub metrics_file: Option<PathBuf>,

    // Parse policy flags are argv-only: the same two paths must give the same output.
    /// Skip (and log) malformed records instead of aborting the run
    #[arg(long, default_value_t = false)]
    pub skip_malformed: bool,

    /// Reject unknown side codes and wrong message tags
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// tracing filter, e.g. `info` or `pnl_marker=debug`
    #[arg(long, env = "LOG_FILTER")]
    pub log_filter: Option<String>,
}

impl Args {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions { skip_malformed: self.skip_malformed, strict: self.strict }
    }

    /// Filter precedence: `--log-filter`/`LOG_FILTER`, then `RUST_LOG`, then `info`.
    pub fn log_filter(&self) -> String {
        self.log_filter
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "info".to_string())
    }
}

/// Parse policy handed to the feed loader.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub skip_malformed: bool,
    pub strict: bool,
}

/// Reads `.env` (if any) for the output-neutral options, then parses argv.
/// Usage errors are reported by clap, which exits non-zero.
pub fn load() -> Args {
    let _ = dotenv();
    Args::parse()
}
