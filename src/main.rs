// ===============================
// src/main.rs
// ===============================
/*
 pnl_marker fills.txt prices.txt > pnl.txt

 # audit trail + metrics dump
 RECORD_FILE=out/events.jsonl METRICS_FILE=out/metrics.prom pnl_marker fills.txt prices.txt
*/
/*
=============================================================================
Project : pnl_marker — offline mark-to-market PnL from fills + price ticks
Module  : main.rs
Version : 0.5.0
Author  : Kukuh Tripamungkas Wicaksono (Kukuh TW)
License : MIT (see LICENSE)

Summary : Merges a time-ordered fills log with a price tick log, keeps
          per-symbol net size and cash flow, and prints one PnL line per
          price tick. Optional JSONL audit log and Prometheus text dump.

(c) 2025 Kukuh TW. All rights reserved where applicable.
=============================================================================
*/
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pnl_marker::{config, service};

fn main() -> ExitCode {
    // ---- Load config (usage errors exit here via clap) ----
    let args = config::load();

    // ---- Logging (stderr; stdout carries the PnL lines) ----
    let filter = EnvFilter::try_new(args.log_filter()).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!(
        fills = %args.fills.display(),
        prices = %args.prices.display(),
        record_file = ?args.record_file,
        metrics_file = ?args.metrics_file,
        skip_malformed = args.skip_malformed,
        strict = args.strict,
        "startup config"
    );

    let stdout = std::io::stdout();
    match service::run(&args, stdout.lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
