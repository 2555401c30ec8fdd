// ===============================
// src/service.rs (load -> process -> write)
// ===============================
use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Args;
use crate::domain::{Event, PriceTick};
use crate::feed::{self, LoadError};
use crate::metrics::{self, FILLS_DROPPED};
use crate::output;
use crate::positions::PositionEngine;
use crate::recorder::{Recorder, RecorderError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Recorder(#[from] RecorderError),
    #[error("write PnL output failed: {0}")]
    Output(#[source] std::io::Error),
    #[error("write metrics to {path} failed: {source}")]
    Metrics { path: PathBuf, #[source] source: std::io::Error },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: usize,
    pub fills_loaded: usize,
    pub fills_applied: usize,
    pub fills_dropped: usize,
    pub symbols: usize,
}

// Optional recorder; keeps the first write failure and stops recording after it.
// The failure surfaces once the PnL stream is done, so stdout is complete either way.
struct Audit {
    recorder: Option<Recorder>,
    error: Option<RecorderError>,
}

impl Audit {
    fn record(&mut self, ev: Event) {
        if self.error.is_some() {
            return;
        }
        if let Some(r) = self.recorder.as_mut() {
            if let Err(e) = r.record(&ev) {
                self.error = Some(e);
            }
        }
    }

    fn finish(self) -> Result<(), RecorderError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if let Some(r) = self.recorder {
            r.finish()?;
        }
        Ok(())
    }
}

fn utc(ts_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ts_ms)
        .map(|d| d.to_rfc3339())
        .unwrap_or_else(|| ts_ms.to_string())
}

/// Run one batch: load both files fully, then stream one PnL line per tick into `out`.
///
/// Nothing is written to `out` unless both files load.
pub fn run<W: Write>(args: &Args, out: W) -> Result<RunSummary, RunError> {
    metrics::init();
    let opts = args.load_options();

    let fills = feed::load_fills(&args.fills, &opts)?;
    let ticks = feed::load_prices(&args.prices, &opts)?;

    let recorder = args.record_file.as_deref().map(Recorder::create).transpose()?;
    let audit = RefCell::new(Audit { recorder, error: None });
    audit.borrow_mut().record(Event::RunStarted {
        started_at: Utc::now().to_rfc3339(),
        fills_path: args.fills.display().to_string(),
        prices_path: args.prices.display().to_string(),
    });

    let mut engine = PositionEngine::new();
    let mut stream = engine.process_with(&ticks, &fills, |tick, fill, st| {
        audit.borrow_mut().record(Event::FillApplied { tick_ts_ms: tick.ts_ms, fill: fill.clone(), state: *st });
    });
    let written = output::write_records(
        out,
        stream.by_ref().inspect(|rec| audit.borrow_mut().record(Event::Pnl(rec.clone()))),
    )
    .map_err(RunError::Output)?;
    let fills_applied = stream.fills_consumed();
    let fills_dropped = stream.fills_remaining();
    drop(stream);

    let summary = RunSummary {
        ticks: written,
        fills_loaded: fills.len(),
        fills_applied,
        fills_dropped,
        symbols: engine.book().len(),
    };

    FILLS_DROPPED.inc_by(fills_dropped as u64);
    if fills_dropped > 0 {
        warn!(fills_dropped, "fills after the last price tick were not applied");
    }

    audit.borrow_mut().record(Event::RunFinished {
        ticks: summary.ticks,
        fills_applied: summary.fills_applied,
        fills_dropped: summary.fills_dropped,
        symbols: summary.symbols,
    });
    audit.into_inner().finish()?;

    if let Some(path) = args.metrics_file.as_ref() {
        metrics::write_to(path).map_err(|source| RunError::Metrics { path: path.clone(), source })?;
    }

    let span = |t: Option<&PriceTick>| t.map(|t| utc(t.ts_ms)).unwrap_or_default();
    info!(
        ticks = summary.ticks,
        fills_loaded = summary.fills_loaded,
        fills_applied = summary.fills_applied,
        fills_dropped = summary.fills_dropped,
        symbols = summary.symbols,
        first_tick = %span(ticks.first()),
        last_tick = %span(ticks.last()),
        "run complete"
    );
    Ok(summary)
}
