// ===============================
// src/metrics.rs
// ===============================
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use std::path::Path;

// Single custom registry (we register everything here)
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

// -------- Feed loader --------
pub static RECORDS_LOADED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("records_loaded_total", "records parsed per source (label: source)"),
        &["source"],
    )
    .unwrap()
});

pub static RECORDS_SKIPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("records_skipped_total", "malformed records skipped per source (label: source)"),
        &["source"],
    )
    .unwrap()
});

// -------- Position engine --------
pub static TICKS: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("ticks_total", "price ticks marked (one PnL record each)").unwrap());

pub static FILLS_APPLIED: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("fills_applied_total", "fills folded into positions").unwrap());

pub static FILLS_DROPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("fills_dropped_total", "fills later than the last price tick").unwrap()
});

pub static POSITION_NET_SIZE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("position_net_size", "signed net size per symbol"),
        &["symbol"],
    )
    .unwrap()
});

pub fn init() {
    // Register all metrics to the custom registry; repeated init is a no-op
    for m in [
        REGISTRY.register(Box::new(RECORDS_LOADED.clone())),
        REGISTRY.register(Box::new(RECORDS_SKIPPED.clone())),
        REGISTRY.register(Box::new(TICKS.clone())),
        REGISTRY.register(Box::new(FILLS_APPLIED.clone())),
        REGISTRY.register(Box::new(FILLS_DROPPED.clone())),
        REGISTRY.register(Box::new(POSITION_NET_SIZE.clone())),
    ] {
        let _ = m;
    }
}

// Encode all metrics in Prometheus text format
pub fn encode_metrics() -> Vec<u8> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buf = Vec::new();
    if encoder.encode(&families, &mut buf).is_err() || buf.is_empty() {
        buf.extend_from_slice(b"# no metrics\n");
    }
    buf
}

/// Batch job, no scrape endpoint: dump the registry once at the end of a run.
pub fn write_to(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, encode_metrics())
}
