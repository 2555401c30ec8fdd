// ===============================
// src/lib.rs
// ===============================
//! Offline mark-to-market PnL: merges a fills log with a price tick log and
//! emits one `PNL` line per price tick.
//!
//! The core is [`positions::PositionEngine`]; [`service::run`] wires the feed
//! loader, the engine, the formatter and the optional recorder together.

pub mod config;
pub mod domain;
pub mod feed;
pub mod metrics;
pub mod output;
pub mod positions;
pub mod recorder;
pub mod service;

pub use domain::{FillRecord, PnlRecord, PositionState, PriceTick, Side};
pub use positions::{process_all, PositionEngine};
pub use service::{run, RunError, RunSummary};
