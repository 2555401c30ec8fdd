// ===============================
// src/feed.rs
// ===============================
//
// Feed loader:
// - load_records  : read a whole file into an ordered Vec<R>
// - parse_records : same contract over an in-memory string
//
// Notes:
// - One record per line, fields separated by whitespace. Blank lines are ignored.
// - Input order is kept as-is. Out-of-order timestamps are logged, never re-sorted.
// - Default policy aborts on the first malformed record; `skip_malformed` logs
//   and drops it instead.
//

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::LoadOptions;
use crate::domain::{FillRecord, PriceTick, Side};
use crate::metrics::{RECORDS_LOADED, RECORDS_SKIPPED};

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("cannot parse field '{field}' from '{raw}'")]
    Field { field: &'static str, raw: String },
    #[error("field '{field}' is not a finite number: '{raw}'")]
    NonFinite { field: &'static str, raw: String },
    #[error("expected message type '{expected}', found '{found}'")]
    Tag { expected: &'static str, found: String },
    #[error("unknown side indicator '{0}' (expected B or S)")]
    Side(String),
    #[error("field '{field}' must not be negative: '{raw}'")]
    Negative { field: &'static str, raw: String },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("can't open file to read: {path}: {source}")]
    Open { path: PathBuf, #[source] source: std::io::Error },
    #[error("read failed: {path}: {source}")]
    Read { path: PathBuf, #[source] source: std::io::Error },
    #[error("{path}:{line}: {source}")]
    Parse { path: PathBuf, line: usize, #[source] source: ParseError },
}

/// A fixed-shape record type that the loader can decode from one line.
pub trait FeedRecord: Sized {
    const SOURCE: &'static str;
    const TAG: &'static str;
    const FIELDS: usize;

    fn from_fields(fields: &[&str], opts: &LoadOptions) -> Result<Self, ParseError>;
    fn timestamp(&self) -> i64;
}

fn parse_num<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, ParseError> {
    raw.parse::<T>().map_err(|_| ParseError::Field { field, raw: raw.to_string() })
}

fn parse_price(field: &'static str, raw: &str) -> Result<f64, ParseError> {
    let v: f64 = parse_num(field, raw)?;
    if !v.is_finite() {
        return Err(ParseError::NonFinite { field, raw: raw.to_string() });
    }
    Ok(v)
}

fn check_shape<R: FeedRecord>(fields: &[&str], opts: &LoadOptions) -> Result<(), ParseError> {
    if fields.len() != R::FIELDS {
        return Err(ParseError::FieldCount { expected: R::FIELDS, found: fields.len() });
    }
    if opts.strict && fields[0] != R::TAG {
        return Err(ParseError::Tag { expected: R::TAG, found: fields[0].to_string() });
    }
    Ok(())
}

impl FeedRecord for FillRecord {
    const SOURCE: &'static str = "fills";
    const TAG: &'static str = "F";
    const FIELDS: usize = 6;

    fn from_fields(fields: &[&str], opts: &LoadOptions) -> Result<Self, ParseError> {
        check_shape::<Self>(fields, opts)?;
        let side = if opts.strict {
            Side::from_code_strict(fields[5]).ok_or_else(|| ParseError::Side(fields[5].to_string()))?
        } else {
            Side::from_code(fields[5])
        };
        let fill = FillRecord {
            ts_ms: parse_num("timestamp", fields[1])?,
            symbol: fields[2].to_string(),
            price: parse_price("price", fields[3])?,
            size: parse_num("size", fields[4])?,
            side,
        };
        if opts.strict {
            if fill.ts_ms < 0 {
                return Err(ParseError::Negative { field: "timestamp", raw: fields[1].to_string() });
            }
            if fill.price < 0.0 {
                return Err(ParseError::Negative { field: "price", raw: fields[3].to_string() });
            }
        }
        Ok(fill)
    }

    fn timestamp(&self) -> i64 { self.ts_ms }
}

impl FeedRecord for PriceTick {
    const SOURCE: &'static str = "prices";
    const TAG: &'static str = "P";
    const FIELDS: usize = 4;

    fn from_fields(fields: &[&str], opts: &LoadOptions) -> Result<Self, ParseError> {
        check_shape::<Self>(fields, opts)?;
        Ok(PriceTick {
            ts_ms: parse_num("timestamp", fields[1])?,
            symbol: fields[2].to_string(),
            price: parse_price("price", fields[3])?,
        })
    }

    fn timestamp(&self) -> i64 { self.ts_ms }
}

/// Decode every line of `reader`. `origin` only labels errors and logs.
fn read_lines<R: FeedRecord, B: BufRead>(
    reader: B,
    origin: &Path,
    opts: &LoadOptions,
) -> Result<Vec<R>, LoadError> {
    let mut out = Vec::new();
    let mut skipped = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| LoadError::Read { path: origin.to_path_buf(), source })?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        match R::from_fields(&fields, opts) {
            Ok(rec) => out.push(rec),
            Err(e) if opts.skip_malformed => {
                warn!(source = R::SOURCE, path = %origin.display(), line = idx + 1, error = %e, "skipping malformed record");
                RECORDS_SKIPPED.with_label_values(&[R::SOURCE]).inc();
                skipped += 1;
            }
            Err(source) => {
                return Err(LoadError::Parse { path: origin.to_path_buf(), line: idx + 1, source });
            }
        }
    }

    RECORDS_LOADED.with_label_values(&[R::SOURCE]).inc_by(out.len() as u64);
    if let Some(i) = first_out_of_order(&out) {
        warn!(source = R::SOURCE, index = i, ts_ms = out[i].timestamp(), "timestamps not non-decreasing; input is used as given");
    }
    info!(source = R::SOURCE, path = %origin.display(), records = out.len(), skipped, "loaded");
    Ok(out)
}

/// Load an ordered sequence of records from a file. The file is closed before returning.
pub fn load_records<R: FeedRecord>(path: &Path, opts: &LoadOptions) -> Result<Vec<R>, LoadError> {
    debug!(source = R::SOURCE, path = %path.display(), "opening");
    let file = File::open(path).map_err(|source| LoadError::Open { path: path.to_path_buf(), source })?;
    read_lines(BufReader::new(file), path, opts)
}

pub fn parse_records<R: FeedRecord>(src: &str, origin: &str, opts: &LoadOptions) -> Result<Vec<R>, LoadError> {
    read_lines(src.as_bytes(), Path::new(origin), opts)
}

/// Index of the first record whose timestamp is lower than its predecessor's.
pub fn first_out_of_order<R: FeedRecord>(records: &[R]) -> Option<usize> {
    records
        .windows(2)
        .position(|w| w[1].timestamp() < w[0].timestamp())
        .map(|i| i + 1)
}

pub fn load_fills(path: &Path, opts: &LoadOptions) -> Result<Vec<FillRecord>, LoadError> {
    load_records(path, opts)
}

pub fn load_prices(path: &Path, opts: &LoadOptions) -> Result<Vec<PriceTick>, LoadError> {
    load_records(path, opts)
}
