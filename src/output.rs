// ===============================
// src/output.rs
// ===============================
use std::fmt;
use std::io::{self, Write};

use crate::domain::PnlRecord;

pub const PNL_TAG: &str = "PNL";

/// Shortest text that round-trips the value, with `.0` kept on integral values.
pub fn format_pnl(v: f64) -> String {
    let s = v.to_string();
    if v.is_finite() && !s.contains('.') {
        format!("{s}.0")
    } else {
        s
    }
}

// PNL <ts_ms> <symbol> <net_size> <pnl>
impl fmt::Display for PnlRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {} {}", PNL_TAG, self.ts_ms, self.symbol, self.net_size, format_pnl(self.pnl))
    }
}

pub fn write_records<W, I>(out: W, records: I) -> io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = PnlRecord>,
{
    let mut w = io::BufWriter::new(out);
    let mut n = 0usize;
    for rec in records {
        writeln!(w, "{rec}")?;
        n += 1;
    }
    w.flush()?;
    Ok(n)
}
