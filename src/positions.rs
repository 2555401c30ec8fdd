// ===============================
// src/positions.rs (merge fills into positions, mark on each price tick)
// ===============================

use ahash::AHashMap as HashMap;
use tracing::trace;

use crate::domain::{FillRecord, PnlRecord, PositionState, PriceTick};
use crate::metrics::{FILLS_APPLIED, POSITION_NET_SIZE, TICKS};

/// Per-symbol position state, created lazily on first reference.
#[derive(Debug, Default, Clone)]
pub struct PositionBook {
    by_symbol: HashMap<String, PositionState>,
}

impl PositionBook {
    pub fn get(&self, symbol: &str) -> Option<&PositionState> { self.by_symbol.get(symbol) }

    pub fn len(&self) -> usize { self.by_symbol.len() }

    pub fn is_empty(&self) -> bool { self.by_symbol.is_empty() }

    fn entry(&mut self, symbol: &str) -> &mut PositionState {
        self.by_symbol.entry(symbol.to_string()).or_default()
    }

    pub fn apply(&mut self, fill: &FillRecord) -> PositionState {
        let st = self.entry(&fill.symbol);
        st.apply(fill);
        POSITION_NET_SIZE.with_label_values(&[fill.symbol.as_str()]).set(st.net_size);
        *st
    }

    pub fn mark(&mut self, tick: &PriceTick) -> PnlRecord {
        let st = self.entry(&tick.symbol);
        PnlRecord { ts_ms: tick.ts_ms, symbol: tick.symbol.clone(), net_size: st.net_size, pnl: st.mark(tick.price) }
    }
}

/// Observer used by [`PositionEngine::process`]: ignores every fill.
pub type NoopObserver = fn(&PriceTick, &FillRecord, &PositionState);

fn ignore_fill(_: &PriceTick, _: &FillRecord, _: &PositionState) {}

#[derive(Debug, Default)]
pub struct PositionEngine {
    book: PositionBook,
}

impl PositionEngine {
    pub fn new() -> Self { Self::default() }

    pub fn book(&self) -> &PositionBook { &self.book }

    /// Lazily yields one [`PnlRecord`] per tick, in tick order.
    ///
    /// Before each tick is marked, every not-yet-consumed fill with
    /// `ts_ms <= tick.ts_ms` is applied, whatever its symbol. The fill cursor
    /// only moves forward; fills later than the last tick are never applied.
    pub fn process<'a>(&'a mut self, ticks: &'a [PriceTick], fills: &'a [FillRecord]) -> PnlStream<'a, NoopObserver> {
        self.process_with(ticks, fills, ignore_fill as NoopObserver)
    }

    /// Same as [`process`](Self::process), calling `on_fill` after each fill is applied
    /// with the triggering tick, the fill, and the symbol's updated state.
    pub fn process_with<'a, F>(&'a mut self, ticks: &'a [PriceTick], fills: &'a [FillRecord], on_fill: F) -> PnlStream<'a, F>
    where
        F: FnMut(&PriceTick, &FillRecord, &PositionState),
    {
        PnlStream { book: &mut self.book, ticks: ticks.iter(), fills, cursor: 0, on_fill }
    }
}

pub struct PnlStream<'a, F> {
    book: &'a mut PositionBook,
    ticks: std::slice::Iter<'a, PriceTick>,
    fills: &'a [FillRecord],
    cursor: usize,
    on_fill: F,
}

impl<'a, F> PnlStream<'a, F> {
    pub fn fills_consumed(&self) -> usize { self.cursor }

    /// Fills past the cursor. After the stream is exhausted these are the trailing fills.
    pub fn fills_remaining(&self) -> usize { self.fills.len() - self.cursor }
}

impl<'a, F> Iterator for PnlStream<'a, F>
where
    F: FnMut(&PriceTick, &FillRecord, &PositionState),
{
    type Item = PnlRecord;

    fn next(&mut self) -> Option<PnlRecord> {
        let tick = self.ticks.next()?;
        let fills = self.fills;

        while let Some(fill) = fills.get(self.cursor) {
            if fill.ts_ms > tick.ts_ms {
                break;
            }
            let st = self.book.apply(fill);
            (self.on_fill)(tick, fill, &st);
            FILLS_APPLIED.inc();
            self.cursor += 1;
        }

        let rec = self.book.mark(tick);
        trace!(ts_ms = rec.ts_ms, symbol = %rec.symbol, net_size = rec.net_size, pnl = rec.pnl, "marked");
        TICKS.inc();
        Some(rec)
    }

    fn size_hint(&self) -> (usize, Option<usize>) { self.ticks.size_hint() }
}

impl<'a, F> ExactSizeIterator for PnlStream<'a, F> where F: FnMut(&PriceTick, &FillRecord, &PositionState) {}

/// One-shot convenience: fresh engine, collect every record.
pub fn process_all(ticks: &[PriceTick], fills: &[FillRecord]) -> Vec<PnlRecord> {
    let mut engine = PositionEngine::new();
    engine.process(ticks, fills).collect()
}
