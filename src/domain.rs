// ===============================
// src/domain.rs
// ===============================
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side { Buy, Sell }
impl Side {
    pub fn sign(&self) -> i64 { match self { Side::Buy => 1, Side::Sell => -1 } }

    /// Lenient decode: only `"B"` is a buy, every other code trades as a sell.
    pub fn from_code(code: &str) -> Side { if code == "B" { Side::Buy } else { Side::Sell } }

    pub fn from_code_strict(code: &str) -> Option<Side> {
        match code { "B" => Some(Side::Buy), "S" => Some(Side::Sell), _ => None }
    }
}

/// One executed trade from the fills file. `size` is a magnitude; direction lives in `side`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillRecord { pub ts_ms: i64, pub symbol: String, pub price: f64, pub size: u32, pub side: Side }

impl FillRecord {
    pub fn signed_size(&self) -> i64 { self.side.sign() * self.size as i64 }
    pub fn signed_cash(&self) -> f64 { -self.price * self.signed_size() as f64 }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTick { pub ts_ms: i64, pub symbol: String, pub price: f64 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnlRecord { pub ts_ms: i64, pub symbol: String, pub net_size: i64, pub pnl: f64 }

// Running aggregate per symbol
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    pub cash_flow: f64,
    pub net_size: i64,
}

impl PositionState {
    pub fn apply(&mut self, fill: &FillRecord) {
        self.net_size += fill.signed_size();
        self.cash_flow += fill.signed_cash();
    }

    pub fn mark(&self, price: f64) -> f64 { self.net_size as f64 * price + self.cash_flow }
}

// Audit trail entries written by the recorder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    RunStarted { started_at: String, fills_path: String, prices_path: String },
    FillApplied { tick_ts_ms: i64, fill: FillRecord, state: PositionState },
    Pnl(PnlRecord),
    RunFinished { ticks: usize, fills_applied: usize, fills_dropped: usize, symbols: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(price: f64, size: u32, side: Side) -> FillRecord {
        FillRecord { ts_ms: 0, symbol: "AAPL".into(), price, size, side }
    }

    #[test]
    fn buy_adds_size_and_spends_cash() {
        let mut st = PositionState::default();
        st.apply(&fill(10.0, 5, Side::Buy));
        assert_eq!(st.net_size, 5);
        assert_eq!(st.cash_flow, -50.0);
        assert_eq!(st.mark(12.0), 10.0);
    }

    #[test]
    fn sell_goes_short_and_receives_cash() {
        let mut st = PositionState::default();
        st.apply(&fill(9.0, 2, Side::Sell));
        assert_eq!(st.net_size, -2);
        assert_eq!(st.cash_flow, 18.0);
    }

    #[test]
    fn side_codes() {
        assert_eq!(Side::from_code("B"), Side::Buy);
        assert_eq!(Side::from_code("S"), Side::Sell);
        assert_eq!(Side::from_code("X"), Side::Sell);
        assert_eq!(Side::from_code("b"), Side::Sell);
        assert_eq!(Side::from_code_strict("X"), None);
        assert_eq!(Side::from_code_strict("S"), Some(Side::Sell));
    }
}
