// Randomized checks of the merge engine over seeded, timestamp-sorted inputs.

use pnl_marker::output::write_records;
use pnl_marker::{process_all, FillRecord, PositionEngine, PriceTick, Side};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SYMBOLS: [&str; 3] = ["AAPL", "MSFT", "IBM"];

fn gen_inputs(seed: u64, n_ticks: usize, n_fills: usize) -> (Vec<PriceTick>, Vec<FillRecord>) {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut ts = 0i64;
    let ticks = (0..n_ticks)
        .map(|_| {
            ts += rng.gen_range(0..=20);
            PriceTick {
                ts_ms: ts,
                symbol: SYMBOLS[rng.gen_range(0..SYMBOLS.len())].to_string(),
                price: rng.gen_range(1..=2000) as f64 / 8.0,
            }
        })
        .collect();

    let mut ts = 0i64;
    let fills = (0..n_fills)
        .map(|_| {
            ts += rng.gen_range(0..=20);
            FillRecord {
                ts_ms: ts,
                symbol: SYMBOLS[rng.gen_range(0..SYMBOLS.len())].to_string(),
                price: rng.gen_range(1..=2000) as f64 / 8.0,
                size: rng.gen_range(1..=500),
                side: if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell },
            }
        })
        .collect();

    (ticks, fills)
}

fn render(ticks: &[PriceTick], fills: &[FillRecord]) -> Vec<u8> {
    let mut buf = Vec::new();
    write_records(&mut buf, process_all(ticks, fills)).unwrap();
    buf
}

#[test]
fn one_record_per_tick_in_tick_order() {
    for seed in 0..20 {
        let (ticks, fills) = gen_inputs(seed, 200, 300);
        let out = process_all(&ticks, &fills);
        assert_eq!(out.len(), ticks.len());
        for (rec, tick) in out.iter().zip(&ticks) {
            assert_eq!(rec.ts_ms, tick.ts_ms);
            assert_eq!(rec.symbol, tick.symbol);
        }
    }
}

#[test]
fn output_is_byte_identical_across_runs() {
    let (ticks, fills) = gen_inputs(42, 500, 500);
    assert_eq!(render(&ticks, &fills), render(&ticks, &fills));
}

#[test]
fn late_fills_do_not_change_output() {
    for seed in 0..10 {
        let (ticks, mut fills) = gen_inputs(seed, 100, 150);
        let before = render(&ticks, &fills);

        let last = ticks.last().map(|t| t.ts_ms).unwrap_or(0);
        let start = fills.last().map(|f| f.ts_ms).unwrap_or(0).max(last) + 1;
        for (i, sym) in SYMBOLS.iter().enumerate() {
            fills.push(FillRecord { ts_ms: start + i as i64, symbol: sym.to_string(), price: 1.0, size: 1000, side: Side::Buy });
        }

        assert_eq!(before, render(&ticks, &fills));
    }
}

#[test]
fn net_size_and_pnl_match_fold_of_applied_fills() {
    for seed in [7, 8, 9] {
        let (ticks, fills) = gen_inputs(seed, 300, 400);
        let out = process_all(&ticks, &fills);
        for (rec, tick) in out.iter().zip(&ticks) {
            // prices are multiples of 1/8, so folding in file order is exact
            let (net, cash) = fills
                .iter()
                .filter(|f| f.ts_ms <= tick.ts_ms && f.symbol == tick.symbol)
                .fold((0i64, 0.0f64), |(net, cash), f| {
                    let signed = if f.side == Side::Buy { f.size as i64 } else { -(f.size as i64) };
                    (net + signed, cash + -f.price * signed as f64)
                });
            assert_eq!(rec.net_size, net, "tick at {} {}", tick.ts_ms, tick.symbol);
            assert_eq!(rec.pnl, net as f64 * tick.price + cash, "tick at {} {}", tick.ts_ms, tick.symbol);
        }
    }
}

#[test]
fn buy_only_conservation() {
    let (s, p, p2) = (37u32, 101.25, 99.5);
    let fills = [FillRecord { ts_ms: 10, symbol: "AAPL".into(), price: p, size: s, side: Side::Buy }];
    let ticks = [PriceTick { ts_ms: 20, symbol: "AAPL".into(), price: p2 }];
    let out = process_all(&ticks, &fills);
    assert_eq!(out[0].net_size, s as i64);
    assert_eq!(out[0].pnl, s as f64 * p2 - s as f64 * p);
}

#[test]
fn sell_fill_sign() {
    let fills = [FillRecord { ts_ms: 10, symbol: "AAPL".into(), price: 12.5, size: 4, side: Side::Sell }];
    let ticks = [PriceTick { ts_ms: 10, symbol: "AAPL".into(), price: 12.5 }];
    let mut engine = PositionEngine::new();
    let out: Vec<_> = engine.process(&ticks, &fills).collect();
    let st = engine.book().get("AAPL").unwrap();
    assert_eq!(st.net_size, -4);
    assert_eq!(st.cash_flow, 50.0);
    assert_eq!(out[0].pnl, 0.0);
}

#[test]
fn fill_at_tick_timestamp_is_included() {
    let fills = [FillRecord { ts_ms: 100, symbol: "AAPL".into(), price: 10.0, size: 5, side: Side::Buy }];
    let at = process_all(&[PriceTick { ts_ms: 100, symbol: "AAPL".into(), price: 12.0 }], &fills);
    let before = process_all(&[PriceTick { ts_ms: 99, symbol: "AAPL".into(), price: 12.0 }], &fills);
    assert_eq!((at[0].net_size, at[0].pnl), (5, 10.0));
    assert_eq!((before[0].net_size, before[0].pnl), (0, 0.0));
}
