#![allow(dead_code)]

use chrono::NaiveDate;
use oppscan::domain::series::PriceBar;
use std::fs;
use std::path::Path;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Flat-OHLC daily bars from closes, starting 2024-01-01.
pub fn bars_from_closes(symbol: &str, closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            symbol: symbol.to_string(),
            date: date(2024, 1, 1) + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 10_000,
        })
        .collect()
}

/// Forty falling closes then ten rising: strongly oversold, recovers.
pub fn v_shape_closes() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..40).map(|i| 300.0 - 5.0 * i as f64).collect();
    let bottom = *closes.last().unwrap();
    closes.extend((1..=10).map(|i| bottom + 5.0 * i as f64));
    closes
}

/// Small alternating moves, nothing to signal on.
pub fn flat_closes(len: usize) -> Vec<f64> {
    (0..len).map(|i| 100.0 + (i % 2) as f64 * 0.5).collect()
}

pub fn write_price_csv(dir: &Path, symbol: &str, bars: &[PriceBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for bar in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
        ));
    }
    fs::write(dir.join(format!("{}.csv", symbol)), content).unwrap();
}

pub fn write_fundamentals_csv(dir: &Path, rows: &[(&str, f64, f64, f64, f64)]) {
    let mut content = String::from(
        "symbol,pe_ratio,price_to_book,revenue_growth,profit_margin,dividend_yield,beta\n",
    );
    for (symbol, pe, pb, growth, margin) in rows {
        content.push_str(&format!("{},{},{},{},{},,\n", symbol, pe, pb, growth, margin));
    }
    fs::write(dir.join("fundamentals.csv"), content).unwrap();
}
