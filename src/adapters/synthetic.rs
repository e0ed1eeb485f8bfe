//! Deterministic synthetic market data.
//!
//! A seeded random-walk provider for demos and offline testing. The
//! same seed, symbol, and date range always produce the same bars, so
//! scan and backtest output is reproducible without any data files.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::domain::error::OppscanError;
use crate::domain::fundamentals::Fundamentals;
use crate::domain::series::{PriceBar, PriceSeries};
use crate::ports::market_data::MarketDataProvider;

pub struct SyntheticProvider {
    seed: u64,
    symbols: Vec<String>,
}

/// xorshift64*, folded to [0, 1). Stable across platforms, which a
/// general-purpose RNG crate does not guarantee between versions.
struct DetRng(u64);

impl DetRng {
    fn new(seed: u64) -> Self {
        DetRng(seed | 1)
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        x.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in [-1, 1).
    fn next_signed(&mut self) -> f64 {
        self.next_f64() * 2.0 - 1.0
    }
}

fn symbol_hash(symbol: &str) -> u64 {
    // FNV-1a
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in symbol.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

impl SyntheticProvider {
    pub fn new(seed: u64, symbols: Vec<String>) -> Self {
        SyntheticProvider { seed, symbols }
    }

    fn rng_for(&self, symbol: &str) -> DetRng {
        DetRng::new(self.seed ^ symbol_hash(symbol))
    }

    fn generate(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
        let mut rng = self.rng_for(symbol);

        let base_price = 20.0 + rng.next_f64() * 180.0;
        let drift = rng.next_signed() * 0.002;
        let volatility = 0.005 + rng.next_f64() * 0.02;
        let base_volume = 50_000.0 + rng.next_f64() * 950_000.0;

        let mut bars = Vec::new();
        let mut close = base_price;
        let mut date = start;
        while date <= end {
            if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                date += chrono::Duration::days(1);
                continue;
            }

            let open = close;
            close = (close * (1.0 + drift + rng.next_signed() * volatility)).max(0.01);
            let spread = close.max(open) * volatility * rng.next_f64();
            let high = close.max(open) + spread;
            let low = (close.min(open) - spread).max(0.01);
            let volume = (base_volume * (0.5 + rng.next_f64())) as i64;

            bars.push(PriceBar {
                symbol: symbol.to_string(),
                date,
                open,
                high,
                low,
                close,
                volume,
            });
            date += chrono::Duration::days(1);
        }
        bars
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn price_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, OppscanError> {
        let bars = self.generate(symbol, start, end);
        if bars.is_empty() {
            return Err(OppscanError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("no trading days between {} and {}", start, end),
            });
        }
        PriceSeries::new(symbol, bars)
    }

    fn quote(&self, symbol: &str) -> Result<f64, OppscanError> {
        let mut rng = self.rng_for(symbol);
        Ok(20.0 + rng.next_f64() * 180.0)
    }

    fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, OppscanError> {
        let mut rng = DetRng::new(self.seed ^ symbol_hash(symbol).rotate_left(17));
        Ok(Fundamentals {
            pe_ratio: Some(5.0 + rng.next_f64() * 35.0),
            price_to_book: Some(0.5 + rng.next_f64() * 4.0),
            revenue_growth: Some(rng.next_signed() * 0.4),
            profit_margin: Some(rng.next_signed() * 0.3),
            dividend_yield: Some(rng.next_f64() * 0.06),
            beta: Some(0.4 + rng.next_f64() * 1.6),
        })
    }

    fn list_symbols(&self) -> Result<Vec<String>, OppscanError> {
        Ok(self.symbols.clone())
    }
}
