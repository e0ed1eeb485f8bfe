//! Technical indicator engine.
//!
//! Every indicator produces a series the same length as its input, with
//! warmup positions flagged `valid: false`. Downstream code must treat an
//! invalid point as "no evidence", never as a value.

pub mod sma;
pub mod ema;
pub mod rsi;
pub mod macd;
pub mod bollinger;

pub use bollinger::compute_bollinger;
pub use ema::compute_ema;
pub use macd::compute_macd;
pub use rsi::compute_rsi;
pub use sma::compute_sma;

use chrono::NaiveDate;
use std::fmt;

use crate::domain::series::PriceBar;

/// Indicator identity plus parameters. Doubles as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        window: usize,
        mult_x100: u32,
    },
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Sma(window) => write!(f, "SMA({})", window),
            IndicatorKind::Ema(window) => write!(f, "EMA({})", window),
            IndicatorKind::Rsi(window) => write!(f, "RSI({})", window),
            IndicatorKind::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorKind::Bollinger { window, mult_x100 } => {
                write!(f, "BOLLINGER({},{})", window, *mult_x100 as f64 / 100.0)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorOutput {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

/// One point in an indicator series, aligned 1:1 with the price bars.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorOutput,
}

impl IndicatorPoint {
    pub fn undefined(date: NaiveDate, value: IndicatorOutput) -> Self {
        IndicatorPoint {
            date,
            valid: false,
            value,
        }
    }

    /// Simple value if this point is defined.
    pub fn simple(&self) -> Option<f64> {
        match (&self.value, self.valid) {
            (IndicatorOutput::Simple(v), true) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub kind: IndicatorKind,
    pub points: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Full-length series with every point undefined. Used when the
    /// requested window exceeds the available history: not an error,
    /// just no evidence anywhere.
    pub fn all_undefined(kind: IndicatorKind, bars: &[PriceBar]) -> Self {
        let points = bars
            .iter()
            .map(|b| IndicatorPoint::undefined(b.date, IndicatorOutput::Simple(0.0)))
            .collect();
        IndicatorSeries { kind, points }
    }

    pub fn point(&self, index: usize) -> Option<&IndicatorPoint> {
        self.points.get(index)
    }
}

/// Compute an indicator series over `bars`, same length as `bars`.
pub fn compute(bars: &[PriceBar], kind: &IndicatorKind) -> IndicatorSeries {
    match kind {
        IndicatorKind::Sma(window) => compute_sma(bars, *window),
        IndicatorKind::Ema(window) => compute_ema(bars, *window),
        IndicatorKind::Rsi(window) => compute_rsi(bars, *window),
        IndicatorKind::Macd { fast, slow, signal } => compute_macd(bars, *fast, *slow, *signal),
        IndicatorKind::Bollinger { window, mult_x100 } => {
            compute_bollinger(bars, *window, *mult_x100)
        }
    }
}
