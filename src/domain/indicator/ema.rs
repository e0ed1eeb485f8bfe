//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the SMA of the first n closes, then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k). Warmup: first (n-1) positions
//! are undefined.

use crate::domain::indicator::{
    IndicatorKind, IndicatorOutput, IndicatorPoint, IndicatorSeries,
};
use crate::domain::series::PriceBar;

pub fn compute_ema(bars: &[PriceBar], window: usize) -> IndicatorSeries {
    let kind = IndicatorKind::Ema(window);
    if window == 0 || bars.len() < window {
        return IndicatorSeries::all_undefined(kind, bars);
    }

    let mut points = Vec::with_capacity(bars.len());
    let k = 2.0 / (window as f64 + 1.0);
    let mut ema = 0.0;
    let mut seed_sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if i + 1 < window {
            seed_sum += bar.close;
            points.push(IndicatorPoint::undefined(
                bar.date,
                IndicatorOutput::Simple(0.0),
            ));
        } else if i + 1 == window {
            seed_sum += bar.close;
            ema = seed_sum / window as f64;
            points.push(IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorOutput::Simple(ema),
            });
        } else {
            ema = bar.close * k + ema * (1.0 - k);
            points.push(IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorOutput::Simple(ema),
            });
        }
    }

    IndicatorSeries { kind, points }
}
