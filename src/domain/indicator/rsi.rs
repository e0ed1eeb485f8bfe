//! Relative Strength Index, Wilder's smoothing.
//!
//! First average gain/loss: simple mean over the first `window` price
//! changes. Subsequent: avg = (prev_avg * (window-1) + current) / window.
//! RSI = 100 - 100/(1 + avg_gain/avg_loss), with RSI = 100 when
//! avg_loss is 0. Bounded to [0, 100].
//!
//! Warmup: `window` price changes are needed, so the first `window`
//! positions are undefined.

use crate::domain::indicator::{
    IndicatorKind, IndicatorOutput, IndicatorPoint, IndicatorSeries,
};
use crate::domain::series::PriceBar;

pub const DEFAULT_RSI_WINDOW: usize = 14;

pub fn compute_rsi(bars: &[PriceBar], window: usize) -> IndicatorSeries {
    let kind = IndicatorKind::Rsi(window);
    if window == 0 || bars.len() <= window {
        return IndicatorSeries::all_undefined(kind, bars);
    }

    let mut points = Vec::with_capacity(bars.len());
    points.push(IndicatorPoint::undefined(
        bars[0].date,
        IndicatorOutput::Simple(0.0),
    ));

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    let mut seed_gain = 0.0;
    let mut seed_loss = 0.0;

    for (i, bar) in bars.iter().enumerate().skip(1) {
        let change = bar.close - bars[i - 1].close;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if i < window {
            seed_gain += gain;
            seed_loss += loss;
            points.push(IndicatorPoint::undefined(
                bar.date,
                IndicatorOutput::Simple(0.0),
            ));
            continue;
        }

        if i == window {
            avg_gain = (seed_gain + gain) / window as f64;
            avg_loss = (seed_loss + loss) / window as f64;
        } else {
            avg_gain = (avg_gain * (window - 1) as f64 + gain) / window as f64;
            avg_loss = (avg_loss * (window - 1) as f64 + loss) / window as f64;
        }

        let rsi = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };

        points.push(IndicatorPoint {
            date: bar.date,
            valid: true,
            value: IndicatorOutput::Simple(rsi.clamp(0.0, 100.0)),
        });
    }

    IndicatorSeries { kind, points }
}
