//! Simple Moving Average.
//!
//! Arithmetic mean of closes over `window` bars. Warmup: first
//! (window-1) positions are undefined.

use crate::domain::indicator::{
    IndicatorKind, IndicatorOutput, IndicatorPoint, IndicatorSeries,
};
use crate::domain::series::PriceBar;

pub fn compute_sma(bars: &[PriceBar], window: usize) -> IndicatorSeries {
    let kind = IndicatorKind::Sma(window);
    if window == 0 || bars.len() < window {
        return IndicatorSeries::all_undefined(kind, bars);
    }

    let mut points = Vec::with_capacity(bars.len());
    let mut rolling_sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        rolling_sum += bar.close;
        if i >= window {
            rolling_sum -= bars[i - window].close;
        }

        if i + 1 < window {
            points.push(IndicatorPoint::undefined(
                bar.date,
                IndicatorOutput::Simple(0.0),
            ));
        } else {
            points.push(IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorOutput::Simple(rolling_sum / window as f64),
            });
        }
    }

    IndicatorSeries { kind, points }
}
