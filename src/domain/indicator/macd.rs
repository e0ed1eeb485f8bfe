//! Moving Average Convergence Divergence.
//!
//! MACD line = EMA(fast) - EMA(slow)
//! Signal line = EMA(signal) of the MACD line, seeded with the SMA of
//! the first `signal` defined MACD values.
//! Histogram = MACD line - signal line
//!
//! Warmup: (slow - 1) bars for the MACD line plus (signal - 1) more for
//! the signal line; all three outputs are undefined before that.

use crate::domain::indicator::{
    compute_ema, IndicatorKind, IndicatorOutput, IndicatorPoint, IndicatorSeries,
};
use crate::domain::series::PriceBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn compute_macd(
    bars: &[PriceBar],
    fast: usize,
    slow: usize,
    signal_window: usize,
) -> IndicatorSeries {
    let kind = IndicatorKind::Macd {
        fast,
        slow,
        signal: signal_window,
    };

    let warmup = slow.saturating_sub(1) + signal_window.saturating_sub(1);
    if fast == 0 || slow == 0 || signal_window == 0 || bars.len() <= warmup {
        return IndicatorSeries::all_undefined(kind, bars);
    }

    let ema_fast = raw_values(&compute_ema(bars, fast));
    let ema_slow = raw_values(&compute_ema(bars, slow));

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();

    // EMA of the MACD line, starting where the MACD line becomes defined.
    let line_start = slow - 1;
    let k = 2.0 / (signal_window as f64 + 1.0);
    let mut signal_line = vec![0.0; bars.len()];
    let seed: f64 = macd_line[line_start..line_start + signal_window].iter().sum();
    let mut signal_ema = seed / signal_window as f64;
    signal_line[warmup] = signal_ema;
    for i in (warmup + 1)..bars.len() {
        signal_ema = macd_line[i] * k + signal_ema * (1.0 - k);
        signal_line[i] = signal_ema;
    }

    let points = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorPoint {
            date: bar.date,
            valid: i >= warmup,
            value: IndicatorOutput::Macd {
                line: macd_line[i],
                signal: signal_line[i],
                histogram: macd_line[i] - signal_line[i],
            },
        })
        .collect();

    IndicatorSeries { kind, points }
}

pub fn compute_macd_default(bars: &[PriceBar]) -> IndicatorSeries {
    compute_macd(bars, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}

fn raw_values(series: &IndicatorSeries) -> Vec<f64> {
    series
        .points
        .iter()
        .map(|p| match p.value {
            IndicatorOutput::Simple(v) => v,
            _ => 0.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::test_support::bars_from_closes;

    fn histogram_at(series: &IndicatorSeries, i: usize) -> f64 {
        match series.points[i].value {
            IndicatorOutput::Macd { histogram, .. } => histogram,
            _ => panic!("expected MACD output"),
        }
    }

    #[test]
    fn macd_warmup_default() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let bars = bars_from_closes("TEST", &closes);
        let series = compute_macd_default(&bars);

        // slow-1 + signal-1 = 25 + 8 = 33
        for i in 0..33 {
            assert!(!series.points[i].valid, "position {} should be undefined", i);
        }
        assert!(series.points[33].valid);
    }

    #[test]
    fn macd_length_matches_input() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + (i % 7) as f64).collect();
        let bars = bars_from_closes("TEST", &closes);
        let series = compute_macd_default(&bars);
        assert_eq!(series.points.len(), bars.len());
    }

    #[test]
    fn macd_constant_series_is_zero() {
        let bars = bars_from_closes("TEST", &[100.0; 50]);
        let series = compute_macd_default(&bars);

        for (i, point) in series.points.iter().enumerate() {
            if point.valid {
                if let IndicatorOutput::Macd {
                    line,
                    signal,
                    histogram,
                } = point.value
                {
                    assert!(line.abs() < 1e-9, "line at {}", i);
                    assert!(signal.abs() < 1e-9, "signal at {}", i);
                    assert!(histogram.abs() < 1e-9, "histogram at {}", i);
                }
            }
        }
    }

    #[test]
    fn macd_positive_in_uptrend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let bars = bars_from_closes("TEST", &closes);
        let series = compute_macd_default(&bars);

        let last = series.points.last().unwrap();
        assert!(last.valid);
        if let IndicatorOutput::Macd { line, .. } = last.value {
            assert!(line > 0.0, "MACD line should be positive in an uptrend");
        }
    }

    #[test]
    fn macd_histogram_changes_sign_on_reversal() {
        // Long uptrend then a hard downtrend: the histogram must flip
        // from positive to negative somewhere after the reversal.
        let mut closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        closes.extend((0..30).map(|i| 160.0 - 2.0 * i as f64));
        let bars = bars_from_closes("TEST", &closes);
        let series = compute_macd_default(&bars);

        let valid_start = 33;
        let mut saw_positive = false;
        let mut saw_negative_after_positive = false;
        for i in valid_start..series.points.len() {
            let h = histogram_at(&series, i);
            if h > 0.0 {
                saw_positive = true;
            }
            if saw_positive && h < 0.0 {
                saw_negative_after_positive = true;
                break;
            }
        }
        assert!(saw_positive);
        assert!(saw_negative_after_positive);
    }

    #[test]
    fn macd_insufficient_history() {
        let bars = bars_from_closes("TEST", &[100.0; 20]);
        let series = compute_macd_default(&bars);
        assert_eq!(series.points.len(), 20);
        assert!(series.points.iter().all(|p| !p.valid));
    }
}
