//! Bollinger Bands.
//!
//! Middle = SMA(window); upper/lower = middle ± mult * population
//! standard deviation of closes over the window (divide by N, not N-1).
//! A constant price series therefore has zero bandwidth at every
//! defined position.
//!
//! Warmup: first (window-1) positions are undefined.

use crate::domain::indicator::{
    IndicatorKind, IndicatorOutput, IndicatorPoint, IndicatorSeries,
};
use crate::domain::series::PriceBar;

pub const DEFAULT_BOLLINGER_WINDOW: usize = 20;
pub const DEFAULT_BOLLINGER_MULT_X100: u32 = 200;

pub fn compute_bollinger(bars: &[PriceBar], window: usize, mult_x100: u32) -> IndicatorSeries {
    let kind = IndicatorKind::Bollinger { window, mult_x100 };
    if window == 0 || bars.len() < window {
        return IndicatorSeries::all_undefined(kind, bars);
    }

    let mult = mult_x100 as f64 / 100.0;
    let mut points = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        if i + 1 < window {
            points.push(IndicatorPoint::undefined(
                bar.date,
                IndicatorOutput::Bollinger {
                    upper: 0.0,
                    middle: 0.0,
                    lower: 0.0,
                },
            ));
            continue;
        }

        let slice = &bars[i + 1 - window..=i];
        let middle = slice.iter().map(|b| b.close).sum::<f64>() / window as f64;
        let variance = slice
            .iter()
            .map(|b| {
                let diff = b.close - middle;
                diff * diff
            })
            .sum::<f64>()
            / window as f64;
        let stddev = variance.sqrt();

        points.push(IndicatorPoint {
            date: bar.date,
            valid: true,
            value: IndicatorOutput::Bollinger {
                upper: middle + mult * stddev,
                middle,
                lower: middle - mult * stddev,
            },
        });
    }

    IndicatorSeries { kind, points }
}

pub fn compute_bollinger_default(bars: &[PriceBar]) -> IndicatorSeries {
    compute_bollinger(bars, DEFAULT_BOLLINGER_WINDOW, DEFAULT_BOLLINGER_MULT_X100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::test_support::bars_from_closes;

    fn bands_at(series: &IndicatorSeries, i: usize) -> (f64, f64, f64) {
        match series.points[i].value {
            IndicatorOutput::Bollinger {
                upper,
                middle,
                lower,
            } => (upper, middle, lower),
            _ => panic!("expected Bollinger output"),
        }
    }

    #[test]
    fn bollinger_warmup() {
        let bars = bars_from_closes("TEST", &[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = compute_bollinger(&bars, 3, 200);

        assert!(!series.points[0].valid);
        assert!(!series.points[1].valid);
        assert!(series.points[2].valid);
    }

    #[test]
    fn bollinger_constant_series_has_zero_bandwidth() {
        let bars = bars_from_closes("TEST", &[100.0; 25]);
        let series = compute_bollinger_default(&bars);

        for (i, point) in series.points.iter().enumerate() {
            if point.valid {
                let (upper, middle, lower) = bands_at(&series, i);
                assert!((upper - lower).abs() < f64::EPSILON, "bandwidth at {}", i);
                assert!((middle - 100.0).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn bollinger_population_stddev() {
        // Window [10, 20, 30]: mean 20, population variance 200/3.
        let bars = bars_from_closes("TEST", &[10.0, 20.0, 30.0]);
        let series = compute_bollinger(&bars, 3, 200);

        let (upper, middle, lower) = bands_at(&series, 2);
        let stddev = (200.0f64 / 3.0).sqrt();
        assert!((middle - 20.0).abs() < 1e-9);
        assert!((upper - (20.0 + 2.0 * stddev)).abs() < 1e-9);
        assert!((lower - (20.0 - 2.0 * stddev)).abs() < 1e-9);
    }

    #[test]
    fn bollinger_bands_are_ordered() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + ((i * 3) % 11) as f64).collect();
        let bars = bars_from_closes("TEST", &closes);
        let series = compute_bollinger_default(&bars);

        for (i, point) in series.points.iter().enumerate() {
            if point.valid {
                let (upper, middle, lower) = bands_at(&series, i);
                assert!(upper >= middle && middle >= lower, "at {}", i);
            }
        }
    }

    #[test]
    fn bollinger_window_exceeds_length() {
        let bars = bars_from_closes("TEST", &[100.0, 101.0]);
        let series = compute_bollinger_default(&bars);
        assert_eq!(series.points.len(), 2);
        assert!(series.points.iter().all(|p| !p.valid));
    }
}
