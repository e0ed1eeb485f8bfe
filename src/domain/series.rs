//! Price bar and validated price series.

use chrono::NaiveDate;

use super::error::OppscanError;

/// One daily OHLCV bar. Immutable once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PriceBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// An ordered price history for one symbol.
///
/// Construction enforces strictly increasing dates with no duplicates;
/// every downstream computation relies on this ordering for causality.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: &str, bars: Vec<PriceBar>) -> Result<Self, OppscanError> {
        if bars.is_empty() {
            return Err(OppscanError::MalformedSeries {
                symbol: symbol.to_string(),
                reason: "empty series".into(),
            });
        }

        for window in bars.windows(2) {
            if window[1].date <= window[0].date {
                return Err(OppscanError::MalformedSeries {
                    symbol: symbol.to_string(),
                    reason: format!(
                        "non-monotonic dates: {} followed by {}",
                        window[0].date, window[1].date
                    ),
                });
            }
        }

        Ok(PriceSeries {
            symbol: symbol.to_string(),
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last_bar(&self) -> &PriceBar {
        // Non-empty by construction.
        self.bars.last().expect("series is never empty")
    }

    /// Bars with date <= cutoff. Empty result is possible.
    pub fn visible_through(&self, cutoff: NaiveDate) -> &[PriceBar] {
        let end = self.bars.partition_point(|b| b.date <= cutoff);
        &self.bars[..end]
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::bars_from_closes;
    use super::*;

    #[test]
    fn typical_price() {
        let bar = PriceBar {
            symbol: "AAPL".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000,
        };
        let expected = (110.0 + 90.0 + 105.0) / 3.0;
        assert!((bar.typical_price() - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn series_rejects_empty() {
        let result = PriceSeries::new("AAPL", vec![]);
        assert!(matches!(
            result,
            Err(OppscanError::MalformedSeries { .. })
        ));
    }

    #[test]
    fn series_rejects_duplicate_dates() {
        let mut bars = bars_from_closes("AAPL", &[100.0, 101.0]);
        bars[1].date = bars[0].date;
        let result = PriceSeries::new("AAPL", bars);
        assert!(matches!(
            result,
            Err(OppscanError::MalformedSeries { .. })
        ));
    }

    #[test]
    fn series_rejects_descending_dates() {
        let mut bars = bars_from_closes("AAPL", &[100.0, 101.0]);
        bars.reverse();
        let result = PriceSeries::new("AAPL", bars);
        assert!(matches!(
            result,
            Err(OppscanError::MalformedSeries { .. })
        ));
    }

    #[test]
    fn series_accepts_ordered_bars() {
        let bars = bars_from_closes("AAPL", &[100.0, 101.0, 102.0]);
        let series = PriceSeries::new("AAPL", bars).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.symbol(), "AAPL");
        assert!((series.last_bar().close - 102.0).abs() < f64::EPSILON);
    }

    #[test]
    fn visible_through_cuts_future_bars() {
        let bars = bars_from_closes("AAPL", &[100.0, 101.0, 102.0, 103.0]);
        let series = PriceSeries::new("AAPL", bars).unwrap();

        let cutoff = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let visible = series.visible_through(cutoff);
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|b| b.date <= cutoff));
    }

    #[test]
    fn visible_through_before_start_is_empty() {
        let bars = bars_from_closes("AAPL", &[100.0, 101.0]);
        let series = PriceSeries::new("AAPL", bars).unwrap();

        let cutoff = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert!(series.visible_through(cutoff).is_empty());
    }
}
