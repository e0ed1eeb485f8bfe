//! Primary/fallback provider pair.

use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::warn;

use crate::domain::error::OppscanError;
use crate::domain::fundamentals::Fundamentals;
use crate::domain::series::PriceSeries;
use crate::ports::market_data::MarketDataProvider;

/// Serves from the primary provider and falls back to the secondary
/// when the primary errors. Every fallback is logged and counted so an
/// unhealthy primary is visible in operation.
pub struct FallbackProvider {
    primary: Arc<dyn MarketDataProvider>,
    fallback: Arc<dyn MarketDataProvider>,
    fallbacks: AtomicUsize,
}

impl FallbackProvider {
    pub fn new(primary: Arc<dyn MarketDataProvider>, fallback: Arc<dyn MarketDataProvider>) -> Self {
        FallbackProvider {
            primary,
            fallback,
            fallbacks: AtomicUsize::new(0),
        }
    }

    /// Number of requests the primary failed to serve so far.
    pub fn fallback_count(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }

    fn record(&self, symbol: &str, what: &str, err: &OppscanError) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
        warn!(%symbol, %err, "primary provider failed for {}, using fallback", what);
    }
}

impl MarketDataProvider for FallbackProvider {
    fn price_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, OppscanError> {
        match self.primary.price_series(symbol, start, end) {
            Ok(series) => Ok(series),
            Err(err) => {
                self.record(symbol, "price series", &err);
                self.fallback.price_series(symbol, start, end)
            }
        }
    }

    fn quote(&self, symbol: &str) -> Result<f64, OppscanError> {
        match self.primary.quote(symbol) {
            Ok(quote) => Ok(quote),
            Err(err) => {
                self.record(symbol, "quote", &err);
                self.fallback.quote(symbol)
            }
        }
    }

    fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, OppscanError> {
        match self.primary.fundamentals(symbol) {
            Ok(f) => Ok(f),
            Err(err) => {
                self.record(symbol, "fundamentals", &err);
                self.fallback.fundamentals(symbol)
            }
        }
    }

    fn list_symbols(&self) -> Result<Vec<String>, OppscanError> {
        match self.primary.list_symbols() {
            Ok(symbols) => Ok(symbols),
            Err(err) => {
                warn!(%err, "primary provider failed to list symbols, using fallback");
                self.fallbacks.fetch_add(1, Ordering::Relaxed);
                self.fallback.list_symbols()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::synthetic::SyntheticProvider;

    /// Provider that always errors.
    struct DeadProvider;

    impl MarketDataProvider for DeadProvider {
        fn price_series(
            &self,
            symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<PriceSeries, OppscanError> {
            Err(OppscanError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "connection refused".into(),
            })
        }

        fn quote(&self, symbol: &str) -> Result<f64, OppscanError> {
            Err(OppscanError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "connection refused".into(),
            })
        }

        fn list_symbols(&self) -> Result<Vec<String>, OppscanError> {
            Err(OppscanError::Io {
                reason: "connection refused".into(),
            })
        }
    }

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        )
    }

    #[test]
    fn healthy_primary_is_used_directly() {
        let synthetic = Arc::new(SyntheticProvider::new(7, vec!["AAA".into()]));
        let provider = FallbackProvider::new(synthetic.clone(), Arc::new(DeadProvider));

        let (start, end) = range();
        assert!(provider.price_series("AAA", start, end).is_ok());
        assert_eq!(provider.fallback_count(), 0);
    }

    #[test]
    fn dead_primary_falls_back() {
        let synthetic = Arc::new(SyntheticProvider::new(7, vec!["AAA".into()]));
        let provider = FallbackProvider::new(Arc::new(DeadProvider), synthetic);

        let (start, end) = range();
        let series = provider.price_series("AAA", start, end).unwrap();
        assert!(!series.is_empty());
        assert_eq!(provider.fallback_count(), 1);

        assert!(provider.quote("AAA").is_ok());
        assert_eq!(provider.fallback_count(), 2);
    }

    #[test]
    fn both_dead_surfaces_the_fallback_error() {
        let provider = FallbackProvider::new(Arc::new(DeadProvider), Arc::new(DeadProvider));
        let (start, end) = range();
        assert!(matches!(
            provider.price_series("AAA", start, end),
            Err(OppscanError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn list_symbols_falls_back() {
        let synthetic = Arc::new(SyntheticProvider::new(7, vec!["AAA".into()]));
        let provider = FallbackProvider::new(Arc::new(DeadProvider), synthetic);
        assert_eq!(provider.list_symbols().unwrap(), vec!["AAA"]);
    }
}
