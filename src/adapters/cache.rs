//! Read-through cache over a market data provider.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::domain::error::OppscanError;
use crate::domain::fundamentals::Fundamentals;
use crate::domain::series::PriceSeries;
use crate::ports::market_data::MarketDataProvider;

struct Entry<T> {
    value: T,
    fetched_at: Instant,
}

type SeriesKey = (String, NaiveDate, NaiveDate);

/// Caches price series and fundamentals per request key with a TTL.
/// Quotes are never cached. Only successful fetches are stored, so a
/// flaky provider gets retried on the next call.
pub struct CachedProvider {
    inner: Arc<dyn MarketDataProvider>,
    ttl: Duration,
    series: Mutex<HashMap<SeriesKey, Entry<PriceSeries>>>,
    fundamentals: Mutex<HashMap<String, Entry<Fundamentals>>>,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn MarketDataProvider>, ttl: Duration) -> Self {
        CachedProvider {
            inner,
            ttl,
            series: Mutex::new(HashMap::new()),
            fundamentals: Mutex::new(HashMap::new()),
        }
    }

    fn fresh<T: Clone>(&self, entry: Option<&Entry<T>>) -> Option<T> {
        entry
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
            .map(|e| e.value.clone())
    }
}

impl MarketDataProvider for CachedProvider {
    fn price_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, OppscanError> {
        let key = (symbol.to_string(), start, end);
        if let Ok(cache) = self.series.lock() {
            if let Some(series) = self.fresh(cache.get(&key)) {
                debug!(%symbol, "price series cache hit");
                return Ok(series);
            }
        }

        let series = self.inner.price_series(symbol, start, end)?;
        if let Ok(mut cache) = self.series.lock() {
            cache.insert(
                key,
                Entry {
                    value: series.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }
        Ok(series)
    }

    fn quote(&self, symbol: &str) -> Result<f64, OppscanError> {
        self.inner.quote(symbol)
    }

    fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, OppscanError> {
        if let Ok(cache) = self.fundamentals.lock() {
            if let Some(f) = self.fresh(cache.get(symbol)) {
                return Ok(f);
            }
        }

        let f = self.inner.fundamentals(symbol)?;
        if let Ok(mut cache) = self.fundamentals.lock() {
            cache.insert(
                symbol.to_string(),
                Entry {
                    value: f.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }
        Ok(f)
    }

    fn list_symbols(&self) -> Result<Vec<String>, OppscanError> {
        self.inner.list_symbols()
    }
}
