//! Market data access port.

use chrono::NaiveDate;

use crate::domain::error::OppscanError;
use crate::domain::fundamentals::Fundamentals;
use crate::domain::series::PriceSeries;

/// Source of price history, quotes, and fundamentals.
///
/// Implementations must be shareable across scan worker threads. Fetch
/// failures surface as [`OppscanError::DataUnavailable`], never as a
/// panic; the scanner recovers from them per symbol.
pub trait MarketDataProvider: Send + Sync {
    fn price_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, OppscanError>;

    /// Latest traded price, for live valuation.
    fn quote(&self, symbol: &str) -> Result<f64, OppscanError>;

    /// Last reported fundamentals. A provider without fundamentals
    /// coverage returns the all-missing default rather than an error.
    fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, OppscanError> {
        let _ = symbol;
        Ok(Fundamentals::default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, OppscanError>;
}
