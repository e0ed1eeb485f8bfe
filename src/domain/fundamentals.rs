//! Fundamental data snapshot used by the value and growth rules.

/// Per-symbol fundamentals as last reported by the data provider.
///
/// Every field is optional: providers routinely miss fields for ETFs,
/// recent listings, or foreign tickers. A missing field means "no
/// evidence", and rules that need it stay neutral.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fundamentals {
    pub pe_ratio: Option<f64>,
    pub price_to_book: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub profit_margin: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
}
