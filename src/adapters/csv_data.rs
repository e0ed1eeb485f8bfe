//! CSV file market data adapter.
//!
//! Reads one `{SYMBOL}.csv` per symbol (date,open,high,low,close,volume)
//! from a base directory, plus an optional shared `fundamentals.csv`
//! keyed by symbol. Symbols without a fundamentals row get the
//! all-missing default.

use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

use crate::domain::error::OppscanError;
use crate::domain::fundamentals::Fundamentals;
use crate::domain::series::{PriceBar, PriceSeries};
use crate::ports::market_data::MarketDataProvider;

const FUNDAMENTALS_FILE: &str = "fundamentals.csv";

pub struct CsvDataProvider {
    base_path: PathBuf,
}

impl CsvDataProvider {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, OppscanError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| OppscanError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| OppscanError::MalformedSeries {
                symbol: symbol.to_string(),
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = field(symbol, &record, 0, "date")?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                OppscanError::MalformedSeries {
                    symbol: symbol.to_string(),
                    reason: format!("invalid date '{}': {}", date_str, e),
                }
            })?;

            bars.push(PriceBar {
                symbol: symbol.to_string(),
                date,
                open: parse_field(symbol, &record, 1, "open")?,
                high: parse_field(symbol, &record, 2, "high")?,
                low: parse_field(symbol, &record, 3, "low")?,
                close: parse_field(symbol, &record, 4, "close")?,
                volume: parse_field(symbol, &record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

fn field<'r>(
    symbol: &str,
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<&'r str, OppscanError> {
    record.get(index).ok_or_else(|| OppscanError::MalformedSeries {
        symbol: symbol.to_string(),
        reason: format!("missing {} column", name),
    })
}

fn parse_field<T: std::str::FromStr>(
    symbol: &str,
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<T, OppscanError>
where
    T::Err: std::fmt::Display,
{
    field(symbol, record, index, name)?
        .parse()
        .map_err(|e| OppscanError::MalformedSeries {
            symbol: symbol.to_string(),
            reason: format!("invalid {} value: {}", name, e),
        })
}

fn parse_optional(record: &csv::StringRecord, index: usize) -> Option<f64> {
    record
        .get(index)
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| s.trim().parse().ok())
}

impl MarketDataProvider for CsvDataProvider {
    fn price_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, OppscanError> {
        let mut bars = self.read_bars(symbol)?;
        bars.retain(|b| b.date >= start && b.date <= end);
        if bars.is_empty() {
            return Err(OppscanError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("no bars between {} and {}", start, end),
            });
        }
        PriceSeries::new(symbol, bars)
    }

    fn quote(&self, symbol: &str) -> Result<f64, OppscanError> {
        let bars = self.read_bars(symbol)?;
        bars.last()
            .map(|b| b.close)
            .ok_or_else(|| OppscanError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "no bars on file".into(),
            })
    }

    fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, OppscanError> {
        let path = self.base_path.join(FUNDAMENTALS_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => return Ok(Fundamentals::default()),
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        for result in rdr.records() {
            let record = result.map_err(|e| OppscanError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("fundamentals parse error: {}", e),
            })?;
            if record.get(0) != Some(symbol) {
                continue;
            }
            return Ok(Fundamentals {
                pe_ratio: parse_optional(&record, 1),
                price_to_book: parse_optional(&record, 2),
                revenue_growth: parse_optional(&record, 3),
                profit_margin: parse_optional(&record, 4),
                dividend_yield: parse_optional(&record, 5),
                beta: parse_optional(&record, 6),
            });
        }
        Ok(Fundamentals::default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, OppscanError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| OppscanError::Io {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| OppscanError::Io {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if name_str == FUNDAMENTALS_FILE {
                continue;
            }
            if let Some(stem) = name_str.strip_suffix(".csv") {
                symbols.push(stem.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
