//! Historical strategy replay.
//!
//! The replay walks the series bar by bar and re-derives the composite
//! score from only the bars visible at that step (`&bars[..=i]`), so a
//! decision can never read a future bar. Indicator recurrences are
//! prefix-causal, which makes the prefix values identical to what a
//! full-series pass would produce at the same index.
//!
//! Trading rule: long-only, whole shares, fills at the decision bar's
//! close. Enter when flat and the score reaches the strategy threshold;
//! exit when the score drops to zero or below.

use chrono::NaiveDate;
use std::fmt;
use tracing::debug;

use crate::domain::error::OppscanError;
use crate::domain::fundamentals::Fundamentals;
use crate::domain::metrics::Metrics;
use crate::domain::series::{PriceBar, PriceSeries};
use crate::domain::signal::SignalContext;
use crate::domain::strategy::{StrategyKind, StrategySpec};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub initial_capital: f64,
}

impl BacktestConfig {
    pub fn new(start: NaiveDate, end: NaiveDate, initial_capital: f64) -> Result<Self, OppscanError> {
        if end < start {
            return Err(OppscanError::ConfigInvalid {
                section: "backtest".into(),
                key: "end".into(),
                reason: format!("end {} precedes start {}", end, start),
            });
        }
        if !initial_capital.is_finite() || initial_capital <= 0.0 {
            return Err(OppscanError::ConfigInvalid {
                section: "backtest".into(),
                key: "initial_capital".into(),
                reason: format!("{} is not a positive amount", initial_capital),
            });
        }
        Ok(BacktestConfig {
            start,
            end,
            initial_capital,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacktestState {
    Idle,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillSide {
    Buy,
    Sell,
}

impl fmt::Display for FillSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillSide::Buy => f.write_str("buy"),
            FillSide::Sell => f.write_str("sell"),
        }
    }
}

/// One simulated order execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeFill {
    pub date: NaiveDate,
    pub side: FillSide,
    pub quantity: i64,
    pub price: f64,
}

/// A completed round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub symbol: String,
    pub quantity: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub pnl: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub symbol: String,
    pub strategy: StrategyKind,
    pub equity_curve: Vec<EquityPoint>,
    pub fills: Vec<TradeFill>,
    pub trades: Vec<TradeRecord>,
    pub final_equity: f64,
    pub metrics: Metrics,
}

struct OpenLot {
    quantity: i64,
    entry_price: f64,
    entry_date: NaiveDate,
}

/// Single-symbol, single-strategy replay with explicit lifecycle state.
pub struct Backtester {
    state: BacktestState,
}

impl Default for Backtester {
    fn default() -> Self {
        Backtester::new()
    }
}

impl Backtester {
    pub fn new() -> Self {
        Backtester {
            state: BacktestState::Idle,
        }
    }

    pub fn state(&self) -> BacktestState {
        self.state
    }

    /// Run the replay. Bars before `config.start` are warmup history:
    /// indicators see them, the trading loop does not. A malformed
    /// series fails the run before any equity point is produced.
    pub fn run(
        &mut self,
        symbol: &str,
        bars: &[PriceBar],
        fundamentals: Option<&Fundamentals>,
        spec: &StrategySpec,
        config: &BacktestConfig,
    ) -> Result<BacktestResult, OppscanError> {
        self.state = BacktestState::Running;

        let series = match PriceSeries::new(symbol, bars.to_vec()) {
            Ok(series) => series,
            Err(err) => {
                self.state = BacktestState::Failed;
                return Err(err);
            }
        };

        let all = series.bars();
        let mut cash = config.initial_capital;
        let mut position: Option<OpenLot> = None;
        let mut equity_curve = Vec::new();
        let mut fills = Vec::new();
        let mut trades = Vec::new();

        for (i, bar) in all.iter().enumerate() {
            if bar.date < config.start {
                continue;
            }
            if bar.date > config.end {
                break;
            }

            let visible = &all[..=i];
            let ctx = match SignalContext::new(visible, fundamentals) {
                Some(ctx) => ctx,
                None => continue,
            };
            let score = spec.compose(&ctx).score;

            match position.take() {
                None => {
                    if score >= spec.threshold() {
                        let quantity = (cash / bar.close).floor() as i64;
                        if quantity > 0 {
                            cash -= quantity as f64 * bar.close;
                            fills.push(TradeFill {
                                date: bar.date,
                                side: FillSide::Buy,
                                quantity,
                                price: bar.close,
                            });
                            position = Some(OpenLot {
                                quantity,
                                entry_price: bar.close,
                                entry_date: bar.date,
                            });
                        }
                    }
                }
                Some(lot) => {
                    if score <= 0.0 {
                        cash += lot.quantity as f64 * bar.close;
                        fills.push(TradeFill {
                            date: bar.date,
                            side: FillSide::Sell,
                            quantity: lot.quantity,
                            price: bar.close,
                        });
                        trades.push(TradeRecord {
                            symbol: symbol.to_string(),
                            quantity: lot.quantity,
                            entry_price: lot.entry_price,
                            exit_price: bar.close,
                            entry_date: lot.entry_date,
                            exit_date: bar.date,
                            pnl: lot.quantity as f64 * (bar.close - lot.entry_price),
                        });
                    } else {
                        position = Some(lot);
                    }
                }
            }

            let held = position.as_ref().map_or(0.0, |lot| lot.quantity as f64 * bar.close);
            equity_curve.push(EquityPoint {
                date: bar.date,
                equity: cash + held,
            });
        }

        if equity_curve.is_empty() {
            self.state = BacktestState::Failed;
            return Err(OppscanError::InsufficientHistory {
                symbol: symbol.to_string(),
                bars: 0,
                minimum: 1,
            });
        }

        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(config.initial_capital);
        let metrics = Metrics::compute(&equity_curve, &trades, config.initial_capital);

        debug!(
            symbol,
            strategy = %spec.kind(),
            bars = equity_curve.len(),
            trades = trades.len(),
            final_equity,
            "backtest complete"
        );

        self.state = BacktestState::Completed;
        Ok(BacktestResult {
            symbol: symbol.to_string(),
            strategy: spec.kind(),
            equity_curve,
            fills,
            trades,
            final_equity,
            metrics,
        })
    }
}
