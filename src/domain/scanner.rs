//! Cross-sectional opportunity scanning.
//!
//! Each symbol's fetch → indicators → signals → compose pipeline runs as
//! an independent task on the rayon pool; pipelines share no mutable
//! state and report into a channel. A failed, malformed, or slow symbol
//! is recorded in the skip list and never aborts the scan for the
//! others. The final ranking is sorted once, after all pipelines settle
//! or the deadline passes, so the result does not depend on completion
//! order.

use chrono::NaiveDate;
use std::fmt;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::domain::error::OppscanError;
use crate::domain::opportunity::{self, Opportunity};
use crate::domain::signal::SignalContext;
use crate::domain::strategy::StrategySpec;
use crate::ports::market_data::MarketDataProvider;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Calendar days of history fetched behind the as-of date.
    pub history_days: i64,
    /// Cap on opportunities kept per strategy.
    pub top_n: usize,
    /// Deadline for the whole scan; symbols still running when it
    /// passes are recorded as timed out.
    pub timeout: Option<Duration>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            history_days: 365,
            top_n: 20,
            timeout: None,
        }
    }
}

/// Why a symbol produced no result.
#[derive(Debug, Clone)]
pub enum SkipReason {
    DataUnavailable(String),
    InsufficientHistory { bars: usize, minimum: usize },
    MalformedSeries(String),
    TimedOut,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DataUnavailable(reason) => write!(f, "data unavailable: {}", reason),
            SkipReason::InsufficientHistory { bars, minimum } => {
                write!(f, "insufficient history: {} bars, need {}", bars, minimum)
            }
            SkipReason::MalformedSeries(reason) => write!(f, "malformed series: {}", reason),
            SkipReason::TimedOut => f.write_str("timed out"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

/// Best-effort scan result: ranked opportunities plus every skipped
/// symbol with its reason.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub as_of: NaiveDate,
    pub opportunities: Vec<Opportunity>,
    pub skipped: Vec<SkippedSymbol>,
}

type SymbolOutcome = (String, Result<Vec<Opportunity>, SkipReason>);

/// Scan a symbol universe under a set of strategies as of a date.
pub fn scan(
    provider: Arc<dyn MarketDataProvider>,
    universe: &[String],
    strategies: &[StrategySpec],
    as_of: NaiveDate,
    options: &ScanOptions,
) -> ScanReport {
    let strategies: Arc<[StrategySpec]> = strategies.into();
    let (tx, rx) = mpsc::channel::<SymbolOutcome>();

    for symbol in universe {
        let provider = Arc::clone(&provider);
        let strategies = Arc::clone(&strategies);
        let symbol = symbol.clone();
        let tx = tx.clone();
        let options = options.clone();
        // Detached: a wedged provider call cannot hold the scan open
        // past its deadline.
        rayon::spawn(move || {
            let outcome = scan_symbol(provider.as_ref(), &symbol, &strategies, as_of, &options);
            // The receiver may have given up at the deadline.
            let _ = tx.send((symbol, outcome));
        });
    }
    drop(tx);

    let (mut opportunities, mut skipped) = collect(rx, universe, options.timeout);

    opportunities = cap_per_strategy(opportunity::rank(opportunities), options.top_n);
    skipped.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    debug!(
        opportunities = opportunities.len(),
        skipped = skipped.len(),
        %as_of,
        "scan complete"
    );

    ScanReport {
        as_of,
        opportunities,
        skipped,
    }
}

/// One symbol's full pipeline. Pure given the provider's responses.
fn scan_symbol(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    strategies: &[StrategySpec],
    as_of: NaiveDate,
    options: &ScanOptions,
) -> Result<Vec<Opportunity>, SkipReason> {
    let start = as_of - chrono::Duration::days(options.history_days);
    let series = provider
        .price_series(symbol, start, as_of)
        .map_err(|e| match e {
            OppscanError::MalformedSeries { reason, .. } => SkipReason::MalformedSeries(reason),
            other => SkipReason::DataUnavailable(other.to_string()),
        })?;

    let minimum = strategies
        .iter()
        .map(StrategySpec::min_history)
        .min()
        .unwrap_or(1);
    if series.len() < minimum {
        return Err(SkipReason::InsufficientHistory {
            bars: series.len(),
            minimum,
        });
    }

    // Fundamentals are optional evidence; a fetch failure just means
    // the value/growth rules stay neutral.
    let fundamentals = provider.fundamentals(symbol).unwrap_or_default();

    let ctx = match SignalContext::new(series.bars(), Some(&fundamentals)) {
        Some(ctx) => ctx,
        None => {
            return Err(SkipReason::InsufficientHistory {
                bars: 0,
                minimum,
            })
        }
    };

    let last = series.last_bar();
    let mut found = Vec::new();
    for spec in strategies {
        let composite = spec.compose(&ctx);
        if spec.qualifies(composite.score) {
            found.push(Opportunity {
                symbol: symbol.to_string(),
                strategy: spec.kind(),
                date: last.date,
                score: composite.score,
                last_price: last.close,
                last_volume: last.volume,
                volume_weight: composite.volume_weight,
                signals: composite.signals,
                rank: 0,
            });
        }
    }

    Ok(found)
}

fn collect(
    rx: mpsc::Receiver<SymbolOutcome>,
    universe: &[String],
    timeout: Option<Duration>,
) -> (Vec<Opportunity>, Vec<SkippedSymbol>) {
    let deadline = timeout.map(|t| Instant::now() + t);
    let mut pending: Vec<&String> = universe.iter().collect();
    let mut opportunities = Vec::new();
    let mut skipped = Vec::new();

    while !pending.is_empty() {
        let received = match deadline {
            None => rx.recv().ok(),
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    None
                } else {
                    rx.recv_timeout(remaining).ok()
                }
            }
        };

        let (symbol, outcome) = match received {
            Some(message) => message,
            None => break,
        };
        pending.retain(|s| **s != symbol);

        match outcome {
            Ok(found) => opportunities.extend(found),
            Err(reason) => {
                warn!(%symbol, %reason, "symbol skipped");
                skipped.push(SkippedSymbol { symbol, reason });
            }
        }
    }

    for symbol in pending {
        warn!(%symbol, "symbol timed out");
        skipped.push(SkippedSymbol {
            symbol: symbol.clone(),
            reason: SkipReason::TimedOut,
        });
    }

    (opportunities, skipped)
}

/// Keep at most `top_n` opportunities per strategy, preserving ranking
/// order, then reassign ranks.
fn cap_per_strategy(ranked: Vec<Opportunity>, top_n: usize) -> Vec<Opportunity> {
    use std::collections::HashMap;

    let mut kept_per_strategy: HashMap<_, usize> = HashMap::new();
    let mut kept = Vec::with_capacity(ranked.len());
    for opp in ranked {
        let count = kept_per_strategy.entry(opp.strategy).or_insert(0);
        if *count < top_n {
            *count += 1;
            kept.push(opp);
        }
    }
    for (i, opp) in kept.iter_mut().enumerate() {
        opp.rank = i + 1;
    }
    kept
}
