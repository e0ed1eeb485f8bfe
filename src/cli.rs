//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::adapters::cache::CachedProvider;
use crate::adapters::csv_data::CsvDataProvider;
use crate::adapters::csv_report::CsvReportAdapter;
use crate::adapters::fallback::FallbackProvider;
use crate::adapters::ini_config::IniConfigAdapter;
use crate::adapters::memory_repository::InMemoryRepository;
use crate::adapters::synthetic::SyntheticProvider;
use crate::domain::backtest::{BacktestConfig, Backtester};
use crate::domain::error::OppscanError;
use crate::domain::scanner::{self, ScanOptions};
use crate::domain::strategy::StrategySpec;
use crate::domain::universe::parse_symbols;
use crate::ports::config::ConfigPort;
use crate::ports::market_data::MarketDataProvider;
use crate::ports::report::ReportPort;
use crate::ports::repository::OpportunityRepository;

#[derive(Parser, Debug)]
#[command(name = "oppscan", about = "Investment opportunity scanner and backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a symbol universe for opportunities
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated symbols, overriding the config universe
        #[arg(long)]
        symbols: Option<String>,
        /// Comma-separated strategy names, overriding the config
        #[arg(long)]
        strategies: Option<String>,
        /// Scan date (defaults to today)
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replay one strategy over one symbol's history
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        strategy: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List symbols the configured data source can serve
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Check a config file without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Install the global tracing subscriber. RUST_LOG overrides the
/// default level.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Scan {
            config,
            symbols,
            strategies,
            as_of,
            output,
        } => run_scan(
            &config,
            symbols.as_deref(),
            strategies.as_deref(),
            as_of,
            output.as_deref(),
        ),
        Command::Backtest {
            config,
            symbol,
            strategy,
            start,
            end,
            output,
        } => run_backtest(
            &config,
            &symbol,
            strategy.as_deref(),
            start,
            end,
            output.as_deref(),
        ),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(&err)
        }
    }
}

fn load_config(path: &PathBuf) -> Result<IniConfigAdapter, OppscanError> {
    IniConfigAdapter::from_file(path)
}

/// Build the provider stack from the `[data]` section: the base source
/// (`csv` or `synthetic`), an optional synthetic fallback, and an
/// optional read-through cache.
pub fn build_provider(config: &dyn ConfigPort) -> Result<Arc<dyn MarketDataProvider>, OppscanError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());

    let mut provider: Arc<dyn MarketDataProvider> = match source.as_str() {
        "csv" => {
            let path = config
                .get_string("data", "csv_path")
                .ok_or(OppscanError::ConfigMissing {
                    section: "data".into(),
                    key: "csv_path".into(),
                })?;
            Arc::new(CsvDataProvider::new(PathBuf::from(path)))
        }
        "synthetic" => {
            let seed = config.get_int("data", "seed", 42) as u64;
            let symbols = config
                .get_string("data", "symbols")
                .map(|s| parse_universe(&s))
                .transpose()?
                .unwrap_or_default();
            Arc::new(SyntheticProvider::new(seed, symbols))
        }
        other => {
            return Err(OppscanError::ConfigInvalid {
                section: "data".into(),
                key: "source".into(),
                reason: format!("unknown source '{}'", other),
            })
        }
    };

    if config.get_bool("data", "fallback_to_synthetic", false) {
        let seed = config.get_int("data", "seed", 42) as u64;
        provider = Arc::new(FallbackProvider::new(
            provider,
            Arc::new(SyntheticProvider::new(seed, vec![])),
        ));
    }

    let ttl_secs = config.get_int("data", "cache_ttl_secs", 0);
    if ttl_secs > 0 {
        provider = Arc::new(CachedProvider::new(
            provider,
            Duration::from_secs(ttl_secs as u64),
        ));
    }

    Ok(provider)
}

fn parse_universe(raw: &str) -> Result<Vec<String>, OppscanError> {
    parse_symbols(raw).map_err(|e| OppscanError::ConfigInvalid {
        section: "scan".into(),
        key: "symbols".into(),
        reason: e.to_string(),
    })
}

fn strategy_by_name(name: &str, config: &dyn ConfigPort) -> Result<StrategySpec, OppscanError> {
    let preset = match name {
        "technical" => StrategySpec::technical(),
        "momentum" => StrategySpec::momentum(),
        "value" => StrategySpec::value(),
        "growth" => StrategySpec::growth(),
        other => {
            return Err(OppscanError::InvalidStrategyConfig {
                reason: format!("unknown strategy '{}'", other),
            })
        }
    };

    // Per-strategy threshold override, e.g. [strategy] technical_threshold = 0.25
    let key = format!("{}_threshold", name);
    let threshold = config.get_double("strategy", &key, preset.threshold());
    StrategySpec::new(preset.kind(), preset.rules().to_vec(), threshold)
}

pub fn build_strategies(
    config: &dyn ConfigPort,
    names_override: Option<&str>,
) -> Result<Vec<StrategySpec>, OppscanError> {
    let names = names_override
        .map(str::to_string)
        .or_else(|| config.get_string("scan", "strategies"))
        .unwrap_or_else(|| "technical,momentum,value,growth".to_string());

    let mut strategies = Vec::new();
    for name in names.split(',') {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            continue;
        }
        strategies.push(strategy_by_name(&name, config)?);
    }
    if strategies.is_empty() {
        return Err(OppscanError::InvalidStrategyConfig {
            reason: "no strategies selected".into(),
        });
    }
    Ok(strategies)
}

fn resolve_symbols(
    config: &dyn ConfigPort,
    provider: &dyn MarketDataProvider,
    symbols_override: Option<&str>,
) -> Result<Vec<String>, OppscanError> {
    if let Some(raw) = symbols_override {
        return parse_universe(raw);
    }
    if let Some(raw) = config.get_string("scan", "symbols") {
        return parse_universe(&raw);
    }
    provider.list_symbols()
}

fn scan_options(config: &dyn ConfigPort) -> ScanOptions {
    let defaults = ScanOptions::default();
    let timeout_secs = config.get_int("scan", "timeout_secs", 0);
    ScanOptions {
        history_days: config.get_int("scan", "history_days", defaults.history_days),
        top_n: config.get_int("scan", "top_n", defaults.top_n as i64).max(1) as usize,
        timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs as u64)),
    }
}

fn run_scan(
    config_path: &PathBuf,
    symbols_override: Option<&str>,
    strategies_override: Option<&str>,
    as_of: Option<NaiveDate>,
    output: Option<&std::path::Path>,
) -> Result<(), OppscanError> {
    let config = load_config(config_path)?;
    let provider = build_provider(&config)?;
    let strategies = build_strategies(&config, strategies_override)?;
    let universe = resolve_symbols(&config, provider.as_ref(), symbols_override)?;
    let options = scan_options(&config);
    let as_of = as_of.unwrap_or_else(|| chrono::Local::now().date_naive());

    info!(
        symbols = universe.len(),
        strategies = strategies.len(),
        %as_of,
        "starting scan"
    );

    let report = scanner::scan(provider, &universe, &strategies, as_of, &options);

    let repository = InMemoryRepository::new();
    for opportunity in &report.opportunities {
        repository.save_opportunity(opportunity)?;
    }

    println!(
        "{:<5} {:<8} {:<10} {:>9} {:>10} {:>12}",
        "rank", "symbol", "strategy", "score", "price", "volume"
    );
    for opp in &report.opportunities {
        println!(
            "{:<5} {:<8} {:<10} {:>9.4} {:>10.2} {:>12}",
            opp.rank, opp.symbol, opp.strategy, opp.score, opp.last_price, opp.last_volume
        );
    }
    if !report.skipped.is_empty() {
        println!();
        println!("skipped {} symbol(s):", report.skipped.len());
        for skip in &report.skipped {
            println!("  {}: {}", skip.symbol, skip.reason);
        }
    }

    if let Some(path) = output {
        let path = path.to_string_lossy();
        CsvReportAdapter::new().write_scan(&report, &path)?;
        info!(output = %path, "scan report written");
    }

    Ok(())
}

fn run_backtest(
    config_path: &PathBuf,
    symbol: &str,
    strategy_override: Option<&str>,
    start_override: Option<NaiveDate>,
    end_override: Option<NaiveDate>,
    output: Option<&std::path::Path>,
) -> Result<(), OppscanError> {
    let config = load_config(config_path)?;
    let provider = build_provider(&config)?;

    let strategy_name = strategy_override
        .map(str::to_string)
        .or_else(|| config.get_string("backtest", "strategy"))
        .unwrap_or_else(|| "technical".to_string());
    let spec = strategy_by_name(strategy_name.trim().to_lowercase().as_str(), &config)?;

    let start = resolve_date(&config, "backtest", "start", start_override)?;
    let end = resolve_date(&config, "backtest", "end", end_override)?;
    let initial_capital = config.get_double("backtest", "initial_capital", 100_000.0);
    let backtest_config = BacktestConfig::new(start, end, initial_capital)?;

    // Fetch extra history before the window so indicators are warm on
    // the first trading day.
    let warmup_days = config.get_int("backtest", "warmup_days", 365);
    let fetch_start = start - chrono::Duration::days(warmup_days);
    let series = provider.price_series(symbol, fetch_start, end)?;
    let fundamentals = provider.fundamentals(symbol).unwrap_or_default();

    let mut backtester = Backtester::new();
    let result = backtester.run(
        symbol,
        series.bars(),
        Some(&fundamentals),
        &spec,
        &backtest_config,
    )?;

    let m = &result.metrics;
    println!("backtest: {} / {} ({} to {})", symbol, spec.kind(), start, end);
    println!("  final equity:      {:.2}", result.final_equity);
    println!("  total return:      {:.2}%", m.total_return * 100.0);
    println!("  annualized return: {:.2}%", m.annualized_return * 100.0);
    println!("  sharpe ratio:      {:.2}", m.sharpe_ratio);
    println!("  max drawdown:      {:.2}%", m.max_drawdown * 100.0);
    println!(
        "  trades:            {} ({} won, {} lost)",
        result.trades.len(),
        m.trades_won,
        m.trades_lost
    );
    println!("  win rate:          {:.1}%", m.win_rate * 100.0);
    println!("  profit factor:     {:.2}", m.profit_factor);

    if let Some(path) = output {
        let path = path.to_string_lossy();
        CsvReportAdapter::new().write_backtest(&result, &path)?;
        info!(output = %path, "backtest report written");
    }

    Ok(())
}

fn resolve_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    cli_override: Option<NaiveDate>,
) -> Result<NaiveDate, OppscanError> {
    if let Some(date) = cli_override {
        return Ok(date);
    }
    let raw = config
        .get_string(section, key)
        .ok_or_else(|| OppscanError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        })?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| OppscanError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: format!("'{}' is not a date: {}", raw, e),
    })
}

fn run_list_symbols(config_path: &PathBuf) -> Result<(), OppscanError> {
    let config = load_config(config_path)?;
    let provider = build_provider(&config)?;
    let symbols = provider.list_symbols()?;
    for symbol in &symbols {
        println!("{}", symbol);
    }
    info!(count = symbols.len(), "symbols listed");
    Ok(())
}

fn run_validate(config_path: &PathBuf) -> Result<(), OppscanError> {
    let config = load_config(config_path)?;
    build_provider(&config)?;
    let strategies = build_strategies(&config, None)?;
    if let Some(raw) = config.get_string("scan", "symbols") {
        parse_universe(&raw)?;
    }
    println!(
        "{}: OK ({} strategies)",
        config_path.display(),
        strategies.len()
    );
    Ok(())
}
