//! CSV report adapter.
//!
//! Scan reports go to one file, with skipped symbols in a sibling
//! `<path>.skipped` file when any exist. Backtest reports write the
//! equity curve to the given path and the trade log to
//! `<path>.trades`.


use crate::domain::backtest::BacktestResult;
use crate::domain::error::OppscanError;
use crate::domain::scanner::ScanReport;
use crate::ports::report::ReportPort;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        CsvReportAdapter::new()
    }
}

fn report_err(e: csv::Error) -> OppscanError {
    OppscanError::Report {
        reason: e.to_string(),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_scan(&self, report: &ScanReport, output_path: &str) -> Result<(), OppscanError> {
        let mut writer = csv::Writer::from_path(output_path).map_err(report_err)?;
        writer
            .write_record([
                "rank",
                "symbol",
                "strategy",
                "date",
                "score",
                "last_price",
                "last_volume",
                "volume_weight",
                "signals",
            ])
            .map_err(report_err)?;

        for opp in &report.opportunities {
            let signals = opp
                .signals
                .iter()
                .map(|s| format!("{}={:+.4}", s.rule, s.signed_strength()))
                .collect::<Vec<_>>()
                .join(";");
            writer
                .write_record([
                    opp.rank.to_string(),
                    opp.symbol.clone(),
                    opp.strategy.to_string(),
                    opp.date.to_string(),
                    format!("{:.6}", opp.score),
                    format!("{:.4}", opp.last_price),
                    opp.last_volume.to_string(),
                    format!("{:.2}", opp.volume_weight),
                    signals,
                ])
                .map_err(report_err)?;
        }
        writer.flush()?;

        if !report.skipped.is_empty() {
            let skip_path = format!("{}.skipped", output_path);
            let mut writer = csv::Writer::from_path(&skip_path).map_err(report_err)?;
            writer
                .write_record(["symbol", "reason"])
                .map_err(report_err)?;
            for skip in &report.skipped {
                writer
                    .write_record([skip.symbol.clone(), skip.reason.to_string()])
                    .map_err(report_err)?;
            }
            writer.flush()?;
        }

        Ok(())
    }

    fn write_backtest(
        &self,
        result: &BacktestResult,
        output_path: &str,
    ) -> Result<(), OppscanError> {
        let mut writer = csv::Writer::from_path(output_path).map_err(report_err)?;
        writer.write_record(["date", "equity"]).map_err(report_err)?;
        for point in &result.equity_curve {
            writer
                .write_record([point.date.to_string(), format!("{:.2}", point.equity)])
                .map_err(report_err)?;
        }
        writer.flush()?;

        let trades_path = format!("{}.trades", output_path);
        let mut writer = csv::Writer::from_path(&trades_path).map_err(report_err)?;
        writer
            .write_record([
                "symbol",
                "quantity",
                "entry_date",
                "entry_price",
                "exit_date",
                "exit_price",
                "pnl",
            ])
            .map_err(report_err)?;
        for trade in &result.trades {
            writer
                .write_record([
                    trade.symbol.clone(),
                    trade.quantity.to_string(),
                    trade.entry_date.to_string(),
                    format!("{:.4}", trade.entry_price),
                    trade.exit_date.to_string(),
                    format!("{:.4}", trade.exit_price),
                    format!("{:.2}", trade.pnl),
                ])
                .map_err(report_err)?;
        }
        writer.flush()?;

        Ok(())
    }
}
