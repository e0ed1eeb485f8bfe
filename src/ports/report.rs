//! Report output port.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::OppscanError;
use crate::domain::scanner::ScanReport;

/// Port for writing scan and backtest reports.
pub trait ReportPort {
    fn write_scan(&self, report: &ScanReport, output_path: &str) -> Result<(), OppscanError>;

    fn write_backtest(
        &self,
        result: &BacktestResult,
        output_path: &str,
    ) -> Result<(), OppscanError>;
}
