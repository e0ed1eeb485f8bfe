//! Core domain types and logic.

pub mod series;
pub mod fundamentals;
pub mod indicator;
pub mod signal;
pub mod strategy;
pub mod opportunity;
pub mod scanner;
pub mod backtest;
pub mod metrics;
pub mod universe;
pub mod error;
