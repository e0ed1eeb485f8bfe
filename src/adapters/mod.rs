//! Adapter implementations of the port traits.

pub mod cache;
pub mod csv_data;
pub mod csv_report;
pub mod fallback;
pub mod ini_config;
pub mod memory_repository;
pub mod synthetic;
