//! Port traits for external collaborators.

pub mod market_data;
pub mod repository;
pub mod config;
pub mod report;
