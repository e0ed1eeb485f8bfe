//! Opportunity records and ranking.

use chrono::NaiveDate;
use std::cmp::Ordering;

use crate::domain::signal::Signal;
use crate::domain::strategy::StrategyKind;

/// One qualified symbol under one strategy, produced by a scan cycle.
#[derive(Debug, Clone)]
pub struct Opportunity {
    pub symbol: String,
    pub strategy: StrategyKind,
    pub date: NaiveDate,
    pub score: f64,
    pub last_price: f64,
    pub last_volume: i64,
    /// Absolute contribution mass scaled by latest volume; tiebreak key.
    pub volume_weight: f64,
    pub signals: Vec<Signal>,
    /// 1-based position after ranking.
    pub rank: usize,
}

/// Total order for reproducible ranking: composite score descending,
/// then volume-weighted contribution descending, then symbol ascending.
pub fn ranking_order(a: &Opportunity, b: &Opportunity) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.volume_weight.total_cmp(&a.volume_weight))
        .then_with(|| a.symbol.cmp(&b.symbol))
}

/// Sort opportunities into ranking order and assign 1-based ranks.
pub fn rank(mut opportunities: Vec<Opportunity>) -> Vec<Opportunity> {
    opportunities.sort_by(ranking_order);
    for (i, opp) in opportunities.iter_mut().enumerate() {
        opp.rank = i + 1;
    }
    opportunities
}
