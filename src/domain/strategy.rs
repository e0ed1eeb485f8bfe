//! Strategy definitions and composite scoring.
//!
//! A strategy is a named, ordered set of weighted signal rules plus a
//! qualification threshold. Composition maps the rules' signed
//! strengths into one composite score in [-1, 1]:
//!
//!   score = sum(weight_i * signed_strength_i) / sum(|weight_i|)
//!
//! A symbol qualifies when |score| >= threshold. Construction validates
//! eagerly; a zero weight sum or a negative threshold never reaches the
//! scan loop.

use std::fmt;

use crate::domain::error::OppscanError;
use crate::domain::signal::{self, Signal, SignalContext, SignalRule};

/// The closed set of strategy families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Value,
    Growth,
    Momentum,
    Technical,
    Custom,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Value => "value",
            StrategyKind::Growth => "growth",
            StrategyKind::Momentum => "momentum",
            StrategyKind::Technical => "technical",
            StrategyKind::Custom => "custom",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedRule {
    pub rule: SignalRule,
    pub weight: f64,
}

/// A validated strategy definition.
#[derive(Debug, Clone)]
pub struct StrategySpec {
    kind: StrategyKind,
    rules: Vec<WeightedRule>,
    threshold: f64,
}

/// Result of composing a strategy's signals for one symbol.
#[derive(Debug, Clone)]
pub struct CompositeScore {
    pub score: f64,
    pub signals: Vec<Signal>,
    /// Absolute contribution mass scaled by the latest bar's volume;
    /// used as the ranking tiebreak.
    pub volume_weight: f64,
}

impl StrategySpec {
    pub fn new(
        kind: StrategyKind,
        rules: Vec<WeightedRule>,
        threshold: f64,
    ) -> Result<Self, OppscanError> {
        if rules.is_empty() {
            return Err(OppscanError::InvalidStrategyConfig {
                reason: format!("strategy '{}' has no rules", kind),
            });
        }
        for wr in &rules {
            if !wr.weight.is_finite() {
                return Err(OppscanError::InvalidStrategyConfig {
                    reason: format!("rule '{}' has non-finite weight", wr.rule),
                });
            }
        }
        let weight_sum: f64 = rules.iter().map(|wr| wr.weight.abs()).sum();
        if weight_sum == 0.0 {
            return Err(OppscanError::InvalidStrategyConfig {
                reason: format!("strategy '{}' weights sum to zero", kind),
            });
        }
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(OppscanError::InvalidStrategyConfig {
                reason: format!("strategy '{}' threshold {} is invalid", kind, threshold),
            });
        }

        Ok(StrategySpec {
            kind,
            rules,
            threshold,
        })
    }

    /// RSI + MACD + Bollinger composite.
    pub fn technical() -> Self {
        StrategySpec {
            kind: StrategyKind::Technical,
            rules: vec![
                WeightedRule {
                    rule: SignalRule::rsi_default(),
                    weight: 0.4,
                },
                WeightedRule {
                    rule: SignalRule::macd_default(),
                    weight: 0.35,
                },
                WeightedRule {
                    rule: SignalRule::bollinger_default(),
                    weight: 0.25,
                },
            ],
            threshold: 0.2,
        }
    }

    /// Price momentum with an RSI overextension check.
    pub fn momentum() -> Self {
        StrategySpec {
            kind: StrategyKind::Momentum,
            rules: vec![
                WeightedRule {
                    rule: SignalRule::momentum_default(),
                    weight: 0.7,
                },
                WeightedRule {
                    rule: SignalRule::rsi_default(),
                    weight: 0.3,
                },
            ],
            threshold: 0.3,
        }
    }

    /// Fundamental cheapness.
    pub fn value() -> Self {
        StrategySpec {
            kind: StrategyKind::Value,
            rules: vec![WeightedRule {
                rule: SignalRule::value_default(),
                weight: 1.0,
            }],
            threshold: 0.3,
        }
    }

    /// Fundamental growth quality.
    pub fn growth() -> Self {
        StrategySpec {
            kind: StrategyKind::Growth,
            rules: vec![WeightedRule {
                rule: SignalRule::growth_default(),
                weight: 1.0,
            }],
            threshold: 0.3,
        }
    }

    pub fn custom(rules: Vec<WeightedRule>, threshold: f64) -> Result<Self, OppscanError> {
        StrategySpec::new(StrategyKind::Custom, rules, threshold)
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    pub fn rules(&self) -> &[WeightedRule] {
        &self.rules
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Bars needed before every rule in this strategy can be defined.
    pub fn min_history(&self) -> usize {
        self.rules
            .iter()
            .map(|wr| wr.rule.min_history())
            .max()
            .unwrap_or(1)
    }

    /// Evaluate every rule at the context's last bar and fold the
    /// signed strengths into one composite score.
    pub fn compose(&self, ctx: &SignalContext) -> CompositeScore {
        let weight_sum: f64 = self.rules.iter().map(|wr| wr.weight.abs()).sum();

        let mut weighted = 0.0;
        let mut contribution_mass = 0.0;
        let mut signals = Vec::with_capacity(self.rules.len());

        for wr in &self.rules {
            let sig = signal::evaluate(&wr.rule, ctx);
            weighted += wr.weight * sig.signed_strength();
            contribution_mass += (wr.weight * sig.strength).abs();
            signals.push(sig);
        }

        let score = weighted / weight_sum;
        let last_volume = ctx.bars().last().map(|b| b.volume).unwrap_or(0) as f64;
        let volume_weight = contribution_mass / weight_sum * last_volume;

        CompositeScore {
            score,
            signals,
            volume_weight,
        }
    }

    pub fn qualifies(&self, score: f64) -> bool {
        score.abs() >= self.threshold
    }
}
