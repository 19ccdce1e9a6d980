use crate::errors::{EngineError, EngineResult};
use crate::models::GreeksSnapshot;
use serde::{Deserialize, Serialize};

/// Symbol appears in more than this many combined legs -> concentration warning.
pub const MAX_LEGS_PER_SYMBOL: usize = 3;
/// More than this many proposed legs on one expiry -> warning.
pub const MAX_LEGS_PER_EXPIRY: usize = 5;
/// More than this many proposed legs on one (symbol, strike) -> warning.
pub const MAX_LEGS_PER_STRIKE: usize = 3;
/// Short legs this close to expiry are checked for early assignment.
pub const ASSIGNMENT_WINDOW_DAYS: i64 = 7;
/// Credit strategies want mean IV at or above this level.
pub const MIN_CREDIT_VOLATILITY: f64 = 0.50;
/// Max loss above this fraction of available cash -> warning.
pub const MAX_LOSS_CASH_FRACTION: f64 = 0.20;

/// Portfolio-level Greek thresholds. Vega and theta are in dollars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GreeksLimits {
    pub max_delta: f64,
    pub max_gamma: f64,
    pub max_vega: f64,
    pub max_theta: f64,
}

impl Default for GreeksLimits {
    fn default() -> Self {
        Self {
            max_delta: 200.0,
            max_gamma: 20.0,
            max_vega: 500.0,
            max_theta: 100.0,
        }
    }
}

impl GreeksLimits {
    #[inline]
    pub fn delta_exceeded(&self, greeks: &GreeksSnapshot) -> bool {
        greeks.delta.abs() > self.max_delta
    }

    /// Every limit the snapshot breaches, as human-readable lines.
    /// Pure function, no side effects.
    pub fn breaches(&self, greeks: &GreeksSnapshot) -> Vec<String> {
        let mut out = Vec::new();
        if self.delta_exceeded(greeks) {
            out.push(format!("delta {:.2} exceeds limit {:.2}", greeks.delta, self.max_delta));
        }
        if greeks.gamma.abs() > self.max_gamma {
            out.push(format!("gamma {:.4} exceeds limit {:.2}", greeks.gamma, self.max_gamma));
        }
        if greeks.vega.abs() > self.max_vega {
            out.push(format!("vega {:.2} exceeds limit {:.2}", greeks.vega, self.max_vega));
        }
        if greeks.theta.abs() > self.max_theta {
            out.push(format!("theta {:.2} exceeds limit {:.2}", greeks.theta, self.max_theta));
        }
        out
    }

    pub fn validate(&self) -> EngineResult<()> {
        for (name, v) in [
            ("max_delta", self.max_delta),
            ("max_gamma", self.max_gamma),
            ("max_vega", self.max_vega),
            ("max_theta", self.max_theta),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(EngineError::Config(format!("{name} must be positive, got {v}")));
            }
        }
        Ok(())
    }
}

// ── Risk Profile ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskProfile {
    #[serde(alias = "conservative")]
    Conservative,
    #[serde(alias = "moderate")]
    Moderate,
    #[serde(alias = "aggressive")]
    Aggressive,
}

impl Default for RiskProfile {
    fn default() -> Self {
        Self::Moderate
    }
}

impl std::fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conservative => write!(f, "CONSERVATIVE"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::Aggressive => write!(f, "AGGRESSIVE"),
        }
    }
}

/// Minimum probability of profit (percent) per risk profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityThresholds {
    pub conservative: f64,
    pub moderate: f64,
    pub aggressive: f64,
}

impl Default for ProbabilityThresholds {
    fn default() -> Self {
        Self {
            conservative: 70.0,
            moderate: 60.0,
            aggressive: 50.0,
        }
    }
}

impl ProbabilityThresholds {
    #[inline]
    pub fn minimum_for(&self, profile: RiskProfile) -> f64 {
        match profile {
            RiskProfile::Conservative => self.conservative,
            RiskProfile::Moderate => self.moderate,
            RiskProfile::Aggressive => self.aggressive,
        }
    }
}

/// Everything the pipeline needs, injected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub greeks_limits: GreeksLimits,
    pub probability_thresholds: ProbabilityThresholds,
    pub risk_free_rate: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            greeks_limits: GreeksLimits::default(),
            probability_thresholds: ProbabilityThresholds::default(),
            risk_free_rate: 0.05,
        }
    }
}
