use crate::errors::{EngineError, EngineResult};
use crate::risk::limits::{GreeksLimits, ProbabilityThresholds, RiskConfig};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub risk_free_rate: f64,
    pub greeks_limits: GreeksLimits,
    pub probability_thresholds: ProbabilityThresholds,
}

impl AppConfig {
    pub fn from_env() -> EngineResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Missing keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> EngineResult<Self> {
        let defaults_limits = GreeksLimits::default();
        let defaults_pop = ProbabilityThresholds::default();

        let server_port = parse_or(&lookup, "SERVER_PORT", 3001u16)?;
        let risk_free_rate: f64 = parse_or(&lookup, "RISK_FREE_RATE", 0.05)?;

        let greeks_limits = GreeksLimits {
            max_delta: parse_or(&lookup, "MAX_DELTA", defaults_limits.max_delta)?,
            max_gamma: parse_or(&lookup, "MAX_GAMMA", defaults_limits.max_gamma)?,
            max_vega: parse_or(&lookup, "MAX_VEGA", defaults_limits.max_vega)?,
            max_theta: parse_or(&lookup, "MAX_THETA", defaults_limits.max_theta)?,
        };
        greeks_limits.validate()?;

        let probability_thresholds = ProbabilityThresholds {
            conservative: parse_or(
                &lookup,
                "MIN_POP_CONSERVATIVE",
                defaults_pop.conservative,
            )?,
            moderate: parse_or(&lookup, "MIN_POP_MODERATE", defaults_pop.moderate)?,
            aggressive: parse_or(&lookup, "MIN_POP_AGGRESSIVE", defaults_pop.aggressive)?,
        };
        for (key, v) in [
            ("MIN_POP_CONSERVATIVE", probability_thresholds.conservative),
            ("MIN_POP_MODERATE", probability_thresholds.moderate),
            ("MIN_POP_AGGRESSIVE", probability_thresholds.aggressive),
        ] {
            if !(0.0..=100.0).contains(&v) {
                return Err(EngineError::Config(format!(
                    "{key}: must be within 0-100, got {v}"
                )));
            }
        }

        if !risk_free_rate.is_finite() {
            return Err(EngineError::Config("RISK_FREE_RATE: must be finite".into()));
        }

        Ok(Self {
            server_port,
            risk_free_rate,
            greeks_limits,
            probability_thresholds,
        })
    }

    /// The configuration injected into each `RiskCheckPipeline`.
    pub fn risk_config(&self) -> RiskConfig {
        RiskConfig {
            greeks_limits: self.greeks_limits,
            probability_thresholds: self.probability_thresholds,
            risk_free_rate: self.risk_free_rate,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let risk = RiskConfig::default();
        Self {
            server_port: 3001,
            risk_free_rate: risk.risk_free_rate,
            greeks_limits: risk.greeks_limits,
            probability_thresholds: risk.probability_thresholds,
        }
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> EngineResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| EngineError::Config(format!("{key}: {e}"))),
        None => Ok(default),
    }
}
