pub mod black_scholes;

use crate::errors::{EngineError, EngineResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Contract multiplier: one listed equity option covers 100 shares.
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

/// Calendar days per year used for T and for per-day theta.
pub const DAYS_PER_YEAR: f64 = 365.0;

// ── Option Kind / Action ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptionKind {
    #[serde(alias = "call")]
    Call,
    #[serde(alias = "put")]
    Put,
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "CALL"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    #[serde(alias = "buy")]
    Buy,
    #[serde(alias = "sell")]
    Sell,
}

impl TradeAction {
    /// +1 for BUY, -1 for SELL.
    #[inline]
    pub fn sign(&self) -> f64 {
        match self {
            Self::Buy => 1.0,
            Self::Sell => -1.0,
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

// ── Option Leg ──

/// One leg of an existing position or a proposed trade.
/// Premium is per share; quantity is in contracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionLeg {
    pub symbol: String,
    pub kind: OptionKind,
    pub action: TradeAction,
    pub strike: f64,
    pub expiry: NaiveDate,
    pub quantity: u32,
    pub premium: f64,
    pub volatility: f64,
    pub underlying_price: f64,
}

impl OptionLeg {
    /// Check every leg invariant. `label` identifies the leg in the error
    /// (e.g. "proposed[2]").
    pub fn validate(&self, label: &str) -> EngineResult<()> {
        if self.symbol.trim().is_empty() {
            return Err(EngineError::invalid(label, "symbol must not be empty"));
        }
        if self.quantity == 0 {
            return Err(EngineError::invalid(label, "quantity must be positive"));
        }
        if !self.strike.is_finite() || self.strike <= 0.0 {
            return Err(EngineError::invalid(
                label,
                format!("strike must be positive, got {}", self.strike),
            ));
        }
        if !self.volatility.is_finite() || self.volatility <= 0.0 {
            return Err(EngineError::invalid(
                label,
                format!("volatility must be positive, got {}", self.volatility),
            ));
        }
        if !self.underlying_price.is_finite() || self.underlying_price <= 0.0 {
            return Err(EngineError::invalid(
                label,
                format!("underlying price must be positive, got {}", self.underlying_price),
            ));
        }
        if !self.premium.is_finite() || self.premium < 0.0 {
            return Err(EngineError::invalid(
                label,
                format!("premium must be non-negative, got {}", self.premium),
            ));
        }
        Ok(())
    }

    /// +quantity for BUY, -quantity for SELL.
    #[inline]
    pub fn signed_quantity(&self) -> f64 {
        self.action.sign() * self.quantity as f64
    }

    /// Signed premium cash for the whole leg: positive = paid, negative = received.
    #[inline]
    pub fn cash_flow(&self) -> f64 {
        self.premium * self.quantity as f64 * CONTRACT_MULTIPLIER * self.action.sign()
    }

    /// Per-share intrinsic value at the current underlying price.
    #[inline]
    pub fn intrinsic_value(&self) -> f64 {
        intrinsic(self.underlying_price, self.strike, self.kind)
    }

    #[inline]
    pub fn is_in_the_money(&self) -> bool {
        self.intrinsic_value() > 0.0
    }

    /// Calendar days from `as_of` to expiry. Negative once expired.
    #[inline]
    pub fn days_to_expiry(&self, as_of: NaiveDate) -> i64 {
        (self.expiry - as_of).num_days()
    }

    /// Year fraction to expiry, floored at zero for expired legs.
    #[inline]
    pub fn time_to_expiry_years(&self, as_of: NaiveDate) -> f64 {
        self.days_to_expiry(as_of).max(0) as f64 / DAYS_PER_YEAR
    }
}

/// max(S-K, 0) for calls, max(K-S, 0) for puts.
#[inline]
pub fn intrinsic(spot: f64, strike: f64, kind: OptionKind) -> f64 {
    match kind {
        OptionKind::Call => (spot - strike).max(0.0),
        OptionKind::Put => (strike - spot).max(0.0),
    }
}

/// Validate a collection of legs, labelling errors as `name[index]`.
pub fn validate_legs(name: &str, legs: &[OptionLeg]) -> EngineResult<()> {
    for (i, leg) in legs.iter().enumerate() {
        leg.validate(&format!("{name}[{i}]"))?;
    }
    Ok(())
}

// ── Greeks ──

/// Option sensitivities. Theta is per calendar day; vega and rho are per
/// 1-point move in volatility / rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GreeksSnapshot {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub rho: f64,
}

impl GreeksSnapshot {
    #[inline]
    pub fn zero() -> Self {
        Self::default()
    }

    #[inline]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            delta: self.delta * factor,
            gamma: self.gamma * factor,
            theta: self.theta * factor,
            vega: self.vega * factor,
            rho: self.rho * factor,
        }
    }

    /// Reporting precision: 2 dp for delta/theta/vega/rho, 4 dp for gamma.
    pub fn rounded(&self) -> Self {
        Self {
            delta: round_to(self.delta, 2),
            gamma: round_to(self.gamma, 4),
            theta: round_to(self.theta, 2),
            vega: round_to(self.vega, 2),
            rho: round_to(self.rho, 2),
        }
    }
}

impl std::ops::Add for GreeksSnapshot {
    type Output = GreeksSnapshot;

    fn add(self, rhs: Self) -> Self {
        Self {
            delta: self.delta + rhs.delta,
            gamma: self.gamma + rhs.gamma,
            theta: self.theta + rhs.theta,
            vega: self.vega + rhs.vega,
            rho: self.rho + rhs.rho,
        }
    }
}

#[inline]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// ── Precomputed model parameters (stack, no alloc) ──

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct PricingParams {
    pub spot: f64,
    pub strike: f64,
    pub ttl_years: f64,
    pub rate: f64,
    pub sigma: f64,
    // Precomputed
    pub ln_s_k: f64,
    pub sqrt_t: f64,
    pub sigma_sqrt_t: f64,
    pub discount: f64,
}

impl PricingParams {
    #[inline]
    pub fn new(spot: f64, strike: f64, ttl_years: f64, rate: f64, sigma: f64) -> Self {
        let sqrt_t = ttl_years.sqrt();
        Self {
            spot,
            strike,
            ttl_years,
            rate,
            sigma,
            ln_s_k: (spot / strike).ln(),
            sqrt_t,
            sigma_sqrt_t: sigma * sqrt_t,
            discount: (-rate * ttl_years).exp(),
        }
    }

    /// Check the pricing preconditions. Nothing is clamped.
    pub fn validate(&self) -> EngineResult<()> {
        if !self.spot.is_finite() || self.spot <= 0.0 {
            return Err(EngineError::invalid(
                "pricing",
                format!("spot must be positive, got {}", self.spot),
            ));
        }
        if !self.strike.is_finite() || self.strike <= 0.0 {
            return Err(EngineError::invalid(
                "pricing",
                format!("strike must be positive, got {}", self.strike),
            ));
        }
        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(EngineError::invalid(
                "pricing",
                format!("volatility must be positive, got {}", self.sigma),
            ));
        }
        if !self.ttl_years.is_finite() || self.ttl_years < 0.0 {
            return Err(EngineError::invalid(
                "pricing",
                format!("time to expiry must be non-negative, got {}", self.ttl_years),
            ));
        }
        if !self.rate.is_finite() {
            return Err(EngineError::invalid("pricing", "risk-free rate must be finite"));
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::leg;
    use super::*;

    #[test]
    fn test_validate_rejects_bad_legs() {
        let good = leg(OptionKind::Call, TradeAction::Buy, 450.0, 30);
        assert!(good.validate("leg").is_ok());

        let mut zero_qty = good.clone();
        zero_qty.quantity = 0;
        assert!(zero_qty.validate("leg").unwrap_err().is_invalid_input());

        let mut bad_vol = good.clone();
        bad_vol.volatility = 0.0;
        assert!(bad_vol.validate("leg").is_err());

        let mut bad_strike = good.clone();
        bad_strike.strike = -5.0;
        assert!(bad_strike.validate("leg").is_err());

        let mut bad_premium = good;
        bad_premium.premium = f64::NAN;
        assert!(bad_premium.validate("leg").is_err());
    }

    #[test]
    fn test_validate_legs_names_offending_index() {
        let mut legs = vec![
            leg(OptionKind::Call, TradeAction::Buy, 450.0, 30),
            leg(OptionKind::Put, TradeAction::Sell, 440.0, 30),
        ];
        legs[1].underlying_price = 0.0;
        let err = validate_legs("proposed", &legs).unwrap_err();
        assert!(err.to_string().contains("proposed[1]"), "error should name leg: {err}");
    }

    #[test]
    fn test_cash_flow_sign() {
        let buy = leg(OptionKind::Call, TradeAction::Buy, 450.0, 30);
        let sell = leg(OptionKind::Call, TradeAction::Sell, 460.0, 30);
        assert_eq!(buy.cash_flow(), 500.0);
        assert_eq!(sell.cash_flow(), -500.0);
    }

    #[test]
    fn test_expired_leg_has_zero_time() {
        let l = leg(OptionKind::Put, TradeAction::Buy, 450.0, -3);
        assert_eq!(l.days_to_expiry(fixtures::as_of()), -3);
        assert_eq!(l.time_to_expiry_years(fixtures::as_of()), 0.0);
    }

    #[test]
    fn test_rounding_precision() {
        let g = GreeksSnapshot {
            delta: 1.23456,
            gamma: 0.0123456,
            theta: -3.14159,
            vega: 2.71828,
            rho: 0.005,
        };
        let r = g.rounded();
        assert_eq!(r.delta, 1.23);
        assert_eq!(r.gamma, 0.0123);
        assert_eq!(r.theta, -3.14);
        assert_eq!(r.vega, 2.72);
    }
}
