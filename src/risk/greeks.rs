//! Portfolio Greeks aggregation.
//!
//! Each leg is priced with the closed-form model and its per-share Greeks
//! are scaled by the signed quantity (+q BUY, -q SELL):
//! - Delta: sum(leg_delta * signed_qty)
//! - Gamma: sum(leg_gamma * signed_qty)
//! - Theta: sum(leg_theta * signed_qty)
//! - Vega:  sum(leg_vega * signed_qty)
//! - Rho:   sum(leg_rho * signed_qty)
//!
//! Sums are kept at full precision; round with `GreeksSnapshot::rounded`
//! only when reporting.

use crate::errors::EngineResult;
use crate::models::black_scholes::BlackScholes;
use crate::models::{validate_legs, GreeksSnapshot, OptionLeg};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Existing / incoming / combined exposure for a proposed trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GreeksImpact {
    pub existing: GreeksSnapshot,
    pub incoming: GreeksSnapshot,
    pub combined: GreeksSnapshot,
}

impl GreeksImpact {
    pub fn new(existing: GreeksSnapshot, incoming: GreeksSnapshot) -> Self {
        Self {
            existing,
            incoming,
            combined: combine(existing, incoming),
        }
    }

    pub fn rounded(&self) -> Self {
        Self {
            existing: self.existing.rounded(),
            incoming: self.incoming.rounded(),
            combined: self.combined.rounded(),
        }
    }
}

/// Signed Greeks for one leg.
pub fn leg_greeks(
    model: &BlackScholes,
    leg: &OptionLeg,
    as_of: NaiveDate,
    risk_free_rate: f64,
) -> EngineResult<GreeksSnapshot> {
    let (_, greeks) = model.price_leg(leg, as_of, risk_free_rate)?;
    Ok(greeks.scaled(leg.signed_quantity()))
}

/// Sum signed Greeks over all legs. An empty slice yields zero exposure.
/// A bad leg is reported by position (`legs[i]`).
pub fn aggregate(
    model: &BlackScholes,
    legs: &[OptionLeg],
    as_of: NaiveDate,
    risk_free_rate: f64,
) -> EngineResult<GreeksSnapshot> {
    validate_legs("legs", legs)?;
    legs.iter()
        .try_fold(GreeksSnapshot::zero(), |acc, leg| -> EngineResult<GreeksSnapshot> {
            Ok(combine(acc, leg_greeks(model, leg, as_of, risk_free_rate)?))
        })
}

/// Elementwise sum.
#[inline]
pub fn combine(a: GreeksSnapshot, b: GreeksSnapshot) -> GreeksSnapshot {
    a + b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{as_of, leg};
    use crate::models::{OptionKind, TradeAction};

    #[test]
    fn test_empty_is_zero() {
        let bs = BlackScholes::new();
        let g = aggregate(&bs, &[], as_of(), 0.05).unwrap();
        assert_eq!(g, GreeksSnapshot::zero());
    }

    #[test]
    fn test_signed_quantity_scaling() {
        let bs = BlackScholes::new();
        let mut long = leg(OptionKind::Call, TradeAction::Buy, 450.0, 30);
        long.quantity = 3;
        let mut short = long.clone();
        short.action = TradeAction::Sell;

        let (_, unit) = bs.price_leg(&long, as_of(), 0.05).unwrap();
        let g_long = aggregate(&bs, &[long.clone()], as_of(), 0.05).unwrap();
        assert!((g_long.delta - 3.0 * unit.delta).abs() < 1e-12);
        assert!((g_long.theta - 3.0 * unit.theta).abs() < 1e-12);

        // Long and short of the same contract cancel out
        let flat = aggregate(&bs, &[long, short], as_of(), 0.05).unwrap();
        assert!(flat.delta.abs() < 1e-12);
        assert!(flat.gamma.abs() < 1e-12 && flat.vega.abs() < 1e-12);
    }

    #[test]
    fn test_combine_associative_commutative() {
        let snap = |delta, gamma, theta, vega, rho| GreeksSnapshot {
            delta,
            gamma,
            theta,
            vega,
            rho,
        };
        let a = snap(1.5, 0.01, -2.0, 3.0, 0.4);
        let b = snap(-0.5, 0.02, -1.0, 1.0, -0.1);
        let c = snap(10.0, 0.0, 0.5, -4.0, 0.2);
        assert_eq!(combine(a, b), combine(b, a));
        let left = combine(combine(a, b), c);
        let right = combine(a, combine(b, c));
        assert!((left.delta - right.delta).abs() < 1e-12);
        assert!((left.gamma - right.gamma).abs() < 1e-12);
        assert!((left.theta - right.theta).abs() < 1e-12);
        assert!((left.vega - right.vega).abs() < 1e-12);
        assert!((left.rho - right.rho).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_leg_propagates() {
        let bs = BlackScholes::new();
        let mut bad = leg(OptionKind::Put, TradeAction::Buy, 450.0, 30);
        bad.volatility = -0.1;
        assert!(aggregate(&bs, &[bad], as_of(), 0.05).is_err());
    }

    #[test]
    fn test_invalid_leg_named_by_position() {
        let bs = BlackScholes::new();
        let good = leg(OptionKind::Call, TradeAction::Buy, 450.0, 30);
        let mut bad = good.clone();
        bad.volatility = 0.0;

        let err = aggregate(&bs, &[good.clone(), good, bad], as_of(), 0.05).unwrap_err();
        assert!(err.is_invalid_input(), "{err}");
        assert!(err.to_string().contains("legs[2]"), "{err}");
        assert!(err.to_string().contains("volatility"), "{err}");
    }

    #[test]
    fn test_impact_combines_full_precision() {
        let existing = GreeksSnapshot { delta: 0.004, ..GreeksSnapshot::zero() };
        let incoming = GreeksSnapshot { delta: 0.004, ..GreeksSnapshot::zero() };
        let impact = GreeksImpact::new(existing, incoming);
        // 0.008 rounds to 0.01, rounding each side first would give 0.00
        assert_eq!(impact.rounded().combined.delta, 0.01);
    }
}
