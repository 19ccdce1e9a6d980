use crate::errors::{EngineError, EngineResult};
use crate::models::{intrinsic, GreeksSnapshot, OptionKind, OptionLeg, PricingParams, DAYS_PER_YEAR};
use chrono::NaiveDate;
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

/// Closed-form lognormal (Black-Scholes) valuation for European options.
///
/// d1 = (ln(S/K) + (r + sigma^2/2)*T) / (sigma * sqrt(T))
/// d2 = d1 - sigma * sqrt(T)
///
/// Call = S*Phi(d1) - K*e^(-rT)*Phi(d2)
/// Put  = K*e^(-rT)*Phi(-d2) - S*Phi(-d1)
///
/// Theta is reported per calendar day, vega and rho per 1-point move.
/// At T = 0 the price collapses to intrinsic value.
pub struct BlackScholes {
    /// Standard normal distribution (created once, reused)
    normal: Normal,
}

impl BlackScholes {
    pub fn new() -> Self {
        Self {
            normal: Normal::standard(),
        }
    }

    #[inline]
    pub fn cdf(&self, x: f64) -> f64 {
        self.normal.cdf(x)
    }

    #[inline]
    pub fn pdf(&self, x: f64) -> f64 {
        self.normal.pdf(x)
    }

    /// Price and Greeks for a single contract (per share).
    pub fn price_and_greeks(
        &self,
        spot: f64,
        strike: f64,
        time_to_expiry_years: f64,
        risk_free_rate: f64,
        volatility: f64,
        kind: OptionKind,
    ) -> EngineResult<(f64, GreeksSnapshot)> {
        let params =
            PricingParams::new(spot, strike, time_to_expiry_years, risk_free_rate, volatility);
        params.validate()?;
        self.evaluate(&params, kind)
    }

    /// Price an `OptionLeg` as of a date, using the leg's own spot and volatility.
    pub fn price_leg(
        &self,
        leg: &OptionLeg,
        as_of: NaiveDate,
        risk_free_rate: f64,
    ) -> EngineResult<(f64, GreeksSnapshot)> {
        leg.validate(&leg.symbol)?;
        self.price_and_greeks(
            leg.underlying_price,
            leg.strike,
            leg.time_to_expiry_years(as_of),
            risk_free_rate,
            leg.volatility,
            leg.kind,
        )
    }

    /// Pure function on validated, precomputed params.
    fn evaluate(&self, p: &PricingParams, kind: OptionKind) -> EngineResult<(f64, GreeksSnapshot)> {
        if p.ttl_years == 0.0 {
            return Ok(expiration_value(p.spot, p.strike, kind));
        }

        let d1 = (p.ln_s_k + (p.rate + 0.5 * p.sigma * p.sigma) * p.ttl_years) / p.sigma_sqrt_t;
        let d2 = d1 - p.sigma_sqrt_t;

        let pdf_d1 = self.pdf(d1);
        let k_disc = p.strike * p.discount;

        // Shared by both kinds
        let gamma = pdf_d1 / (p.spot * p.sigma_sqrt_t);
        let vega = p.spot * pdf_d1 * p.sqrt_t / 100.0;
        let decay = -p.spot * pdf_d1 * p.sigma / (2.0 * p.sqrt_t);

        let (price, delta, theta, rho) = match kind {
            OptionKind::Call => {
                let nd1 = self.cdf(d1);
                let nd2 = self.cdf(d2);
                (
                    p.spot * nd1 - k_disc * nd2,
                    nd1,
                    (decay - p.rate * k_disc * nd2) / DAYS_PER_YEAR,
                    p.strike * p.ttl_years * p.discount * nd2 / 100.0,
                )
            }
            OptionKind::Put => {
                let n_neg_d1 = self.cdf(-d1);
                let n_neg_d2 = self.cdf(-d2);
                (
                    k_disc * n_neg_d2 - p.spot * n_neg_d1,
                    self.cdf(d1) - 1.0,
                    (decay + p.rate * k_disc * n_neg_d2) / DAYS_PER_YEAR,
                    -p.strike * p.ttl_years * p.discount * n_neg_d2 / 100.0,
                )
            }
        };

        if !price.is_finite() || !delta.is_finite() || !gamma.is_finite() {
            return Err(EngineError::Model(format!(
                "non-finite result for S={} K={} T={} sigma={}",
                p.spot, p.strike, p.ttl_years, p.sigma
            )));
        }

        Ok((price, GreeksSnapshot { delta, gamma, theta, vega, rho }))
    }
}

impl Default for BlackScholes {
    fn default() -> Self {
        Self::new()
    }
}

/// Expiration boundary: intrinsic price, step delta, every other Greek zero.
fn expiration_value(spot: f64, strike: f64, kind: OptionKind) -> (f64, GreeksSnapshot) {
    let value = intrinsic(spot, strike, kind);
    let delta = match kind {
        OptionKind::Call if value > 0.0 => 1.0,
        OptionKind::Put if value > 0.0 => -1.0,
        _ => 0.0,
    };
    (value, GreeksSnapshot { delta, ..GreeksSnapshot::zero() })
}
