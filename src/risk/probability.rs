use crate::errors::EngineResult;
use crate::models::black_scholes::BlackScholes;
use crate::models::OptionLeg;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Returned when there is nothing to evaluate.
pub const NEUTRAL_PROBABILITY: f64 = 50.0;

/// Probability of profit at expiry under a risk-neutral lognormal terminal price.
///
/// Breakeven B = strike + premium (long-call style), then
///
/// P(S_T > B) = Phi(d2),  d2 = (ln(S0/B) + (r - sigma^2/2)*T) / (sigma * sqrt(T))
///
/// Only the first leg is evaluated, even for multi-leg strategies.
/// Spreads and condors therefore get a single-leg estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityAnalysis {
    /// Percent, 0-100.
    pub probability_of_profit: f64,
    pub breakevens: SmallVec<[f64; 2]>,
}

impl ProbabilityAnalysis {
    pub fn neutral() -> Self {
        Self {
            probability_of_profit: NEUTRAL_PROBABILITY,
            breakevens: SmallVec::new(),
        }
    }
}

/// Pure function: same legs, date and rate always give the same estimate.
pub fn estimate(
    model: &BlackScholes,
    legs: &[OptionLeg],
    as_of: NaiveDate,
    risk_free_rate: f64,
) -> EngineResult<ProbabilityAnalysis> {
    let Some(first) = legs.first() else {
        return Ok(ProbabilityAnalysis::neutral());
    };
    first.validate("legs[0]")?;

    let breakeven = first.strike + first.premium;
    let spot = first.underlying_price;
    let sigma = first.volatility;
    let t = first.time_to_expiry_years(as_of);

    let probability = if t > 0.0 {
        let drift = (risk_free_rate - 0.5 * sigma * sigma) * t;
        let d2 = ((spot / breakeven).ln() + drift) / (sigma * t.sqrt());
        model.cdf(d2) * 100.0
    } else if spot >= breakeven {
        100.0
    } else {
        0.0
    };

    let mut breakevens = SmallVec::new();
    breakevens.push(breakeven);

    Ok(ProbabilityAnalysis {
        probability_of_profit: probability,
        breakevens,
    })
}
