use crate::errors::{EngineError, EngineResult};
use crate::models::CONTRACT_MULTIPLIER;
use serde::{Deserialize, Serialize};

/// Strikes whose |GEX| exceeds this fraction of |net GEX| are walls.
pub const WALL_THRESHOLD_FRACTION: f64 = 0.10;

/// One strike of an options-chain snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainStrike {
    pub strike: f64,
    pub call_gamma: f64,
    pub put_gamma: f64,
    pub call_open_interest: f64,
    pub put_open_interest: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallKind {
    None,
    Support,
    Resistance,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GexRecord {
    pub strike: f64,
    pub call_gex: f64,
    pub put_gex: f64,
    pub total_gex: f64,
    pub wall: WallKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GexProfile {
    pub call_gex_total: f64,
    pub put_gex_total: f64,
    pub net_gex: f64,
    /// Sorted by strike.
    pub per_strike_profile: Vec<GexRecord>,
    /// Subset of the profile classified as support or resistance.
    pub walls: Vec<GexRecord>,
    /// First strike where cumulative GEX (ascending strikes) changes sign.
    pub gamma_flip: Option<f64>,
}

/// Dealer gamma exposure for a chain snapshot.
///
/// Dealers are assumed net short calls and net long puts:
///   call_gex = -call_gamma * call_OI * 100
///   put_gex  = +put_gamma  * put_OI  * 100
///
/// A strike is a wall when |call_gex + put_gex| > 0.10 * |net_gex|:
/// resistance if positive, support if negative.
/// Pure function.
pub fn compute_gex(chain: &[ChainStrike]) -> EngineResult<GexProfile> {
    for (i, row) in chain.iter().enumerate() {
        validate_row(i, row)?;
    }

    let mut rows: Vec<ChainStrike> = chain.to_vec();
    rows.sort_by(|a, b| a.strike.total_cmp(&b.strike));

    let mut profile: Vec<GexRecord> = rows
        .iter()
        .map(|r| {
            let call_gex = -r.call_gamma * r.call_open_interest * CONTRACT_MULTIPLIER;
            let put_gex = r.put_gamma * r.put_open_interest * CONTRACT_MULTIPLIER;
            GexRecord {
                strike: r.strike,
                call_gex,
                put_gex,
                total_gex: call_gex + put_gex,
                wall: WallKind::None,
            }
        })
        .collect();

    let call_gex_total: f64 = profile.iter().map(|r| r.call_gex).sum();
    let put_gex_total: f64 = profile.iter().map(|r| r.put_gex).sum();
    let net_gex = call_gex_total + put_gex_total;
    let threshold = WALL_THRESHOLD_FRACTION * net_gex.abs();

    for record in &mut profile {
        if record.total_gex.abs() > threshold {
            record.wall = if record.total_gex > 0.0 {
                WallKind::Resistance
            } else {
                WallKind::Support
            };
        }
    }

    let walls: Vec<GexRecord> = profile
        .iter()
        .filter(|r| r.wall != WallKind::None)
        .copied()
        .collect();
    let gamma_flip = find_gamma_flip(&profile);

    tracing::debug!(
        strikes = profile.len(),
        net_gex,
        walls = walls.len(),
        gamma_flip = ?gamma_flip,
        "gex computed"
    );

    Ok(GexProfile {
        call_gex_total,
        put_gex_total,
        net_gex,
        per_strike_profile: profile,
        walls,
        gamma_flip,
    })
}

fn validate_row(index: usize, row: &ChainStrike) -> EngineResult<()> {
    let label = format!("chain[{index}]");
    if !row.strike.is_finite() || row.strike <= 0.0 {
        return Err(EngineError::invalid(
            label,
            format!("strike must be positive, got {}", row.strike),
        ));
    }
    for (name, v) in [
        ("call_gamma", row.call_gamma),
        ("put_gamma", row.put_gamma),
        ("call_open_interest", row.call_open_interest),
        ("put_open_interest", row.put_open_interest),
    ] {
        if !v.is_finite() || v < 0.0 {
            return Err(EngineError::invalid(
                label,
                format!("{name} must be non-negative, got {v}"),
            ));
        }
    }
    Ok(())
}

/// Walk strikes upward accumulating GEX; report the strike where the running
/// total first crosses zero (strictly changes sign).
fn find_gamma_flip(profile: &[GexRecord]) -> Option<f64> {
    let mut cumulative = 0.0_f64;
    let mut last_sign = 0.0_f64;
    for record in profile {
        cumulative += record.total_gex;
        let sign = if cumulative > 0.0 {
            1.0
        } else if cumulative < 0.0 {
            -1.0
        } else {
            0.0
        };
        if sign != 0.0 {
            if last_sign != 0.0 && sign != last_sign {
                return Some(record.strike);
            }
            last_sign = sign;
        }
    }
    None
}
