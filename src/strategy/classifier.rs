use crate::models::{OptionKind, OptionLeg, TradeAction, CONTRACT_MULTIPLIER};
use crate::strategy::{StrategyClassification, StrategyKind};

/// Deterministic strategy-shape classification.
///
/// Rules, by leg count:
///   1 leg  -> long/short call/put from action + kind
///   2 legs -> call_spread (both calls), put_spread (both puts),
///             straddle (call + put, equal strikes), strangle (call + put)
///   4 legs -> iron_condor when exactly 2 calls + 2 puts
///   other  -> custom
///
/// Equal strikes on a call + put pair always resolve to straddle.
/// Pure function: no pricing, no inference.
pub fn classify(legs: &[OptionLeg]) -> StrategyClassification {
    let net_cost = net_cost(legs);
    let calls: Vec<&OptionLeg> = legs.iter().filter(|l| l.kind == OptionKind::Call).collect();
    let puts: Vec<&OptionLeg> = legs.iter().filter(|l| l.kind == OptionKind::Put).collect();

    let (strategy, bounds) = match legs {
        [leg] => single_leg(leg, net_cost),
        [a, b] if a.kind == b.kind => {
            let kind = match a.kind {
                OptionKind::Call => StrategyKind::CallSpread,
                OptionKind::Put => StrategyKind::PutSpread,
            };
            (kind, vertical_bounds(a, b, net_cost))
        }
        [a, b] => {
            let kind = if a.strike == b.strike {
                StrategyKind::Straddle
            } else {
                StrategyKind::Strangle
            };
            (kind, same_side_bounds(legs, net_cost))
        }
        [_, _, _, _] if calls.len() == 2 && puts.len() == 2 => {
            (StrategyKind::IronCondor, condor_bounds(&calls, &puts, net_cost))
        }
        _ => (StrategyKind::Custom, None),
    };

    let (max_loss, max_profit) = bounds.unwrap_or_else(|| debit_credit_bounds(net_cost));

    StrategyClassification {
        strategy,
        leg_count: legs.len(),
        net_cost,
        max_loss,
        max_profit,
    }
}

/// Σ(premium · quantity · 100 · sign), sign = +1 BUY, -1 SELL.
#[inline]
pub fn net_cost(legs: &[OptionLeg]) -> f64 {
    legs.iter().map(OptionLeg::cash_flow).sum()
}

type Bounds = (Option<f64>, Option<f64>);

/// Debit: loss capped at the debit. Credit: profit capped at the credit.
fn debit_credit_bounds(net_cost: f64) -> Bounds {
    if net_cost > 0.0 {
        (Some(net_cost), None)
    } else if net_cost < 0.0 {
        (None, Some(-net_cost))
    } else {
        (None, None)
    }
}

fn single_leg(leg: &OptionLeg, net_cost: f64) -> (StrategyKind, Option<Bounds>) {
    let notional = leg.strike * CONTRACT_MULTIPLIER * leg.quantity as f64;
    match (leg.action, leg.kind) {
        (TradeAction::Buy, OptionKind::Call) => {
            (StrategyKind::LongCall, Some((Some(net_cost), None)))
        }
        (TradeAction::Buy, OptionKind::Put) => (
            StrategyKind::LongPut,
            Some((Some(net_cost), Some(notional - net_cost))),
        ),
        (TradeAction::Sell, OptionKind::Call) => {
            (StrategyKind::ShortCall, Some((None, Some(-net_cost))))
        }
        (TradeAction::Sell, OptionKind::Put) => (
            StrategyKind::ShortPut,
            Some((Some(notional + net_cost), Some(-net_cost))),
        ),
    }
}

/// One long and one short leg of equal size: risk bounded by the strike width.
fn vertical_bounds(a: &OptionLeg, b: &OptionLeg, net_cost: f64) -> Option<Bounds> {
    if a.action == b.action || a.quantity != b.quantity {
        return None;
    }
    let width = (a.strike - b.strike).abs() * CONTRACT_MULTIPLIER * a.quantity as f64;
    Some(width_bounds(width, net_cost))
}

fn width_bounds(width: f64, net_cost: f64) -> Bounds {
    if net_cost >= 0.0 {
        (Some(net_cost), Some(width - net_cost))
    } else {
        (Some(width + net_cost), Some(-net_cost))
    }
}

/// Straddle / strangle: only all-long or all-short legs have one-sided bounds.
fn same_side_bounds(legs: &[OptionLeg], net_cost: f64) -> Option<Bounds> {
    if legs.iter().all(|l| l.action == TradeAction::Buy) {
        Some((Some(net_cost), None))
    } else if legs.iter().all(|l| l.action == TradeAction::Sell) {
        Some((None, Some(-net_cost)))
    } else {
        None
    }
}

/// Iron condor bounded by the wider of its two wings.
fn condor_bounds(calls: &[&OptionLeg], puts: &[&OptionLeg], net_cost: f64) -> Option<Bounds> {
    let qty = calls[0].quantity;
    let balanced = |pair: &[&OptionLeg]| {
        pair[0].action != pair[1].action && pair.iter().all(|l| l.quantity == qty)
    };
    if !balanced(calls) || !balanced(puts) {
        return None;
    }
    let call_wing = (calls[0].strike - calls[1].strike).abs();
    let put_wing = (puts[0].strike - puts[1].strike).abs();
    let width = call_wing.max(put_wing) * CONTRACT_MULTIPLIER * qty as f64;
    Some(width_bounds(width, net_cost))
}
