use crate::errors::{EngineError, EngineResult};
use crate::models::black_scholes::BlackScholes;
use crate::models::{validate_legs, OptionLeg, TradeAction};
use crate::risk::greeks::{self, GreeksImpact};
use crate::risk::limits::*;
use crate::risk::probability::{self, ProbabilityAnalysis};
use crate::strategy::classifier;
use crate::strategy::StrategyClassification;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

// ── Check vocabulary ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Blocker,
    Warning,
    Info,
    Pass,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blocker => write!(f, "BLOCKER"),
            Self::Warning => write!(f, "WARNING"),
            Self::Info => write!(f, "INFO"),
            Self::Pass => write!(f, "PASS"),
        }
    }
}

/// The ten checks, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckId {
    StrategyDetection,
    GreeksDeltaLimit,
    CapitalRequirement,
    ProbabilityThreshold,
    IvRank,
    SymbolConcentration,
    EarlyAssignment,
    ExpirationConcentration,
    StrikeConcentration,
    MaxLoss,
}

impl CheckId {
    pub const ORDER: [CheckId; 10] = [
        CheckId::StrategyDetection,
        CheckId::GreeksDeltaLimit,
        CheckId::CapitalRequirement,
        CheckId::ProbabilityThreshold,
        CheckId::IvRank,
        CheckId::SymbolConcentration,
        CheckId::EarlyAssignment,
        CheckId::ExpirationConcentration,
        CheckId::StrikeConcentration,
        CheckId::MaxLoss,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StrategyDetection => "strategy_detection",
            Self::GreeksDeltaLimit => "greeks_delta_limit",
            Self::CapitalRequirement => "capital_requirement",
            Self::ProbabilityThreshold => "probability_threshold",
            Self::IvRank => "iv_rank",
            Self::SymbolConcentration => "symbol_concentration",
            Self::EarlyAssignment => "early_assignment",
            Self::ExpirationConcentration => "expiration_concentration",
            Self::StrikeConcentration => "strike_concentration",
            Self::MaxLoss => "max_loss",
        }
    }
}

impl std::fmt::Display for CheckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskCheckResult {
    pub check: CheckId,
    pub severity: Severity,
    pub message: String,
    pub observed: Option<f64>,
    pub limit: Option<f64>,
}

impl RiskCheckResult {
    fn new(check: CheckId, severity: Severity, message: String) -> Self {
        Self {
            check,
            severity,
            message,
            observed: None,
            limit: None,
        }
    }

    fn measured(mut self, observed: f64, limit: Option<f64>) -> Self {
        self.observed = Some(observed);
        self.limit = limit;
        self
    }
}

// ── Request / Report ──

/// A proposed trade against an account's current positions.
/// `as_of` defaults to today (UTC) when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    #[serde(default)]
    pub existing_legs: Vec<OptionLeg>,
    pub proposed_legs: Vec<OptionLeg>,
    pub available_cash: f64,
    #[serde(default)]
    pub risk_profile: RiskProfile,
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

pub type CheckList = SmallVec<[RiskCheckResult; 10]>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True iff no check returned BLOCKER.
    pub passed: bool,
    pub blocker_count: usize,
    pub warning_count: usize,
    pub checks: CheckList,
    pub strategy: StrategyClassification,
    /// Rounded for reporting.
    pub greeks_impact: GreeksImpact,
    /// Every GreeksLimits breach of the combined exposure. Only delta gates.
    pub limit_breaches: Vec<String>,
    pub probability: ProbabilityAnalysis,
    pub as_of: NaiveDate,
}

impl ValidationReport {
    #[cfg(test)]
    pub fn result(&self, check: CheckId) -> Option<&RiskCheckResult> {
        self.checks.iter().find(|c| c.check == check)
    }
}

/// Inputs every check reads. Built once per validation, then discarded.
struct CheckContext<'a> {
    request: &'a ValidationRequest,
    as_of: NaiveDate,
    strategy: &'a StrategyClassification,
    impact: &'a GreeksImpact,
    probability: &'a ProbabilityAnalysis,
}

// ── Pipeline ──

/// Ordered ten-check risk gate for a proposed trade.
///
/// Every check always runs, in `CheckId::ORDER`, with no branching on earlier
/// outcomes. Only BLOCKER results fail the report.
/// Config is injected; the pipeline holds no mutable state and may be shared
/// across threads.
pub struct RiskCheckPipeline {
    config: RiskConfig,
    model: BlackScholes,
}

impl RiskCheckPipeline {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            model: BlackScholes::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn validate(&self, request: &ValidationRequest) -> EngineResult<ValidationReport> {
        if !request.available_cash.is_finite() || request.available_cash < 0.0 {
            return Err(EngineError::invalid(
                "available_cash",
                format!("must be a non-negative amount, got {}", request.available_cash),
            ));
        }
        validate_legs("existing", &request.existing_legs)?;
        validate_legs("proposed", &request.proposed_legs)?;

        let as_of = request.as_of.unwrap_or_else(|| chrono::Utc::now().date_naive());
        let rate = self.config.risk_free_rate;

        let strategy = classifier::classify(&request.proposed_legs);
        let existing = greeks::aggregate(&self.model, &request.existing_legs, as_of, rate)?;
        let incoming = greeks::aggregate(&self.model, &request.proposed_legs, as_of, rate)?;
        let impact = GreeksImpact::new(existing, incoming);
        let probability = probability::estimate(&self.model, &request.proposed_legs, as_of, rate)?;

        let ctx = CheckContext {
            request,
            as_of,
            strategy: &strategy,
            impact: &impact,
            probability: &probability,
        };

        let checks: CheckList = CheckId::ORDER.iter().map(|&id| self.run_check(id, &ctx)).collect();

        let blocker_count = checks.iter().filter(|c| c.severity == Severity::Blocker).count();
        let warning_count = checks.iter().filter(|c| c.severity == Severity::Warning).count();
        let passed = blocker_count == 0;

        for c in checks.iter().filter(|c| c.severity == Severity::Blocker) {
            tracing::warn!(check = %c.check, message = %c.message, "risk check blocked trade");
        }
        tracing::info!(
            strategy = %strategy.strategy,
            legs = strategy.leg_count,
            passed,
            blockers = blocker_count,
            warnings = warning_count,
            "trade validated"
        );

        Ok(ValidationReport {
            passed,
            blocker_count,
            warning_count,
            checks,
            strategy,
            greeks_impact: impact.rounded(),
            limit_breaches: self.config.greeks_limits.breaches(&impact.combined),
            probability,
            as_of,
        })
    }

    fn run_check(&self, id: CheckId, ctx: &CheckContext<'_>) -> RiskCheckResult {
        let result = match id {
            CheckId::StrategyDetection => check_strategy(ctx),
            CheckId::GreeksDeltaLimit => check_delta(ctx, &self.config.greeks_limits),
            CheckId::CapitalRequirement => check_capital(ctx),
            CheckId::ProbabilityThreshold => {
                check_probability(ctx, &self.config.probability_thresholds)
            }
            CheckId::IvRank => check_iv_rank(ctx),
            CheckId::SymbolConcentration => check_symbol_concentration(ctx),
            CheckId::EarlyAssignment => check_early_assignment(ctx),
            CheckId::ExpirationConcentration => check_expiration_concentration(ctx),
            CheckId::StrikeConcentration => check_strike_concentration(ctx),
            CheckId::MaxLoss => check_max_loss(ctx),
        };
        tracing::debug!(
            check = %id,
            severity = %result.severity,
            message = %result.message,
            "risk check"
        );
        result
    }
}

// ── Checks (pure functions) ──

fn check_strategy(ctx: &CheckContext<'_>) -> RiskCheckResult {
    let risk = if ctx.strategy.strategy.is_defined_risk() { "defined" } else { "open" };
    RiskCheckResult::new(
        CheckId::StrategyDetection,
        Severity::Info,
        format!(
            "Detected strategy: {} ({} legs, {risk} risk)",
            ctx.strategy.strategy, ctx.strategy.leg_count
        ),
    )
    .measured(ctx.strategy.leg_count as f64, None)
}

fn check_delta(ctx: &CheckContext<'_>, limits: &GreeksLimits) -> RiskCheckResult {
    let combined = ctx.impact.combined.delta;
    let (severity, verb) = if limits.delta_exceeded(&ctx.impact.combined) {
        (Severity::Blocker, "exceeds")
    } else {
        (Severity::Pass, "within")
    };
    RiskCheckResult::new(
        CheckId::GreeksDeltaLimit,
        severity,
        format!(
            "Combined portfolio delta {:.2} {verb} limit of ±{:.2}",
            combined, limits.max_delta
        ),
    )
    .measured(combined.abs(), Some(limits.max_delta))
}

fn check_capital(ctx: &CheckContext<'_>) -> RiskCheckResult {
    let cost = ctx.strategy.net_cost;
    let cash = ctx.request.available_cash;
    let (severity, message) = if cost > cash {
        (
            Severity::Blocker,
            format!("Trade requires ${cost:.2} but only ${cash:.2} is available"),
        )
    } else if cost < 0.0 {
        (Severity::Pass, format!("Trade collects a net credit of ${:.2}", -cost))
    } else {
        (Severity::Pass, format!("Trade requires ${cost:.2} of ${cash:.2} available"))
    };
    RiskCheckResult::new(CheckId::CapitalRequirement, severity, message).measured(cost, Some(cash))
}

fn check_probability(
    ctx: &CheckContext<'_>,
    thresholds: &ProbabilityThresholds,
) -> RiskCheckResult {
    let pop = ctx.probability.probability_of_profit;
    let profile = ctx.request.risk_profile;
    let minimum = thresholds.minimum_for(profile);
    let severity = if pop < minimum { Severity::Warning } else { Severity::Pass };
    let relation = if pop < minimum { "below" } else { "meets" };
    RiskCheckResult::new(
        CheckId::ProbabilityThreshold,
        severity,
        format!(
            "Probability of profit {pop:.1}% {relation} the {profile} minimum of {minimum:.0}%"
        ),
    )
    .measured(pop, Some(minimum))
}

fn check_iv_rank(ctx: &CheckContext<'_>) -> RiskCheckResult {
    let legs = &ctx.request.proposed_legs;
    if !ctx.strategy.is_net_credit() || legs.is_empty() {
        return RiskCheckResult::new(
            CheckId::IvRank,
            Severity::Info,
            "Volatility check not applicable: strategy is not a net credit".to_string(),
        );
    }
    let mean_iv = legs.iter().map(|l| l.volatility).sum::<f64>() / legs.len() as f64;
    let (severity, message) = if mean_iv < MIN_CREDIT_VOLATILITY {
        (
            Severity::Warning,
            format!(
                "Selling premium with mean IV {:.0}% below {:.0}%",
                mean_iv * 100.0,
                MIN_CREDIT_VOLATILITY * 100.0
            ),
        )
    } else {
        (
            Severity::Pass,
            format!("Mean IV {:.0}% supports selling premium", mean_iv * 100.0),
        )
    };
    RiskCheckResult::new(CheckId::IvRank, severity, message)
        .measured(mean_iv, Some(MIN_CREDIT_VOLATILITY))
}

fn check_symbol_concentration(ctx: &CheckContext<'_>) -> RiskCheckResult {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for leg in ctx.request.existing_legs.iter().chain(&ctx.request.proposed_legs) {
        *counts.entry(leg.symbol.as_str()).or_default() += 1;
    }
    let max = counts.values().copied().max().unwrap_or(0);

    let mut crowded: Vec<&str> = counts
        .iter()
        .filter(|(_, &n)| n > MAX_LEGS_PER_SYMBOL)
        .map(|(&s, _)| s)
        .collect();
    crowded.sort_unstable();

    let (severity, message) = if crowded.is_empty() {
        (
            Severity::Pass,
            format!("No symbol exceeds {MAX_LEGS_PER_SYMBOL} positions"),
        )
    } else {
        (
            Severity::Warning,
            format!(
                "Concentrated in {} (more than {MAX_LEGS_PER_SYMBOL} positions)",
                crowded.join(", ")
            ),
        )
    };
    RiskCheckResult::new(CheckId::SymbolConcentration, severity, message)
        .measured(max as f64, Some(MAX_LEGS_PER_SYMBOL as f64))
}

fn check_early_assignment(ctx: &CheckContext<'_>) -> RiskCheckResult {
    let at_risk: Vec<String> = ctx
        .request
        .proposed_legs
        .iter()
        .filter(|l| l.action == TradeAction::Sell)
        .filter(|l| l.days_to_expiry(ctx.as_of) <= ASSIGNMENT_WINDOW_DAYS && l.is_in_the_money())
        .map(|l| {
            format!(
                "{} {} {} ({} DTE, ${:.2} ITM)",
                l.symbol,
                l.strike,
                l.kind,
                l.days_to_expiry(ctx.as_of),
                l.intrinsic_value()
            )
        })
        .collect();

    let (severity, message) = if at_risk.is_empty() {
        (Severity::Pass, "No short legs at early-assignment risk".to_string())
    } else {
        (
            Severity::Warning,
            format!("Early assignment risk on short ITM legs: {}", at_risk.join("; ")),
        )
    };
    RiskCheckResult::new(CheckId::EarlyAssignment, severity, message)
        .measured(at_risk.len() as f64, Some(ASSIGNMENT_WINDOW_DAYS as f64))
}

fn check_expiration_concentration(ctx: &CheckContext<'_>) -> RiskCheckResult {
    let mut counts: HashMap<NaiveDate, usize> = HashMap::new();
    for leg in &ctx.request.proposed_legs {
        *counts.entry(leg.expiry).or_default() += 1;
    }
    let busiest = counts.iter().max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)));

    let (severity, message, observed) = match busiest {
        Some((expiry, &n)) if n > MAX_LEGS_PER_EXPIRY => (
            Severity::Warning,
            format!("{n} legs expire on {expiry} (more than {MAX_LEGS_PER_EXPIRY})"),
            n,
        ),
        other => (
            Severity::Pass,
            format!("No expiry holds more than {MAX_LEGS_PER_EXPIRY} legs"),
            other.map_or(0, |(_, &n)| n),
        ),
    };
    RiskCheckResult::new(CheckId::ExpirationConcentration, severity, message)
        .measured(observed as f64, Some(MAX_LEGS_PER_EXPIRY as f64))
}

fn check_strike_concentration(ctx: &CheckContext<'_>) -> RiskCheckResult {
    // f64 strikes keyed by bit pattern; legs were validated finite and positive
    let mut counts: HashMap<(&str, u64), usize> = HashMap::new();
    for leg in &ctx.request.proposed_legs {
        *counts.entry((leg.symbol.as_str(), leg.strike.to_bits())).or_default() += 1;
    }
    let mut crowded: Vec<String> = counts
        .iter()
        .filter(|(_, &n)| n > MAX_LEGS_PER_STRIKE)
        .map(|(&(sym, bits), n)| format!("{sym} {} x{n}", f64::from_bits(bits)))
        .collect();
    crowded.sort_unstable();
    let max = counts.values().copied().max().unwrap_or(0);

    let (severity, message) = if crowded.is_empty() {
        (
            Severity::Pass,
            format!("No strike holds more than {MAX_LEGS_PER_STRIKE} legs"),
        )
    } else {
        (
            Severity::Warning,
            format!("Strike concentration: {}", crowded.join(", ")),
        )
    };
    RiskCheckResult::new(CheckId::StrikeConcentration, severity, message)
        .measured(max as f64, Some(MAX_LEGS_PER_STRIKE as f64))
}

fn check_max_loss(ctx: &CheckContext<'_>) -> RiskCheckResult {
    let limit = ctx.request.available_cash * MAX_LOSS_CASH_FRACTION;
    let Some(max_loss) = ctx.strategy.max_loss else {
        return RiskCheckResult::new(
            CheckId::MaxLoss,
            Severity::Info,
            "Max loss is undefined for this strategy".to_string(),
        );
    };
    let severity = if max_loss > limit { Severity::Warning } else { Severity::Pass };
    let relation = if max_loss > limit { "exceeds" } else { "within" };
    RiskCheckResult::new(
        CheckId::MaxLoss,
        severity,
        format!(
            "Max loss ${max_loss:.2} {relation} {:.0}% of available cash (${limit:.2})",
            MAX_LOSS_CASH_FRACTION * 100.0
        ),
    )
    .measured(max_loss, Some(limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{as_of, leg};
    use crate::models::OptionKind::{Call, Put};
    use crate::models::TradeAction::{Buy, Sell};

    fn request(proposed: Vec<OptionLeg>, cash: f64) -> ValidationRequest {
        ValidationRequest {
            existing_legs: Vec::new(),
            proposed_legs: proposed,
            available_cash: cash,
            risk_profile: RiskProfile::Moderate,
            as_of: Some(as_of()),
        }
    }

    /// Deep ITM long calls: delta ~1 per contract.
    fn deep_itm_calls(quantity: u32) -> OptionLeg {
        let mut l = leg(Call, Buy, 200.0, 30);
        l.quantity = quantity;
        l.premium = 250.0;
        l
    }

    fn severity(report: &ValidationReport, id: CheckId) -> Severity {
        report.result(id).map(|r| r.severity).unwrap()
    }

    #[test]
    fn test_all_ten_checks_in_order() {
        let pipeline = RiskCheckPipeline::new(RiskConfig::default());
        let report = pipeline
            .validate(&request(vec![leg(Call, Buy, 450.0, 30)], 100_000.0))
            .unwrap();
        let ids: Vec<CheckId> = report.checks.iter().map(|c| c.check).collect();
        assert_eq!(ids, CheckId::ORDER.to_vec());
        assert_eq!(severity(&report, CheckId::StrategyDetection), Severity::Info);
    }

    #[test]
    fn test_delta_limit_gates_trade() {
        let pipeline = RiskCheckPipeline::new(RiskConfig::default());

        // ~250 delta against a 200 limit
        let report = pipeline.validate(&request(vec![deep_itm_calls(250)], 10_000_000.0)).unwrap();
        let delta = report.result(CheckId::GreeksDeltaLimit).unwrap();
        assert_eq!(delta.severity, Severity::Blocker);
        assert!(delta.observed.unwrap() > 240.0, "observed delta {:?}", delta.observed);
        assert!(!report.passed);
        assert_eq!(report.blocker_count, 1);
        assert_eq!(report.checks.len(), 10);

        // Cut the position below the limit
        let report = pipeline.validate(&request(vec![deep_itm_calls(150)], 10_000_000.0)).unwrap();
        assert_eq!(severity(&report, CheckId::GreeksDeltaLimit), Severity::Pass);
        assert!(report.passed);
        assert_eq!(report.checks.len(), 10);
    }

    #[test]
    fn test_existing_delta_counts_toward_limit() {
        let pipeline = RiskCheckPipeline::new(RiskConfig::default());
        let mut req = request(vec![deep_itm_calls(120)], 10_000_000.0);
        req.existing_legs = vec![deep_itm_calls(120)];
        let report = pipeline.validate(&req).unwrap();
        assert_eq!(severity(&report, CheckId::GreeksDeltaLimit), Severity::Blocker);
        assert!(report.greeks_impact.combined.delta > 200.0);
        assert!(!report.limit_breaches.is_empty());
    }

    #[test]
    fn test_capital_requirement() {
        let pipeline = RiskCheckPipeline::new(RiskConfig::default());
        // 5.00 * 100 = $500 debit
        let report = pipeline.validate(&request(vec![leg(Call, Buy, 450.0, 30)], 400.0)).unwrap();
        assert_eq!(severity(&report, CheckId::CapitalRequirement), Severity::Blocker);
        assert!(!report.passed);

        let report = pipeline.validate(&request(vec![leg(Call, Buy, 450.0, 30)], 500.0)).unwrap();
        assert_eq!(severity(&report, CheckId::CapitalRequirement), Severity::Pass);
        assert!(report.passed, "warnings must not block: {:?}", report.checks);
    }

    #[test]
    fn test_probability_threshold_by_profile() {
        let pipeline = RiskCheckPipeline::new(RiskConfig::default());
        // OTM breakeven: well under 50%
        let mut req = request(vec![leg(Call, Buy, 470.0, 30)], 100_000.0);
        req.risk_profile = RiskProfile::Aggressive;
        let report = pipeline.validate(&req).unwrap();
        assert_eq!(severity(&report, CheckId::ProbabilityThreshold), Severity::Warning);
        assert!(report.passed, "probability warnings never block");

        // Deep ITM at expiry: 100%
        let mut itm = leg(Call, Buy, 300.0, 0);
        itm.premium = 100.0;
        let mut req = request(vec![itm], 100_000.0);
        req.risk_profile = RiskProfile::Conservative;
        let report = pipeline.validate(&req).unwrap();
        assert_eq!(report.probability.probability_of_profit, 100.0);
        assert_eq!(severity(&report, CheckId::ProbabilityThreshold), Severity::Pass);
    }

    #[test]
    fn test_iv_rank_only_for_credit() {
        let pipeline = RiskCheckPipeline::new(RiskConfig::default());
        let debit = pipeline.validate(&request(vec![leg(Put, Buy, 450.0, 30)], 100_000.0)).unwrap();
        assert_eq!(severity(&debit, CheckId::IvRank), Severity::Info);

        let credit = pipeline
            .validate(&request(vec![leg(Put, Sell, 430.0, 30)], 100_000.0))
            .unwrap();
        // 25% IV is thin for selling premium
        assert_eq!(severity(&credit, CheckId::IvRank), Severity::Warning);

        let mut rich = leg(Put, Sell, 430.0, 30);
        rich.volatility = 0.65;
        let credit = pipeline.validate(&request(vec![rich], 100_000.0)).unwrap();
        assert_eq!(severity(&credit, CheckId::IvRank), Severity::Pass);
    }

    #[test]
    fn test_symbol_concentration_counts_existing() {
        let pipeline = RiskCheckPipeline::new(RiskConfig::default());
        let mut req = request(vec![leg(Call, Buy, 460.0, 30)], 100_000.0);
        req.existing_legs = vec![
            leg(Put, Buy, 440.0, 30),
            leg(Put, Buy, 430.0, 60),
            leg(Call, Buy, 470.0, 60),
        ];
        let report = pipeline.validate(&req).unwrap();
        assert_eq!(severity(&report, CheckId::SymbolConcentration), Severity::Warning);

        req.existing_legs.pop();
        let report = pipeline.validate(&req).unwrap();
        // 3 positions is the limit
        assert_eq!(severity(&report, CheckId::SymbolConcentration), Severity::Pass);
    }

    #[test]
    fn test_early_assignment_short_itm_near_expiry() {
        let pipeline = RiskCheckPipeline::new(RiskConfig::default());
        // Spot 450: short 440 call is ITM, short 460 call is not
        let legs = vec![leg(Call, Sell, 440.0, 5), leg(Call, Sell, 460.0, 5)];
        let report = pipeline.validate(&request(legs, 100_000.0)).unwrap();
        let r = report.result(CheckId::EarlyAssignment).unwrap();
        assert_eq!(r.severity, Severity::Warning);
        assert_eq!(r.observed, Some(1.0));
        assert!(r.message.contains("440"), "message should name the leg: {}", r.message);

        let far = vec![leg(Call, Sell, 440.0, 30)];
        let report = pipeline.validate(&request(far, 100_000.0)).unwrap();
        assert_eq!(severity(&report, CheckId::EarlyAssignment), Severity::Pass);
    }

    #[test]
    fn test_expiration_and_strike_concentration() {
        let pipeline = RiskCheckPipeline::new(RiskConfig::default());
        let strikes = [440.0, 445.0, 450.0, 455.0, 460.0, 465.0];
        let legs: Vec<OptionLeg> = strikes.iter().map(|&k| leg(Put, Buy, k, 30)).collect();
        let report = pipeline.validate(&request(legs, 1_000_000.0)).unwrap();
        assert_eq!(severity(&report, CheckId::ExpirationConcentration), Severity::Warning);
        assert_eq!(severity(&report, CheckId::StrikeConcentration), Severity::Pass);

        let legs: Vec<OptionLeg> = (0..4).map(|i| leg(Put, Buy, 450.0, 30 + i)).collect();
        let report = pipeline.validate(&request(legs, 1_000_000.0)).unwrap();
        assert_eq!(severity(&report, CheckId::StrikeConcentration), Severity::Warning);
        assert_eq!(severity(&report, CheckId::ExpirationConcentration), Severity::Pass);
    }

    #[test]
    fn test_max_loss_fraction_of_cash() {
        let pipeline = RiskCheckPipeline::new(RiskConfig::default());
        // $500 debit vs 20% of $2000 = $400
        let report = pipeline.validate(&request(vec![leg(Call, Buy, 450.0, 30)], 2_000.0)).unwrap();
        assert_eq!(severity(&report, CheckId::MaxLoss), Severity::Warning);
        assert!(report.passed);

        let report = pipeline
            .validate(&request(vec![leg(Call, Buy, 450.0, 30)], 10_000.0))
            .unwrap();
        assert_eq!(severity(&report, CheckId::MaxLoss), Severity::Pass);

        let naked = pipeline
            .validate(&request(vec![leg(Call, Sell, 470.0, 30)], 10_000.0))
            .unwrap();
        assert_eq!(severity(&naked, CheckId::MaxLoss), Severity::Info);
    }

    #[test]
    fn test_assignment_window_edge() {
        let pipeline = RiskCheckPipeline::new(RiskConfig::default());
        let short_itm = |dte| request(vec![leg(Call, Sell, 440.0, dte)], 100_000.0);

        let inside = pipeline.validate(&short_itm(7)).unwrap();
        assert_eq!(severity(&inside, CheckId::EarlyAssignment), Severity::Warning);

        let outside = pipeline.validate(&short_itm(8)).unwrap();
        assert_eq!(severity(&outside, CheckId::EarlyAssignment), Severity::Pass);
    }

    #[test]
    fn test_delta_at_limit_passes() {
        let legs = vec![deep_itm_calls(150)];
        let delta = greeks::aggregate(&BlackScholes::new(), &legs, as_of(), 0.05).unwrap().delta;

        let mut config = RiskConfig::default();
        config.greeks_limits.max_delta = delta;
        let report = RiskCheckPipeline::new(config)
            .validate(&request(legs, 10_000_000.0))
            .unwrap();
        let r = report.result(CheckId::GreeksDeltaLimit).unwrap();
        assert_eq!(r.observed, Some(delta));
        assert_eq!(r.severity, Severity::Pass);
    }

    #[test]
    fn test_concentration_at_limits_passes() {
        let pipeline = RiskCheckPipeline::new(RiskConfig::default());

        let five: Vec<OptionLeg> = [440.0, 445.0, 450.0, 455.0, 460.0]
            .iter()
            .map(|&k| leg(Put, Buy, k, 30))
            .collect();
        let report = pipeline.validate(&request(five, 1_000_000.0)).unwrap();
        let r = report.result(CheckId::ExpirationConcentration).unwrap();
        assert_eq!(r.observed, Some(5.0));
        assert_eq!(r.severity, Severity::Pass);

        let three: Vec<OptionLeg> = (0..3).map(|i| leg(Put, Buy, 450.0, 30 + i)).collect();
        let report = pipeline.validate(&request(three, 1_000_000.0)).unwrap();
        let r = report.result(CheckId::StrikeConcentration).unwrap();
        assert_eq!(r.observed, Some(3.0));
        assert_eq!(r.severity, Severity::Pass);
    }

    #[test]
    fn test_iv_exactly_at_floor_passes() {
        let pipeline = RiskCheckPipeline::new(RiskConfig::default());
        let mut short_put = leg(Put, Sell, 430.0, 30);
        short_put.volatility = MIN_CREDIT_VOLATILITY;
        let report = pipeline.validate(&request(vec![short_put], 100_000.0)).unwrap();
        assert_eq!(severity(&report, CheckId::IvRank), Severity::Pass);
    }

    #[test]
    fn test_max_loss_exactly_at_fraction_passes() {
        let pipeline = RiskCheckPipeline::new(RiskConfig::default());
        // $500 debit vs 20% of $2500
        let report = pipeline.validate(&request(vec![leg(Call, Buy, 450.0, 30)], 2_500.0)).unwrap();
        let r = report.result(CheckId::MaxLoss).unwrap();
        assert_eq!(r.observed, Some(500.0));
        assert_eq!(r.limit, Some(500.0));
        assert_eq!(r.severity, Severity::Pass);
    }

    #[test]
    fn test_invalid_leg_fails_fast() {
        let pipeline = RiskCheckPipeline::new(RiskConfig::default());
        let mut bad = leg(Call, Buy, 450.0, 30);
        bad.volatility = 0.0;
        let mut req = request(vec![leg(Call, Buy, 450.0, 30)], 10_000.0);
        req.existing_legs = vec![bad];
        let err = pipeline.validate(&req).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("existing[0]"), "{err}");

        let err = pipeline.validate(&request(vec![], -1.0)).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_empty_proposal_still_reports_ten_checks() {
        let pipeline = RiskCheckPipeline::new(RiskConfig::default());
        let report = pipeline.validate(&request(vec![], 1_000.0)).unwrap();
        assert_eq!(report.checks.len(), 10);
        assert_eq!(report.probability.probability_of_profit, 50.0);
        assert!(report.passed);
    }

    #[test]
    fn test_report_is_deterministic() {
        let pipeline = RiskCheckPipeline::new(RiskConfig::default());
        let req = request(vec![leg(Call, Buy, 450.0, 30), leg(Put, Buy, 450.0, 30)], 50_000.0);
        let a = pipeline.validate(&req).unwrap();
        let b = pipeline.validate(&req).unwrap();
        assert_eq!(a.checks, b.checks);
        assert_eq!(a.strategy, b.strategy);
    }
}
