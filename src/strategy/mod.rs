pub mod classifier;

use serde::{Deserialize, Serialize};

/// Named strategy shapes.
///
/// The classifier emits only the shapes it can identify from leg count and
/// composition; butterfly, iron butterfly, calendar, diagonal and ratio
/// spreads are part of the vocabulary shared with callers that tag
/// positions themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    LongCall,
    LongPut,
    ShortCall,
    ShortPut,
    CallSpread,
    PutSpread,
    Straddle,
    Strangle,
    IronCondor,
    IronButterfly,
    Butterfly,
    CalendarSpread,
    DiagonalSpread,
    RatioSpread,
    Custom,
}

impl StrategyKind {
    /// Shapes whose worst case is bounded when built as a textbook position.
    #[inline]
    pub const fn is_defined_risk(&self) -> bool {
        matches!(
            self,
            Self::LongCall
                | Self::LongPut
                | Self::CallSpread
                | Self::PutSpread
                | Self::IronCondor
                | Self::IronButterfly
                | Self::Butterfly
        )
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LongCall => "long_call",
            Self::LongPut => "long_put",
            Self::ShortCall => "short_call",
            Self::ShortPut => "short_put",
            Self::CallSpread => "call_spread",
            Self::PutSpread => "put_spread",
            Self::Straddle => "straddle",
            Self::Strangle => "strangle",
            Self::IronCondor => "iron_condor",
            Self::IronButterfly => "iron_butterfly",
            Self::Butterfly => "butterfly",
            Self::CalendarSpread => "calendar_spread",
            Self::DiagonalSpread => "diagonal_spread",
            Self::RatioSpread => "ratio_spread",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of classifying a leg set.
///
/// `net_cost` is positive for a debit and negative for a credit, in dollars.
/// `None` for max loss / max profit means unbounded or not determinable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyClassification {
    pub strategy: StrategyKind,
    pub leg_count: usize,
    pub net_cost: f64,
    pub max_loss: Option<f64>,
    pub max_profit: Option<f64>,
}

impl StrategyClassification {
    #[inline]
    pub fn is_net_credit(&self) -> bool {
        self.net_cost < 0.0
    }
}
