/// Domain-specific error types for the pricing and risk engine.
/// The core never retries and never coerces bad input:
/// - Invalid legs or chain rows fail fast with `InvalidInput`
/// - Config problems are reported once at startup
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid input ({leg}): {reason}")]
    InvalidInput { leg: String, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("model computation error: {0}")]
    Model(String),
}

impl EngineError {
    /// Shorthand for an `InvalidInput` tied to a named leg or row.
    pub fn invalid(leg: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            leg: leg.into(),
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, EngineError::InvalidInput { .. })
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
