use crate::analytics::gex::{self, ChainStrike, GexProfile};
use crate::errors::EngineError;
use crate::models::{validate_legs, GreeksSnapshot, OptionKind, OptionLeg, DAYS_PER_YEAR};
use crate::risk::limits::RiskConfig;
use crate::risk::pipeline::{ValidationReport, ValidationRequest};
use crate::state::{AppState, CounterSnapshot, PerfCounters};
use crate::strategy::classifier;
use crate::strategy::StrategyClassification;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use std::sync::Arc;

#[derive(Debug, serde::Deserialize)]
pub struct PriceRequest {
    pub spot: f64,
    pub strike: f64,
    pub kind: OptionKind,
    pub volatility: f64,
    pub time_to_expiry_years: Option<f64>,
    pub days_to_expiry: Option<f64>,
    pub risk_free_rate: Option<f64>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct PriceResponse {
    pub price: f64,
    pub greeks: GreeksSnapshot,
}

#[derive(Debug, serde::Deserialize)]
pub struct ClassifyRequest {
    pub legs: Vec<OptionLeg>,
}

#[derive(Debug, serde::Deserialize)]
pub struct GexRequest {
    pub chain: Vec<ChainStrike>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ValidationResponse {
    pub request_id: String,
    pub report: ValidationReport,
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match self {
            EngineError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            EngineError::Config(_) | EngineError::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Count rejected requests before handing the error back to axum.
fn rejected(state: &AppState, e: EngineError) -> EngineError {
    if e.is_invalid_input() {
        PerfCounters::bump(&state.counters.invalid_requests);
    }
    tracing::warn!(error = %e, "request rejected");
    e
}

/// POST /api/price -- single-contract price + Greeks
pub async fn post_price(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PriceRequest>,
) -> Result<Json<PriceResponse>, EngineError> {
    PerfCounters::bump(&state.counters.pricings);

    let t = match (req.time_to_expiry_years, req.days_to_expiry) {
        (Some(t), _) => t,
        (None, Some(days)) => days / DAYS_PER_YEAR,
        (None, None) => {
            return Err(rejected(
                &state,
                EngineError::invalid(
                    "pricing",
                    "time_to_expiry_years or days_to_expiry is required",
                ),
            ))
        }
    };
    let rate = req.risk_free_rate.unwrap_or(state.config.risk_free_rate);

    let (price, greeks) = state
        .pricing
        .price_and_greeks(req.spot, req.strike, t, rate, req.volatility, req.kind)
        .map_err(|e| rejected(&state, e))?;

    Ok(Json(PriceResponse { price, greeks }))
}

/// POST /api/strategy/classify -- strategy shape of a leg set
pub async fn post_classify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClassifyRequest>,
) -> Result<Json<StrategyClassification>, EngineError> {
    PerfCounters::bump(&state.counters.classifications);
    validate_legs("legs", &req.legs).map_err(|e| rejected(&state, e))?;
    Ok(Json(classifier::classify(&req.legs)))
}

/// POST /api/risk/validate -- run the ten-check pipeline
pub async fn post_validate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidationRequest>,
) -> Result<Json<ValidationResponse>, EngineError> {
    PerfCounters::bump(&state.counters.validations);
    let request_id = uuid::Uuid::new_v4().to_string();

    let report = state.pipeline.validate(&req).map_err(|e| rejected(&state, e))?;
    if !report.passed {
        PerfCounters::bump(&state.counters.validations_blocked);
    }
    tracing::info!(
        request_id = %request_id,
        passed = report.passed,
        strategy = %report.strategy.strategy,
        "validation served"
    );

    Ok(Json(ValidationResponse { request_id, report }))
}

/// POST /api/gex -- dealer gamma exposure for a chain snapshot
pub async fn post_gex(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GexRequest>,
) -> Result<Json<GexProfile>, EngineError> {
    PerfCounters::bump(&state.counters.gex_requests);
    let profile = gex::compute_gex(&req.chain).map_err(|e| rejected(&state, e))?;
    Ok(Json(profile))
}

/// GET /api/config -- effective risk configuration
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<RiskConfig> {
    Json(*state.pipeline.config())
}

/// GET /api/counters -- request counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<CounterSnapshot> {
    Json(state.counters.snapshot())
}
