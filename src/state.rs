use crate::config::AppConfig;
use crate::models::black_scholes::BlackScholes;
use crate::risk::pipeline::RiskCheckPipeline;
use portable_atomic::{AtomicU64, Ordering};
use serde::Serialize;
use std::sync::Arc;

// ── Performance Counters (lock-free) ──

pub struct PerfCounters {
    pub pricings: AtomicU64,
    pub classifications: AtomicU64,
    pub validations: AtomicU64,
    pub validations_blocked: AtomicU64,
    pub gex_requests: AtomicU64,
    pub invalid_requests: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            pricings: AtomicU64::new(0),
            classifications: AtomicU64::new(0),
            validations: AtomicU64::new(0),
            validations_blocked: AtomicU64::new(0),
            gex_requests: AtomicU64::new(0),
            invalid_requests: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            pricings: self.pricings.load(Ordering::Relaxed),
            classifications: self.classifications.load(Ordering::Relaxed),
            validations: self.validations.load(Ordering::Relaxed),
            validations_blocked: self.validations_blocked.load(Ordering::Relaxed),
            gex_requests: self.gex_requests.load(Ordering::Relaxed),
            invalid_requests: self.invalid_requests.load(Ordering::Relaxed),
        }
    }
}

impl Default for PerfCounters {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CounterSnapshot {
    pub pricings: u64,
    pub classifications: u64,
    pub validations: u64,
    pub validations_blocked: u64,
    pub gex_requests: u64,
    pub invalid_requests: u64,
}

// ── Application shared state (immutable config, no locks) ──

pub struct AppState {
    pub config: AppConfig,
    pub pricing: BlackScholes,
    pub pipeline: RiskCheckPipeline,
    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(config: AppConfig) -> Arc<Self> {
        let pipeline = RiskCheckPipeline::new(config.risk_config());
        Arc::new(Self {
            config,
            pricing: BlackScholes::new(),
            pipeline,
            counters: PerfCounters::new(),
        })
    }
}
