//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Authentication Metrics
    pub static ref LOGINS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gitgate_logins_total", "Total number of completed OAuth callbacks"),
        &["outcome"]
    ).expect("metric can be created");
    pub static ref LOGOUTS_TOTAL: IntCounter = IntCounter::new(
        "gitgate_logouts_total",
        "Total number of logout requests"
    ).expect("metric can be created");

    // Session Metrics
    pub static ref SESSION_LOOKUPS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gitgate_session_lookups_total", "Total number of session store lookups"),
        &["result"]
    ).expect("metric can be created");
    pub static ref ACTIVE_SESSIONS: IntGauge = IntGauge::new(
        "gitgate_active_sessions",
        "Current number of sessions held in the store"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gitgate_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(LOGINS_TOTAL.clone()))
        .expect("LOGINS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(LOGOUTS_TOTAL.clone()))
        .expect("LOGOUTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SESSION_LOOKUPS_TOTAL.clone()))
        .expect("SESSION_LOOKUPS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ACTIVE_SESSIONS.clone()))
        .expect("ACTIVE_SESSIONS can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
