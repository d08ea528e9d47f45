//! API layer
//!
//! HTTP handlers for:
//! - HTML pages (home, login, account)
//! - Metrics (Prometheus)

pub mod metrics;
mod pages;

pub use metrics::metrics_router;
pub use pages::{account, pages_router};
