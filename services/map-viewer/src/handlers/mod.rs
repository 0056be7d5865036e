//! HTTP request handlers.
//!
//! - `map`: render-by-bootstrap-query and the live editor apply
//! - `metrics`: health check and Prometheus metrics

pub mod map;
pub mod metrics;

pub use map::{devel_apply_handler, map_handler, MapResponse};
pub use metrics::{health_handler, metrics_handler};
