//! HTTP request handlers.

pub mod connection_details;
pub mod health;
pub mod metrics;

pub use connection_details::{agent_connection_details, connection_details};
pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
