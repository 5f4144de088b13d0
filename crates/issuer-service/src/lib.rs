//! Credential Issuer Library
//!
//! Stateless HTTP service that signs short-lived, capability-scoped access
//! tokens for one fixed room of an external real-time media service.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - Access token signing and verification
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `observability` - Metrics
//! - `routes` - Router and application state
//! - `services` - Issuance logic

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod observability;
pub mod routes;
pub mod services;
