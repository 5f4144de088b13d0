//! Observability for the credential issuer.
//!
//! Metrics live in [`metrics`]. Logging is initialised through
//! `common::observability`.
//!
//! # Privacy
//!
//! Handlers use `#[instrument(skip_all)]` and record only bounded fields:
//! the issuance kind and outcome. Tokens, secrets and full identities are
//! never logged. Agent identities are logged by category only.

pub mod metrics;

pub use metrics::{init_metrics_recorder, record_credential_issuance, IssuanceKind};
