//! Session Controller Library
//!
//! Client-side orchestration of one participation in a real-time room:
//! fetch a credential from the issuer, connect to the real-time service with
//! it, track remote participants, toggle the local microphone and invite an
//! automated participant.
//!
//! # Architecture
//!
//! A session is owned by a single actor task ([`session::SessionController`]).
//! Callers talk to it through a [`session::SessionHandle`]:
//!
//! ```text
//! SessionHandle --mpsc--> SessionController --HTTP--> issuer
//!       ^                       |
//!       |                       +--RealtimeService::connect--> room
//!       +---watch (state, participants)---+
//! ```
//!
//! # Modules
//!
//! - `automation` - Invite requests to the automation-control endpoint
//! - `config` - Controller configuration
//! - `errors` - Error types
//! - `issuer_client` - HTTP client for the credential issuer
//! - `mock` - In-memory collaborators for tests
//! - `participants` - Remote participant set
//! - `realtime` - Seam to the external real-time service
//! - `session` - Session state machine actor
//! - `view` - Render view derived from session state

pub mod automation;
pub mod config;
pub mod errors;
pub mod issuer_client;
pub mod mock;
pub mod participants;
pub mod realtime;
pub mod session;
pub mod view;

pub use config::ControllerConfig;
pub use errors::ControllerError;
pub use session::{SessionController, SessionHandle, SessionState};
pub use view::SessionView;
