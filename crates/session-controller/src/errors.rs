//! Session Controller error types.
//!
//! Errors raised while connecting end the session in
//! `SessionState::Failed`; command errors are returned to the caller and
//! leave the session untouched.

use thiserror::Error;

/// Session Controller error type.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The issuer could not be reached.
    #[error("Issuer request failed: {0}")]
    Transport(String),

    /// The issuer answered with a non-2xx status.
    #[error("Issuer returned {status}: {message}")]
    Issuance { status: u16, message: String },

    /// The issuer answered 2xx with a body that is not usable.
    #[error("Invalid issuer response: {0}")]
    InvalidResponse(String),

    /// The real-time service refused or dropped an operation.
    #[error("Real-time service error: {0}")]
    Realtime(String),

    /// The automation-control endpoint could not be reached or refused.
    #[error("Automation request failed: {0}")]
    Automation(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Command issued while the session is not Active.
    #[error("Session is not active")]
    NotActive,

    /// The controller task has exited.
    #[error("Session controller has stopped")]
    ControllerStopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_issuance() {
        let error = ControllerError::Issuance {
            status: 500,
            message: "Server misconfigured".to_string(),
        };
        assert_eq!(error.to_string(), "Issuer returned 500: Server misconfigured");
    }

    #[test]
    fn test_display_simple_variants() {
        assert_eq!(ControllerError::NotActive.to_string(), "Session is not active");
        assert_eq!(
            ControllerError::ControllerStopped.to_string(),
            "Session controller has stopped"
        );
        assert_eq!(
            ControllerError::Transport("connection refused".to_string()).to_string(),
            "Issuer request failed: connection refused"
        );
    }
}
