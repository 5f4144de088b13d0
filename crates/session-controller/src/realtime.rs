//! Seam to the external real-time service.
//!
//! The media transport and signaling live outside this crate. A
//! [`RealtimeService`] turns a `(ws_url, token)` pair into a
//! [`RoomConnection`]: the participants already present, a stream of
//! membership events and a control handle for the local participant.

use crate::errors::ControllerError;
use common::secret::SecretString;
use tokio::sync::mpsc;

/// A participant other than the local one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteParticipant {
    /// Identity from the participant's credential.
    pub identity: String,
    /// Free-form metadata published by the participant.
    pub metadata: Option<String>,
}

impl RemoteParticipant {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }
}

/// Room events pushed by the real-time service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// A remote participant joined.
    ParticipantConnected(RemoteParticipant),
    /// A remote participant left.
    ParticipantDisconnected { identity: String },
    /// A remote participant changed its metadata.
    ParticipantMetadataChanged {
        identity: String,
        metadata: Option<String>,
    },
    /// The local connection to the room ended.
    Disconnected { reason: String },
}

/// Controls the local participant of a connected room.
#[async_trait::async_trait]
pub trait LocalParticipantControl: Send + Sync {
    /// Start or stop publishing the local microphone.
    async fn set_microphone_enabled(&self, enabled: bool) -> Result<(), ControllerError>;

    /// Leave the room. Idempotent.
    async fn disconnect(&self);
}

/// An established room connection.
pub struct RoomConnection {
    /// Identity the room assigned to the local participant.
    pub local_identity: String,
    /// Remote participants present when the connection was established.
    pub participants: Vec<RemoteParticipant>,
    /// Membership events. The stream ending means the room is gone.
    pub events: mpsc::Receiver<RoomEvent>,
    /// Local participant control.
    pub local: Box<dyn LocalParticipantControl>,
    /// Whether the microphone is published on join.
    pub microphone_enabled: bool,
}

impl std::fmt::Debug for RoomConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomConnection")
            .field("local_identity", &self.local_identity)
            .field("participants", &self.participants)
            .field("microphone_enabled", &self.microphone_enabled)
            .finish_non_exhaustive()
    }
}

/// Connects to the external real-time service.
#[async_trait::async_trait]
pub trait RealtimeService: Send + Sync {
    /// Join the room the token grants access to at `ws_url`.
    async fn connect(
        &self,
        ws_url: &str,
        token: &SecretString,
    ) -> Result<RoomConnection, ControllerError>;
}
