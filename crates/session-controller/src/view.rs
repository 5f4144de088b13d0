//! Render view derived from session state.
//!
//! The view is a pure function of the session state and the participant
//! snapshot. Nothing is rendered unless the session is Active.

use crate::realtime::RemoteParticipant;
use crate::session::SessionState;
use std::fmt;

/// One remote participant tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantTile {
    pub identity: String,
    pub metadata: Option<String>,
}

/// Room view shown while Active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomView {
    pub local_identity: String,
    pub microphone_enabled: bool,
    /// The invite control is offered whenever the room is shown.
    pub invite_available: bool,
    /// Remote participants, sorted by identity.
    pub tiles: Vec<ParticipantTile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionView {
    /// Nothing rendered.
    Blank,
    Room(RoomView),
}

impl SessionView {
    /// Derive the view for `state` and the current remote participants.
    #[must_use]
    pub fn render(state: &SessionState, participants: &[RemoteParticipant]) -> Self {
        let SessionState::Active(active) = state else {
            return SessionView::Blank;
        };

        let mut tiles: Vec<ParticipantTile> = participants
            .iter()
            .filter(|p| p.identity != active.local_identity)
            .map(|p| ParticipantTile {
                identity: p.identity.clone(),
                metadata: p.metadata.clone(),
            })
            .collect();
        tiles.sort_by(|a, b| a.identity.cmp(&b.identity));

        SessionView::Room(RoomView {
            local_identity: active.local_identity.clone(),
            microphone_enabled: active.microphone_enabled,
            invite_available: true,
            tiles,
        })
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, SessionView::Blank)
    }
}

impl fmt::Display for SessionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionView::Blank => Ok(()),
            SessionView::Room(room) => {
                let mic = if room.microphone_enabled { "on" } else { "off" };
                writeln!(f, "{} (mic {})", room.local_identity, mic)?;
                for tile in &room.tiles {
                    match &tile.metadata {
                        Some(metadata) => writeln!(f, "  {} [{}]", tile.identity, metadata)?,
                        None => writeln!(f, "  {}", tile.identity)?,
                    }
                }
                if room.invite_available {
                    writeln!(f, "[invite agent]")?;
                }
                Ok(())
            }
        }
    }
}
