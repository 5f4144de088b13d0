//! Remote participant set.
//!
//! Keyed by identity and updated from [`RoomEvent`]s. The local participant
//! is never a member.

use crate::realtime::{RemoteParticipant, RoomEvent};
use std::collections::HashMap;

/// Remote participants of an Active session.
#[derive(Debug, Clone, Default)]
pub struct ParticipantSet {
    local_identity: String,
    members: HashMap<String, Option<String>>,
}

impl ParticipantSet {
    /// Seed the set with the participants present at connect time.
    pub fn new(local_identity: &str, initial: Vec<RemoteParticipant>) -> Self {
        let mut set = Self {
            local_identity: local_identity.to_string(),
            members: HashMap::new(),
        };
        for participant in initial {
            set.insert(participant);
        }
        set
    }

    fn insert(&mut self, participant: RemoteParticipant) -> bool {
        if participant.identity == self.local_identity {
            return false;
        }
        let previous = self
            .members
            .insert(participant.identity, participant.metadata.clone());
        previous != Some(participant.metadata)
    }

    /// Apply one event. Returns whether membership or metadata changed.
    pub fn apply(&mut self, event: &RoomEvent) -> bool {
        match event {
            RoomEvent::ParticipantConnected(participant) => self.insert(participant.clone()),
            RoomEvent::ParticipantDisconnected { identity } => {
                self.members.remove(identity).is_some()
            }
            RoomEvent::ParticipantMetadataChanged { identity, metadata } => {
                match self.members.get_mut(identity) {
                    Some(current) if current != metadata => {
                        current.clone_from(metadata);
                        true
                    }
                    _ => false,
                }
            }
            RoomEvent::Disconnected { .. } => false,
        }
    }

    /// Drop every member.
    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members sorted by identity.
    pub fn snapshot(&self) -> Vec<RemoteParticipant> {
        let mut participants: Vec<RemoteParticipant> = self
            .members
            .iter()
            .map(|(identity, metadata)| RemoteParticipant {
                identity: identity.clone(),
                metadata: metadata.clone(),
            })
            .collect();
        participants.sort_by(|a, b| a.identity.cmp(&b.identity));
        participants
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn identities(set: &ParticipantSet) -> Vec<String> {
        set.snapshot().into_iter().map(|p| p.identity).collect()
    }

    #[test]
    fn test_initial_members_exclude_local() {
        let set = ParticipantSet::new(
            "caller",
            vec![
                RemoteParticipant::new("kitt-b"),
                RemoteParticipant::new("caller"),
                RemoteParticipant::new("kitt-a"),
            ],
        );
        assert_eq!(identities(&set), vec!["kitt-a", "kitt-b"]);
    }

    #[test]
    fn test_connect_and_disconnect() {
        let mut set = ParticipantSet::new("caller", vec![]);
        assert!(set.is_empty());

        assert!(set.apply(&RoomEvent::ParticipantConnected(RemoteParticipant::new("kitt-1"))));
        assert_eq!(set.len(), 1);

        // Duplicate join is not a change
        assert!(!set.apply(&RoomEvent::ParticipantConnected(RemoteParticipant::new("kitt-1"))));

        assert!(set.apply(&RoomEvent::ParticipantDisconnected {
            identity: "kitt-1".to_string()
        }));
        assert!(set.is_empty());

        // Unknown leave is not a change
        assert!(!set.apply(&RoomEvent::ParticipantDisconnected {
            identity: "kitt-1".to_string()
        }));
    }

    #[test]
    fn test_local_participant_events_ignored() {
        let mut set = ParticipantSet::new("caller", vec![]);
        assert!(!set.apply(&RoomEvent::ParticipantConnected(RemoteParticipant::new("caller"))));
        assert!(set.is_empty());
    }

    #[test]
    fn test_metadata_change() {
        let mut set = ParticipantSet::new("caller", vec![RemoteParticipant::new("kitt-1")]);

        assert!(set.apply(&RoomEvent::ParticipantMetadataChanged {
            identity: "kitt-1".to_string(),
            metadata: Some("speaking".to_string()),
        }));
        assert_eq!(set.snapshot()[0].metadata.as_deref(), Some("speaking"));

        // Same value again is not a change
        assert!(!set.apply(&RoomEvent::ParticipantMetadataChanged {
            identity: "kitt-1".to_string(),
            metadata: Some("speaking".to_string()),
        }));

        // Unknown participant is ignored
        assert!(!set.apply(&RoomEvent::ParticipantMetadataChanged {
            identity: "ghost".to_string(),
            metadata: None,
        }));
    }

    #[test]
    fn test_clear() {
        let mut set = ParticipantSet::new("caller", vec![RemoteParticipant::new("kitt-1")]);
        set.clear();
        assert!(set.snapshot().is_empty());
    }
}
