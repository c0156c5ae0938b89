use crate::registry::{Participant, ParticipantUpdate};
use meshcall_core::{PeerId, UserId};
use tracing::debug;

/// `peerId -> Participant` in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ParticipantRegistry {
    entries: Vec<Participant>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `update` into the entry for `peer_id`, creating it if needed.
    /// Returns true when the participant is new.
    pub fn upsert(&mut self, peer_id: &PeerId, update: ParticipantUpdate) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|p| &p.peer_id == peer_id) {
            entry.merge(update);
            return false;
        }

        let mut participant = Participant::new(peer_id.clone());
        participant.merge(update);
        debug!("Registered participant {}", peer_id);
        self.entries.push(participant);
        true
    }

    pub fn remove(&mut self, peer_id: &PeerId) -> Option<Participant> {
        let index = self.entries.iter().position(|p| &p.peer_id == peer_id)?;
        debug!("Removed participant {}", peer_id);
        Some(self.entries.remove(index))
    }

    pub fn get(&self, peer_id: &PeerId) -> Option<&Participant> {
        self.entries.iter().find(|p| &p.peer_id == peer_id)
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.get(peer_id).is_some()
    }

    pub fn find_by_user(&self, user_id: &UserId) -> Option<&PeerId> {
        self.entries
            .iter()
            .find(|p| p.user_id.as_ref() == Some(user_id))
            .map(|p| &p.peer_id)
    }

    /// Owned copy for rendering. Later changes never alias into it.
    pub fn snapshot(&self) -> Vec<Participant> {
        self.entries.clone()
    }

    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.entries.iter().map(|p| p.peer_id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
