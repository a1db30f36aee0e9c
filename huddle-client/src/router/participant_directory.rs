use huddle_core::{ConnectionStatus, Participant, ParticipantId};

/// Everyone in the room, the local user included, in join order.
#[derive(Debug, Clone, Default)]
pub struct ParticipantDirectory {
    participants: Vec<Participant>,
}

impl ParticipantDirectory {
    pub fn replace_all(&mut self, participants: Vec<Participant>) {
        self.participants = participants;
    }

    /// Insert or update. Our own view of the link status is kept on update.
    pub fn upsert(&mut self, participant: Participant) {
        match self.participants.iter_mut().find(|p| p.id == participant.id) {
            Some(existing) => {
                let status = existing.connection_status;
                *existing = participant;
                existing.connection_status = status;
            }
            None => self.participants.push(participant),
        }
    }

    pub fn remove(&mut self, id: &ParticipantId) -> Option<Participant> {
        let index = self.participants.iter().position(|p| &p.id == id)?;
        Some(self.participants.remove(index))
    }

    pub fn set_status(&mut self, id: &ParticipantId, status: ConnectionStatus) -> bool {
        match self.participants.iter_mut().find(|p| &p.id == id) {
            Some(participant) => {
                participant.connection_status = status;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    pub fn to_vec(&self) -> Vec<Participant> {
        self.participants.clone()
    }

    pub fn clear(&mut self) {
        self.participants.clear();
    }
}
