mod participant;
mod participant_registry;

pub use participant::{Participant, ParticipantUpdate};
pub use participant_registry::ParticipantRegistry;
