use crate::media::MediaConstraints;
use crate::peer::PeerRole;
use crate::transport::TransportConfig;
use meshcall_core::utils::DEFAULT_MAX_PARTICIPANTS;
use serde::{Deserialize, Serialize};

/// Which side of a (existing member, newcomer) pair sends the offer.
///
/// Both rules are decided by room-join order, so exactly one side offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OfferPolicy {
    #[default]
    ExistingMembersOffer,
    NewcomerOffers,
}

impl OfferPolicy {
    /// Role toward participants already present in the roster we receive on join.
    pub fn roster_role(self) -> PeerRole {
        match self {
            Self::ExistingMembersOffer => PeerRole::Responder,
            Self::NewcomerOffers => PeerRole::Initiator,
        }
    }

    /// Role toward a participant announced by `call:participant-joined`.
    pub fn newcomer_role(self) -> PeerRole {
        match self {
            Self::ExistingMembersOffer => PeerRole::Initiator,
            Self::NewcomerOffers => PeerRole::Responder,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallConfig {
    pub transport: TransportConfig,
    pub offer_policy: OfferPolicy,
    /// Room capacity including the local participant.
    pub max_participants: usize,
    pub media: MediaConstraints,
    pub command_capacity: usize,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            offer_policy: OfferPolicy::default(),
            max_participants: DEFAULT_MAX_PARTICIPANTS,
            media: MediaConstraints::default(),
            command_capacity: 64,
        }
    }
}
