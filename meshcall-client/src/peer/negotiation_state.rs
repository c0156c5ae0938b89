use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Offer/answer progress of one peer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NegotiationState {
    Idle,
    OfferSent,
    OfferReceived,
    AnswerSent,
    Stable,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationEvent {
    LocalOfferCreated,
    RemoteOfferReceived,
    LocalAnswerCreated,
    AnswerTransmitted,
    RemoteAnswerApplied,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{event:?} is not valid in state {from}")]
pub struct InvalidTransition {
    pub from: NegotiationState,
    pub event: NegotiationEvent,
}

impl NegotiationState {
    /// Pure transition function. Closing is accepted from every live state.
    pub fn next(self, event: NegotiationEvent) -> Result<Self, InvalidTransition> {
        use NegotiationEvent::*;
        use NegotiationState::*;

        let next = match (self, event) {
            (Closed, _) => None,
            (_, Close) => Some(Closed),
            (Idle, LocalOfferCreated) => Some(OfferSent),
            (Idle, RemoteOfferReceived) => Some(OfferReceived),
            (OfferReceived, LocalAnswerCreated) => Some(AnswerSent),
            (AnswerSent, AnswerTransmitted) => Some(Stable),
            (OfferSent, RemoteAnswerApplied) => Some(Stable),
            _ => None,
        };

        next.ok_or(InvalidTransition { from: self, event })
    }

    pub fn is_stable(self) -> bool {
        self == Self::Stable
    }

    /// Between the first offer and `Stable`.
    pub fn is_negotiating(self) -> bool {
        matches!(
            self,
            Self::OfferSent | Self::OfferReceived | Self::AnswerSent
        )
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::OfferSent => "offer-sent",
            Self::OfferReceived => "offer-received",
            Self::AnswerSent => "answer-sent",
            Self::Stable => "stable",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}
