use crate::RelayConfig;
use anyhow::{Context, Result};
use dashmap::DashMap;
use meshcall_core::{
    ClientMessage, ParticipantInfo, PeerId, RoomId, ServerMessage, SignalEnvelope, UserId,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct Member {
    socket_id: PeerId,
    user_id: UserId,
    username: String,
}

impl Member {
    fn info(&self) -> ParticipantInfo {
        ParticipantInfo::new(
            self.user_id.clone(),
            self.socket_id.clone(),
            self.username.clone(),
        )
    }
}

struct RelayInner {
    config: RelayConfig,
    sockets: DashMap<PeerId, mpsc::UnboundedSender<ServerMessage>>,
    rooms: DashMap<RoomId, Vec<Member>>,
    memberships: DashMap<PeerId, HashSet<RoomId>>,
}

/// Server side of the call signaling contract: room rosters, membership
/// broadcasts and unicast of `call:signal` with the sender stamped.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<RelayInner>,
}

impl RelayService {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                config,
                sockets: DashMap::new(),
                rooms: DashMap::new(),
                memberships: DashMap::new(),
            }),
        }
    }

    /// Assigns a socket id to a new connection.
    pub fn register(&self, tx: mpsc::UnboundedSender<ServerMessage>) -> PeerId {
        let socket_id = PeerId::random();
        self.inner.sockets.insert(socket_id.clone(), tx);
        debug!("Registered socket {}", socket_id);
        socket_id
    }

    /// Drops the socket. Every room it was in sees it leave.
    pub fn unregister(&self, socket_id: &PeerId) {
        let rooms = self
            .inner
            .memberships
            .remove(socket_id)
            .map(|(_, rooms)| rooms)
            .unwrap_or_default();
        for room_id in rooms {
            self.leave(socket_id, &room_id);
        }
        self.inner.sockets.remove(socket_id);
        debug!("Unregistered socket {}", socket_id);
    }

    pub fn handle_text(&self, socket_id: &PeerId, text: &str) -> Result<()> {
        let message: ClientMessage =
            serde_json::from_str(text).context("Invalid call message")?;
        self.handle_message(socket_id, message);
        Ok(())
    }

    pub fn handle_message(&self, socket_id: &PeerId, message: ClientMessage) {
        match message {
            ClientMessage::Join {
                room_id,
                user_id,
                username,
            } => self.join(socket_id, room_id, user_id, username),
            ClientMessage::Leave { room_id, .. } => {
                if let Some(mut rooms) = self.inner.memberships.get_mut(socket_id) {
                    rooms.remove(&room_id);
                }
                self.leave(socket_id, &room_id);
            }
            ClientMessage::Signal(envelope) => self.relay_signal(socket_id, envelope),
        }
    }

    /// Sockets currently in `room_id`.
    pub fn room_size(&self, room_id: &RoomId) -> usize {
        self.inner.rooms.get(room_id).map_or(0, |m| m.len())
    }

    pub fn socket_count(&self) -> usize {
        self.inner.sockets.len()
    }

    fn join(&self, socket_id: &PeerId, room_id: RoomId, user_id: UserId, username: String) {
        let max = self.inner.config.max_participants;

        let (admitted, others) = {
            let mut members = self.inner.rooms.entry(room_id.clone()).or_default();
            let len = members.len();
            let admitted = match members.iter_mut().find(|m| &m.socket_id == socket_id) {
                Some(existing) => {
                    existing.user_id = user_id.clone();
                    existing.username = username.clone();
                    true
                }
                None if len >= max => false,
                None => {
                    members.push(Member {
                        socket_id: socket_id.clone(),
                        user_id: user_id.clone(),
                        username: username.clone(),
                    });
                    true
                }
            };
            let others: Vec<Member> = members
                .iter()
                .filter(|m| &m.socket_id != socket_id)
                .cloned()
                .collect();
            (admitted, others)
        };

        if !admitted {
            warn!("Room {} is full, rejecting {}", room_id, socket_id);
            self.send(
                socket_id,
                ServerMessage::Error {
                    message: format!("room {} is full ({} participants)", room_id, max),
                },
            );
            return;
        }

        self.inner
            .memberships
            .entry(socket_id.clone())
            .or_default()
            .insert(room_id.clone());

        info!(
            "{} ({}) joined room {} with {} others",
            socket_id,
            user_id,
            room_id,
            others.len()
        );

        self.send(
            socket_id,
            ServerMessage::Participants {
                participants: others.iter().map(Member::info).collect(),
            },
        );

        let joined = ParticipantInfo::new(user_id, socket_id.clone(), username);
        for member in &others {
            self.send(
                &member.socket_id,
                ServerMessage::ParticipantJoined(joined.clone()),
            );
        }
    }

    fn leave(&self, socket_id: &PeerId, room_id: &RoomId) {
        let (departed, others) = {
            let Some(mut members) = self.inner.rooms.get_mut(room_id) else {
                return;
            };
            let Some(index) = members.iter().position(|m| &m.socket_id == socket_id) else {
                return;
            };
            let departed = members.remove(index);
            (departed, members.clone())
        };

        if others.is_empty() {
            self.inner.rooms.remove_if(room_id, |_, members| members.is_empty());
            debug!("Room {} is empty", room_id);
        }

        info!("{} left room {}", socket_id, room_id);
        for member in &others {
            self.send(
                &member.socket_id,
                ServerMessage::ParticipantLeft {
                    user_id: departed.user_id.clone(),
                    socket_id: Some(departed.socket_id.clone()),
                },
            );
        }
    }

    fn relay_signal(&self, socket_id: &PeerId, mut envelope: SignalEnvelope) {
        let Some(target) = envelope.target_id.clone() else {
            warn!(
                "Dropping {} signal from {} without targetId",
                envelope.signal.kind(),
                socket_id
            );
            return;
        };

        envelope.sender_id = Some(socket_id.clone());
        debug!(
            "Relaying {} {} -> {}",
            envelope.signal.kind(),
            socket_id,
            target
        );
        self.send(&target, ServerMessage::Signal(envelope));
    }

    fn send(&self, socket_id: &PeerId, message: ServerMessage) {
        let Some(tx) = self.inner.sockets.get(socket_id) else {
            warn!("Attempted to send to disconnected socket {}", socket_id);
            return;
        };
        if tx.send(message).is_err() {
            debug!("Socket {} is closing, message dropped", socket_id);
        }
    }
}

impl Default for RelayService {
    fn default() -> Self {
        Self::new(RelayConfig::default())
    }
}
