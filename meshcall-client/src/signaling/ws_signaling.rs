use crate::error::SignalingTransportError;
use crate::signaling::{SignalingEvent, SignalingOutput};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use meshcall_core::{ClientMessage, ServerMessage};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const EVENT_CAPACITY: usize = 256;

/// Backoff for re-establishing a dropped signaling socket.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            max_attempts: Some(10),
        }
    }
}

/// JSON-over-WebSocket signaling channel.
///
/// A background task owns the socket. When it drops the task reports
/// `Disconnected`, reconnects with backoff and reports `Reconnected`.
/// Once the policy gives up, the event stream ends.
pub struct WsSignaling {
    outbound: mpsc::UnboundedSender<String>,
    connected: Arc<AtomicBool>,
}

impl WsSignaling {
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::Receiver<SignalingEvent>), SignalingTransportError> {
        Self::connect_with(url, ReconnectPolicy::default()).await
    }

    pub async fn connect_with(
        url: &str,
        policy: ReconnectPolicy,
    ) -> Result<(Self, mpsc::Receiver<SignalingEvent>), SignalingTransportError> {
        info!("Connecting to signaling server: {}", url);
        let ws = open(url).await?;
        info!("Connected to signaling server");

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(EVENT_CAPACITY);
        let connected = Arc::new(AtomicBool::new(true));

        tokio::spawn(supervise(
            url.to_owned(),
            ws,
            policy,
            outbound_rx,
            event_tx,
            connected.clone(),
        ));

        Ok((
            Self {
                outbound,
                connected,
            },
            event_rx,
        ))
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignalingOutput for WsSignaling {
    async fn send(&self, message: ClientMessage) -> Result<(), SignalingTransportError> {
        if !self.is_connected() {
            return Err(SignalingTransportError::Disconnected);
        }
        let json = serde_json::to_string(&message)
            .map_err(|e| SignalingTransportError::Encode(e.to_string()))?;
        self.outbound
            .send(json)
            .map_err(|_| SignalingTransportError::Disconnected)
    }
}

async fn open(url: &str) -> Result<WsStream, SignalingTransportError> {
    let (ws, _) = connect_async(url)
        .await
        .map_err(|e| SignalingTransportError::Connect(e.to_string()))?;
    Ok(ws)
}

enum ConnectionEnd {
    /// The socket dropped.
    Lost,
    /// Every `WsSignaling` handle is gone or nobody listens for events.
    Shutdown,
}

async fn supervise(
    url: String,
    first: WsStream,
    policy: ReconnectPolicy,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::Sender<SignalingEvent>,
    connected: Arc<AtomicBool>,
) {
    let mut ws = first;

    loop {
        if let ConnectionEnd::Shutdown = pump(ws, &mut outbound, &events).await {
            break;
        }

        connected.store(false, Ordering::SeqCst);
        warn!("Signaling connection lost");
        if events.send(SignalingEvent::Disconnected).await.is_err() {
            break;
        }

        // Messages queued against the dead socket are not replayed.
        while outbound.try_recv().is_ok() {}

        match reconnect(&url, &policy, &events).await {
            Some(next) => {
                ws = next;
                connected.store(true, Ordering::SeqCst);
                info!("Signaling connection re-established");
                if events.send(SignalingEvent::Reconnected).await.is_err() {
                    break;
                }
            }
            None => {
                error!("Giving up on signaling server {}", url);
                break;
            }
        }
    }

    connected.store(false, Ordering::SeqCst);
    debug!("Signaling supervisor finished");
}

async fn pump(
    ws: WsStream,
    outbound: &mut mpsc::UnboundedReceiver<String>,
    events: &mpsc::Sender<SignalingEvent>,
) -> ConnectionEnd {
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(message) => {
                            if events.send(SignalingEvent::Message(message)).await.is_err() {
                                let _ = write.close().await;
                                return ConnectionEnd::Shutdown;
                            }
                        }
                        Err(e) => warn!("Ignoring unparseable signaling message: {}", e),
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("Signaling socket closed by server");
                    return ConnectionEnd::Lost;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!("Signaling socket error: {}", e);
                    return ConnectionEnd::Lost;
                }
            },

            out = outbound.recv() => match out {
                Some(json) => {
                    if let Err(e) = write.send(Message::Text(json)).await {
                        error!("Failed to send signaling message: {}", e);
                        return ConnectionEnd::Lost;
                    }
                }
                None => {
                    let _ = write.close().await;
                    return ConnectionEnd::Shutdown;
                }
            },
        }
    }
}

async fn reconnect(
    url: &str,
    policy: &ReconnectPolicy,
    events: &mpsc::Sender<SignalingEvent>,
) -> Option<WsStream> {
    let mut delay = policy.initial_delay;
    let mut attempt = 0u32;

    loop {
        if policy.max_attempts.is_some_and(|max| attempt >= max) || events.is_closed() {
            return None;
        }
        attempt += 1;
        tokio::time::sleep(delay).await;

        match open(url).await {
            Ok(ws) => return Some(ws),
            Err(e) => {
                debug!("Reconnect attempt {} failed: {}", attempt, e);
                delay = (delay * 2).min(policy.max_delay);
            }
        }
    }
}
