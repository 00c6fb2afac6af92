//! Live connection owned by a client view.
//!
//! A [`LiveConnection`] is a pair of typed queues plus a cancellation
//! token. [`WsConnector`] backs it with a WebSocket; tests back it with a
//! [`RemotePeer`] they drive by hand.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use campusboard_realtime::{ClientEvent, ServerEvent};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::liveness::LivenessGuard;

/// Opens live connections.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Opens a connection, authenticated when a token is given.
    async fn connect(&self, token: Option<&str>) -> ClientResult<LiveConnection>;
}

/// An open live connection.
#[derive(Debug)]
pub struct LiveConnection {
    outbound: mpsc::Sender<ClientEvent>,
    inbound: mpsc::Receiver<ServerEvent>,
    cancel: CancellationToken,
}

impl LiveConnection {
    /// Creates a connection and the peer that serves it.
    pub fn pair(buffer: usize) -> (Self, RemotePeer) {
        let (out_tx, out_rx) = mpsc::channel(buffer.max(1));
        let (in_tx, in_rx) = mpsc::channel(buffer.max(1));
        let cancel = CancellationToken::new();

        let connection = Self {
            outbound: out_tx,
            inbound: in_rx,
            cancel: cancel.clone(),
        };
        let peer = RemotePeer {
            incoming: out_rx,
            outgoing: in_tx,
            cancel,
        };
        (connection, peer)
    }

    /// Splits into the sending half and the event stream.
    pub fn split(self) -> (LiveHandle, LiveEvents) {
        let handle = LiveHandle {
            outbound: self.outbound,
            cancel: self.cancel.clone(),
            closed: Arc::new(AtomicBool::new(false)),
        };
        let events = LiveEvents {
            inbound: self.inbound,
            cancel: self.cancel,
        };
        (handle, events)
    }
}

/// Sending half of a live connection.
#[derive(Debug, Clone)]
pub struct LiveHandle {
    outbound: mpsc::Sender<ClientEvent>,
    cancel: CancellationToken,
    closed: Arc<AtomicBool>,
}

impl LiveHandle {
    /// Queues an event for the server.
    pub async fn send(&self, event: ClientEvent) -> ClientResult<()> {
        if self.is_closed() {
            return Err(ClientError::Transport("connection closed".into()));
        }
        self.outbound
            .send(event)
            .await
            .map_err(|_| ClientError::Transport("connection closed".into()))
    }

    /// Closes the connection. Returns `true` only for the call that
    /// actually closed it.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.cancel.cancel();
        true
    }

    /// Whether the connection has been closed from either side.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.cancel.is_cancelled()
    }
}

/// Receiving half of a live connection.
#[derive(Debug)]
pub struct LiveEvents {
    inbound: mpsc::Receiver<ServerEvent>,
    cancel: CancellationToken,
}

impl LiveEvents {
    /// Next server event, or `None` once the connection is closed.
    pub async fn next(&mut self) -> Option<ServerEvent> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            event = self.inbound.recv() => event,
        }
    }
}

/// The far end of a [`LiveConnection`].
#[derive(Debug)]
pub struct RemotePeer {
    incoming: mpsc::Receiver<ClientEvent>,
    outgoing: mpsc::Sender<ServerEvent>,
    cancel: CancellationToken,
}

impl RemotePeer {
    /// Delivers an event to the client. Returns `false` if it is gone.
    pub async fn push(&self, event: ServerEvent) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.outgoing.send(event).await.is_ok()
    }

    /// Next event sent by the client.
    pub async fn recv(&mut self) -> Option<ClientEvent> {
        tokio::select! {
            event = self.incoming.recv() => event,
            _ = self.cancel.cancelled() => None,
        }
    }

    /// Next event already queued by the client, without waiting.
    pub fn try_recv(&mut self) -> Option<ClientEvent> {
        self.incoming.try_recv().ok()
    }

    /// Whether the client closed the connection.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when the client closes the connection.
    pub async fn closed(&self) {
        self.cancel.cancelled().await
    }

    /// Drops the connection from the server side.
    pub fn disconnect(&self) {
        self.cancel.cancel();
    }
}

/// Retries `open` after a dropped connection, waiting the configured delay
/// before each attempt. Gives up when the attempts run out or the guard
/// dies.
pub async fn reconnect<T, F, Fut>(
    config: &ClientConfig,
    guard: &LivenessGuard,
    mut open: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    for attempt in 1..=config.reconnect_attempts {
        tokio::time::sleep(config.reconnect_delay()).await;
        if !guard.is_live() {
            return None;
        }
        match open().await {
            Ok(value) => {
                info!(attempt, "Live connection restored");
                return Some(value);
            }
            Err(e) => warn!(attempt, error = %e, "Reconnect attempt failed"),
        }
    }
    if guard.is_live() {
        warn!(attempts = config.reconnect_attempts, "Giving up on live connection");
    }
    None
}

/// [`Connector`] over WebSocket.
#[derive(Debug, Clone)]
pub struct WsConnector {
    socket_url: String,
    buffer: usize,
}

impl WsConnector {
    /// Creates a connector for the configured endpoint.
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            socket_url: config.socket_url.clone(),
            buffer: config.channel_buffer,
        }
    }

    fn url(&self, token: Option<&str>) -> ClientResult<Url> {
        let mut url = Url::parse(&self.socket_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", self.socket_url)))?;
        if let Some(token) = token {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url)
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, token: Option<&str>) -> ClientResult<LiveConnection> {
        let url = self.url(token)?;
        let (stream, _) = connect_async(url.as_str()).await?;
        debug!(authenticated = token.is_some(), "Live connection opened");

        let (connection, peer) = LiveConnection::pair(self.buffer);
        tokio::spawn(pump(stream, peer));
        Ok(connection)
    }
}

/// Moves frames between the socket and the peer until either side closes.
async fn pump<S>(stream: tokio_tungstenite::WebSocketStream<S>, mut peer: RemotePeer)
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut ws_tx, mut ws_rx) = stream.split();
    let cancel = peer.cancel.clone();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            outbound = peer.incoming.recv() => {
                let Some(event) = outbound else { break };
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                            warn!(error = %e, "Live send failed");
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "Failed to encode client event"),
                }
            }
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let event = match serde_json::from_str::<ServerEvent>(&text) {
                            Ok(event) => event,
                            Err(e) => {
                                trace!(error = %e, "Ignoring unknown live frame");
                                continue;
                            }
                        };
                        if matches!(event, ServerEvent::Ping { .. }) {
                            if let Ok(text) = serde_json::to_string(&ClientEvent::Pong) {
                                let _ = ws_tx.send(Message::Text(text.into())).await;
                            }
                            continue;
                        }
                        if !peer.push(event).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "Live connection error");
                        break;
                    }
                }
            }
        }
    }

    let _ = ws_tx.send(Message::Close(None)).await;
    peer.disconnect();
    debug!("Live connection closed");
}
