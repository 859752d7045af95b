//! Socket.IO-over-WebSocket presence transport.
//!
//! ARCHITECTURE
//! ============
//! `connect` performs the Engine.IO/Socket.IO handshake inline and only then
//! returns, so a returned connection is already live. A spawned reader task
//! owns the websocket afterwards: it answers heartbeats, forwards presence
//! events, and exits on close, server disconnect, shutdown, or when no packet
//! arrives within `pingInterval + pingTimeout` of the previous one.
//!
//! Dropping a [`SocketIoConnection`] without calling `disconnect` still shuts
//! the reader down (the shutdown sender is dropped with it).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::packet::{self, EnginePacket, SocketPacket, SocketPacketKind};
use super::{ONLINE_USERS_EVENT, OnlineUsersHandler, PresenceConnection, PresenceTransport};
use crate::config::SessionConfig;
use crate::error::PresenceError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

/// Engine.IO v4 server defaults, used if the open packet never arrives.
const DEFAULT_PING_INTERVAL_MS: u64 = 25_000;
const DEFAULT_PING_TIMEOUT_MS: u64 = 20_000;

pub struct SocketIoTransport {
    base_url: String,
    handshake_timeout: Duration,
}

impl SocketIoTransport {
    #[must_use]
    pub fn new(base_url: &str, handshake_timeout: Duration) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_owned(), handshake_timeout }
    }

    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(&config.socket_url, Duration::from_secs(config.timeouts.connect_secs))
    }
}

#[async_trait::async_trait]
impl PresenceTransport for SocketIoTransport {
    async fn connect(
        &self,
        user_id: &str,
        on_online_users: OnlineUsersHandler,
    ) -> Result<Box<dyn PresenceConnection>, PresenceError> {
        let url = socket_url(&self.base_url, user_id)?;
        tracing::debug!(%url, "opening presence channel");

        let (mut stream, _) = timeout(self.handshake_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| PresenceError::Timeout)??;
        let (sid, heartbeat) = timeout(self.handshake_timeout, handshake(&mut stream))
            .await
            .map_err(|_| PresenceError::Timeout)??;
        tracing::info!(user_id, %sid, ?heartbeat, "presence channel connected");

        let connected = Arc::new(AtomicBool::new(true));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_reader(
            stream,
            heartbeat,
            shutdown_rx,
            on_online_users,
            Arc::clone(&connected),
            user_id.to_owned(),
        ));

        Ok(Box::new(SocketIoConnection { connected, shutdown: Some(shutdown_tx), task: Some(task) }))
    }
}

/// Live Socket.IO connection handle.
pub struct SocketIoConnection {
    connected: Arc<AtomicBool>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

#[async_trait::async_trait]
impl PresenceConnection for SocketIoConnection {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn disconnect(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            let abort = task.abort_handle();
            if timeout(DISCONNECT_GRACE, task).await.is_err() {
                tracing::warn!("presence reader did not stop in time; aborting");
                abort.abort();
            }
        }
        self.connected.store(false, Ordering::SeqCst);
    }
}

/// Websocket URL for the Engine.IO endpoint, carrying `userId` in the query.
pub(crate) fn socket_url(base_url: &str, user_id: &str) -> Result<String, PresenceError> {
    let base = base_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if base.starts_with("ws://") || base.starts_with("wss://") {
        base.to_owned()
    } else {
        return Err(PresenceError::InvalidUrl(base_url.to_owned()));
    };

    let mut url =
        Url::parse(&format!("{ws_base}/socket.io/")).map_err(|e| PresenceError::InvalidUrl(format!("{base_url}: {e}")))?;
    url.query_pairs_mut()
        .append_pair("EIO", "4")
        .append_pair("transport", "websocket")
        .append_pair("userId", user_id);
    Ok(url.into())
}

/// Id list carried by a `getOnlineUsers` event, if well-formed.
pub(crate) fn parse_online_users(args: &[Value]) -> Option<Vec<String>> {
    let first = args.first()?;
    serde_json::from_value::<Vec<String>>(first.clone()).ok()
}

/// Silence allowed between inbound packets before the link counts as dead.
pub(crate) fn heartbeat_deadline(ping_interval_ms: u64, ping_timeout_ms: u64) -> Duration {
    Duration::from_millis(ping_interval_ms.saturating_add(ping_timeout_ms))
}

/// Returns the Socket.IO session id and the heartbeat deadline.
async fn handshake(stream: &mut WsStream) -> Result<(String, Duration), PresenceError> {
    let mut opened = false;
    let mut heartbeat = heartbeat_deadline(DEFAULT_PING_INTERVAL_MS, DEFAULT_PING_TIMEOUT_MS);
    loop {
        let Some(text) = next_text(stream).await? else {
            return Err(PresenceError::Closed);
        };
        match packet::decode(&text)? {
            EnginePacket::Open(open) if !opened => {
                tracing::debug!(
                    sid = %open.sid,
                    ping_interval = open.ping_interval,
                    ping_timeout = open.ping_timeout,
                    "engine.io open"
                );
                heartbeat = heartbeat_deadline(open.ping_interval, open.ping_timeout);
                opened = true;
                send(stream, &EnginePacket::Message(SocketPacket::connect())).await?;
            }
            EnginePacket::Ping => send(stream, &EnginePacket::Pong).await?,
            EnginePacket::Close => return Err(PresenceError::Closed),
            EnginePacket::Message(socket) if socket.kind == SocketPacketKind::Connect => {
                let sid = socket
                    .data
                    .as_ref()
                    .and_then(|data| data.get("sid"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned();
                return Ok((sid, heartbeat));
            }
            EnginePacket::Message(socket) if socket.kind == SocketPacketKind::ConnectError => {
                let message = socket
                    .data
                    .as_ref()
                    .and_then(|data| data.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("connection refused")
                    .to_owned();
                return Err(PresenceError::Handshake(message));
            }
            _ => {}
        }
    }
}

async fn run_reader(
    mut stream: WsStream,
    heartbeat: Duration,
    mut shutdown: oneshot::Receiver<()>,
    on_online_users: OnlineUsersHandler,
    connected: Arc<AtomicBool>,
    user_id: String,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                let _ = send(&mut stream, &EnginePacket::Message(SocketPacket::disconnect())).await;
                let _ = stream.close(None).await;
                tracing::info!(%user_id, "presence channel disconnected");
                break;
            }
            next = timeout(heartbeat, next_text(&mut stream)) => match next {
                Err(_) => {
                    tracing::warn!(%user_id, ?heartbeat, "presence heartbeat timed out");
                    break;
                }
                Ok(Ok(Some(text))) => {
                    if !handle_text(&mut stream, &text, &on_online_users).await {
                        tracing::info!(%user_id, "presence channel closed by server");
                        break;
                    }
                }
                Ok(Ok(None)) => {
                    tracing::info!(%user_id, "presence websocket closed");
                    break;
                }
                Ok(Err(e)) => {
                    tracing::warn!(%user_id, error = %e, "presence websocket failed");
                    break;
                }
            }
        }
    }
    connected.store(false, Ordering::SeqCst);
}

/// Returns `false` when the channel should stop.
async fn handle_text(stream: &mut WsStream, text: &str, on_online_users: &OnlineUsersHandler) -> bool {
    let packet = match packet::decode(text) {
        Ok(packet) => packet,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring malformed socket.io packet");
            return true;
        }
    };

    match packet {
        EnginePacket::Ping => send(stream, &EnginePacket::Pong).await.is_ok(),
        EnginePacket::Close => false,
        EnginePacket::Message(socket) => match socket.kind {
            SocketPacketKind::Disconnect => false,
            SocketPacketKind::Event => {
                match socket.event_name() {
                    Some(ONLINE_USERS_EVENT) => match parse_online_users(socket.event_args()) {
                        Some(ids) => {
                            tracing::debug!(count = ids.len(), "online users updated");
                            on_online_users(ids);
                        }
                        None => tracing::warn!(data = ?socket.data, "malformed online users event"),
                    },
                    other => tracing::trace!(event = ?other, "ignoring socket.io event"),
                }
                true
            }
            _ => true,
        },
        _ => true,
    }
}

async fn next_text(stream: &mut WsStream) -> Result<Option<String>, PresenceError> {
    loop {
        let Some(message) = stream.next().await else {
            return Ok(None);
        };
        match message? {
            Message::Text(text) => return Ok(Some(text.as_str().to_owned())),
            Message::Close(_) => return Ok(None),
            _ => {}
        }
    }
}

async fn send(stream: &mut WsStream, packet: &EnginePacket) -> Result<(), PresenceError> {
    stream
        .send(Message::text(packet::encode(packet)))
        .await
        .map_err(PresenceError::from)
}

#[cfg(test)]
#[path = "socket_test.rs"]
mod tests;
