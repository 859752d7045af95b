//! Engine.IO v4 / Socket.IO v5 text packet codec.
//!
//! WIRE FORMAT
//! ===========
//! Every websocket text message is one Engine.IO packet: a type digit
//! followed by an optional payload. Type `4` (message) wraps a Socket.IO
//! packet laid out as
//!
//! ```text
//! <type>[<attachments>-][/<namespace>,][<ack id>][<json>]
//! ```
//!
//! e.g. `42["getOnlineUsers",["u1","u2"]]`. Binary attachments are parsed
//! but never reassembled; presence traffic is JSON-only.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_NAMESPACE: &str = "/";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PacketError {
    #[error("empty packet")]
    Empty,
    #[error("unknown engine.io packet type: {0}")]
    UnknownEngineType(char),
    #[error("unknown socket.io packet type: {0}")]
    UnknownSocketType(char),
    #[error("malformed packet: {0}")]
    Malformed(String),
}

/// Payload of the Engine.IO `open` packet sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPayload {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenPayload),
    Close,
    Ping,
    Pong,
    Message(SocketPacket),
    Upgrade,
    Noop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketPacketKind {
    Connect,
    Disconnect,
    Event,
    Ack,
    ConnectError,
    BinaryEvent,
    BinaryAck,
}

impl SocketPacketKind {
    fn from_char(c: char) -> Result<Self, PacketError> {
        match c {
            '0' => Ok(Self::Connect),
            '1' => Ok(Self::Disconnect),
            '2' => Ok(Self::Event),
            '3' => Ok(Self::Ack),
            '4' => Ok(Self::ConnectError),
            '5' => Ok(Self::BinaryEvent),
            '6' => Ok(Self::BinaryAck),
            other => Err(PacketError::UnknownSocketType(other)),
        }
    }

    fn as_char(self) -> char {
        match self {
            Self::Connect => '0',
            Self::Disconnect => '1',
            Self::Event => '2',
            Self::Ack => '3',
            Self::ConnectError => '4',
            Self::BinaryEvent => '5',
            Self::BinaryAck => '6',
        }
    }

    fn is_binary(self) -> bool {
        matches!(self, Self::BinaryEvent | Self::BinaryAck)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SocketPacket {
    pub kind: SocketPacketKind,
    pub namespace: String,
    pub ack_id: Option<u64>,
    pub attachments: u32,
    pub data: Option<Value>,
}

impl SocketPacket {
    fn bare(kind: SocketPacketKind, data: Option<Value>) -> Self {
        Self { kind, namespace: DEFAULT_NAMESPACE.to_owned(), ack_id: None, attachments: 0, data }
    }

    /// CONNECT to the default namespace with no auth payload (`40`).
    #[must_use]
    pub fn connect() -> Self {
        Self::bare(SocketPacketKind::Connect, None)
    }

    /// DISCONNECT from the default namespace (`41`).
    #[must_use]
    pub fn disconnect() -> Self {
        Self::bare(SocketPacketKind::Disconnect, None)
    }

    /// EVENT on the default namespace: `42["name",arg,...]`.
    #[must_use]
    pub fn event(name: &str, args: Vec<Value>) -> Self {
        let mut array = Vec::with_capacity(args.len() + 1);
        array.push(Value::String(name.to_owned()));
        array.extend(args);
        Self::bare(SocketPacketKind::Event, Some(Value::Array(array)))
    }

    /// Event name for EVENT packets.
    #[must_use]
    pub fn event_name(&self) -> Option<&str> {
        if !matches!(self.kind, SocketPacketKind::Event | SocketPacketKind::BinaryEvent) {
            return None;
        }
        self.data
            .as_ref()?
            .as_array()?
            .first()?
            .as_str()
    }

    /// Arguments following the event name. Empty for non-event packets.
    #[must_use]
    pub fn event_args(&self) -> &[Value] {
        if self.event_name().is_none() {
            return &[];
        }
        match self.data.as_ref().and_then(Value::as_array) {
            Some(array) => &array[1..],
            None => &[],
        }
    }
}

/// Decode one Engine.IO text packet.
///
/// # Errors
///
/// Returns an error for an empty message, an unknown type digit, or a
/// payload that is not valid JSON where JSON is required.
pub fn decode(text: &str) -> Result<EnginePacket, PacketError> {
    let mut chars = text.chars();
    let Some(kind) = chars.next() else {
        return Err(PacketError::Empty);
    };
    let rest = chars.as_str();

    match kind {
        '0' => {
            let open = serde_json::from_str::<OpenPayload>(rest)
                .map_err(|e| PacketError::Malformed(format!("open payload: {e}")))?;
            Ok(EnginePacket::Open(open))
        }
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping),
        '3' => Ok(EnginePacket::Pong),
        '4' => decode_socket(rest).map(EnginePacket::Message),
        '5' => Ok(EnginePacket::Upgrade),
        '6' => Ok(EnginePacket::Noop),
        other => Err(PacketError::UnknownEngineType(other)),
    }
}

fn decode_socket(text: &str) -> Result<SocketPacket, PacketError> {
    let mut chars = text.chars();
    let Some(kind) = chars.next() else {
        return Err(PacketError::Malformed("empty socket.io packet".to_owned()));
    };
    let kind = SocketPacketKind::from_char(kind)?;
    let mut rest = chars.as_str();

    let mut attachments = 0_u32;
    if kind.is_binary() {
        let Some((count, tail)) = rest.split_once('-') else {
            return Err(PacketError::Malformed("binary packet without attachment count".to_owned()));
        };
        attachments = count
            .parse()
            .map_err(|_| PacketError::Malformed(format!("attachment count: {count}")))?;
        rest = tail;
    }

    let mut namespace = DEFAULT_NAMESPACE.to_owned();
    if rest.starts_with('/') {
        match rest.split_once(',') {
            Some((nsp, tail)) => {
                nsp.clone_into(&mut namespace);
                rest = tail;
            }
            None => {
                rest.clone_into(&mut namespace);
                rest = "";
            }
        }
    }

    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let ack_id = if digits > 0 {
        let (id, tail) = rest.split_at(digits);
        rest = tail;
        Some(
            id.parse::<u64>()
                .map_err(|_| PacketError::Malformed(format!("ack id: {id}")))?,
        )
    } else {
        None
    };

    let data = if rest.is_empty() {
        None
    } else {
        Some(serde_json::from_str::<Value>(rest).map_err(|e| PacketError::Malformed(format!("payload: {e}")))?)
    };

    Ok(SocketPacket { kind, namespace, ack_id, attachments, data })
}

/// Encode one Engine.IO text packet.
#[must_use]
pub fn encode(packet: &EnginePacket) -> String {
    match packet {
        EnginePacket::Open(open) => {
            let json = serde_json::to_string(open).unwrap_or_else(|_| "{}".to_owned());
            format!("0{json}")
        }
        EnginePacket::Close => "1".to_owned(),
        EnginePacket::Ping => "2".to_owned(),
        EnginePacket::Pong => "3".to_owned(),
        EnginePacket::Message(socket) => format!("4{}", encode_socket(socket)),
        EnginePacket::Upgrade => "5".to_owned(),
        EnginePacket::Noop => "6".to_owned(),
    }
}

fn encode_socket(packet: &SocketPacket) -> String {
    let mut out = String::new();
    out.push(packet.kind.as_char());
    if packet.kind.is_binary() {
        out.push_str(&packet.attachments.to_string());
        out.push('-');
    }
    if packet.namespace != DEFAULT_NAMESPACE {
        out.push_str(&packet.namespace);
        out.push(',');
    }
    if let Some(id) = packet.ack_id {
        out.push_str(&id.to_string());
    }
    if let Some(data) = &packet.data {
        out.push_str(&data.to_string());
    }
    out
}

#[cfg(test)]
#[path = "packet_test.rs"]
mod tests;
