use super::*;
use serde_json::json;

// =============================================================================
// engine.io
// =============================================================================

#[test]
fn decode_open_handshake() {
    let packet = decode(r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#)
        .unwrap();
    let EnginePacket::Open(open) = packet else {
        panic!("expected open packet");
    };
    assert_eq!(open.sid, "abc");
    assert_eq!(open.ping_interval, 25000);
    assert_eq!(open.ping_timeout, 20000);
    assert_eq!(open.max_payload, Some(1_000_000));
}

#[test]
fn decode_open_with_bad_json_is_malformed() {
    assert!(matches!(decode("0{not json"), Err(PacketError::Malformed(_))));
}

#[test]
fn decode_heartbeat_and_control_packets() {
    assert_eq!(decode("1").unwrap(), EnginePacket::Close);
    assert_eq!(decode("2").unwrap(), EnginePacket::Ping);
    assert_eq!(decode("3").unwrap(), EnginePacket::Pong);
    assert_eq!(decode("6").unwrap(), EnginePacket::Noop);
}

#[test]
fn decode_rejects_empty_and_unknown() {
    assert_eq!(decode(""), Err(PacketError::Empty));
    assert_eq!(decode("9"), Err(PacketError::UnknownEngineType('9')));
    assert_eq!(decode("49"), Err(PacketError::UnknownSocketType('9')));
}

// =============================================================================
// socket.io
// =============================================================================

#[test]
fn decode_connect_ack_with_sid() {
    let EnginePacket::Message(packet) = decode(r#"40{"sid":"xyz"}"#).unwrap() else {
        panic!("expected message");
    };
    assert_eq!(packet.kind, SocketPacketKind::Connect);
    assert_eq!(packet.namespace, "/");
    assert_eq!(packet.data, Some(json!({ "sid": "xyz" })));
}

#[test]
fn decode_presence_event() {
    let EnginePacket::Message(packet) = decode(r#"42["getOnlineUsers",["u1","u2"]]"#).unwrap() else {
        panic!("expected message");
    };
    assert_eq!(packet.event_name(), Some("getOnlineUsers"));
    assert_eq!(packet.event_args(), &[json!(["u1", "u2"])]);
}

#[test]
fn decode_event_with_namespace_and_ack_id() {
    let EnginePacket::Message(packet) = decode(r#"42/chat,17["newMessage",{"text":"hi"}]"#).unwrap() else {
        panic!("expected message");
    };
    assert_eq!(packet.namespace, "/chat");
    assert_eq!(packet.ack_id, Some(17));
    assert_eq!(packet.event_name(), Some("newMessage"));
}

#[test]
fn decode_namespace_only_disconnect() {
    let EnginePacket::Message(packet) = decode("41/admin").unwrap() else {
        panic!("expected message");
    };
    assert_eq!(packet.kind, SocketPacketKind::Disconnect);
    assert_eq!(packet.namespace, "/admin");
    assert!(packet.data.is_none());
}

#[test]
fn decode_binary_event_reads_attachment_count() {
    let EnginePacket::Message(packet) =
        decode(r#"451-["upload",{"_placeholder":true,"num":0}]"#).unwrap()
    else {
        panic!("expected message");
    };
    assert_eq!(packet.kind, SocketPacketKind::BinaryEvent);
    assert_eq!(packet.attachments, 1);
    assert_eq!(packet.event_name(), Some("upload"));
}

#[test]
fn decode_connect_error() {
    let EnginePacket::Message(packet) = decode(r#"44{"message":"Not authorized"}"#).unwrap() else {
        panic!("expected message");
    };
    assert_eq!(packet.kind, SocketPacketKind::ConnectError);
    assert_eq!(packet.data, Some(json!({ "message": "Not authorized" })));
}

#[test]
fn non_event_packets_have_no_event_name() {
    let packet = SocketPacket::connect();
    assert!(packet.event_name().is_none());
    assert!(packet.event_args().is_empty());
}

#[test]
fn encode_client_packets() {
    assert_eq!(encode(&EnginePacket::Pong), "3");
    assert_eq!(encode(&EnginePacket::Message(SocketPacket::connect())), "40");
    assert_eq!(encode(&EnginePacket::Message(SocketPacket::disconnect())), "41");
    assert_eq!(
        encode(&EnginePacket::Message(SocketPacket::event("getOnlineUsers", vec![json!(["u1"])]))),
        r#"42["getOnlineUsers",["u1"]]"#
    );
}

#[test]
fn encode_namespaced_ack_event() {
    let packet = SocketPacket {
        kind: SocketPacketKind::Event,
        namespace: "/chat".to_owned(),
        ack_id: Some(3),
        attachments: 0,
        data: Some(json!(["typing"])),
    };
    assert_eq!(encode(&EnginePacket::Message(packet)), r#"42/chat,3["typing"]"#);
}
