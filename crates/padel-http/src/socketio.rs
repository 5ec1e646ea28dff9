//! Minimal Engine.IO v4 / Socket.IO v5 text frame codec.
//!
//! Only what a push subscriber needs: the open handshake, heartbeats,
//! namespace connect and event packets. Binary attachments are not
//! supported.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use padel_core::error::PushDecodeError;
use padel_core::{EntityName, PushEvent, PushPayload};

/// Default Socket.IO namespace.
pub const ROOT_NAMESPACE: &str = "/";

/// Engine.IO heartbeat answer.
pub const PONG: &str = "3";

/// Handshake data carried by the Engine.IO open packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

/// A decoded text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Connect {
        namespace: String,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        ack: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        message: Option<String>,
    },
    /// Upgrade, noop, acks and binary packets.
    Ignored,
}

/// Packet sent to join a namespace after the open handshake.
pub fn connect_packet(namespace: &str) -> String {
    if namespace == ROOT_NAMESPACE {
        "40".to_string()
    } else {
        format!("40{},", namespace)
    }
}

/// Decode one websocket text frame.
pub fn decode(text: &str) -> Result<Frame, PushDecodeError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or_else(|| frame_error(text, "empty frame"))?;
    let rest = chars.as_str();

    match kind {
        '0' => serde_json::from_str(rest)
            .map(Frame::Open)
            .map_err(|e| frame_error(text, e)),
        '1' => Ok(Frame::Close),
        '2' => Ok(Frame::Ping),
        '3' => Ok(Frame::Pong),
        '4' => decode_message(text, rest),
        '5' | '6' => Ok(Frame::Ignored),
        _ => Err(frame_error(text, format!("unknown packet type '{}'", kind))),
    }
}

fn decode_message(text: &str, body: &str) -> Result<Frame, PushDecodeError> {
    let mut chars = body.chars();
    let kind = chars
        .next()
        .ok_or_else(|| frame_error(text, "missing socket packet type"))?;
    let mut rest = chars.as_str();

    let namespace = if rest.starts_with('/') {
        let end = rest.find(',').unwrap_or(rest.len());
        let namespace = rest[..end].to_string();
        rest = rest.get(end + 1..).unwrap_or("");
        namespace
    } else {
        ROOT_NAMESPACE.to_string()
    };

    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    let ack = if digits > 0 {
        let id = rest[..digits]
            .parse()
            .map_err(|e| frame_error(text, e))?;
        rest = &rest[digits..];
        Some(id)
    } else {
        None
    };

    match kind {
        '0' => Ok(Frame::Connect { namespace }),
        '1' => Ok(Frame::Disconnect { namespace }),
        '2' => {
            let mut args: Vec<Value> =
                serde_json::from_str(rest).map_err(|e| frame_error(text, e))?;
            if args.is_empty() {
                return Err(frame_error(text, "event without a name"));
            }
            let name = match args.remove(0) {
                Value::String(name) => name,
                other => return Err(frame_error(text, format!("event name {} is not a string", other))),
            };
            Ok(Frame::Event {
                namespace,
                ack,
                name,
                args,
            })
        }
        '4' => {
            let message = serde_json::from_str::<Value>(rest)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string));
            Ok(Frame::ConnectError { namespace, message })
        }
        '3' | '5' | '6' => Ok(Frame::Ignored),
        other => Err(frame_error(text, format!("unknown socket packet type '{}'", other))),
    }
}

/// Turn an event's arguments into a push event for `entity`.
///
/// The first argument must be an object of the form `{"data": <record>}`.
pub fn push_event<T: DeserializeOwned>(
    entity: &EntityName,
    args: Vec<Value>,
) -> Result<PushEvent<T>, PushDecodeError> {
    let payload = args.into_iter().next().ok_or_else(|| PushDecodeError::Payload {
        entity: entity.to_string(),
        reason: "event carries no payload".to_string(),
    })?;

    let payload: PushPayload<T> =
        serde_json::from_value(payload).map_err(|e| PushDecodeError::Payload {
            entity: entity.to_string(),
            reason: e.to_string(),
        })?;

    Ok(PushEvent::new(entity.clone(), payload.data))
}

fn frame_error(text: &str, reason: impl std::fmt::Display) -> PushDecodeError {
    let mut frame: String = text.chars().take(64).collect();
    if frame.len() < text.len() {
        frame.push('…');
    }
    PushDecodeError::Frame {
        frame,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padel_core::DynRecord;

    #[test]
    fn open_packet() {
        let frame =
            decode(r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#)
                .unwrap();
        assert_eq!(
            frame,
            Frame::Open(Handshake {
                sid: "abc".to_string(),
                ping_interval: 25000,
                ping_timeout: 20000,
            })
        );
    }

    #[test]
    fn heartbeats() {
        assert_eq!(decode("2").unwrap(), Frame::Ping);
        assert_eq!(decode("3").unwrap(), Frame::Pong);
        assert_eq!(decode("6").unwrap(), Frame::Ignored);
    }

    #[test]
    fn connect_ack_with_sid() {
        assert_eq!(
            decode(r#"40{"sid":"xyz"}"#).unwrap(),
            Frame::Connect {
                namespace: "/".to_string()
            }
        );
        assert_eq!(
            decode(r#"40/admin,{"sid":"xyz"}"#).unwrap(),
            Frame::Connect {
                namespace: "/admin".to_string()
            }
        );
    }

    #[test]
    fn event_in_root_namespace() {
        let frame = decode(r#"42["sale",{"data":{"_id":"a1","total":150}}]"#).unwrap();
        let Frame::Event {
            namespace,
            ack,
            name,
            args,
        } = frame
        else {
            panic!("expected event");
        };
        assert_eq!(namespace, "/");
        assert_eq!(ack, None);
        assert_eq!(name, "sale");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn event_with_namespace_and_ack() {
        let frame = decode(r#"42/admin,17["user",{"data":{"_id":"u1"}}]"#).unwrap();
        assert!(matches!(
            frame,
            Frame::Event { ref namespace, ack: Some(17), ref name, .. }
                if namespace == "/admin" && name == "user"
        ));
    }

    #[test]
    fn connect_error_message() {
        assert_eq!(
            decode(r#"44{"message":"Not authorized"}"#).unwrap(),
            Frame::ConnectError {
                namespace: "/".to_string(),
                message: Some("Not authorized".to_string()),
            }
        );
    }

    #[test]
    fn bad_frames() {
        assert!(decode("").is_err());
        assert!(decode("9").is_err());
        assert!(decode("4").is_err());
        assert!(decode("42[]").is_err());
        assert!(decode("42[1,2]").is_err());
        assert!(decode("42not json").is_err());
    }

    #[test]
    fn connect_packets() {
        assert_eq!(connect_packet("/"), "40");
        assert_eq!(connect_packet("/admin"), "40/admin,");
    }

    #[test]
    fn payload_to_push_event() {
        let args = vec![serde_json::json!({"data": {"_id": "a1", "total": 150}})];
        let event: PushEvent<DynRecord> = push_event(&EntityName::sale(), args).unwrap();
        assert_eq!(event.entity, EntityName::sale());
        assert_eq!(event.record.id.as_str(), "a1");
        assert_eq!(event.record.field("total"), Some(&serde_json::json!(150)));
    }

    #[test]
    fn payload_without_data_is_rejected() {
        let args = vec![serde_json::json!({"_id": "a1"})];
        let result: Result<PushEvent<DynRecord>, _> = push_event(&EntityName::sale(), args);
        assert!(matches!(result, Err(PushDecodeError::Payload { .. })));

        let result: Result<PushEvent<DynRecord>, _> = push_event(&EntityName::sale(), Vec::new());
        assert!(result.is_err());
    }
}
