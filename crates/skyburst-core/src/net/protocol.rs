use serde::{Deserialize, Serialize};

use super::messages::{ChannelMessage, FireworkEvent, MessageType};

/// Maximum message size in bytes. A firework frame is well under 100 bytes.
pub const MAX_MESSAGE_SIZE: usize = 4 * 1024; // 4 KiB

#[derive(Debug)]
pub enum ProtocolError {
    EmptyMessage,
    UnknownMessageType(u8),
    UnknownEventName(String),
    PayloadTooLarge(usize),
    SerializeError(String),
    DeserializeError(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "empty message"),
            Self::UnknownMessageType(b) => write!(f, "unknown message type: 0x{b:02x}"),
            Self::UnknownEventName(name) => write!(f, "unknown event name: {name}"),
            Self::PayloadTooLarge(size) => {
                write!(
                    f,
                    "payload too large: {size} bytes (max {MAX_MESSAGE_SIZE})"
                )
            },
            Self::SerializeError(e) => write!(f, "serialize error: {e}"),
            Self::DeserializeError(e) => write!(f, "deserialize error: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Encode a serializable payload with a 1-byte type prefix.
pub fn encode_message<T: Serialize>(
    msg_type: MessageType,
    payload: &T,
) -> Result<Vec<u8>, ProtocolError> {
    let payload_bytes =
        rmp_serde::to_vec(payload).map_err(|e| ProtocolError::SerializeError(e.to_string()))?;
    let total = 1 + payload_bytes.len();
    if total > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(total));
    }
    let mut buf = Vec::with_capacity(total);
    buf.push(msg_type as u8);
    buf.extend_from_slice(&payload_bytes);
    Ok(buf)
}

/// Encode a `ChannelMessage` to the binary WebSocket format.
pub fn encode_channel_message(msg: &ChannelMessage) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        ChannelMessage::NewFirework(ev) => encode_message(MessageType::NewFirework, ev),
        ChannelMessage::HappyNewYear => encode_message(MessageType::HappyNewYear, &()),
    }
}

/// Extract the message type byte from raw wire data.
pub fn decode_message_type(data: &[u8]) -> Result<MessageType, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    MessageType::from_byte(data[0]).ok_or(ProtocolError::UnknownMessageType(data[0]))
}

/// Decode a MessagePack payload (bytes after the type prefix).
pub fn decode_payload<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    rmp_serde::from_slice(&data[1..]).map_err(|e| ProtocolError::DeserializeError(e.to_string()))
}

/// Decode raw wire data into a `ChannelMessage`.
pub fn decode_channel_message(data: &[u8]) -> Result<ChannelMessage, ProtocolError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(data.len()));
    }
    match decode_message_type(data)? {
        MessageType::NewFirework => Ok(ChannelMessage::NewFirework(decode_payload::<
            FireworkEvent,
        >(data)?)),
        MessageType::HappyNewYear => Ok(ChannelMessage::HappyNewYear),
    }
}

/// JSON body for text transports (SSE). The event name travels separately.
pub fn encode_json(msg: &ChannelMessage) -> Result<String, ProtocolError> {
    match msg {
        ChannelMessage::NewFirework(ev) => {
            serde_json::to_string(ev).map_err(|e| ProtocolError::SerializeError(e.to_string()))
        },
        ChannelMessage::HappyNewYear => Ok("{}".to_string()),
    }
}

/// Inverse of [`encode_json`], keyed by the channel event name.
pub fn decode_json(event_name: &str, data: &str) -> Result<ChannelMessage, ProtocolError> {
    match MessageType::from_name(event_name) {
        Some(MessageType::NewFirework) => serde_json::from_str::<FireworkEvent>(data)
            .map(ChannelMessage::NewFirework)
            .map_err(|e| ProtocolError::DeserializeError(e.to_string())),
        Some(MessageType::HappyNewYear) => Ok(ChannelMessage::HappyNewYear),
        None => Err(ProtocolError::UnknownEventName(event_name.to_string())),
    }
}
