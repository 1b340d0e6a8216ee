//! Two-layer textual framing.
//!
//! ```text
//! +--------+------------+----------------------------------------+
//! |  kind  |  sequence  |  payload (one encoded message)         |
//! +--------+------------+----------------------------------------+
//!                       | command | arg_count | body             |
//!                       +---------+-----------+------------------+
//! ```
//!
//! Fields are separated by a single space. The trailing field of each layer
//! (packet payload, message body) is taken verbatim after its separator and
//! may itself contain spaces, so decoding is the exact inverse of encoding.

use std::fmt;
use std::str::FromStr;

use crate::error::{ProtocolError, ProtocolResult};

/// Packet kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// Opens a reliable exchange.
    Start,
    /// Closes a reliable exchange.
    End,
    /// Carries an application message.
    Data,
    /// Acknowledges a sequence number.
    Ack,
}

impl PacketKind {
    /// Returns the wire tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Data => "data",
            Self::Ack => "ack",
        }
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PacketKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "end" => Ok(Self::End),
            "data" => Ok(Self::Data),
            "ack" => Ok(Self::Ack),
            other => Err(ProtocolError::malformed_packet(format!(
                "unrecognized packet kind: {other:?}"
            ))),
        }
    }
}

/// Application-level message: command name, declared structured-token count, body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Command name.
    pub command: String,
    /// Number of leading body tokens that are structured arguments.
    pub arg_count: usize,
    /// Raw body text.
    pub body: String,
}

impl Message {
    /// Creates a new message.
    pub fn new(command: impl Into<String>, arg_count: usize, body: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            arg_count,
            body: body.into(),
        }
    }

    /// Encodes this message as `"<command> <arg_count> <body>"`.
    pub fn encode(&self) -> String {
        encode_message(&self.command, self.arg_count, &self.body)
    }

    /// Decodes a message frame.
    pub fn decode(raw: &str) -> ProtocolResult<Self> {
        decode_message(raw)
    }

    /// Whitespace-separated tokens of the body.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.body.split_whitespace()
    }
}

/// Wire-level envelope around one encoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Kind tag.
    pub kind: PacketKind,
    /// Sequence number.
    pub sequence: u32,
    /// Encoded message text. Left undecoded so packet and message errors stay distinct.
    pub payload: String,
}

impl Packet {
    /// Creates a packet.
    pub fn new(kind: PacketKind, sequence: u32, payload: impl Into<String>) -> Self {
        Self {
            kind,
            sequence,
            payload: payload.into(),
        }
    }

    /// Creates a data packet carrying `message`.
    pub fn data(sequence: u32, message: Message) -> Self {
        Self::new(PacketKind::Data, sequence, message.encode())
    }

    /// Encodes this packet as `"<kind> <sequence> <payload>"`.
    pub fn encode(&self) -> String {
        encode_packet(self.kind, self.sequence, &self.payload)
    }

    /// Decodes a packet frame.
    pub fn decode(raw: &str) -> ProtocolResult<Self> {
        decode_packet(raw)
    }

    /// Decodes the carried message.
    pub fn message(&self) -> ProtocolResult<Message> {
        decode_message(&self.payload)
    }
}

/// Encodes a message frame.
///
/// ```rust
/// use udpchat_protocol::encode_message;
///
/// assert_eq!(encode_message("forwarded_message", 1, "alice hi there"),
///            "forwarded_message 1 alice hi there");
/// ```
pub fn encode_message(command: &str, arg_count: usize, body: &str) -> String {
    format!("{command} {arg_count} {body}")
}

/// Decodes a message frame.
///
/// Fails with [`ProtocolError::MalformedMessage`] when fewer than two tokens
/// are present or the second token is not an unsigned integer.
pub fn decode_message(raw: &str) -> ProtocolResult<Message> {
    let (command, rest) =
        next_field(raw).ok_or_else(|| ProtocolError::malformed_message("empty message"))?;
    let (count, body) = next_field(rest).ok_or_else(|| {
        ProtocolError::malformed_message(format!("missing argument count after {command:?}"))
    })?;
    let arg_count = count.parse::<usize>().map_err(|_| {
        ProtocolError::malformed_message(format!("invalid argument count: {count:?}"))
    })?;

    Ok(Message::new(command, arg_count, body))
}

/// Encodes a packet frame around an already encoded message.
pub fn encode_packet(kind: PacketKind, sequence: u32, message: &str) -> String {
    format!("{kind} {sequence} {message}")
}

/// Decodes a packet frame.
///
/// Fails with [`ProtocolError::MalformedPacket`] on an unknown kind tag, a
/// non-numeric sequence, or a frame with fewer than two fields.
pub fn decode_packet(raw: &str) -> ProtocolResult<Packet> {
    let (kind, rest) =
        next_field(raw).ok_or_else(|| ProtocolError::malformed_packet("empty packet"))?;
    let kind = kind.parse::<PacketKind>()?;
    let (sequence, payload) = next_field(rest)
        .ok_or_else(|| ProtocolError::malformed_packet("missing sequence number"))?;
    let sequence = sequence.parse::<u32>().map_err(|_| {
        ProtocolError::malformed_packet(format!("invalid sequence number: {sequence:?}"))
    })?;

    Ok(Packet::new(kind, sequence, payload))
}

/// Decodes a raw datagram into a packet.
pub fn decode_datagram(data: &[u8]) -> ProtocolResult<Packet> {
    let text = std::str::from_utf8(data)
        .map_err(|e| ProtocolError::malformed_packet(format!("datagram is not UTF-8: {e}")))?;
    decode_packet(text)
}

/// Splits off the first whitespace-delimited field.
///
/// Returns the field and everything after the single separator character
/// that follows it, or `None` if `raw` holds no field at all.
pub(crate) fn next_field(raw: &str) -> Option<(&str, &str)> {
    let raw = raw.trim_start();
    if raw.is_empty() {
        return None;
    }
    match raw.char_indices().find(|(_, c)| c.is_whitespace()) {
        Some((idx, sep)) => Some((&raw[..idx], &raw[idx + sep.len_utf8()..])),
        None => Some((raw, "")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_wire_text() {
        insta::assert_snapshot!(encode_message("join", 1, "alice"), @"join 1 alice");
        insta::assert_snapshot!(
            Message::new("send_message", 3, "2 bob carol hi  there").encode(),
            @"send_message 3 2 bob carol hi  there"
        );
    }

    #[test]
    fn packet_wire_text() {
        let packet = Packet::data(7, Message::new("forwarded_message", 1, "alice hello there"));
        insta::assert_snapshot!(packet.encode(), @"data 7 forwarded_message 1 alice hello there");
    }

    #[test]
    fn roundtrip_preserves_body_spacing() {
        let message = Message::new("send_message", 2, "1 bob  spaced   out ");
        let packet = Packet::data(42, message.clone());

        let decoded = decode_packet(&packet.encode()).unwrap();
        assert_eq!(decoded, packet);
        assert_eq!(decoded.message().unwrap(), message);
    }

    #[test]
    fn roundtrip_empty_body() {
        let message = Message::new("disconnect", 0, "");
        let wire = Packet::new(PacketKind::Ack, u32::MAX, message.encode()).encode();

        let decoded = decode_packet(&wire).unwrap();
        assert_eq!(decoded.kind, PacketKind::Ack);
        assert_eq!(decoded.sequence, u32::MAX);
        assert_eq!(decoded.message().unwrap(), message);
    }

    #[test]
    fn decode_message_without_body() {
        let message = decode_message("request_users_list 0").unwrap();
        assert_eq!(message.command, "request_users_list");
        assert_eq!(message.arg_count, 0);
        assert_eq!(message.body, "");
    }

    #[test]
    fn decode_message_tolerates_leading_whitespace() {
        let message = decode_message("  join\t1 alice").unwrap();
        assert_eq!(message.command, "join");
        assert_eq!(message.arg_count, 1);
        assert_eq!(message.body, "alice");
    }

    #[test]
    fn decode_message_bad_count() {
        let result = decode_message("join one alice");
        assert!(matches!(result, Err(ProtocolError::MalformedMessage { .. })));

        let result = decode_message("join -1 alice");
        assert!(matches!(result, Err(ProtocolError::MalformedMessage { .. })));
    }

    #[test]
    fn decode_message_too_few_tokens() {
        assert!(matches!(
            decode_message(""),
            Err(ProtocolError::MalformedMessage { .. })
        ));
        assert!(matches!(
            decode_message("join"),
            Err(ProtocolError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn message_tokens() {
        let message = Message::new("send_message", 3, "2 bob carol  hi there");
        let tokens: Vec<_> = message.tokens().collect();
        assert_eq!(tokens, vec!["2", "bob", "carol", "hi", "there"]);
    }

    #[test]
    fn decode_packet_unknown_kind() {
        let result = decode_packet("nack 0 join 1 alice");
        assert!(matches!(result, Err(ProtocolError::MalformedPacket { .. })));
    }

    #[test]
    fn decode_packet_missing_sequence() {
        assert!(matches!(
            decode_packet("data"),
            Err(ProtocolError::MalformedPacket { .. })
        ));
        assert!(matches!(
            decode_packet("data x join 1 alice"),
            Err(ProtocolError::MalformedPacket { .. })
        ));
    }

    #[test]
    fn packet_with_bad_message_decodes_at_packet_layer() {
        let packet = decode_packet("data 0 garbage").unwrap();
        assert_eq!(packet.payload, "garbage");
        assert!(matches!(
            packet.message(),
            Err(ProtocolError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn decode_datagram_rejects_invalid_utf8() {
        let result = decode_datagram(&[0x64, 0x61, 0xff, 0xfe]);
        assert!(matches!(result, Err(ProtocolError::MalformedPacket { .. })));
    }

    #[test]
    fn packet_kind_tags() {
        for kind in [
            PacketKind::Start,
            PacketKind::End,
            PacketKind::Data,
            PacketKind::Ack,
        ] {
            assert_eq!(kind.as_str().parse::<PacketKind>().unwrap(), kind);
        }
        assert!("DATA".parse::<PacketKind>().is_err());
    }
}
