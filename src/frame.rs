//! Fixed-layout frame codec
//!
//! Client -> broker and broker -> client records exchanged over the
//! transport. All integers are 32-bit signed little-endian.
//!
//! ```text
//! inbound  (268 bytes): | size (4) | channel ref (4) | sender id (4) | payload (256) |
//! outbound (260 bytes): | size (4) | payload (256) |
//! ```
//!
//! Payloads are opaque bytes. They are copied verbatim into and out of the
//! fixed buffer and never used as a formatting template.

use crate::error::{DecodeError, EncodeError};
use crate::types::{ChannelRef, ClientId};

/// Size of the fixed payload buffer
pub const PAYLOAD_CAPACITY: usize = 256;

/// Largest usable payload (one byte stays reserved for a text terminator)
pub const MAX_PAYLOAD: usize = PAYLOAD_CAPACITY - 1;

/// Encoded size of a client -> broker frame
pub const INBOUND_FRAME_LEN: usize = 12 + PAYLOAD_CAPACITY;

/// Encoded size of a broker -> client frame
pub const OUTBOUND_FRAME_LEN: usize = 4 + PAYLOAD_CAPACITY;

/// Byte offset of the outbound channel reference in an inbound frame
const CHANNEL_REF_OFFSET: usize = 4;

/// Client -> broker frame
///
/// The first frame from an unseen sender carries its display name,
/// every later one carries a chat line. The payload is only reachable
/// through constructors that keep its size within `MAX_PAYLOAD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    /// Number of meaningful payload bytes (0..=255)
    payload_size: usize,
    /// Channel the broker should deliver to for this sender
    pub channel_ref: ChannelRef,
    /// Sender identity
    pub sender: ClientId,
    /// Fixed payload buffer; bytes past `payload_size` are ignored
    payload: [u8; PAYLOAD_CAPACITY],
}

impl InboundFrame {
    /// Build a request frame (client side)
    pub fn new(sender: ClientId, channel_ref: ChannelRef, data: &[u8]) -> Result<Self, EncodeError> {
        let payload = fill_payload(data)?;
        Ok(Self {
            payload_size: data.len(),
            channel_ref,
            sender,
            payload,
        })
    }

    /// Meaningful payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.payload_size]
    }

    /// Number of meaningful payload bytes
    pub fn payload_size(&self) -> usize {
        self.payload_size
    }

    /// Serialize to the fixed wire layout
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(INBOUND_FRAME_LEN);
        out.extend_from_slice(&(self.payload_size as i32).to_le_bytes());
        out.extend_from_slice(&self.channel_ref.0.to_le_bytes());
        out.extend_from_slice(&self.sender.0.to_le_bytes());
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Broker -> client frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFrame {
    /// Number of meaningful payload bytes (0..=255)
    payload_size: usize,
    /// Fixed payload buffer; bytes past `payload_size` are zero
    payload: [u8; PAYLOAD_CAPACITY],
}

impl OutboundFrame {
    /// Meaningful payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.payload_size]
    }

    /// Number of meaningful payload bytes
    pub fn payload_size(&self) -> usize {
        self.payload_size
    }

    /// Payload rendered as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.payload()).into_owned()
    }

    /// Serialize to the fixed wire layout
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(OUTBOUND_FRAME_LEN);
        out.extend_from_slice(&(self.payload_size as i32).to_le_bytes());
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Decode a raw client -> broker frame
///
/// A declared size above `MAX_PAYLOAD` is clamped: the frame is kept and
/// everything past byte 255 is dropped.
pub fn decode_inbound(raw: &[u8]) -> Result<InboundFrame, DecodeError> {
    check_len(raw, INBOUND_FRAME_LEN)?;

    let payload_size = clamp_size(read_i32(raw, 0))?;
    let mut payload = [0u8; PAYLOAD_CAPACITY];
    payload.copy_from_slice(&raw[12..]);

    Ok(InboundFrame {
        payload_size,
        channel_ref: ChannelRef(read_i32(raw, CHANNEL_REF_OFFSET)),
        sender: ClientId(read_i32(raw, 8)),
        payload,
    })
}

/// Encode a delivery frame
pub fn encode_outbound(text: &[u8]) -> Result<OutboundFrame, EncodeError> {
    let payload = fill_payload(text)?;
    Ok(OutboundFrame {
        payload_size: text.len(),
        payload,
    })
}

/// Decode a raw broker -> client frame (client side)
///
/// Uses the same clamping policy as `decode_inbound`.
pub fn decode_outbound(raw: &[u8]) -> Result<OutboundFrame, DecodeError> {
    check_len(raw, OUTBOUND_FRAME_LEN)?;

    let payload_size = clamp_size(read_i32(raw, 0))?;
    let mut payload = [0u8; PAYLOAD_CAPACITY];
    payload[..payload_size].copy_from_slice(&raw[4..4 + payload_size]);

    Ok(OutboundFrame {
        payload_size,
        payload,
    })
}

/// Overwrite the outbound channel reference of a raw inbound frame
///
/// Transports that own endpoint naming use this to bind a frame to the
/// connection it arrived on. Frames of the wrong length are left untouched
/// and rejected later by `decode_inbound`.
pub fn stamp_channel_ref(raw: &mut [u8], channel_ref: ChannelRef) {
    if raw.len() == INBOUND_FRAME_LEN {
        raw[CHANNEL_REF_OFFSET..CHANNEL_REF_OFFSET + 4].copy_from_slice(&channel_ref.0.to_le_bytes());
    }
}

/// Render a broadcast line: `<displayName> : <message>;`
///
/// The result is clamped to `MAX_PAYLOAD` bytes so it always fits a frame.
pub fn render_broadcast(display_name: &str, text: &[u8]) -> Vec<u8> {
    let mut line = Vec::with_capacity(display_name.len() + text.len() + 4);
    line.extend_from_slice(display_name.as_bytes());
    line.extend_from_slice(b" : ");
    line.extend_from_slice(text);
    line.push(b';');
    line.truncate(MAX_PAYLOAD);
    line
}

fn fill_payload(data: &[u8]) -> Result<[u8; PAYLOAD_CAPACITY], EncodeError> {
    if data.len() > MAX_PAYLOAD {
        return Err(EncodeError::PayloadTooLarge {
            size: data.len(),
            max: MAX_PAYLOAD,
        });
    }
    let mut payload = [0u8; PAYLOAD_CAPACITY];
    payload[..data.len()].copy_from_slice(data);
    Ok(payload)
}

fn check_len(raw: &[u8], expected: usize) -> Result<(), DecodeError> {
    if raw.len() != expected {
        return Err(DecodeError::Length {
            expected,
            actual: raw.len(),
        });
    }
    Ok(())
}

fn clamp_size(declared: i32) -> Result<usize, DecodeError> {
    if declared < 0 {
        return Err(DecodeError::NegativeSize(declared));
    }
    Ok((declared as usize).min(MAX_PAYLOAD))
}

fn read_i32(raw: &[u8], offset: usize) -> i32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&raw[offset..offset + 4]);
    i32::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_inbound(size: i32, channel: i32, sender: i32, fill: u8) -> Vec<u8> {
        let mut raw = Vec::with_capacity(INBOUND_FRAME_LEN);
        raw.extend_from_slice(&size.to_le_bytes());
        raw.extend_from_slice(&channel.to_le_bytes());
        raw.extend_from_slice(&sender.to_le_bytes());
        raw.extend_from_slice(&[fill; PAYLOAD_CAPACITY]);
        raw
    }

    #[test]
    fn test_decode_inbound_fields() {
        let frame = InboundFrame::new(ClientId(1234), ChannelRef(7), b"Alice").unwrap();
        let decoded = decode_inbound(&frame.to_bytes()).unwrap();

        assert_eq!(decoded.sender, ClientId(1234));
        assert_eq!(decoded.channel_ref, ChannelRef(7));
        assert_eq!(decoded.payload(), b"Alice");
    }

    #[test]
    fn test_max_payload_survives_intact() {
        let data = vec![b'x'; MAX_PAYLOAD];
        let frame = InboundFrame::new(ClientId(1), ChannelRef(1), &data).unwrap();
        let decoded = decode_inbound(&frame.to_bytes()).unwrap();
        assert_eq!(decoded.payload(), data.as_slice());

        let out = encode_outbound(&data).unwrap();
        let back = decode_outbound(&out.to_bytes()).unwrap();
        assert_eq!(back.payload(), data.as_slice());
    }

    #[test]
    fn test_oversized_declared_size_is_clamped() {
        let decoded = decode_inbound(&raw_inbound(256, 1, 1, b'a')).unwrap();
        assert_eq!(decoded.payload_size(), MAX_PAYLOAD);

        let decoded = decode_inbound(&raw_inbound(10_000, 1, 1, b'a')).unwrap();
        assert_eq!(decoded.payload().len(), MAX_PAYLOAD);
    }

    #[test]
    fn test_request_constructor_rejects_oversized_payload() {
        let err = InboundFrame::new(ClientId(1), ChannelRef(1), &[b'z'; PAYLOAD_CAPACITY]).unwrap_err();
        assert_eq!(
            err,
            EncodeError::PayloadTooLarge {
                size: PAYLOAD_CAPACITY,
                max: MAX_PAYLOAD
            }
        );

        let frame = InboundFrame::new(ClientId(1), ChannelRef(1), &[b'z'; MAX_PAYLOAD]).unwrap();
        assert_eq!(frame.payload_size(), MAX_PAYLOAD);
        assert_eq!(frame.payload().len(), MAX_PAYLOAD);
    }

    #[test]
    fn test_negative_size_rejected() {
        assert_eq!(
            decode_inbound(&raw_inbound(-1, 1, 1, 0)),
            Err(DecodeError::NegativeSize(-1))
        );
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = decode_inbound(&[0u8; 10]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Length {
                expected: INBOUND_FRAME_LEN,
                actual: 10
            }
        );
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let err = encode_outbound(&[b'z'; PAYLOAD_CAPACITY]).unwrap_err();
        assert_eq!(
            err,
            EncodeError::PayloadTooLarge {
                size: PAYLOAD_CAPACITY,
                max: MAX_PAYLOAD
            }
        );
    }

    #[test]
    fn test_percent_payload_copied_verbatim() {
        let text = b"100% %s%n%x %%";
        let frame = encode_outbound(text).unwrap();
        assert_eq!(frame.payload(), text);
        assert!(frame.payload[text.len()..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_stamp_channel_ref() {
        let frame = InboundFrame::new(ClientId(3), ChannelRef(0), b"hi").unwrap();
        let mut raw = frame.to_bytes();
        stamp_channel_ref(&mut raw, ChannelRef(42));

        let decoded = decode_inbound(&raw).unwrap();
        assert_eq!(decoded.channel_ref, ChannelRef(42));
        assert_eq!(decoded.sender, ClientId(3));
        assert_eq!(decoded.payload(), b"hi");
    }

    #[test]
    fn test_render_broadcast() {
        assert_eq!(render_broadcast("Alice", b"hi"), b"Alice : hi;".to_vec());

        let long = render_broadcast(&"n".repeat(200), &[b'm'; 200]);
        assert_eq!(long.len(), MAX_PAYLOAD);
        assert!(encode_outbound(&long).is_ok());
    }
}
