use bitflags::bitflags;

use crate::checksum::checksum;
use crate::error::CodecError;

/// Wire magic sentinel (`spec.md` §6).
pub const MAGIC: u32 = 0x504C_4D00;
/// The only version this codec understands.
pub const VERSION: u8 = 1;
/// Fixed header size in bytes, before payload and metadata.
pub const HEADER_SIZE: usize = 24;
/// Hard cap on `payload_size` (`spec.md` §4.1: "Payload size hard cap: 16 KiB per message").
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024;

/// The `type` header field (`spec.md` §3 Message).
///
/// Values 0-7 are reserved for the protocol; 8-255 are free for callers to
/// tag application-defined message kinds ("user-tagged range").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Handshake,
    Auth,
    Command,
    Response,
    Error,
    Heartbeat,
    Ack,
    Stream,
    User(u8),
}

impl MessageType {
    fn to_u8(self) -> u8 {
        match self {
            MessageType::Handshake => 0,
            MessageType::Auth => 1,
            MessageType::Command => 2,
            MessageType::Response => 3,
            MessageType::Error => 4,
            MessageType::Heartbeat => 5,
            MessageType::Ack => 6,
            MessageType::Stream => 7,
            MessageType::User(tag) => tag,
        }
    }

    fn from_u8(byte: u8) -> Self {
        match byte {
            0 => MessageType::Handshake,
            1 => MessageType::Auth,
            2 => MessageType::Command,
            3 => MessageType::Response,
            4 => MessageType::Error,
            5 => MessageType::Heartbeat,
            6 => MessageType::Ack,
            7 => MessageType::Stream,
            tag => MessageType::User(tag),
        }
    }
}

bitflags! {
    /// The `flags` header field (`spec.md` §3 Message).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MessageFlags: u16 {
        const RELIABLE      = 0b0000_0001;
        const COMPRESSED    = 0b0000_0010;
        const ENCRYPTED     = 0b0000_0100;
        const FRAGMENTED    = 0b0000_1000;
        const PRIORITY      = 0b0001_0000;
        const OBSERVABLE    = 0b0010_0000;
        const AUTO_RECONNECT = 0b0100_0000;
    }
}

/// The wire unit (`spec.md` §3 Message).
///
/// Created by either endpoint, mutated only before serialization, and
/// destroyed after dispatch or pool return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub msg_type: MessageType,
    pub flags: MessageFlags,
    pub sequence: u32,
    pub payload: Vec<u8>,
    pub metadata: Vec<u8>,
}

impl Message {
    pub fn new(msg_type: MessageType, sequence: u32, payload: Vec<u8>) -> Self {
        Self {
            msg_type,
            flags: MessageFlags::empty(),
            sequence,
            payload,
            metadata: Vec::new(),
        }
    }

    pub fn with_flags(mut self, flags: MessageFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_metadata(mut self, metadata: Vec<u8>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Encodes this message into its wire form: header, payload, metadata.
    pub fn serialize(&self) -> Result<Vec<u8>, CodecError> {
        let payload_size = self.payload.len();
        if payload_size > MAX_MESSAGE_SIZE {
            return Err(CodecError::PayloadTooLarge {
                size: payload_size as u32,
            });
        }

        let mut out = Vec::with_capacity(HEADER_SIZE + payload_size + self.metadata.len());
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.push(VERSION);
        out.push(self.msg_type.to_u8());
        out.extend_from_slice(&self.flags.bits().to_le_bytes());
        out.extend_from_slice(&self.sequence.to_le_bytes());
        out.extend_from_slice(&(payload_size as u32).to_le_bytes());
        out.extend_from_slice(&(self.metadata.len() as u32).to_le_bytes());
        out.extend_from_slice(&checksum(&self.payload).to_le_bytes());
        out.extend_from_slice(&self.payload);
        out.extend_from_slice(&self.metadata);
        Ok(out)
    }

    /// Decodes a message from its wire form, validating magic, version,
    /// declared sizes and checksum (`spec.md` §4.1).
    pub fn deserialize(buf: &[u8]) -> Result<Self, CodecError> {
        if buf.len() < HEADER_SIZE {
            return Err(CodecError::MalformedFrame);
        }

        let magic = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        if magic != MAGIC {
            return Err(CodecError::MalformedFrame);
        }

        let version = buf[4];
        if version != VERSION {
            return Err(CodecError::UnsupportedVersion { found: version });
        }

        let msg_type = MessageType::from_u8(buf[5]);
        let flags = MessageFlags::from_bits_truncate(u16::from_le_bytes(
            buf[6..8].try_into().unwrap(),
        ));
        let sequence = u32::from_le_bytes(buf[8..12].try_into().unwrap());
        let payload_size = u32::from_le_bytes(buf[12..16].try_into().unwrap()) as usize;
        let metadata_size = u32::from_le_bytes(buf[16..20].try_into().unwrap()) as usize;
        let declared_checksum = u32::from_le_bytes(buf[20..24].try_into().unwrap());

        if payload_size > MAX_MESSAGE_SIZE {
            return Err(CodecError::PayloadTooLarge {
                size: payload_size as u32,
            });
        }

        let body = &buf[HEADER_SIZE..];
        if body.len() < payload_size + metadata_size {
            return Err(CodecError::MalformedFrame);
        }

        let payload = &body[..payload_size];
        let metadata = &body[payload_size..payload_size + metadata_size];

        if checksum(payload) != declared_checksum {
            return Err(CodecError::ChecksumMismatch);
        }

        Ok(Message {
            msg_type,
            flags,
            sequence,
            payload: payload.to_vec(),
            metadata: metadata.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_serialize_and_deserialize() {
        let msg = Message::new(MessageType::Command, 7, b"hello".to_vec())
            .with_flags(MessageFlags::RELIABLE | MessageFlags::OBSERVABLE)
            .with_metadata(b"meta".to_vec());

        let bytes = msg.serialize().unwrap();
        let decoded = Message::deserialize(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut bytes = Message::new(MessageType::Ack, 1, vec![]).serialize().unwrap();
        bytes[4] = 2;
        assert_eq!(
            Message::deserialize(&bytes),
            Err(CodecError::UnsupportedVersion { found: 2 })
        );
    }

    #[test]
    fn detects_tampered_payload_via_checksum() {
        let mut bytes = Message::new(MessageType::Command, 1, b"payload".to_vec())
            .serialize()
            .unwrap();
        let payload_start = HEADER_SIZE;
        bytes[payload_start] ^= 0xFF;
        assert_eq!(Message::deserialize(&bytes), Err(CodecError::ChecksumMismatch));
    }

    #[test]
    fn rejects_oversized_payload() {
        let msg = Message::new(MessageType::Command, 1, vec![0u8; MAX_MESSAGE_SIZE + 1]);
        assert_eq!(
            msg.serialize(),
            Err(CodecError::PayloadTooLarge {
                size: (MAX_MESSAGE_SIZE + 1) as u32
            })
        );
    }

    #[test]
    fn metadata_is_not_covered_by_the_checksum() {
        let mut a = Message::new(MessageType::Command, 1, b"same".to_vec());
        a.metadata = b"one".to_vec();
        let mut b = a.clone();
        b.metadata = b"two".to_vec();

        let bytes_a = a.serialize().unwrap();
        let bytes_b = b.serialize().unwrap();
        // checksum field (bytes 20..24) is identical even though metadata differs
        assert_eq!(bytes_a[20..24], bytes_b[20..24]);
    }
}
