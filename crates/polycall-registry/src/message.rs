use polycall_types::ValueTag;

use crate::error::RegistryError;

/// A single command parameter (`spec.md` §3 "Parameter").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub id: u32,
    pub type_tag: ValueTag,
    pub flags: u16,
    pub bytes: Vec<u8>,
}

impl Param {
    pub fn new(id: u32, type_tag: ValueTag, bytes: Vec<u8>) -> Self {
        Self { id, type_tag, flags: 0, bytes }
    }
}

/// The decoded command-message payload (`spec.md` §3 "Command message", §6
/// wire layout): `u32 command_id | u32 param_count | param_count ×
/// { u32 param_id, u16 type_tag, u16 flags, u32 size, size bytes }`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandMessage {
    pub command_id: u32,
    params: Vec<Param>,
}

impl CommandMessage {
    pub fn new(command_id: u32) -> Self {
        Self { command_id, params: Vec::new() }
    }

    /// Appends a parameter, rejecting a duplicate id at add-time (`spec.md`
    /// §4.3: "duplicate param ids within a message are rejected at
    /// add-time").
    pub fn add_param(&mut self, param: Param) -> Result<(), RegistryError> {
        if self.params.iter().any(|p| p.id == param.id) {
            return Err(RegistryError::DuplicateParam { param_id: param.id });
        }
        self.params.push(param);
        Ok(())
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// O(n) lookup by parameter id (`spec.md` §4.3).
    pub fn param(&self, id: u32) -> Option<&Param> {
        self.params.iter().find(|p| p.id == id)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.command_id.to_le_bytes());
        out.extend_from_slice(&(self.params.len() as u32).to_le_bytes());
        for p in &self.params {
            out.extend_from_slice(&p.id.to_le_bytes());
            out.extend_from_slice(&p.type_tag.wire_code().to_le_bytes());
            out.extend_from_slice(&p.flags.to_le_bytes());
            out.extend_from_slice(&(p.bytes.len() as u32).to_le_bytes());
            out.extend_from_slice(&p.bytes);
        }
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, RegistryError> {
        if buf.len() < 8 {
            return Err(RegistryError::MalformedPayload);
        }
        let command_id = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        let param_count = u32::from_le_bytes(buf[4..8].try_into().unwrap());

        let mut msg = CommandMessage::new(command_id);
        let mut offset = 8usize;
        for _ in 0..param_count {
            if buf.len() < offset + 12 {
                return Err(RegistryError::MalformedPayload);
            }
            let param_id = u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap());
            let type_tag = u16::from_le_bytes(buf[offset + 4..offset + 6].try_into().unwrap());
            let flags = u16::from_le_bytes(buf[offset + 6..offset + 8].try_into().unwrap());
            let size = u32::from_le_bytes(buf[offset + 8..offset + 12].try_into().unwrap()) as usize;
            offset += 12;

            if buf.len() < offset + size {
                return Err(RegistryError::MalformedPayload);
            }
            let bytes = buf[offset..offset + size].to_vec();
            offset += size;

            let type_tag = ValueTag::from_wire_code(type_tag).ok_or(RegistryError::MalformedPayload)?;
            msg.add_param(Param { id: param_id, type_tag, flags, bytes })?;
        }
        Ok(msg)
    }
}

/// Final disposition of a dispatch (`spec.md` §3 "Command response").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Partial,
    Timeout,
}

impl Status {
    fn to_u16(self) -> u16 {
        match self {
            Status::Success => 0,
            Status::Error => 1,
            Status::Partial => 2,
            Status::Timeout => 3,
        }
    }

    fn from_u16(v: u16) -> Result<Self, RegistryError> {
        Ok(match v {
            0 => Status::Success,
            1 => Status::Error,
            2 => Status::Partial,
            3 => Status::Timeout,
            _ => return Err(RegistryError::MalformedPayload),
        })
    }
}

/// `spec.md` §3 "Command response" / §6 payload: `u16 status | u16
/// error_code | u32 message_len | u32 data_len | message bytes | data
/// bytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub status: Status,
    pub error_code: u16,
    pub error_message: String,
    pub data: Vec<u8>,
}

impl CommandResponse {
    pub fn success(data: Vec<u8>) -> Self {
        Self { status: Status::Success, error_code: 0, error_message: String::new(), data }
    }

    pub fn error(error_code: u16, error_message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            error_code,
            error_message: error_message.into(),
            data: Vec::new(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let message_bytes = self.error_message.as_bytes();
        let mut out = Vec::with_capacity(12 + message_bytes.len() + self.data.len());
        out.extend_from_slice(&self.status.to_u16().to_le_bytes());
        out.extend_from_slice(&self.error_code.to_le_bytes());
        out.extend_from_slice(&(message_bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        out.extend_from_slice(message_bytes);
        out.extend_from_slice(&self.data);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, RegistryError> {
        if buf.len() < 12 {
            return Err(RegistryError::MalformedPayload);
        }
        let status = Status::from_u16(u16::from_le_bytes(buf[0..2].try_into().unwrap()))?;
        let error_code = u16::from_le_bytes(buf[2..4].try_into().unwrap());
        let message_len = u32::from_le_bytes(buf[4..8].try_into().unwrap()) as usize;
        let data_len = u32::from_le_bytes(buf[8..12].try_into().unwrap()) as usize;

        let body = &buf[12..];
        if body.len() < message_len + data_len {
            return Err(RegistryError::MalformedPayload);
        }
        let error_message = String::from_utf8(body[..message_len].to_vec())
            .map_err(|_| RegistryError::MalformedPayload)?;
        let data = body[message_len..message_len + data_len].to_vec();

        Ok(Self { status, error_code, error_message, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_message_round_trips() {
        let mut msg = CommandMessage::new(7);
        msg.add_param(Param::new(1, ValueTag::String, b"hi\0".to_vec())).unwrap();
        msg.add_param(Param::new(2, ValueTag::I32, 9i32.to_le_bytes().to_vec())).unwrap();

        let bytes = msg.encode();
        let decoded = CommandMessage::decode(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn duplicate_param_id_is_rejected_at_add_time() {
        let mut msg = CommandMessage::new(1);
        msg.add_param(Param::new(1, ValueTag::Bool, vec![1])).unwrap();
        let err = msg.add_param(Param::new(1, ValueTag::Bool, vec![0])).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateParam { param_id: 1 });
    }

    #[test]
    fn response_round_trips() {
        let resp = CommandResponse { data: b"hi\0".to_vec(), ..CommandResponse::success(vec![]) };
        let bytes = resp.encode();
        assert_eq!(CommandResponse::decode(&bytes).unwrap(), resp);
    }

    #[test]
    fn truncated_payload_is_malformed() {
        let err = CommandMessage::decode(&[1, 2, 3]).unwrap_err();
        assert_eq!(err, RegistryError::MalformedPayload);
    }
}
