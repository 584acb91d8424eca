use polycall_types::{FfiValue, Handle, ValueTag};

use crate::error::FfiError;

/// Encodes an [`FfiValue`] to the raw bytes carried in a wire [`Param`]
/// (`polycall_registry::Param`). The tag travels alongside in the param
/// header, so the payload here carries only the value itself.
pub fn encode_value(value: &FfiValue) -> Vec<u8> {
    match value {
        FfiValue::Void => Vec::new(),
        FfiValue::Bool(b) => vec![*b as u8],
        FfiValue::I8(n) => vec![*n as u8],
        FfiValue::I16(n) => n.to_le_bytes().to_vec(),
        FfiValue::I32(n) => n.to_le_bytes().to_vec(),
        FfiValue::I64(n) => n.to_le_bytes().to_vec(),
        FfiValue::U8(n) => vec![*n],
        FfiValue::U16(n) => n.to_le_bytes().to_vec(),
        FfiValue::U32(n) => n.to_le_bytes().to_vec(),
        FfiValue::U64(n) => n.to_le_bytes().to_vec(),
        FfiValue::F32(n) => n.to_le_bytes().to_vec(),
        FfiValue::F64(n) => n.to_le_bytes().to_vec(),
        FfiValue::String(s) => s.as_bytes().to_vec(),
        FfiValue::Bytes(b) => b.clone(),
        FfiValue::Object(h) | FfiValue::Function(h) => encode_handle(h),
        FfiValue::Array(elem_tag, items) => encode_array(*elem_tag, items),
        FfiValue::Struct(fields) => encode_struct(fields),
    }
}

fn encode_handle(handle: &Handle) -> Vec<u8> {
    let mut out = Vec::with_capacity(10);
    out.extend_from_slice(&handle.language_id.to_le_bytes());
    out.extend_from_slice(&handle.handle_id.to_le_bytes());
    out
}

fn encode_array(elem_tag: ValueTag, items: &[FfiValue]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&elem_tag.wire_code().to_le_bytes());
    out.extend_from_slice(&(items.len() as u32).to_le_bytes());
    for item in items {
        let bytes = encode_value(item);
        out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(&bytes);
    }
    out
}

fn encode_struct(fields: &[(String, FfiValue)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(fields.len() as u32).to_le_bytes());
    for (name, value) in fields {
        let name_bytes = name.as_bytes();
        out.extend_from_slice(&(name_bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(name_bytes);
        let value_tag = value.tag();
        out.extend_from_slice(&value_tag.wire_code().to_le_bytes());
        let value_bytes = encode_value(value);
        out.extend_from_slice(&(value_bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(&value_bytes);
    }
    out
}

/// Decodes an [`FfiValue`] from a wire param's `(tag, bytes)` pair, the
/// inverse of [`encode_value`].
pub fn decode_value(tag: ValueTag, bytes: &[u8]) -> Result<FfiValue, FfiError> {
    Ok(match tag {
        ValueTag::Void => FfiValue::Void,
        ValueTag::Bool => FfiValue::Bool(*bytes.first().ok_or(FfiError::MalformedPayload)? != 0),
        ValueTag::I8 => FfiValue::I8(*bytes.first().ok_or(FfiError::MalformedPayload)? as i8),
        ValueTag::I16 => FfiValue::I16(i16::from_le_bytes(fixed(bytes)?)),
        ValueTag::I32 => FfiValue::I32(i32::from_le_bytes(fixed(bytes)?)),
        ValueTag::I64 => FfiValue::I64(i64::from_le_bytes(fixed(bytes)?)),
        ValueTag::U8 => FfiValue::U8(*bytes.first().ok_or(FfiError::MalformedPayload)?),
        ValueTag::U16 => FfiValue::U16(u16::from_le_bytes(fixed(bytes)?)),
        ValueTag::U32 => FfiValue::U32(u32::from_le_bytes(fixed(bytes)?)),
        ValueTag::U64 => FfiValue::U64(u64::from_le_bytes(fixed(bytes)?)),
        ValueTag::F32 => FfiValue::F32(f32::from_le_bytes(fixed(bytes)?)),
        ValueTag::F64 => FfiValue::F64(f64::from_le_bytes(fixed(bytes)?)),
        ValueTag::String => {
            FfiValue::String(String::from_utf8(bytes.to_vec()).map_err(|_| FfiError::MalformedPayload)?)
        }
        ValueTag::Bytes => FfiValue::Bytes(bytes.to_vec()),
        ValueTag::Object => FfiValue::Object(decode_handle(bytes)?),
        ValueTag::Function => FfiValue::Function(decode_handle(bytes)?),
        ValueTag::Array => decode_array(bytes)?,
        ValueTag::Struct => decode_struct(bytes)?,
        ValueTag::Any => return Err(FfiError::MalformedPayload),
    })
}

fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N], FfiError> {
    bytes.try_into().map_err(|_| FfiError::MalformedPayload)
}

fn decode_handle(bytes: &[u8]) -> Result<Handle, FfiError> {
    if bytes.len() < 10 {
        return Err(FfiError::MalformedPayload);
    }
    let language_id = u16::from_le_bytes(bytes[0..2].try_into().unwrap());
    let handle_id = u64::from_le_bytes(bytes[2..10].try_into().unwrap());
    Ok(Handle { language_id, handle_id })
}

fn decode_array(bytes: &[u8]) -> Result<FfiValue, FfiError> {
    if bytes.len() < 6 {
        return Err(FfiError::MalformedPayload);
    }
    let elem_tag = ValueTag::from_wire_code(u16::from_le_bytes(bytes[0..2].try_into().unwrap()))
        .ok_or(FfiError::MalformedPayload)?;
    let count = u32::from_le_bytes(bytes[2..6].try_into().unwrap());

    let mut items = Vec::with_capacity(count as usize);
    let mut offset = 6usize;
    for _ in 0..count {
        if bytes.len() < offset + 4 {
            return Err(FfiError::MalformedPayload);
        }
        let len = u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap()) as usize;
        offset += 4;
        if bytes.len() < offset + len {
            return Err(FfiError::MalformedPayload);
        }
        items.push(decode_value(elem_tag, &bytes[offset..offset + len])?);
        offset += len;
    }
    Ok(FfiValue::Array(elem_tag, items))
}

fn decode_struct(bytes: &[u8]) -> Result<FfiValue, FfiError> {
    if bytes.len() < 4 {
        return Err(FfiError::MalformedPayload);
    }
    let count = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
    let mut offset = 4usize;
    let mut fields = Vec::with_capacity(count as usize);
    for _ in 0..count {
        if bytes.len() < offset + 4 {
            return Err(FfiError::MalformedPayload);
        }
        let name_len = u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap()) as usize;
        offset += 4;
        if bytes.len() < offset + name_len {
            return Err(FfiError::MalformedPayload);
        }
        let name = String::from_utf8(bytes[offset..offset + name_len].to_vec())
            .map_err(|_| FfiError::MalformedPayload)?;
        offset += name_len;

        if bytes.len() < offset + 6 {
            return Err(FfiError::MalformedPayload);
        }
        let tag = ValueTag::from_wire_code(u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap()))
            .ok_or(FfiError::MalformedPayload)?;
        let value_len = u32::from_le_bytes(bytes[offset + 2..offset + 6].try_into().unwrap()) as usize;
        offset += 6;
        if bytes.len() < offset + value_len {
            return Err(FfiError::MalformedPayload);
        }
        let value = decode_value(tag, &bytes[offset..offset + value_len])?;
        offset += value_len;

        fields.push((name, value));
    }
    Ok(FfiValue::Struct(fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: FfiValue) {
        let bytes = encode_value(&value);
        assert_eq!(decode_value(value.tag(), &bytes).unwrap(), value);
    }

    #[test]
    fn primitives_round_trip() {
        round_trip(FfiValue::I32(-7));
        round_trip(FfiValue::U64(u64::MAX));
        round_trip(FfiValue::F64(3.5));
        round_trip(FfiValue::Bool(true));
        round_trip(FfiValue::String("hello".into()));
        round_trip(FfiValue::Bytes(vec![1, 2, 3]));
    }

    #[test]
    fn handle_round_trips_for_object_and_function() {
        let handle = Handle { language_id: 4, handle_id: 0xDEAD_BEEF };
        round_trip(FfiValue::Object(handle));
        round_trip(FfiValue::Function(handle));
    }

    #[test]
    fn nested_array_and_struct_round_trip() {
        let array = FfiValue::Array(ValueTag::I32, vec![FfiValue::I32(1), FfiValue::I32(2)]);
        round_trip(array);

        let strukt = FfiValue::Struct(vec![
            ("count".into(), FfiValue::U32(3)),
            ("label".into(), FfiValue::String("x".into())),
        ]);
        round_trip(strukt);
    }

    #[test]
    fn truncated_bytes_are_malformed() {
        let err = decode_value(ValueTag::I64, &[0, 1]).unwrap_err();
        assert_eq!(err, FfiError::MalformedPayload);
    }
}
