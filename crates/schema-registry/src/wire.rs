//! Schema-id framing for serialized payloads.

use crate::error::{Result, SchemaError};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Magic byte indicating a schema id follows
pub const MAGIC_BYTE: u8 = 0x00;

/// Length of the magic byte plus the schema id
pub const HEADER_LEN: usize = 5;

/// Frame `data` with a schema id.
///
/// Format: [magic_byte(1)][schema_id(4)][data(N)]
pub fn encode(schema_id: i32, data: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + data.len());
    buf.put_u8(MAGIC_BYTE);
    // Big-endian for compatibility with Confluent
    buf.put_i32(schema_id);
    buf.put_slice(data);
    buf.freeze()
}

/// Split a framed payload into (schema_id, data_without_header).
pub fn decode(data: &[u8]) -> Result<(i32, &[u8])> {
    if data.len() < HEADER_LEN {
        return Err(SchemaError::MalformedPayload(format!(
            "payload of {} bytes is too short to contain a schema id",
            data.len()
        )));
    }

    if data[0] != MAGIC_BYTE {
        return Err(SchemaError::MalformedPayload(format!(
            "invalid magic byte: expected 0x00, got 0x{:02x}",
            data[0]
        )));
    }

    let mut id_bytes = &data[1..HEADER_LEN];
    let schema_id = id_bytes.get_i32();

    Ok((schema_id, &data[HEADER_LEN..]))
}
