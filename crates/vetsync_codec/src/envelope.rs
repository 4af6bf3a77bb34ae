//! Record envelope: header plus CBOR body.

use crate::error::{CodecError, CodecResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Magic bytes at the start of every record.
pub const MAGIC: [u8; 4] = *b"VSYN";

/// Record format version written by this build.
pub const FORMAT_VERSION: u16 = 1;

/// Length of the record header in bytes.
pub const HEADER_LEN: usize = MAGIC.len() + 2;

/// Encodes `value` into a versioned CBOR record.
///
/// # Errors
///
/// Returns [`CodecError::Serialize`] if serde serialization fails.
pub fn encode_record<T: Serialize>(value: &T) -> CodecResult<Vec<u8>> {
    let mut out = Vec::with_capacity(64);
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());

    ciborium::ser::into_writer(value, &mut out)
        .map_err(|e| CodecError::Serialize(e.to_string()))?;

    Ok(out)
}

/// Decodes a record produced by [`encode_record`].
///
/// # Errors
///
/// Returns an error if the header is truncated, the magic or version do not
/// match, or the body is not valid CBOR for `T`.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::Truncated { len: bytes.len() });
    }

    let mut found = [0u8; 4];
    found.copy_from_slice(&bytes[..4]);
    if found != MAGIC {
        return Err(CodecError::BadMagic { found });
    }

    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: version,
            supported: FORMAT_VERSION,
        });
    }

    ciborium::de::from_reader(&bytes[HEADER_LEN..])
        .map_err(|e| CodecError::Deserialize(e.to_string()))
}
