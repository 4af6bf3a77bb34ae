//! Record envelope errors.

use thiserror::Error;

/// Result alias for envelope encoding and decoding.
pub type CodecResult<T> = Result<T, CodecError>;

/// Why a record could not be written or read back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// serde could not serialize the record body.
    #[error("cannot encode record body: {0}")]
    Serialize(String),

    /// The body is not valid CBOR for the requested type.
    #[error("cannot decode record body: {0}")]
    Deserialize(String),

    /// Fewer bytes than the envelope header.
    #[error("record truncated: {len} bytes")]
    Truncated {
        /// Length of the input.
        len: usize,
    },

    /// The record does not start with the envelope magic.
    #[error("bad record magic: {found:02x?}")]
    BadMagic {
        /// First four bytes of the input.
        found: [u8; 4],
    },

    /// Written by a format version this build cannot read.
    #[error("unsupported record version {found} (supported: {supported})")]
    UnsupportedVersion {
        /// Version in the header.
        found: u16,
        /// Version this build reads and writes.
        supported: u16,
    },
}
