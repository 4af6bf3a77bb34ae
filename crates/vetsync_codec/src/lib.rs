//! # VetSync Codec
//!
//! Versioned CBOR record encoding for VetSync.
//!
//! Every record written by the durable store goes through this crate. A
//! record is a small fixed header followed by the serde-encoded CBOR body:
//!
//! ```text
//! +-------+---------+-------------------+
//! | magic | version | CBOR body         |
//! | VSYN  | u16 LE  | (ciborium/serde)  |
//! +-------+---------+-------------------+
//! ```
//!
//! The header lets a newer client refuse a record it cannot interpret
//! instead of misreading it.
//!
//! ## Usage
//!
//! ```
//! use vetsync_codec::{decode_record, encode_record};
//!
//! let bytes = encode_record(&vec![1u32, 2, 3]).unwrap();
//! let decoded: Vec<u32> = decode_record(&bytes).unwrap();
//! assert_eq!(decoded, vec![1, 2, 3]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod envelope;
mod error;

pub use envelope::{decode_record, encode_record, FORMAT_VERSION, HEADER_LEN, MAGIC};
pub use error::{CodecError, CodecResult};
