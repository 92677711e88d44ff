//! Protocol Layer: Tagged Array Binary Encoding
//!
//! Design principles:
//! - Flat binary: fixed header, then entries back to back, little-endian
//! - Deterministic: the same collection always encodes to the same bytes
//! - Validating: every length and tag is checked before it is trusted

mod encoder;
mod format;

pub use encoder::{encoded_len, Decoder, Encoder, Entries, EntryView};
pub use format::{
    check_magic, FileHeader, HEADER_SIZE, MAGIC, MIN_ENTRY_SIZE, NAME_ABSENT, NAME_PRESENT,
    VERSION,
};

use crate::config::DecodeLimits;
use crate::core::NdList;
use crate::error::Result;

/// Encode a collection into a new buffer.
pub fn encode(list: &NdList) -> Result<Vec<u8>> {
    let mut encoder = Encoder::with_capacity(encoded_len(list)?);
    encoder.encode(list)?;
    Ok(encoder.into_bytes())
}

/// Decode a complete file image with default limits.
pub fn decode(bytes: &[u8]) -> Result<NdList> {
    Decoder::new(bytes).decode_list()
}

pub fn decode_with_limits(bytes: &[u8], limits: DecodeLimits) -> Result<NdList> {
    Decoder::with_limits(bytes, limits).decode_list()
}

/// Validate and return the header without touching the entries.
pub fn peek_header(bytes: &[u8]) -> Result<FileHeader> {
    FileHeader::from_bytes(bytes)
}
