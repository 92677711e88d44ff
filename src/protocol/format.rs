//! File Format (little-endian, no padding)
//!
//! Layout:
//! ┌─────────────────────────────────────────────────────┐
//! │ FileHeader (16 bytes, fixed)                        │
//! │   magic "NDSK" | version u32 | entry_count u64      │
//! ├─────────────────────────────────────────────────────┤
//! │ Entry 0                                             │
//! │   has_name u8 | [name_len u32 | name bytes]         │
//! │   dtype u8 | rank u32 | shape u64 × rank            │
//! │   elements (product(shape) × width bytes)           │
//! ├─────────────────────────────────────────────────────┤
//! │ Entry 1 ...                                         │
//! └─────────────────────────────────────────────────────┘

use crate::error::{Error, Malformed, Result};

pub const MAGIC: [u8; 4] = *b"NDSK";
pub const VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 16;

pub const NAME_ABSENT: u8 = 0;
pub const NAME_PRESENT: u8 = 1;

/// Lower bound on the size of any entry: has_name flag, dtype tag and rank,
/// with no name, dims or elements counted. Used to reject impossible entry
/// counts.
pub const MIN_ENTRY_SIZE: usize = 1 + 1 + 4;

/// Fixed header at the start of every file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub version: u32,
    pub entry_count: u64,
}

impl FileHeader {
    /// Header for the current format version.
    #[inline(always)]
    pub fn new(entry_count: u64) -> Self {
        Self {
            version: VERSION,
            entry_count,
        }
    }

    /// Serialize to the on-disk representation.
    #[inline(always)]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4..8].copy_from_slice(&self.version.to_le_bytes());
        buf[8..16].copy_from_slice(&self.entry_count.to_le_bytes());
        buf
    }

    /// Parse and validate magic and version.
    ///
    /// The magic is checked before the length so a short buffer that already
    /// disagrees on the magic reports `BadMagic` rather than truncation.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let magic_len = buf.len().min(MAGIC.len());
        if buf[..magic_len] != MAGIC[..magic_len] {
            let mut magic = [0u8; 4];
            magic[..magic_len].copy_from_slice(&buf[..magic_len]);
            return Err(Malformed::BadMagic(magic).into());
        }

        if buf.len() < HEADER_SIZE {
            return Err(Error::Truncated {
                field: "header",
                needed: HEADER_SIZE,
                available: buf.len(),
            });
        }

        let version = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        if version != VERSION {
            return Err(Malformed::UnsupportedVersion(version).into());
        }

        let mut count = [0u8; 8];
        count.copy_from_slice(&buf[8..16]);

        Ok(Self {
            version,
            entry_count: u64::from_le_bytes(count),
        })
    }
}

/// Check only the magic bytes.
#[inline(always)]
pub fn check_magic(buf: &[u8]) -> bool {
    buf.len() >= MAGIC.len() && buf[..MAGIC.len()] == MAGIC
}
