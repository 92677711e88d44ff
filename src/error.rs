//! Error types for encoding, decoding and persisting array collections.

use std::io;

use thiserror::Error;

use crate::core::DType;

/// Structural reasons a byte buffer is rejected by the decoder.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Malformed {
    #[error("bad magic: {0:02x?}")]
    BadMagic([u8; 4]),
    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u32),
    #[error("unknown dtype tag: {0}")]
    UnknownDType(u8),
    #[error("invalid name flag: {0} (expected 0 or 1)")]
    InvalidNameFlag(u8),
    #[error("entry count {count} cannot fit in {remaining} remaining bytes (limit {limit})")]
    EntryCountOutOfRange {
        count: u64,
        remaining: usize,
        limit: usize,
    },
    #[error("rank {rank} exceeds maximum of {limit}")]
    RankTooLarge { rank: u32, limit: usize },
    #[error("shape of rank {rank} does not fit in {remaining} remaining bytes")]
    ShapeOutOfRange { rank: u32, remaining: usize },
    #[error("array of shape {shape:?} exceeds {limit} bytes")]
    ArrayTooLarge { shape: Vec<u64>, limit: usize },
    #[error("name length {len} exceeds maximum of {limit}")]
    NameTooLarge { len: u32, limit: usize },
    #[error("entry name is not valid UTF-8")]
    InvalidName,
    #[error("{0} unexpected trailing bytes after last entry")]
    TrailingBytes(usize),
}

/// Errors returned by the codec and the file wrappers.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("malformed format: {0}")]
    Malformed(#[from] Malformed),

    #[error("truncated input: {field} needs {needed} bytes, {available} available")]
    Truncated {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("buffer of {actual} bytes does not match shape (expected {expected} bytes)")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("dtype mismatch: array holds {actual}, requested {expected}")]
    DTypeMismatch { expected: DType, actual: DType },

    #[error("entry name of {0} bytes does not fit a u32 length prefix")]
    NameTooLong(usize),
}

impl Error {
    /// True for structural validation failures.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::Malformed(_))
    }

    /// True when the input ended before a declared field was complete.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Error::Truncated { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        let err: Error = Malformed::UnknownDType(42).into();
        assert!(err.is_malformed());
        assert!(!err.is_truncated());

        let err = Error::Truncated {
            field: "shape",
            needed: 8,
            available: 3,
        };
        assert!(err.is_truncated());
        assert!(!err.is_malformed());
    }

    #[test]
    fn test_display() {
        let err: Error = Malformed::BadMagic(*b"XXXX").into();
        assert_eq!(
            err.to_string(),
            "malformed format: bad magic: [58, 58, 58, 58]"
        );

        let err = Error::Truncated {
            field: "elements",
            needed: 100,
            available: 40,
        };
        assert_eq!(
            err.to_string(),
            "truncated input: elements needs 100 bytes, 40 available"
        );
    }
}
