//! Decoder resource limits.
//!
//! Every count and size in a file is attacker-controlled, so the decoder
//! checks them against these bounds before allocating.

/// Default maximum number of entries in one file.
pub const DEFAULT_MAX_ENTRIES: usize = 1_000_000;
/// Default maximum rank of a single array.
pub const DEFAULT_MAX_RANK: usize = 32;
/// Default maximum entry name length in bytes (64 KiB).
pub const DEFAULT_MAX_NAME_LEN: usize = 64 * 1024;
/// Default maximum size of one element buffer (4 GiB, or the address space on 32-bit).
pub const DEFAULT_MAX_ARRAY_BYTES: usize = (u32::MAX as usize).saturating_add(1);

/// Bounds applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_entries: usize,
    pub max_rank: usize,
    pub max_name_len: usize,
    pub max_array_bytes: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_rank: DEFAULT_MAX_RANK,
            max_name_len: DEFAULT_MAX_NAME_LEN,
            max_array_bytes: DEFAULT_MAX_ARRAY_BYTES,
        }
    }
}

impl DecodeLimits {
    /// No limits beyond what the input length itself allows.
    pub const fn unlimited() -> Self {
        Self {
            max_entries: usize::MAX,
            max_rank: usize::MAX,
            max_name_len: usize::MAX,
            max_array_bytes: usize::MAX,
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_max_rank(mut self, max_rank: usize) -> Self {
        self.max_rank = max_rank;
        self
    }

    pub fn with_max_name_len(mut self, max_name_len: usize) -> Self {
        self.max_name_len = max_name_len;
        self
    }

    pub fn with_max_array_bytes(mut self, max_array_bytes: usize) -> Self {
        self.max_array_bytes = max_array_bytes;
        self
    }
}
