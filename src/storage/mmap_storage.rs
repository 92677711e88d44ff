//! Memory-Mapped File Loading for Zero-Copy Reads
//!
//! The file is mapped read-only and decoded straight from the page cache:
//! - Zero-copy inspection: entry views borrow the mapping
//! - Kernel-managed paging: only touched pages are read from disk
//! - Owned decode on demand: `decode` copies element data out of the map

use std::fs::File;
use std::path::Path;

use memmap2::{Mmap, MmapOptions};
use tracing::debug;

use crate::config::DecodeLimits;
use crate::core::NdList;
use crate::error::Result;
use crate::protocol::{Decoder, Entries};

/// Read-only mapping of a collection file.
pub struct MappedFile {
    /// `None` for an empty file; mapping zero bytes fails on some platforms.
    mmap: Option<Mmap>,
    limits: DecodeLimits,
}

impl MappedFile {
    /// Map the file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let len = file.metadata()?.len();

        let mmap = if len == 0 {
            None
        } else {
            // SAFETY: mapped read-only; callers must not truncate the file
            // while the mapping is alive.
            Some(unsafe { MmapOptions::new().map(&file)? })
        };

        debug!(path = %path.display(), bytes = len, "mapped collection file");
        Ok(Self {
            mmap,
            limits: DecodeLimits::default(),
        })
    }

    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// The mapped bytes.
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    /// Zero-copy iteration over entry views borrowing the mapping.
    pub fn entries(&self) -> Result<Entries<'_>> {
        Decoder::with_limits(self.as_bytes(), self.limits).entries()
    }

    /// Decode into an owned collection.
    pub fn decode(&self) -> Result<NdList> {
        Decoder::with_limits(self.as_bytes(), self.limits).decode_list()
    }
}

/// Load the collection at `path` through a memory map.
pub fn load_mmap<P: AsRef<Path>>(path: P) -> Result<NdList> {
    MappedFile::open(path)?.decode()
}
