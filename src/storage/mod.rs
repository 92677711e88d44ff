//! Storage Layer: file persistence
//!
//! Two read paths over the same format:
//! - Buffered: read the whole file into memory, then decode
//! - Mapped: decode directly from a read-only memory map
//!
//! File handles are scoped to each call and released on every exit path.

mod file;
mod mmap_storage;

pub use file::{load, load_with_limits, save};
pub use mmap_storage::{load_mmap, MappedFile};
