//! ndstash - tagged n-dimensional array collections on disk
//!
//! An `NdList` is an ordered sequence of arrays, each optionally named. It
//! is written as one flat little-endian file and read back with order,
//! names, shapes and element bytes preserved exactly.
//!
//! ```no_run
//! use ndstash::{load, save, NdArray, NdList};
//!
//! let mut list = NdList::new();
//! list.push_named("x", NdArray::arange(25));
//! list.push_named("y", NdArray::arange(25));
//!
//! save("two_arrays_dict.nds", &list)?;
//! let loaded = load("two_arrays_dict.nds")?;
//! assert_eq!(loaded, list);
//! # Ok::<(), ndstash::Error>(())
//! ```
//!
//! Layers:
//! - `core`: data model (`DType`, `NdArray`, `Entry`, `NdList`)
//! - `protocol`: binary encoder/decoder
//! - `storage`: buffered and memory-mapped file access

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod storage;

pub use crate::config::DecodeLimits;
pub use crate::core::{DType, Element, Entry, NdArray, NdList};
pub use crate::error::{Error, Malformed, Result};
pub use crate::protocol::{decode, encode};
pub use crate::storage::{load, load_mmap, save};
