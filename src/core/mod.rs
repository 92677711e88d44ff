//! Core module: in-memory data model
//!
//! Design principles:
//! - Validated at construction: an `NdArray` buffer always matches its shape
//! - Explicit absence: unnamed entries are `None`, never an empty string
//! - Order preserving: `NdList` is a plain ordered sequence

mod array;
mod dtype;
mod list;

pub use array::NdArray;
pub(crate) use array::element_count;
pub use dtype::{DType, Element};
pub use list::{Entry, NdList};
