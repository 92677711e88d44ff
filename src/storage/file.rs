//! Buffered whole-file save and load.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::debug;

use crate::config::DecodeLimits;
use crate::core::NdList;
use crate::error::Result;
use crate::protocol;

/// Write `list` to `path`, replacing any existing file.
///
/// The collection is encoded before the file is opened, so an encode error
/// leaves an existing file untouched. The handle is closed on every path.
pub fn save<P: AsRef<Path>>(path: P, list: &NdList) -> Result<()> {
    let path = path.as_ref();
    let bytes = protocol::encode(list)?;

    let mut file = File::create(path)?;
    file.write_all(&bytes)?;
    file.flush()?;

    debug!(
        path = %path.display(),
        entries = list.len(),
        bytes = bytes.len(),
        "saved collection"
    );
    Ok(())
}

/// Read and decode the collection at `path` with default limits.
pub fn load<P: AsRef<Path>>(path: P) -> Result<NdList> {
    load_with_limits(path, DecodeLimits::default())
}

pub fn load_with_limits<P: AsRef<Path>>(path: P, limits: DecodeLimits) -> Result<NdList> {
    let path = path.as_ref();
    let bytes = read_all(path)?;
    let list = protocol::decode_with_limits(&bytes, limits)?;

    debug!(
        path = %path.display(),
        entries = list.len(),
        bytes = bytes.len(),
        "loaded collection"
    );
    Ok(list)
}

/// Upper bound on the up-front allocation; larger files grow the buffer as
/// they are read.
const MAX_PREALLOC: usize = 64 * 1024 * 1024;

fn read_all(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let size_hint = file
        .metadata()
        .ok()
        .and_then(|m| usize::try_from(m.len()).ok())
        .unwrap_or(0)
        .min(MAX_PREALLOC);
    let mut bytes = Vec::with_capacity(size_hint);
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}
