//! Collection Encoder/Decoder
//!
//! The encoder sizes its output exactly before writing, so encoding a
//! collection costs one allocation. The decoder borrows its input and hands
//! out zero-copy entry views; owned arrays are only built on request.

use tracing::{debug, trace};

use super::format::{
    FileHeader, HEADER_SIZE, MIN_ENTRY_SIZE, NAME_ABSENT, NAME_PRESENT,
};
use crate::config::DecodeLimits;
use crate::core::{element_count, DType, Entry, NdArray, NdList};
use crate::error::{Error, Malformed, Result};

/// Exact encoded size of `list`.
///
/// Fails if any name is too long for its u32 length prefix; nothing is
/// written in that case.
pub fn encoded_len(list: &NdList) -> Result<usize> {
    let mut total = HEADER_SIZE;
    for entry in list {
        total += entry_len(entry)?;
    }
    Ok(total)
}

#[inline(always)]
fn entry_len(entry: &Entry) -> Result<usize> {
    let name_len = match entry.name() {
        None => 0,
        Some(name) => {
            if u32::try_from(name.len()).is_err() {
                return Err(Error::NameTooLong(name.len()));
            }
            4 + name.len()
        }
    };
    Ok(1 + name_len + 1 + 4 + 8 * entry.array.rank() + entry.array.size_in_bytes())
}

/// Growable output buffer for encoded collections.
///
/// Each call to [`Encoder::encode`] appends one complete file image; call
/// [`Encoder::reset`] to reuse the allocation for the next one.
#[derive(Debug, Default)]
pub struct Encoder {
    buffer: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Reset encoder for reuse, keeping the allocation.
    #[inline(always)]
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Encode `list` and return the bytes just written.
    pub fn encode(&mut self, list: &NdList) -> Result<&[u8]> {
        let total = encoded_len(list)?;
        let start = self.buffer.len();
        self.buffer.reserve_exact(total);

        self.buffer
            .extend_from_slice(&FileHeader::new(list.len() as u64).to_bytes());

        for entry in list {
            self.write_entry(entry);
        }

        debug_assert_eq!(self.buffer.len() - start, total);
        trace!(entries = list.len(), bytes = total, "encoded collection");

        Ok(&self.buffer[start..])
    }

    /// Names were validated by `encoded_len`, so this cannot fail.
    #[inline(always)]
    fn write_entry(&mut self, entry: &Entry) {
        match entry.name() {
            None => self.buffer.push(NAME_ABSENT),
            Some(name) => {
                self.buffer.push(NAME_PRESENT);
                self.buffer
                    .extend_from_slice(&(name.len() as u32).to_le_bytes());
                self.buffer.extend_from_slice(name.as_bytes());
            }
        }

        let array = &entry.array;
        self.buffer.push(array.dtype().tag());
        // A shape with u32::MAX dims cannot be allocated, so the cast is exact.
        self.buffer
            .extend_from_slice(&(array.rank() as u32).to_le_bytes());
        for &dim in array.shape() {
            self.buffer.extend_from_slice(&(dim as u64).to_le_bytes());
        }
        self.buffer.extend_from_slice(array.as_bytes());
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// Borrowed view of one decoded entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView<'a> {
    pub name: Option<&'a str>,
    pub dtype: DType,
    pub shape: Vec<usize>,
    pub data: &'a [u8],
}

impl EntryView<'_> {
    /// Copy into an owned entry.
    pub fn to_entry(&self) -> Entry {
        Entry {
            name: self.name.map(str::to_owned),
            array: NdArray::from_validated(self.dtype, self.shape.clone(), self.data.to_vec()),
        }
    }
}

/// Zero-copy decoder over a complete file image.
pub struct Decoder<'a> {
    buffer: &'a [u8],
    read_pos: usize,
    limits: DecodeLimits,
}

impl<'a> Decoder<'a> {
    /// Decoder with default limits.
    #[inline(always)]
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::with_limits(buffer, DecodeLimits::default())
    }

    #[inline(always)]
    pub fn with_limits(buffer: &'a [u8], limits: DecodeLimits) -> Self {
        Self {
            buffer,
            read_pos: 0,
            limits,
        }
    }

    /// Decode the whole buffer. All or nothing: any error discards every
    /// entry decoded so far.
    pub fn decode_list(mut self) -> Result<NdList> {
        let header = self.read_header()?;

        // Bounded by read_header against the input length.
        let mut list = NdList::with_capacity(header.entry_count as usize);
        for index in 0..header.entry_count {
            let view = self.next_view()?;
            trace!(
                index,
                name = ?view.name,
                dtype = %view.dtype,
                shape = ?view.shape,
                "decoded entry"
            );
            list.push_entry(view.to_entry());
        }
        self.finish()?;

        debug!(
            entries = list.len(),
            bytes = self.buffer.len(),
            "decoded collection"
        );
        Ok(list)
    }

    /// Iterate entry views without copying element data.
    pub fn entries(mut self) -> Result<Entries<'a>> {
        let header = self.read_header()?;
        Ok(Entries {
            decoder: self,
            header,
            remaining: header.entry_count,
            done: false,
        })
    }

    /// Parse the header and check the declared entry count is plausible.
    pub(crate) fn read_header(&mut self) -> Result<FileHeader> {
        let header = FileHeader::from_bytes(&self.buffer[self.read_pos..])?;
        self.read_pos += HEADER_SIZE;

        let remaining = self.remaining();
        let limit = self.limits.max_entries;
        let fits_input = header.entry_count <= (remaining / MIN_ENTRY_SIZE) as u64;
        let within_limit = header.entry_count <= limit as u64;
        if !fits_input || !within_limit {
            return Err(Malformed::EntryCountOutOfRange {
                count: header.entry_count,
                remaining,
                limit,
            }
            .into());
        }

        Ok(header)
    }

    /// Decode the next entry. Only valid after `read_header`.
    pub(crate) fn next_view(&mut self) -> Result<EntryView<'a>> {
        let name = match self.read_u8("has_name")? {
            NAME_ABSENT => None,
            NAME_PRESENT => {
                let len = self.read_u32("name_len")?;
                if len as usize > self.limits.max_name_len {
                    return Err(Malformed::NameTooLarge {
                        len,
                        limit: self.limits.max_name_len,
                    }
                    .into());
                }
                let bytes = self.take(len as usize, "name")?;
                Some(std::str::from_utf8(bytes).map_err(|_| Malformed::InvalidName)?)
            }
            flag => return Err(Malformed::InvalidNameFlag(flag).into()),
        };

        let tag = self.read_u8("dtype")?;
        let dtype = DType::from_tag(tag).ok_or(Malformed::UnknownDType(tag))?;

        let rank = self.read_u32("rank")?;
        if rank as usize > self.limits.max_rank {
            return Err(Malformed::RankTooLarge {
                rank,
                limit: self.limits.max_rank,
            }
            .into());
        }

        let remaining = self.remaining();
        if (rank as usize).saturating_mul(8) > remaining {
            return Err(Malformed::ShapeOutOfRange { rank, remaining }.into());
        }

        let dims: Vec<u64> = self
            .take((rank as usize).saturating_mul(8), "shape")?
            .chunks_exact(8)
            .map(|chunk| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                u64::from_le_bytes(raw)
            })
            .collect();

        let shape = self.checked_shape(&dims, dtype)?;
        let len = element_count(&shape).unwrap_or(0) * dtype.width();
        let data = self.take(len, "elements")?;

        Ok(EntryView {
            name,
            dtype,
            shape,
            data,
        })
    }

    /// Convert dims to `usize` and check the element buffer size.
    fn checked_shape(&self, dims: &[u64], dtype: DType) -> Result<Vec<usize>> {
        let limit = self.limits.max_array_bytes;
        let too_large = || -> Error {
            Malformed::ArrayTooLarge {
                shape: dims.to_vec(),
                limit,
            }
            .into()
        };

        let shape = dims
            .iter()
            .map(|&dim| usize::try_from(dim))
            .collect::<std::result::Result<Vec<usize>, _>>()
            .map_err(|_| too_large())?;

        let bytes = element_count(&shape)
            .and_then(|n| n.checked_mul(dtype.width()))
            .ok_or_else(too_large)?;
        if bytes > limit {
            return Err(too_large());
        }

        Ok(shape)
    }

    /// Fail if bytes remain after the last entry.
    pub fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            extra => Err(Malformed::TrailingBytes(extra).into()),
        }
    }

    /// Remaining bytes
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.read_pos)
    }

    #[inline(always)]
    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8]> {
        let available = self.remaining();
        if len > available {
            return Err(Error::Truncated {
                field,
                needed: len,
                available,
            });
        }
        let start = self.read_pos;
        self.read_pos += len;
        Ok(&self.buffer[start..self.read_pos])
    }

    #[inline(always)]
    fn read_u8(&mut self, field: &'static str) -> Result<u8> {
        Ok(self.take(1, field)?[0])
    }

    #[inline(always)]
    fn read_u32(&mut self, field: &'static str) -> Result<u32> {
        let bytes = self.take(4, field)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Iterator over the entries of a file image.
///
/// Yields `Err` at most once, then stops. After the last entry, leftover
/// bytes are reported as an error.
pub struct Entries<'a> {
    decoder: Decoder<'a>,
    header: FileHeader,
    remaining: u64,
    done: bool,
}

impl Entries<'_> {
    pub fn header(&self) -> FileHeader {
        self.header
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<EntryView<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.remaining == 0 {
            self.done = true;
            return self.decoder.finish().err().map(Err);
        }

        self.remaining -= 1;
        let item = self.decoder.next_view();
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::format::MAGIC;

    fn dict_pair() -> NdList {
        [("x", NdArray::arange(25)), ("y", NdArray::arange(25))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_encode_decode_dict() {
        let mut encoder = Encoder::new();
        encoder.encode(&dict_pair()).unwrap();

        let decoded = Decoder::new(encoder.as_bytes()).decode_list().unwrap();
        assert_eq!(decoded, dict_pair());
        assert_eq!(decoded.get_with_tag(0).unwrap().0, Some("x"));
        assert_eq!(decoded.get_with_tag(1).unwrap().0, Some("y"));
    }

    #[test]
    fn test_exact_layout() {
        let mut list = NdList::new();
        list.push_named("ab", NdArray::from_slice(&[7u8, 9]));

        let mut encoder = Encoder::new();
        let bytes = encoder.encode(&list).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&MAGIC);
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(&1u64.to_le_bytes());
        expected.push(NAME_PRESENT);
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(b"ab");
        expected.push(DType::U8.tag());
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(&2u64.to_le_bytes());
        expected.extend_from_slice(&[7, 9]);

        assert_eq!(bytes, expected.as_slice());
        assert_eq!(encoded_len(&list).unwrap(), expected.len());
    }

    #[test]
    fn test_encoder_reuse() {
        let mut encoder = Encoder::new();
        encoder.encode(&dict_pair()).unwrap();
        encoder.reset();

        let list: NdList = (0..3).map(NdArray::arange).collect();
        encoder.encode(&list).unwrap();

        let decoded = Decoder::new(encoder.as_bytes()).decode_list().unwrap();
        assert_eq!(decoded, list); // Only the collection after reset
    }

    #[test]
    fn test_appended_images_are_trailing_bytes() {
        let mut encoder = Encoder::new();
        encoder.encode(&dict_pair()).unwrap();
        encoder.encode(&dict_pair()).unwrap();

        let err = Decoder::new(encoder.as_bytes()).decode_list().unwrap_err();
        assert!(matches!(err, Error::Malformed(Malformed::TrailingBytes(_))));
    }

    #[test]
    fn test_entries_iterator_is_zero_copy() {
        let mut encoder = Encoder::new();
        let bytes = encoder.encode(&dict_pair()).unwrap();

        let entries = Decoder::new(bytes).entries().unwrap();
        assert_eq!(entries.header().entry_count, 2);

        let views: Vec<_> = entries.collect::<Result<_>>().unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[1].name, Some("y"));
        assert_eq!(views[1].shape, vec![25]);
        // View data points into the encoded buffer.
        let range = bytes.as_ptr_range();
        assert!(range.contains(&views[0].data.as_ptr()));
    }

    #[test]
    fn test_entry_count_beyond_input_is_malformed() {
        let mut bytes = FileHeader::new(1_000).to_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; 12]);

        let err = Decoder::new(&bytes).decode_list().unwrap_err();
        assert!(matches!(
            err,
            Error::Malformed(Malformed::EntryCountOutOfRange { count: 1_000, .. })
        ));
    }

    #[test]
    fn test_entry_count_limit() {
        let list: NdList = (0..5).map(NdArray::arange).collect();
        let bytes = crate::protocol::encode(&list).unwrap();

        let limits = DecodeLimits::default().with_max_entries(4);
        let err = Decoder::with_limits(&bytes, limits)
            .decode_list()
            .unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_unknown_dtype() {
        let mut list = NdList::new();
        list.push(NdArray::arange(4));
        let mut bytes = crate::protocol::encode(&list).unwrap();
        // header, has_name flag, then the dtype tag
        bytes[HEADER_SIZE + 1] = 200;

        let err = Decoder::new(&bytes).decode_list().unwrap_err();
        assert!(matches!(err, Error::Malformed(Malformed::UnknownDType(200))));
    }

    #[test]
    fn test_invalid_name_flag() {
        let mut list = NdList::new();
        list.push(NdArray::arange(4));
        let mut bytes = crate::protocol::encode(&list).unwrap();
        bytes[HEADER_SIZE] = 2;

        let err = Decoder::new(&bytes).decode_list().unwrap_err();
        assert!(matches!(err, Error::Malformed(Malformed::InvalidNameFlag(2))));
    }

    #[test]
    fn test_invalid_utf8_name() {
        let mut list = NdList::new();
        list.push_named("ok", NdArray::arange(1));
        let mut bytes = crate::protocol::encode(&list).unwrap();
        // flag (1) + name_len (4), then the name bytes
        bytes[HEADER_SIZE + 5] = 0xFF;

        let err = Decoder::new(&bytes).decode_list().unwrap_err();
        assert!(matches!(err, Error::Malformed(Malformed::InvalidName)));
    }

    #[test]
    fn test_rank_limit() {
        let mut list = NdList::new();
        list.push(NdArray::zeros(DType::U8, vec![1; 5]).unwrap());
        let bytes = crate::protocol::encode(&list).unwrap();

        let limits = DecodeLimits::default().with_max_rank(4);
        let err = Decoder::with_limits(&bytes, limits)
            .decode_list()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Malformed(Malformed::RankTooLarge { rank: 5, limit: 4 })
        ));
    }

    #[test]
    fn test_rank_beyond_input_is_malformed() {
        let mut bytes = FileHeader::new(1).to_bytes().to_vec();
        bytes.push(NAME_ABSENT);
        bytes.push(DType::I32.tag());
        bytes.extend_from_slice(&20u32.to_le_bytes());

        let err = Decoder::new(&bytes).decode_list().unwrap_err();
        assert!(matches!(
            err,
            Error::Malformed(Malformed::ShapeOutOfRange {
                rank: 20,
                remaining: 0
            })
        ));
    }

    #[test]
    fn test_cut_inside_shape_is_malformed() {
        let mut list = NdList::new();
        list.push(NdArray::zeros(DType::U8, vec![2, 3]).unwrap());
        let bytes = crate::protocol::encode(&list).unwrap();
        // header, flag, dtype, rank, then 4 of the 16 shape bytes
        let cut = &bytes[..HEADER_SIZE + 1 + 1 + 4 + 4];

        let err = Decoder::new(cut).decode_list().unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_overflowing_shape_is_malformed() {
        let mut bytes = FileHeader::new(1).to_bytes().to_vec();
        bytes.push(NAME_ABSENT);
        bytes.push(DType::F64.tag());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());

        let err = Decoder::new(&bytes).decode_list().unwrap_err();
        assert!(matches!(
            err,
            Error::Malformed(Malformed::ArrayTooLarge { .. })
        ));
    }

    #[test]
    fn test_truncated_elements() {
        let bytes = crate::protocol::encode(&dict_pair()).unwrap();
        let cut = &bytes[..bytes.len() - 3];

        let err = Decoder::new(cut).decode_list().unwrap_err();
        assert!(matches!(
            err,
            Error::Truncated {
                field: "elements",
                needed: 100,
                available: 97
            }
        ));
    }

    #[test]
    fn test_entry_len() {
        let entry = Entry::unnamed(NdArray::arange(2));
        assert_eq!(entry_len(&entry).unwrap(), 1 + 1 + 4 + 8 + 8);
    }
}
