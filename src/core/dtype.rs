//! Element types and their on-disk tags.
//!
//! Tag numbering follows the MXNet type flags so files produced by the
//! engine-side tooling line up with ours.

use std::fmt;

use half::f16;

/// Element type of an [`NdArray`](super::NdArray).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F32 = 0,
    F64 = 1,
    F16 = 2,
    U8 = 3,
    I32 = 4,
    I8 = 5,
    I64 = 6,
    Bool = 7,
}

/// Lookup table indexed by tag.
const DTYPE_TABLE: [DType; 8] = [
    DType::F32,
    DType::F64,
    DType::F16,
    DType::U8,
    DType::I32,
    DType::I8,
    DType::I64,
    DType::Bool,
];

impl DType {
    /// Every supported dtype, in tag order.
    pub const ALL: [DType; 8] = DTYPE_TABLE;

    /// Resolve a raw tag. Unknown tags are rejected, never defaulted.
    #[inline(always)]
    pub fn from_tag(tag: u8) -> Option<Self> {
        DTYPE_TABLE.get(tag as usize).copied()
    }

    #[inline(always)]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Size of one element in bytes.
    #[inline(always)]
    pub const fn width(self) -> usize {
        match self {
            DType::U8 | DType::I8 | DType::Bool => 1,
            DType::F16 => 2,
            DType::F32 | DType::I32 => 4,
            DType::F64 | DType::I64 => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            DType::F32 => "float32",
            DType::F64 => "float64",
            DType::F16 => "float16",
            DType::U8 => "uint8",
            DType::I32 => "int32",
            DType::I8 => "int8",
            DType::I64 => "int64",
            DType::Bool => "bool",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A Rust scalar type that can live inside an [`NdArray`](super::NdArray).
///
/// Elements are always stored little-endian regardless of the host.
pub trait Element: Copy + Sized {
    const DTYPE: DType;

    fn write_le(self, out: &mut Vec<u8>);

    /// `bytes` is exactly `DTYPE.width()` long.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                #[inline(always)]
                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                #[inline(always)]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_element! {
    f32 => F32,
    f64 => F64,
    f16 => F16,
    u8 => U8,
    i32 => I32,
    i8 => I8,
    i64 => I64,
}

impl Element for bool {
    const DTYPE: DType = DType::Bool;

    #[inline(always)]
    fn write_le(self, out: &mut Vec<u8>) {
        out.push(self as u8);
    }

    #[inline(always)]
    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_lookup_matches_discriminant() {
        for dtype in DType::ALL {
            assert_eq!(DType::from_tag(dtype.tag()), Some(dtype));
        }
    }

    #[test]
    fn test_unknown_tags_rejected() {
        for tag in 8..=u8::MAX {
            assert_eq!(DType::from_tag(tag), None, "tag {tag} must be rejected");
        }
    }

    #[test]
    fn test_widths_match_rust_types() {
        assert_eq!(DType::F32.width(), std::mem::size_of::<f32>());
        assert_eq!(DType::F64.width(), std::mem::size_of::<f64>());
        assert_eq!(DType::F16.width(), std::mem::size_of::<f16>());
        assert_eq!(DType::I64.width(), std::mem::size_of::<i64>());
        assert_eq!(DType::Bool.width(), 1);
    }

    #[test]
    fn test_element_le_encoding() {
        let mut out = Vec::new();
        0x0102_0304i32.write_le(&mut out);
        assert_eq!(out, [0x04, 0x03, 0x02, 0x01]);
        assert_eq!(i32::read_le(&out), 0x0102_0304);

        out.clear();
        true.write_le(&mut out);
        false.write_le(&mut out);
        assert_eq!(out, [1, 0]);
        assert!(bool::read_le(&out[..1]));
        assert!(!bool::read_le(&out[1..]));
    }

    #[test]
    fn test_display() {
        assert_eq!(DType::I32.to_string(), "int32");
        assert_eq!(DType::F16.to_string(), "float16");
    }
}
