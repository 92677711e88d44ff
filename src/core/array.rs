//! Dense n-dimensional array with an owned little-endian byte buffer.

use super::dtype::{DType, Element};
use crate::error::{Error, Result};

/// Dense, row-major numeric array.
///
/// The buffer always holds exactly `product(shape) * dtype.width()` bytes;
/// every constructor checks this, so encoders can trust it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdArray {
    dtype: DType,
    shape: Vec<usize>,
    data: Vec<u8>,
}

/// Number of elements for `shape`, or `None` on overflow. An empty shape is
/// a scalar holding one element.
#[inline(always)]
pub(crate) fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

impl NdArray {
    /// Build an array from raw little-endian bytes.
    pub fn new(dtype: DType, shape: Vec<usize>, data: Vec<u8>) -> Result<Self> {
        let expected = element_count(&shape)
            .and_then(|n| n.checked_mul(dtype.width()))
            .ok_or(Error::ShapeMismatch {
                expected: usize::MAX,
                actual: data.len(),
            })?;

        if expected != data.len() {
            return Err(Error::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self { dtype, shape, data })
    }

    /// Caller guarantees `data.len() == product(shape) * dtype.width()`.
    #[inline(always)]
    pub(crate) fn from_validated(dtype: DType, shape: Vec<usize>, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            element_count(&shape).map(|n| n * dtype.width()),
            Some(data.len())
        );
        Self { dtype, shape, data }
    }

    /// Build an array from typed values.
    pub fn from_vec<T: Element>(values: Vec<T>, shape: Vec<usize>) -> Result<Self> {
        let mut data = Vec::with_capacity(values.len() * T::DTYPE.width());
        for value in values {
            value.write_le(&mut data);
        }
        Self::new(T::DTYPE, shape, data)
    }

    /// Rank-1 array of the given values.
    pub fn from_slice<T: Element>(values: &[T]) -> Self {
        let mut data = Vec::with_capacity(values.len() * T::DTYPE.width());
        for &value in values {
            value.write_le(&mut data);
        }
        Self {
            dtype: T::DTYPE,
            shape: vec![values.len()],
            data,
        }
    }

    /// Rank-0 array holding a single value.
    pub fn scalar<T: Element>(value: T) -> Self {
        let mut data = Vec::with_capacity(T::DTYPE.width());
        value.write_le(&mut data);
        Self {
            dtype: T::DTYPE,
            shape: Vec::new(),
            data,
        }
    }

    /// `int32` values `0..stop`. Negative `stop` yields an empty array.
    pub fn arange(stop: i32) -> Self {
        let values: Vec<i32> = (0..stop.max(0)).collect();
        Self::from_slice(&values)
    }

    /// All-zero array of the given type and shape.
    pub fn zeros(dtype: DType, shape: Vec<usize>) -> Result<Self> {
        let len = element_count(&shape)
            .and_then(|n| n.checked_mul(dtype.width()))
            .ok_or(Error::ShapeMismatch {
                expected: usize::MAX,
                actual: 0,
            })?;
        Self::new(dtype, shape, vec![0u8; len])
    }

    /// Decode the buffer into typed values.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::DTYPE != self.dtype {
            return Err(Error::DTypeMismatch {
                expected: T::DTYPE,
                actual: self.dtype,
            });
        }
        Ok(self
            .data
            .chunks_exact(self.dtype.width())
            .map(T::read_le)
            .collect())
    }

    #[inline(always)]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    #[inline(always)]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline(always)]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.data.len() / self.dtype.width()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline(always)]
    pub fn size_in_bytes(&self) -> usize {
        self.data.len()
    }

    /// Raw little-endian element bytes.
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use half::f16;

    #[test]
    fn test_arange() {
        let arr = NdArray::arange(25);
        assert_eq!(arr.dtype(), DType::I32);
        assert_eq!(arr.shape(), &[25]);
        assert_eq!(arr.len(), 25);
        assert_eq!(arr.size_in_bytes(), 100);
        assert_eq!(arr.to_vec::<i32>().unwrap(), (0..25).collect::<Vec<_>>());
    }

    #[test]
    fn test_shape_validation() {
        let err = NdArray::new(DType::F32, vec![2, 3], vec![0u8; 20]).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                expected: 24,
                actual: 20
            }
        ));

        assert!(NdArray::new(DType::F32, vec![2, 3], vec![0u8; 24]).is_ok());
    }

    #[test]
    fn test_shape_overflow_rejected() {
        let err = NdArray::new(DType::F64, vec![usize::MAX, 2], vec![]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_scalar_and_zero_sized() {
        let s = NdArray::scalar(3.5f64);
        assert_eq!(s.rank(), 0);
        assert_eq!(s.len(), 1);
        assert_eq!(s.to_vec::<f64>().unwrap(), vec![3.5]);

        let z = NdArray::zeros(DType::F32, vec![4, 0, 2]).unwrap();
        assert!(z.is_empty());
        assert_eq!(z.len(), 0);
        assert_eq!(z.rank(), 3);
    }

    #[test]
    fn test_typed_roundtrip_f16_and_bool() {
        let halves = vec![f16::from_f32(1.5), f16::from_f32(-2.0)];
        let arr = NdArray::from_vec(halves.clone(), vec![2]).unwrap();
        assert_eq!(arr.dtype(), DType::F16);
        assert_eq!(arr.to_vec::<f16>().unwrap(), halves);

        let flags = NdArray::from_vec(vec![true, false, true, true], vec![2, 2]).unwrap();
        assert_eq!(flags.as_bytes(), &[1, 0, 1, 1]);
        assert_eq!(flags.to_vec::<bool>().unwrap(), vec![true, false, true, true]);
    }

    #[test]
    fn test_dtype_mismatch() {
        let arr = NdArray::arange(3);
        let err = arr.to_vec::<f32>().unwrap_err();
        assert!(matches!(
            err,
            Error::DTypeMismatch {
                expected: DType::F32,
                actual: DType::I32
            }
        ));
    }

    #[test]
    fn test_element_count() {
        assert_eq!(element_count(&[]), Some(1));
        assert_eq!(element_count(&[3, 4]), Some(12));
        assert_eq!(element_count(&[3, 0, 4]), Some(0));
        assert_eq!(element_count(&[usize::MAX, 2]), None);
    }
}
