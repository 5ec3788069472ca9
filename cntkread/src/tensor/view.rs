use thiserror::Error;

use super::{DType, TensorValue, F16};

/// Element limit used when rendering tensor contents for display.
pub const DISPLAY_LIMIT: usize = 10_000;

/// Why a tensor's contents cannot be decoded. Reported per tensor, never
/// propagated to the surrounding graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TensorState {
    #[error("Tensor data is empty.")]
    Empty,
    #[error("Tensor has unknown data type.")]
    UnknownDataType,
    #[error("Tensor data type is not implemented.")]
    NotImplemented(DType),
    #[error("Tensor has no dimensions.")]
    NoDimensions,
    #[error("Tensor data is too short.")]
    TooShort { expected: usize, actual: usize },
}

/// Decoded contents together with how much of the payload was consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct Materialized {
    pub value: TensorValue,
    pub elements: usize,
    pub bytes_read: usize,
    pub truncated: bool,
}

/// Dtype, shape and raw bytes of one tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorView<'a> {
    dtype: DType,
    shape: Vec<usize>,
    data: Option<&'a [u8]>,
}

impl<'a> TensorView<'a> {
    pub fn new(dtype: DType, shape: impl Into<Vec<usize>>, data: Option<&'a [u8]>) -> Self {
        Self {
            dtype,
            shape: shape.into(),
            data,
        }
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// The first reason decoding would fail, if any.
    pub fn state(&self) -> Option<TensorState> {
        self.checked().err()
    }

    fn checked(&self) -> Result<(&'a [u8], usize), TensorState> {
        if self.dtype == DType::Unknown {
            return Err(TensorState::UnknownDataType);
        }
        if self.shape.is_empty() {
            return Err(TensorState::NoDimensions);
        }
        let data = match self.data {
            Some(data) if !data.is_empty() => data,
            _ => return Err(TensorState::Empty),
        };
        let width = self
            .dtype
            .width()
            .ok_or(TensorState::NotImplemented(self.dtype))?;
        let expected = self
            .shape
            .iter()
            .try_fold(width, |acc, dim| acc.checked_mul(*dim))
            .unwrap_or(usize::MAX);
        if expected > data.len() {
            return Err(TensorState::TooShort {
                expected,
                actual: data.len(),
            });
        }
        Ok((data, width))
    }

    /// Decode row-major, emitting one [`TensorValue::Ellipsis`] once `limit`
    /// elements have been produced.
    pub fn materialize(&self, limit: usize) -> Result<Materialized, TensorState> {
        let (data, width) = self.checked()?;
        let mut decoder = Decoder {
            data,
            dtype: self.dtype,
            width,
            shape: &self.shape,
            index: 0,
            count: 0,
            limit,
            truncated: false,
        };
        let value = decoder.decode(0);
        Ok(Materialized {
            value,
            elements: decoder.count,
            bytes_read: decoder.index,
            truncated: decoder.truncated,
        })
    }

    /// All elements, without truncation.
    pub fn value(&self) -> Result<TensorValue, TensorState> {
        self.materialize(usize::MAX).map(|decoded| decoded.value)
    }

    /// Pretty JSON of at most `limit` elements; empty when a state applies.
    pub fn to_display_string(&self, limit: usize) -> String {
        match self.materialize(limit) {
            Ok(decoded) => serde_json::to_string_pretty(&decoded.value).unwrap_or_default(),
            Err(_) => String::new(),
        }
    }
}

struct Decoder<'a, 's> {
    data: &'a [u8],
    dtype: DType,
    width: usize,
    shape: &'s [usize],
    index: usize,
    count: usize,
    limit: usize,
    truncated: bool,
}

impl Decoder<'_, '_> {
    fn decode(&mut self, dimension: usize) -> TensorValue {
        let size = self.shape[dimension];
        let innermost = dimension + 1 == self.shape.len();
        let remaining = self.limit.saturating_sub(self.count).saturating_add(1);
        let mut results = Vec::with_capacity(size.min(remaining));
        for _ in 0..size {
            if self.count >= self.limit {
                self.truncated = true;
                results.push(TensorValue::Ellipsis);
                break;
            }
            if innermost {
                results.push(self.scalar());
                self.count += 1;
            } else {
                results.push(self.decode(dimension + 1));
            }
        }
        TensorValue::List(results)
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.index..self.index + N]);
        self.index += self.width;
        out
    }

    fn scalar(&mut self) -> TensorValue {
        match self.dtype {
            DType::Float16 => {
                TensorValue::Float(F16::from_bits(u16::from_le_bytes(self.take())).to_f64())
            }
            DType::Float32 => TensorValue::Float(f32::from_le_bytes(self.take()) as f64),
            DType::Float64 => TensorValue::Float(f64::from_le_bytes(self.take())),
            DType::Int8 => TensorValue::Int(i8::from_le_bytes(self.take()) as i64),
            DType::UInt8 => TensorValue::UInt(self.take::<1>()[0] as u64),
            DType::Int32 => TensorValue::Int(i32::from_le_bytes(self.take()) as i64),
            DType::UInt32 => TensorValue::UInt(u32::from_le_bytes(self.take()) as u64),
            DType::Int64 => TensorValue::Int(i64::from_le_bytes(self.take())),
            DType::UInt64 => TensorValue::UInt(u64::from_le_bytes(self.take())),
            // `checked` rejects dtypes without a width before decoding starts.
            DType::Bool | DType::String | DType::Unknown => TensorValue::Ellipsis,
        }
    }
}
