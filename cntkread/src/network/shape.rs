use serde::Serialize;

use crate::error::Result;
use crate::reader::Reader;

/// Ordered tensor dimensions as stored in a computation network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TensorShape {
    dims: Vec<u32>,
}

impl TensorShape {
    pub fn new(dims: Vec<u32>) -> Self {
        Self { dims }
    }

    /// Read `rank` followed by `rank` dimensions.
    pub fn read(reader: &mut Reader<'_>) -> Result<Self> {
        Self::decode(reader, false)
    }

    /// Like [`TensorShape::read`], but a zero first dimension selects the
    /// pre-tensor layout `(0, a, b)` which decodes to `[b, rank, a]`.
    pub fn read_legacy(reader: &mut Reader<'_>) -> Result<Self> {
        Self::decode(reader, true)
    }

    fn decode(reader: &mut Reader<'_>, accept_legacy: bool) -> Result<Self> {
        let rank = reader.u32()?;
        if rank == 0 {
            return Ok(Self::default());
        }
        let dim0 = reader.u32()?;
        if accept_legacy && dim0 == 0 {
            let dim = reader.u32()?;
            let dims = vec![reader.u32()?, rank, dim];
            return Ok(Self { dims });
        }
        let mut dims = Vec::with_capacity((rank as usize).min(reader.remaining() / 4 + 1));
        dims.push(dim0);
        for _ in 1..rank {
            dims.push(reader.u32()?);
        }
        Ok(Self { dims })
    }

    pub fn dims(&self) -> &[u32] {
        &self.dims
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }

    /// Dimensions widened for indexing.
    pub fn to_usize(&self) -> Vec<usize> {
        self.dims.iter().map(|dim| *dim as usize).collect()
    }
}

impl From<Vec<u32>> for TensorShape {
    fn from(dims: Vec<u32>) -> Self {
        Self::new(dims)
    }
}
