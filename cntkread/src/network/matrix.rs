use std::ops::Range;

use serde::Serialize;

use crate::error::{FormatError, Result};
use crate::reader::Reader;

const MATRIX_DENSE: u8 = b'd';
const MATRIX_SPARSE: u8 = b's';

/// Dense matrix serialized inside a `LearnableParameter` record.
///
/// The payload is not copied; `data` is the byte range of the element data
/// inside the buffer the network was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DenseMatrix {
    pub element_size: u64,
    pub name: String,
    pub format: u32,
    pub rows: u64,
    pub columns: u64,
    #[serde(skip)]
    pub data: Range<usize>,
}

impl DenseMatrix {
    pub fn read(reader: &mut Reader<'_>) -> Result<Self> {
        let kind = reader.byte()?;
        match kind {
            MATRIX_DENSE => Self::read_dense(reader),
            MATRIX_SPARSE => Err(FormatError::unsupported(
                "Matrix sparse type not implemented.",
            )),
            other => Err(FormatError::unsupported(format!(
                "Matrix type '{}' not implemented.",
                other
            ))),
        }
    }

    fn read_dense(reader: &mut Reader<'_>) -> Result<Self> {
        reader.assert_tag("BMAT")?;
        let element_size = reader.u48()?.get();
        let name = reader.string()?;
        let format = reader.u32()?;
        let rows = reader.u48()?.get();
        let columns = reader.u48()?.get();
        let len = element_size
            .checked_mul(rows)
            .and_then(|len| len.checked_mul(columns))
            .and_then(|len| usize::try_from(len).ok())
            .ok_or_else(|| {
                FormatError::range(format!("Matrix '{}' payload size overflows.", name))
            })?;
        let start = reader.offset();
        reader.bytes(len)?;
        reader.assert_tag("EMAT")?;
        Ok(Self {
            element_size,
            name,
            format,
            rows,
            columns,
            data: start..start + len,
        })
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}
