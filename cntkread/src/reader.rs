//! Little-endian cursor over a fully buffered computation network.
//!
//! Strings are zero-terminated sequences of UTF-16 code units. Section markers
//! are strings too, so probing for an optional section is a string compare
//! that rewinds on mismatch.

use crate::error::{FormatError, Result};

/// Largest high word a 48-bit counter may carry.
const U48_HIGH_LIMIT: u32 = 0x1_0000;

/// Count or size stored as two little-endian u32 words with a 16-bit high
/// part. Distinct from 64-bit tensor element values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct U48(u64);

impl U48 {
    pub fn from_words(low: u32, high: u32) -> Result<Self> {
        if high >= U48_HIGH_LIMIT {
            return Err(FormatError::range("Value not in 48-bit range."));
        }
        Ok(Self(((high as u64) << 32) | low as u64))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<U48> for u64 {
    fn from(value: U48) -> Self {
        value.0
    }
}

#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
    version: u64,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            version: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Consume `tag` followed by a zero code unit, or leave the offset untouched.
    pub fn match_tag(&mut self, tag: &str) -> bool {
        let start = self.offset;
        let matched = tag
            .encode_utf16()
            .chain(std::iter::once(0))
            .all(|unit| matches!(self.u16(), Ok(value) if value == unit));
        if !matched {
            self.offset = start;
        }
        matched
    }

    pub fn assert_tag(&mut self, tag: &str) -> Result<()> {
        if self.match_tag(tag) {
            Ok(())
        } else {
            Err(FormatError::structural(format!(
                "Invalid '{}' signature.",
                tag
            )))
        }
    }

    /// Move the cursor by `delta` bytes relative to the current offset.
    pub fn seek(&mut self, delta: isize) -> Result<()> {
        let target = self
            .offset
            .checked_add_signed(delta)
            .filter(|target| *target <= self.data.len())
            .ok_or_else(|| {
                FormatError::range(format!(
                    "Seek by {} from offset {} leaves the buffer.",
                    delta, self.offset
                ))
            })?;
        self.offset = target;
        Ok(())
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                FormatError::range(format!(
                    "Unexpected end of file at offset {} reading {} bytes.",
                    self.offset, len
                ))
            })?;
        let out = &self.data[self.offset..end];
        self.offset = end;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub fn byte(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    pub fn bool(&mut self) -> Result<bool> {
        Ok(self.byte()? != 0)
    }

    pub fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    pub fn u48(&mut self) -> Result<U48> {
        let low = self.u32()?;
        let high = self.u32()?;
        U48::from_words(low, high)
    }

    pub fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    pub fn f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    pub fn string(&mut self) -> Result<String> {
        let mut units = Vec::new();
        loop {
            let unit = self.u16()?;
            if unit == 0 {
                break;
            }
            units.push(unit);
        }
        Ok(String::from_utf16_lossy(&units))
    }

    pub fn strings(&mut self, count: U48) -> Result<Vec<String>> {
        let count = self.bounded_count(count, 2)?;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.string()?);
        }
        Ok(out)
    }

    pub fn bools(&mut self, count: U48) -> Result<Vec<bool>> {
        let count = self.bounded_count(count, 1)?;
        self.bytes(count)
            .map(|bytes| bytes.iter().map(|byte| *byte != 0).collect())
    }

    /// Reject element counts that cannot fit in the remaining bytes.
    fn bounded_count(&self, count: U48, min_width: usize) -> Result<usize> {
        let count = usize::try_from(count.get())
            .map_err(|_| FormatError::range("Value not in 48-bit range."))?;
        if count.saturating_mul(min_width) > self.remaining() {
            return Err(FormatError::range(format!(
                "Unexpected end of file at offset {} reading {} items.",
                self.offset, count
            )));
        }
        Ok(count)
    }
}
