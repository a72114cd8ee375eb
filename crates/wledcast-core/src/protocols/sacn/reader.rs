use std::ops::Range;

use super::error::VerifyError;

/// Offset-based big-endian reads over an encoded packet; every read is
/// bounds-checked and reports how many bytes it needed.
pub struct SacnReader<'a> {
    payload: &'a [u8],
}

impl<'a> SacnReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), VerifyError> {
        match self.payload.len() {
            actual if actual < needed => Err(VerifyError::TooShort { needed, actual }),
            _ => Ok(()),
        }
    }

    pub fn slice(&self, range: Range<usize>) -> Result<&'a [u8], VerifyError> {
        let needed = range.end;
        self.payload.get(range).ok_or(VerifyError::TooShort {
            needed,
            actual: self.payload.len(),
        })
    }

    /// Copy `N` bytes starting at `offset`.
    pub fn array<const N: usize>(&self, offset: usize) -> Result<[u8; N], VerifyError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(offset..offset + N)?);
        Ok(out)
    }

    pub fn u8_at(&self, offset: usize) -> Result<u8, VerifyError> {
        self.array::<1>(offset).map(|[b]| b)
    }

    pub fn u16_at(&self, offset: usize) -> Result<u16, VerifyError> {
        self.array(offset).map(u16::from_be_bytes)
    }

    pub fn u32_at(&self, offset: usize) -> Result<u32, VerifyError> {
        self.array(offset).map(u32::from_be_bytes)
    }
}
