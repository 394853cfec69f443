//! Bounds-checked views over resource buffers
//!
//! Every container reader goes through [`ByteSpan`] so that offsets taken from
//! a header are validated against the buffer length before any copy happens.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// A read-only, bounds-checked view over a resource buffer
#[derive(Debug, Clone, Copy)]
pub struct ByteSpan<'a> {
    data: &'a [u8],
}

impl<'a> ByteSpan<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Borrow `len` bytes starting at `offset`
    pub fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        let end = offset.checked_add(len).ok_or(Error::OutOfBounds {
            offset,
            len,
            size: self.data.len(),
        })?;
        self.data.get(offset..end).ok_or(Error::OutOfBounds {
            offset,
            len,
            size: self.data.len(),
        })
    }

    /// Borrow everything from `offset` to the end of the buffer
    pub fn tail(&self, offset: usize) -> Result<&'a [u8]> {
        self.data.get(offset..).ok_or(Error::OutOfBounds {
            offset,
            len: 0,
            size: self.data.len(),
        })
    }

    pub fn u8_at(&self, offset: usize) -> Result<u8> {
        Ok(self.slice(offset, 1)?[0])
    }

    pub fn u16_at(&self, offset: usize) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.slice(offset, 2)?))
    }

    pub fn i16_at(&self, offset: usize) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.slice(offset, 2)?))
    }

    pub fn u32_at(&self, offset: usize) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.slice(offset, 4)?))
    }

    pub fn i32_at(&self, offset: usize) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.slice(offset, 4)?))
    }

    /// Read a fixed-size byte array
    pub fn array_at<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(offset, N)?);
        Ok(out)
    }

    /// Check the 4-byte signature and return the 4-byte version tag that follows it
    pub fn expect_signature(&self, format: &'static str, signature: &[u8; 4]) -> Result<[u8; 4]> {
        let found: [u8; 4] = self.array_at(0)?;
        if &found != signature {
            return Err(Error::InvalidSignature { format, found });
        }
        self.array_at(4)
    }

    /// Read `count` fixed-size records starting at `offset`
    ///
    /// The whole table is bounds-checked up front so a corrupt count cannot
    /// trigger a huge allocation.
    pub fn records(&self, offset: usize, count: usize, record_size: usize) -> Result<Vec<ByteSpan<'a>>> {
        let total = count.checked_mul(record_size).ok_or(Error::OutOfBounds {
            offset,
            len: usize::MAX,
            size: self.data.len(),
        })?;
        let table = self.slice(offset, total)?;
        Ok(table.chunks_exact(record_size.max(1)).take(count).map(ByteSpan::new).collect())
    }
}

/// Sorted list of all offsets declared by a container
///
/// Used to derive the length of payloads that only store their start offset:
/// the payload runs to the next declared offset, or to the end of the buffer.
#[derive(Debug, Default, Clone)]
pub struct OffsetIndex {
    offsets: Vec<usize>,
    end: usize,
}

impl OffsetIndex {
    #[must_use]
    pub fn new(end: usize) -> Self {
        Self {
            offsets: Vec::new(),
            end,
        }
    }

    pub fn push(&mut self, offset: usize) {
        self.offsets.push(offset);
    }

    /// Finalize the index; must be called before [`Self::length_from`]
    pub fn sort(&mut self) {
        self.offsets.sort_unstable();
        self.offsets.dedup();
    }

    /// Distance from `offset` to the next larger declared offset, clamped to the buffer end
    #[must_use]
    pub fn length_from(&self, offset: usize) -> usize {
        if offset >= self.end {
            return 0;
        }
        let next = match self.offsets.binary_search(&offset) {
            Ok(i) => self.offsets.get(i + 1).copied(),
            Err(i) => self.offsets.get(i).copied(),
        };
        next.unwrap_or(self.end).min(self.end) - offset
    }
}

/// Read an 8-byte, NUL-padded resource reference
#[must_use]
pub fn read_resref(bytes: &[u8]) -> String {
    read_cstr(&bytes[..bytes.len().min(8)])
}

/// Read a NUL-terminated (or NUL-padded) ASCII field
#[must_use]
pub fn read_cstr(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).into_owned()
}

/// Encode a resource reference as 8 NUL-padded bytes
#[must_use]
pub fn resref_bytes(name: &str) -> [u8; 8] {
    let mut out = [0u8; 8];
    let bytes = name.as_bytes();
    let len = bytes.len().min(8);
    out[..len].copy_from_slice(&bytes[..len]);
    out
}

/// Overwrite a little-endian u32 at `pos` in an output buffer (offset back-patching)
pub fn patch_u32(buffer: &mut [u8], pos: usize, value: u32) {
    LittleEndian::write_u32(&mut buffer[pos..pos + 4], value);
}

pub fn patch_u16(buffer: &mut [u8], pos: usize, value: u16) {
    LittleEndian::write_u16(&mut buffer[pos..pos + 2], value);
}

pub fn patch_i16(buffer: &mut [u8], pos: usize, value: i16) {
    LittleEndian::write_i16(&mut buffer[pos..pos + 2], value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_rejects_out_of_bounds() {
        let data = [1u8, 2, 3, 4];
        let span = ByteSpan::new(&data);
        assert!(span.slice(2, 2).is_ok());
        assert!(matches!(span.slice(3, 2), Err(Error::OutOfBounds { offset: 3, len: 2, size: 4 })));
        assert!(span.slice(usize::MAX, 2).is_err());
    }

    #[test]
    fn test_records_checks_whole_table() {
        let data = [0u8; 10];
        let span = ByteSpan::new(&data);
        assert_eq!(span.records(0, 2, 4).unwrap().len(), 2);
        assert!(span.records(0, 3, 4).is_err());
        assert!(span.records(0, usize::MAX, 4).is_err());
    }

    #[test]
    fn test_offset_index_distance() {
        let mut index = OffsetIndex::new(100);
        for off in [40, 10, 70, 10] {
            index.push(off);
        }
        index.sort();
        assert_eq!(index.length_from(10), 30);
        assert_eq!(index.length_from(70), 30);
        assert_eq!(index.length_from(50), 20);
        assert_eq!(index.length_from(120), 0);
    }

    #[test]
    fn test_resref_round_trip() {
        let bytes = resref_bytes("AR0100");
        assert_eq!(&bytes, b"AR0100\0\0");
        assert_eq!(read_resref(&bytes), "AR0100");
        assert_eq!(read_resref(b"LONGNAME"), "LONGNAME");
    }
}
