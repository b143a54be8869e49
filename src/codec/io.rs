//! Little-endian primitives for the snapshot wire format.

use std::io::Write;

use crate::utils::error::CodecError;

type Result<T> = std::result::Result<T, CodecError>;

pub trait WriteLeExt: Write {
    fn write_u8(&mut self, v: u8) -> Result<()> {
        self.write_all(&[v])?;
        Ok(())
    }

    fn write_u32_le(&mut self, v: u32) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    fn write_u64_le(&mut self, v: u64) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    fn write_i64_le(&mut self, v: i64) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    /// Write a collection length into a u32 count field
    fn write_len_u32(&mut self, what: &'static str, len: usize) -> Result<()> {
        let len: u32 = len
            .try_into()
            .map_err(|_| CodecError::TooLarge { what, len })?;
        self.write_u32_le(len)
    }

    fn write_string_u32(&mut self, s: &str) -> Result<()> {
        self.write_len_u32("string length", s.len())?;
        self.write_all(s.as_bytes())?;
        Ok(())
    }
}

impl<T: Write + ?Sized> WriteLeExt for T {}

/// Cursor over an in-memory snapshot.
///
/// Every read names the field it is decoding so a short buffer surfaces as
/// `CodecError::TruncatedData` pointing at the exact field.
pub struct SliceReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn read_bytes(&mut self, field: &'static str, len: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if len > available {
            return Err(CodecError::TruncatedData {
                field,
                needed: len,
                available,
            });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(field, N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8> {
        Ok(self.read_array::<1>(field)?[0])
    }

    pub fn read_u32_le(&mut self, field: &'static str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array(field)?))
    }

    pub fn read_u64_le(&mut self, field: &'static str) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array(field)?))
    }

    pub fn read_i64_le(&mut self, field: &'static str) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array(field)?))
    }

    /// Read a u32 element count and size a vector for it.
    ///
    /// Capacity is bounded by what the remaining bytes could possibly hold,
    /// so a corrupt count cannot trigger a huge allocation.
    pub fn read_count<T>(&mut self, field: &'static str, min_wire_size: usize) -> Result<(usize, Vec<T>)> {
        let count = self.read_u32_le(field)? as usize;
        let plausible = self.remaining() / min_wire_size.max(1);
        Ok((count, Vec::with_capacity(count.min(plausible))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_little_endian() {
        let mut buf = Vec::new();
        buf.write_u32_le(0x0102_0304).unwrap();
        buf.write_i64_le(-2).unwrap();
        assert_eq!(&buf[..4], &[4, 3, 2, 1]);
        assert_eq!(&buf[4..], &[0xfe, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn test_read_past_end_is_truncation() {
        let mut reader = SliceReader::new(&[1, 2, 3]);
        let err = reader.read_u32_le("segment_count").unwrap_err();
        match err {
            CodecError::TruncatedData {
                field,
                needed,
                available,
            } => {
                assert_eq!(field, "segment_count");
                assert_eq!(needed, 4);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        // Failed reads do not consume input
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_read_count_bounds_capacity() {
        let mut reader = SliceReader::new(&[0xff, 0xff, 0xff, 0xff, 0, 0]);
        let (count, vec) = reader.read_count::<u64>("entry_count", 8).unwrap();
        assert_eq!(count, u32::MAX as usize);
        assert!(vec.capacity() < 16);
    }
}
