//! Bounds-checked little-endian reader over a borrowed byte slice.

use crate::error::{DecodeError, Result};

/// Forward-only reader. Every read either returns the requested bytes or
/// fails with [`DecodeError::UnexpectedEof`] without advancing.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Start reading at `pos`; a position past the end leaves nothing to read.
    pub fn with_position(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Up to `n` upcoming bytes, without advancing. Diagnostics only.
    pub fn peek(&self, n: usize) -> &'a [u8] {
        let start = self.pos.min(self.data.len());
        let end = start + n.min(self.remaining());
        &self.data[start..end]
    }

    pub(crate) fn eof(&self, needed: u64) -> DecodeError {
        DecodeError::UnexpectedEof {
            offset: self.pos,
            needed,
            remaining: self.remaining(),
        }
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(self.eof(n as u64));
        }
        let start = self.pos.min(self.data.len());
        let bytes = &self.data[start..start + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Advance past `n` bytes without materializing them.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        match usize::try_from(n) {
            Ok(len) if len <= self.remaining() => {
                self.pos += len;
                Ok(())
            }
            _ => Err(self.eof(n)),
        }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.read_bytes(N)?);
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_le_bytes(self.read_array()?))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_fields() {
        let mut data = Vec::new();
        data.push(0xffu8);
        data.extend_from_slice(&0x1234u16.to_le_bytes());
        data.extend_from_slice(&(-7i32).to_le_bytes());
        data.extend_from_slice(&u64::MAX.to_le_bytes());
        data.extend_from_slice(&1.5f32.to_le_bytes());
        data.extend_from_slice(&(-2.25f64).to_le_bytes());

        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_i8().unwrap(), -1);
        assert_eq!(c.read_u16().unwrap(), 0x1234);
        assert_eq!(c.read_i32().unwrap(), -7);
        assert_eq!(c.read_u64().unwrap(), u64::MAX);
        assert_eq!(c.read_f32().unwrap(), 1.5);
        assert_eq!(c.read_f64().unwrap(), -2.25);
        assert!(c.is_empty());
        assert_eq!(c.position(), data.len());
    }

    #[test]
    fn short_read_fails_without_advancing() {
        let data = [1u8, 2, 3];
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_u8().unwrap(), 1);
        let err = c.read_u32().unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnexpectedEof {
                offset: 1,
                needed: 4,
                remaining: 2
            }
        );
        assert_eq!(c.position(), 1);
        assert_eq!(c.read_u16().unwrap(), u16::from_le_bytes([2, 3]));
    }

    #[test]
    fn skip_rejects_lengths_past_end() {
        let data = [0u8; 16];
        let mut c = ByteCursor::new(&data);
        c.skip(10).unwrap();
        assert!(c.skip(7).is_err());
        assert!(c.skip(u64::MAX).is_err());
        assert_eq!(c.position(), 10);
        c.skip(6).unwrap();
        assert!(c.is_empty());
    }

    #[test]
    fn peek_does_not_advance() {
        let data = *b"GGUF\x03";
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.peek(64), b"GGUF\x03");
        assert_eq!(c.read_bytes(4).unwrap(), b"GGUF");
        assert_eq!(c.peek(2), b"\x03");
        assert_eq!(c.position(), 4);
    }

    #[test]
    fn position_past_end_reads_nothing() {
        let data = [0u8; 4];
        let mut c = ByteCursor::with_position(&data, 9);
        assert_eq!(c.remaining(), 0);
        assert!(c.peek(4).is_empty());
        assert!(c.read_u8().is_err());
    }
}
