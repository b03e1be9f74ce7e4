use byteorder::{BigEndian, ByteOrder};
use crate::{Error, Result};

/// Growable big-endian byte buffer with a read cursor.
///
/// Writes always append; reads advance the cursor and fail with a decode
/// error when fewer bytes remain than requested.
#[derive(Debug, Clone, Default)]
pub struct ByteBuffer {
    buffer: Vec<u8>,
    cursor: usize,
}

impl ByteBuffer {
    /// Create a new ByteBuffer from bytes
    pub fn new(data: Vec<u8>) -> Self {
        ByteBuffer {
            buffer: data,
            cursor: 0,
        }
    }

    /// Create an empty ByteBuffer with capacity
    pub fn with_capacity(capacity: usize) -> Self {
        ByteBuffer {
            buffer: Vec::with_capacity(capacity),
            cursor: 0,
        }
    }

    /// Get current cursor position
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Get remaining bytes from current position
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.cursor)
    }

    /// Check if buffer has at least n bytes remaining
    pub fn has_remaining(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    fn take(&mut self, len: usize) -> Result<&[u8]> {
        if !self.has_remaining(len) {
            return Err(Error::decode(format!(
                "Need {} bytes at offset {}, only {} left",
                len,
                self.cursor,
                self.remaining()
            )));
        }
        let start = self.cursor;
        self.cursor += len;
        Ok(&self.buffer[start..start + len])
    }

    /// Read bytes into buffer
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        Ok(self.take(len)?.to_vec())
    }

    /// Write bytes to buffer
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    pub fn write_u32_be(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        BigEndian::write_u32(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    pub fn read_u64_be(&mut self) -> Result<u64> {
        Ok(BigEndian::read_u64(self.take(8)?))
    }

    pub fn write_u64_be(&mut self, value: u64) {
        let mut bytes = [0u8; 8];
        BigEndian::write_u64(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    pub fn read_i32_be(&mut self) -> Result<i32> {
        Ok(BigEndian::read_i32(self.take(4)?))
    }

    pub fn write_i32_be(&mut self, value: i32) {
        let mut bytes = [0u8; 4];
        BigEndian::write_i32(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    pub fn read_i64_be(&mut self) -> Result<i64> {
        Ok(BigEndian::read_i64(self.take(8)?))
    }

    pub fn write_i64_be(&mut self, value: i64) {
        let mut bytes = [0u8; 8];
        BigEndian::write_i64(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    pub fn read_f64_be(&mut self) -> Result<f64> {
        Ok(BigEndian::read_f64(self.take(8)?))
    }

    pub fn write_f64_be(&mut self, value: f64) {
        let mut bytes = [0u8; 8];
        BigEndian::write_f64(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    /// Get slice of underlying buffer
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the buffer, returning its bytes
    pub fn into_vec(self) -> Vec<u8> {
        self.buffer
    }

    /// Get length of buffer
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
