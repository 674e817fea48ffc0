//! Byte buffers for parameter blocks and info replies.
//!
//! `BlockWriter` is the sink behind the two-pass parameter block builder: the
//! first pass only counts bytes, the second writes them into a buffer that was
//! allocated with the exact size. `ReadBuffer` walks the clumplet-style replies
//! of `isc_blob_info` and `isc_dsql_sql_info`.

use crate::error::{Error, Result};
use crate::protocol::constants::{ISC_INFO_END, ISC_INFO_ERROR, ISC_INFO_TRUNCATED};
use bytes::{BufMut, Bytes, BytesMut};

/// Write sink that either counts or fills.
#[derive(Debug)]
pub enum BlockWriter {
    /// Counting pass: no buffer exists yet.
    Counting(usize),
    /// Filling pass over a pre-sized buffer.
    Filling(BytesMut),
}

impl BlockWriter {
    /// Create a sink for the counting pass.
    pub fn counting() -> Self {
        BlockWriter::Counting(0)
    }

    /// Create a sink for the filling pass with exactly `capacity` bytes reserved.
    pub fn filling(capacity: usize) -> Self {
        BlockWriter::Filling(BytesMut::with_capacity(capacity))
    }

    /// Number of bytes counted or written so far.
    pub fn len(&self) -> usize {
        match self {
            BlockWriter::Counting(n) => *n,
            BlockWriter::Filling(buf) => buf.len(),
        }
    }

    /// Check if nothing has been counted or written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, val: u8) {
        match self {
            BlockWriter::Counting(n) => *n += 1,
            BlockWriter::Filling(buf) => buf.put_u8(val),
        }
    }

    /// Write a big-endian u16.
    pub fn write_u16_be(&mut self, val: u16) {
        match self {
            BlockWriter::Counting(n) => *n += 2,
            BlockWriter::Filling(buf) => buf.put_u16(val),
        }
    }

    /// Write a big-endian u32.
    pub fn write_u32_be(&mut self, val: u32) {
        match self {
            BlockWriter::Counting(n) => *n += 4,
            BlockWriter::Filling(buf) => buf.put_u32(val),
        }
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        match self {
            BlockWriter::Counting(n) => *n += bytes.len(),
            BlockWriter::Filling(buf) => buf.extend_from_slice(bytes),
        }
    }

    /// Freeze the written bytes. The counting pass yields an empty buffer.
    pub fn freeze(self) -> Bytes {
        match self {
            BlockWriter::Counting(_) => Bytes::new(),
            BlockWriter::Filling(buf) => buf.freeze(),
        }
    }
}

/// A buffer for reading info replies.
pub struct ReadBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ReadBuffer<'a> {
    /// Create a new read buffer over a reply.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Get the remaining bytes in the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        let val = *self
            .data
            .get(self.pos)
            .ok_or_else(|| Error::protocol("info reply ended early"))?;
        self.pos += 1;
        Ok(val)
    }

    /// Read a little-endian u16.
    pub fn read_u16_le(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Read `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::protocol(format!(
                "info reply needs {} bytes, {} left",
                n,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read the next `(item, value)` clumplet.
    ///
    /// Returns `Ok(None)` at `isc_info_end` or when the buffer is exhausted.
    pub fn next_item(&mut self) -> Result<Option<(u8, &'a [u8])>> {
        if self.remaining() == 0 {
            return Ok(None);
        }
        let item = self.read_u8()?;
        match item {
            ISC_INFO_END => Ok(None),
            ISC_INFO_TRUNCATED => Err(Error::protocol("info reply truncated")),
            ISC_INFO_ERROR => Err(Error::protocol("info item not supported")),
            _ => {
                let len = self.read_u16_le()? as usize;
                let value = self.read_bytes(len)?;
                Ok(Some((item, value)))
            }
        }
    }

    /// Find `wanted` in the reply and decode its value as a little-endian integer.
    pub fn find_int(mut self, wanted: u8) -> Result<Option<i64>> {
        while let Some((item, value)) = self.next_item()? {
            if item == wanted {
                return Ok(Some(vax_integer(value)));
            }
        }
        Ok(None)
    }
}

/// Decode a little-endian integer of up to 8 bytes, as `isc_portable_integer` does.
pub fn vax_integer(bytes: &[u8]) -> i64 {
    let mut value: i64 = 0;
    for (shift, byte) in bytes.iter().take(8).enumerate() {
        value |= (*byte as i64) << (8 * shift);
    }
    // sign-extend from the top byte that was read
    let width = bytes.len().min(8);
    if width > 0 && width < 8 && bytes[width - 1] & 0x80 != 0 {
        value |= -1i64 << (8 * width);
    }
    value
}
