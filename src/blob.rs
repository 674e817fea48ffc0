//! Blob streams.
//!
//! Blobs are read and written in segments of at most 32767 bytes. A
//! `BlobReader` is only ever opened for reading and a `BlobWriter` only for
//! writing; both are closed by the scope that handed them out.

use std::io;

use crate::error::{Error, Result};
use crate::lifecycle::{Context, SlotId};
use crate::protocol::types::BlobId;

fn io_error(e: Error) -> io::Error {
    match e {
        Error::Io(e) => e,
        other => io::Error::other(other),
    }
}

/// Close `blob` after `result` was computed from it. The first error wins.
fn finish<T>(ctx: &mut Context, blob: SlotId, result: Result<T>) -> Result<T> {
    let closed = ctx.close_blob(blob);
    match result {
        Ok(value) => closed.map(|_| value),
        Err(e) => {
            if let Err(close_err) = closed {
                tracing::warn!(error = %close_err, "failed to close blob");
            }
            Err(e)
        }
    }
}

/// An open blob, read side.
pub struct BlobReader<'a> {
    ctx: &'a mut Context,
    slot: SlotId,
}

impl<'a> BlobReader<'a> {
    pub(crate) fn scoped<T>(
        ctx: &'a mut Context,
        tr: SlotId,
        id: BlobId,
        f: impl FnOnce(&mut BlobReader<'_>) -> Result<T>,
    ) -> Result<T> {
        let slot = ctx.open_blob(tr, id)?;
        let result = f(&mut BlobReader { ctx: &mut *ctx, slot });
        finish(ctx, slot, result)
    }

    /// Id of the blob.
    pub fn id(&self) -> Result<BlobId> {
        self.ctx.blob_id(self.slot)
    }

    /// Total length in bytes.
    pub fn length(&mut self) -> Result<u64> {
        self.ctx.blob_length(self.slot)
    }

    /// Read one segment into `buf`. Returns 0 at end of blob.
    pub fn read_segment(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ctx.get_segment(self.slot, buf)
    }
}

impl io::Read for BlobReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.read_segment(buf).map_err(io_error)
    }
}

/// A new blob, write side.
pub struct BlobWriter<'a> {
    ctx: &'a mut Context,
    slot: SlotId,
}

impl<'a> BlobWriter<'a> {
    pub(crate) fn scoped(
        ctx: &'a mut Context,
        tr: SlotId,
        f: impl FnOnce(&mut BlobWriter<'_>) -> Result<()>,
    ) -> Result<BlobId> {
        let slot = ctx.create_blob(tr)?;
        let result = ctx
            .blob_id(slot)
            .and_then(|id| f(&mut BlobWriter { ctx: &mut *ctx, slot }).map(|_| id));
        finish(ctx, slot, result)
    }

    /// Id the blob will be stored under.
    pub fn id(&self) -> Result<BlobId> {
        self.ctx.blob_id(self.slot)
    }

    /// Append `data`, split into segments.
    pub fn write_all_segments(&mut self, data: &[u8]) -> Result<()> {
        self.ctx.put_segments(self.slot, data)
    }
}

impl io::Write for BlobWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_all_segments(buf).map_err(io_error)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use crate::client::loopback::LoopbackClient;
    use crate::error::Error;
    use crate::Attachment;

    #[test]
    fn test_write_then_read_large() {
        let client = LoopbackClient::new();
        let mut att = Attachment::attach(client.clone(), "test.fdb", &[]).unwrap();
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();

        let read = att
            .transaction(|tr| {
                let id = tr.create_blob(|w| {
                    w.write_all(&data)?;
                    Ok(())
                })?;
                tr.open_blob(id, |r| {
                    assert_eq!(r.length()?, data.len() as u64);
                    let mut out = Vec::new();
                    r.read_to_end(&mut out)?;
                    Ok(out)
                })
            })
            .unwrap();
        assert_eq!(read, data);
        assert_eq!(client.stats().blobs, 0);
    }

    #[test]
    fn test_open_unknown_blob() {
        let mut att = Attachment::attach(LoopbackClient::new(), "test.fdb", &[]).unwrap();
        let err = att
            .transaction(|tr| tr.open_blob(crate::BlobId(9999), |_| Ok(())))
            .unwrap_err();
        assert!(matches!(err, Error::Native { .. }));
    }

    #[test]
    fn test_reader_is_io_read() {
        let client = LoopbackClient::new();
        let id = client.insert_blob(b"abc".to_vec());
        let mut att = Attachment::attach(client, "test.fdb", &[]).unwrap();
        att.transaction(|tr| {
            tr.open_blob(id, |r| {
                let mut s = String::new();
                r.read_to_string(&mut s)?;
                assert_eq!(s, "abc");
                Ok(())
            })
        })
        .unwrap();
    }
}
