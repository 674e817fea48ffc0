//! Slot pools and the per-attachment context.
//!
//! Every scoped resource (transaction, statement, record set, blob and the
//! descriptor buffers behind records) lives in a `SlotPool` owned by the
//! attachment's `Context`. Scope views hold a `SlotId` into the pool instead
//! of owning the resource, so acquiring a resource on the fast path reuses a
//! released slot and allocates nothing.
//!
//! `Context` is also where native calls are made: it owns the client, the
//! status context and the database handle, and keeps the handles stored in
//! slots in step with what the client returns.

use bytes::Bytes;

use crate::client::{check, Client, Handle};
use crate::error::{Error, Result};
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::constants::{
    DSQL_CLOSE, DSQL_DROP, FETCH_NO_MORE_ROWS, ISC_INFO_BLOB_TOTAL_LENGTH, ISC_INFO_SQL_STMT_TYPE,
    ISC_SEGMENT, ISC_SEGSTR_EOF, MAX_SEGMENT_SIZE,
};
use crate::protocol::types::{BlobId, Sqlda};

/// Index of a slot plus the generation it was handed out in.
///
/// A stale id (its slot was released and reused since) no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    index: u32,
    generation: u32,
}

/// State kept in a pool slot.
pub trait Slot: Default {
    /// Return the slot to its pristine state before it goes back on the free-list.
    fn reset(&mut self);
}

#[derive(Debug)]
struct Entry<T> {
    value: T,
    generation: u32,
    live: bool,
    next_free: Option<u32>,
}

impl<T> Entry<T> {
    fn holds(&self, id: SlotId) -> bool {
        self.live && self.generation == id.generation
    }
}

/// Arena of reusable slots with an intrusive free-list of indices.
#[derive(Debug)]
pub struct SlotPool<T> {
    entries: Vec<Entry<T>>,
    free_head: Option<u32>,
    in_use: usize,
}

impl<T> Default for SlotPool<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            free_head: None,
            in_use: 0,
        }
    }
}

impl<T: Slot> SlotPool<T> {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a slot, reusing the free-list head when there is one.
    pub fn acquire(&mut self) -> SlotId {
        self.in_use += 1;
        if let Some(index) = self.free_head {
            let entry = &mut self.entries[index as usize];
            self.free_head = entry.next_free.take();
            entry.generation = entry.generation.wrapping_add(1);
            entry.live = true;
            return SlotId {
                index,
                generation: entry.generation,
            };
        }
        let index = self.entries.len() as u32;
        self.entries.push(Entry {
            value: T::default(),
            generation: 0,
            live: true,
            next_free: None,
        });
        SlotId { index, generation: 0 }
    }

    /// Reset a slot and push it on the free-list.
    ///
    /// Returns false if `id` was already released.
    pub fn release(&mut self, id: SlotId) -> bool {
        let head = self.free_head;
        let Some(entry) = self.entry_mut(id) else {
            return false;
        };
        entry.value.reset();
        entry.live = false;
        entry.next_free = head;
        self.free_head = Some(id.index);
        self.in_use -= 1;
        true
    }

    fn entry_mut(&mut self, id: SlotId) -> Option<&mut Entry<T>> {
        self.entries.get_mut(id.index as usize).filter(|e| e.holds(id))
    }

    /// The slot behind `id`, if it is still held.
    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.entries
            .get(id.index as usize)
            .filter(|e| e.holds(id))
            .map(|e| &e.value)
    }

    /// A shared view of one slot together with an exclusive view of another.
    pub fn split(&mut self, shared: Option<SlotId>, exclusive: Option<SlotId>) -> (Option<&T>, Option<&mut T>) {
        match (shared, exclusive) {
            (Some(a), Some(b)) if a.index != b.index => {
                let (ai, bi) = (a.index as usize, b.index as usize);
                if ai < bi {
                    let (lo, hi) = self.entries.split_at_mut(bi);
                    let x = lo.get(ai).filter(|e| e.holds(a)).map(|e| &e.value);
                    let y = hi.first_mut().filter(|e| e.holds(b)).map(|e| &mut e.value);
                    (x, y)
                } else {
                    let (lo, hi) = self.entries.split_at_mut(ai);
                    let y = lo.get_mut(bi).filter(|e| e.holds(b)).map(|e| &mut e.value);
                    let x = hi.first().filter(|e| e.holds(a)).map(|e| &e.value);
                    (x, y)
                }
            }
            (Some(a), None) => (self.get(a), None),
            (_, Some(b)) => (None, self.get_mut(b)),
            (None, None) => (None, None),
        }
    }

    /// The slot behind `id`, mutable.
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.entry_mut(id).map(|e| &mut e.value)
    }

    /// Distinct slots ever created.
    pub fn allocated(&self) -> usize {
        self.entries.len()
    }

    /// Slots currently held.
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Ids of every held slot.
    pub fn live_ids(&self) -> Vec<SlotId> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.live)
            .map(|(i, e)| SlotId {
                index: i as u32,
                generation: e.generation,
            })
            .collect()
    }

    /// Drop every slot.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.free_head = None;
        self.in_use = 0;
    }
}

impl Slot for Sqlda {
    fn reset(&mut self) {
        self.clear();
    }
}

#[derive(Debug, Default)]
pub(crate) struct TransactionSlot {
    pub handle: Handle,
}

impl Slot for TransactionSlot {
    fn reset(&mut self) {
        self.handle = 0;
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatementSlot {
    pub handle: Handle,
    pub output: Option<SlotId>,
    pub input: Option<SlotId>,
}

impl Slot for StatementSlot {
    fn reset(&mut self) {
        self.handle = 0;
        self.output = None;
        self.input = None;
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordSetSlot {
    pub eof: bool,
}

impl Slot for RecordSetSlot {
    fn reset(&mut self) {
        self.eof = false;
    }
}

#[derive(Debug, Default)]
pub(crate) struct BlobSlot {
    pub handle: Handle,
    pub id: BlobId,
}

impl Slot for BlobSlot {
    fn reset(&mut self) {
        self.handle = 0;
        self.id = BlobId::NULL;
    }
}

/// Slot counts of each pool, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub transactions: usize,
    pub statements: usize,
    pub descriptors: usize,
    pub record_sets: usize,
    pub blobs: usize,
}

/// Everything a scope view needs: the client, status and database handle,
/// the dialect and the pools.
pub(crate) struct Context {
    client: Box<dyn Client>,
    status: Handle,
    db: Handle,
    pub dialect: u16,
    pub descriptors: SlotPool<Sqlda>,
    pub transactions: SlotPool<TransactionSlot>,
    pub statements: SlotPool<StatementSlot>,
    pub record_sets: SlotPool<RecordSetSlot>,
    pub blobs: SlotPool<BlobSlot>,
}

impl Context {
    /// Attach (or create) a database. Partial allocations are freed on failure.
    pub fn open(mut client: Box<dyn Client>, path: &str, dpb: &[u8], create: bool, dialect: u16) -> Result<Self> {
        let status = client.alloc_status();
        let mut db = 0;
        let code = if create {
            client.create_database(status, &mut db, path, dpb)
        } else {
            client.attach_database(status, &mut db, path, dpb)
        };
        if let Err(e) = check(client.as_mut(), status, code) {
            client.free_status(status);
            return Err(e);
        }
        tracing::debug!(path, create, "attached database");
        Ok(Self {
            client,
            status,
            db,
            dialect,
            descriptors: SlotPool::new(),
            transactions: SlotPool::new(),
            statements: SlotPool::new(),
            record_sets: SlotPool::new(),
            blobs: SlotPool::new(),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.db == 0
    }

    /// Detach, free the status context and clear every pool.
    ///
    /// The handles are released even when the detach fails; the failure is
    /// still returned. A second call is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.db == 0 {
            return Ok(());
        }
        let code = self.client.detach_database(self.status, &mut self.db);
        let detached = self.check(code);
        self.client.free_status(self.status);
        self.status = 0;
        self.db = 0;
        self.descriptors.clear();
        self.transactions.clear();
        self.statements.clear();
        self.record_sets.clear();
        self.blobs.clear();
        if detached.is_ok() {
            tracing::debug!("detached database");
        }
        detached
    }

    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            transactions: self.transactions.allocated(),
            statements: self.statements.allocated(),
            descriptors: self.descriptors.allocated(),
            record_sets: self.record_sets.allocated(),
            blobs: self.blobs.allocated(),
        }
    }

    fn check(&mut self, code: i64) -> Result<()> {
        check(self.client.as_mut(), self.status, code)
    }

    fn db(&self) -> Result<Handle> {
        match self.db {
            0 => Err(Error::InvalidHandle),
            db => Ok(db),
        }
    }

    /// Live native handle of a transaction.
    pub fn tr_handle(&self, tr: SlotId) -> Result<Handle> {
        match self.transactions.get(tr).map(|t| t.handle) {
            Some(h) if h != 0 => Ok(h),
            _ => Err(Error::InvalidHandle),
        }
    }

    fn stmt_handle(&self, stmt: SlotId) -> Result<Handle> {
        match self.statements.get(stmt).map(|s| s.handle) {
            Some(h) if h != 0 => Ok(h),
            _ => Err(Error::InvalidHandle),
        }
    }

    pub fn descriptor(&self, id: SlotId) -> Result<&Sqlda> {
        self.descriptors.get(id).ok_or(Error::InvalidHandle)
    }

    pub fn descriptor_mut(&mut self, id: SlotId) -> Result<&mut Sqlda> {
        self.descriptors.get_mut(id).ok_or(Error::InvalidHandle)
    }

    // ---- transactions ----

    pub fn begin(&mut self, tpb: &[u8]) -> Result<SlotId> {
        let mut db = self.db()?;
        let mut tr = 0;
        let code = self.client.start_transaction(self.status, &mut tr, &mut db, tpb);
        self.check(code)?;
        let id = self.transactions.acquire();
        if let Some(slot) = self.transactions.get_mut(id) {
            slot.handle = tr;
        }
        tracing::trace!(handle = tr, "started transaction");
        Ok(id)
    }

    /// Commit. A zeroed handle makes this a no-op.
    pub fn commit(&mut self, tr: SlotId, retaining: bool) -> Result<()> {
        self.end_transaction(tr, retaining, true)
    }

    /// Roll back. A zeroed handle makes this a no-op.
    pub fn rollback(&mut self, tr: SlotId, retaining: bool) -> Result<()> {
        self.end_transaction(tr, retaining, false)
    }

    fn end_transaction(&mut self, tr: SlotId, retaining: bool, commit: bool) -> Result<()> {
        let mut handle = match self.transactions.get(tr) {
            Some(slot) => slot.handle,
            None => return Err(Error::InvalidHandle),
        };
        if handle == 0 {
            return Ok(());
        }
        let code = if commit {
            self.client.commit_transaction(self.status, &mut handle, retaining)
        } else {
            self.client.rollback_transaction(self.status, &mut handle, retaining)
        };
        self.check(code)?;
        if let Some(slot) = self.transactions.get_mut(tr) {
            slot.handle = if retaining { slot.handle } else { 0 };
        }
        Ok(())
    }

    pub fn release_transaction(&mut self, tr: SlotId) {
        self.transactions.release(tr);
    }

    pub fn execute_immediate(&mut self, tr: SlotId, sql: &str) -> Result<()> {
        let mut db = self.db()?;
        let mut handle = self.tr_handle(tr)?;
        tracing::trace!(sql, "execute immediate");
        let code = self.client.execute_immediate(self.status, &mut db, &mut handle, self.dialect, sql);
        self.check(code)
    }

    // ---- statements ----

    /// Allocate and prepare a statement, describing its output.
    pub fn prepare(&mut self, tr: SlotId, sql: &str, cursor: Option<&str>) -> Result<SlotId> {
        let mut db = self.db()?;
        let mut tr_handle = self.tr_handle(tr)?;
        let mut handle = 0;
        let code = self.client.allocate_statement(self.status, &mut db, &mut handle);
        self.check(code)?;

        let stmt = self.statements.acquire();
        let output = self.descriptors.acquire();
        if let Some(slot) = self.statements.get_mut(stmt) {
            slot.handle = handle;
            slot.output = Some(output);
        }
        tracing::trace!(sql, "prepare");
        let prepared = match self.descriptors.get_mut(output) {
            Some(da) => self.client.prepare_statement(
                self.status,
                &mut tr_handle,
                &mut handle,
                self.dialect,
                sql,
                da,
            ),
            None => return Err(Error::InvalidHandle),
        };
        let mut result = self.check(prepared);
        if let (Ok(()), Some(name)) = (&result, cursor) {
            let code = self.client.set_cursor_name(self.status, &mut handle, name);
            result = self.check(code);
        }
        if let Err(e) = result {
            if let Err(cleanup) = self.close_statement(stmt) {
                tracing::warn!(error = %cleanup, "failed to drop statement after prepare error");
            }
            return Err(e);
        }
        Ok(stmt)
    }

    /// Output descriptor of a statement.
    pub fn output(&self, stmt: SlotId) -> Result<SlotId> {
        self.statements.get(stmt).and_then(|s| s.output).ok_or(Error::InvalidHandle)
    }

    /// Input descriptor of a statement, described on first use.
    pub fn input(&mut self, stmt: SlotId) -> Result<SlotId> {
        let slot = self.statements.get(stmt).ok_or(Error::InvalidHandle)?;
        if let Some(input) = slot.input {
            return Ok(input);
        }
        let mut handle = self.stmt_handle(stmt)?;
        let input = self.descriptors.acquire();
        let code = match self.descriptors.get_mut(input) {
            Some(da) => self.client.describe_bind(self.status, &mut handle, self.dialect, da),
            None => return Err(Error::InvalidHandle),
        };
        if let Err(e) = self.check(code) {
            self.descriptors.release(input);
            return Err(e);
        }
        if let Some(slot) = self.statements.get_mut(stmt) {
            slot.input = Some(input);
        }
        Ok(input)
    }

    /// Statement type from `isc_info_sql_stmt_type`.
    pub fn statement_type(&mut self, stmt: SlotId) -> Result<u32> {
        let mut handle = self.stmt_handle(stmt)?;
        let mut buffer = [0u8; 16];
        let code = self
            .client
            .sql_info(self.status, &mut handle, &[ISC_INFO_SQL_STMT_TYPE], &mut buffer);
        self.check(code)?;
        match ReadBuffer::new(&buffer).find_int(ISC_INFO_SQL_STMT_TYPE)? {
            Some(kind) => Ok(kind as u32),
            None => Err(Error::protocol("statement type missing from info reply")),
        }
    }

    /// Execute with the bound parameters, receiving a singleton row into the output.
    pub fn execute(&mut self, tr: SlotId, stmt: SlotId) -> Result<()> {
        let mut tr_handle = self.tr_handle(tr)?;
        let mut handle = self.stmt_handle(stmt)?;
        let (input, output) = match self.statements.get(stmt) {
            Some(slot) => (slot.input, slot.output),
            None => return Err(Error::InvalidHandle),
        };
        tracing::trace!(handle, "execute");
        let (input, output) = self.descriptors.split(input, output);
        let code = self
            .client
            .execute2(self.status, &mut tr_handle, &mut handle, self.dialect, input, output);
        self.check(code)
    }

    /// Execute with the bound parameters and leave the cursor open.
    pub fn open_cursor(&mut self, tr: SlotId, stmt: SlotId) -> Result<()> {
        let mut tr_handle = self.tr_handle(tr)?;
        let mut handle = self.stmt_handle(stmt)?;
        let input = self.statements.get(stmt).and_then(|s| s.input);
        tracing::trace!(handle, "open cursor");
        let input = input.and_then(|id| self.descriptors.get(id));
        let code = self
            .client
            .execute(self.status, &mut tr_handle, &mut handle, self.dialect, input);
        self.check(code)
    }

    /// Fetch the next row. Returns false at end of cursor.
    pub fn fetch(&mut self, stmt: SlotId) -> Result<bool> {
        let mut handle = self.stmt_handle(stmt)?;
        let output = self.output(stmt)?;
        let code = match self.descriptors.get_mut(output) {
            Some(da) => self.client.fetch(self.status, &mut handle, da),
            None => return Err(Error::InvalidHandle),
        };
        if code == FETCH_NO_MORE_ROWS {
            return Ok(false);
        }
        self.check(code)?;
        Ok(true)
    }

    pub fn close_cursor(&mut self, stmt: SlotId) -> Result<()> {
        let mut handle = self.stmt_handle(stmt)?;
        let code = self.client.free_statement(self.status, &mut handle, DSQL_CLOSE);
        self.check(code)
    }

    /// Drop the statement, release its descriptors and its slot.
    pub fn close_statement(&mut self, stmt: SlotId) -> Result<()> {
        let Some(slot) = self.statements.get(stmt) else {
            return Ok(());
        };
        let (mut handle, input, output) = (slot.handle, slot.input, slot.output);
        let code = if handle != 0 && self.db != 0 {
            self.client.free_statement(self.status, &mut handle, DSQL_DROP)
        } else {
            0
        };
        for id in [input, output].into_iter().flatten() {
            self.descriptors.release(id);
        }
        self.statements.release(stmt);
        self.check(code)
    }

    // ---- record sets ----

    pub fn acquire_record_set(&mut self) -> SlotId {
        self.record_sets.acquire()
    }

    pub fn release_record_set(&mut self, id: SlotId) {
        self.record_sets.release(id);
    }

    pub fn is_eof(&self, id: SlotId) -> Result<bool> {
        self.record_sets.get(id).map(|r| r.eof).ok_or(Error::InvalidHandle)
    }

    /// Advance a record set. Once at EOF this is a no-op.
    pub fn advance(&mut self, rs: SlotId, stmt: SlotId) -> Result<bool> {
        if self.is_eof(rs)? {
            return Ok(false);
        }
        let more = self.fetch(stmt)?;
        if !more {
            if let Some(slot) = self.record_sets.get_mut(rs) {
                slot.eof = true;
            }
        }
        Ok(more)
    }

    // ---- blobs ----

    pub fn open_blob(&mut self, tr: SlotId, id: BlobId) -> Result<SlotId> {
        let mut db = self.db()?;
        let mut tr_handle = self.tr_handle(tr)?;
        let mut handle = 0;
        let code = self.client.open_blob(self.status, &mut db, &mut tr_handle, &mut handle, id);
        self.check(code)?;
        let slot = self.blobs.acquire();
        if let Some(blob) = self.blobs.get_mut(slot) {
            blob.handle = handle;
            blob.id = id;
        }
        Ok(slot)
    }

    pub fn create_blob(&mut self, tr: SlotId) -> Result<SlotId> {
        let mut db = self.db()?;
        let mut tr_handle = self.tr_handle(tr)?;
        let mut handle = 0;
        let mut id = BlobId::NULL;
        let code = self
            .client
            .create_blob(self.status, &mut db, &mut tr_handle, &mut handle, &mut id);
        self.check(code)?;
        let slot = self.blobs.acquire();
        if let Some(blob) = self.blobs.get_mut(slot) {
            blob.handle = handle;
            blob.id = id;
        }
        Ok(slot)
    }

    fn blob_handle(&self, blob: SlotId) -> Result<Handle> {
        match self.blobs.get(blob).map(|b| b.handle) {
            Some(h) if h != 0 => Ok(h),
            _ => Err(Error::InvalidHandle),
        }
    }

    pub fn blob_id(&self, blob: SlotId) -> Result<BlobId> {
        self.blobs.get(blob).map(|b| b.id).ok_or(Error::InvalidHandle)
    }

    /// Total length from `isc_info_blob_total_length`.
    pub fn blob_length(&mut self, blob: SlotId) -> Result<u64> {
        let mut handle = self.blob_handle(blob)?;
        let mut buffer = [0u8; 16];
        let code = self
            .client
            .blob_info(self.status, &mut handle, &[ISC_INFO_BLOB_TOTAL_LENGTH], &mut buffer);
        self.check(code)?;
        match ReadBuffer::new(&buffer).find_int(ISC_INFO_BLOB_TOTAL_LENGTH)? {
            Some(len) if len >= 0 => Ok(len as u64),
            _ => Err(Error::protocol("blob length missing from info reply")),
        }
    }

    /// Read up to `buf.len()` bytes (capped at one segment). Returns 0 at end of blob.
    pub fn get_segment(&mut self, blob: SlotId, buf: &mut [u8]) -> Result<usize> {
        let mut handle = self.blob_handle(blob)?;
        let len = buf.len().min(MAX_SEGMENT_SIZE);
        let mut actual = 0u16;
        let code = self
            .client
            .get_segment(self.status, &mut handle, &mut actual, &mut buf[..len]);
        match code {
            ISC_SEGSTR_EOF => return Ok(0),
            ISC_SEGMENT => {}
            _ => self.check(code)?,
        }
        Ok(actual as usize)
    }

    /// Write `data` in segments of at most 32767 bytes.
    pub fn put_segments(&mut self, blob: SlotId, data: &[u8]) -> Result<()> {
        let mut handle = self.blob_handle(blob)?;
        for chunk in data.chunks(MAX_SEGMENT_SIZE) {
            let code = self.client.put_segment(self.status, &mut handle, chunk);
            self.check(code)?;
        }
        Ok(())
    }

    /// Close the blob and release its slot.
    pub fn close_blob(&mut self, blob: SlotId) -> Result<()> {
        let Some(slot) = self.blobs.get(blob) else {
            return Ok(());
        };
        let mut handle = slot.handle;
        let code = if handle != 0 && self.db != 0 {
            self.client.close_blob(self.status, &mut handle)
        } else {
            0
        };
        self.blobs.release(blob);
        self.check(code)
    }

    /// Whole content of a blob.
    pub fn read_blob(&mut self, tr: SlotId, id: BlobId) -> Result<Bytes> {
        let blob = self.open_blob(tr, id)?;
        let result = self.read_all(blob);
        let closed = self.close_blob(blob);
        let data = result?;
        closed?;
        Ok(data)
    }

    fn read_all(&mut self, blob: SlotId) -> Result<Bytes> {
        let total = self.blob_length(blob)? as usize;
        let mut data = vec![0u8; total];
        let mut pos = 0;
        while pos < total {
            let n = self.get_segment(blob, &mut data[pos..])?;
            if n == 0 {
                break;
            }
            pos += n;
        }
        data.truncate(pos);
        Ok(Bytes::from(data))
    }

    /// Store `data` in a new blob and return its id.
    pub fn write_blob(&mut self, tr: SlotId, data: &[u8]) -> Result<BlobId> {
        let blob = self.create_blob(tr)?;
        let id = self.blob_id(blob)?;
        let result = self.put_segments(blob, data);
        let closed = self.close_blob(blob);
        result?;
        closed?;
        Ok(id)
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "failed to detach database on drop");
        }
    }
}
