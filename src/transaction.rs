//! Transactions.
//!
//! A `Transaction` borrows its attachment mutably, so while it is alive every
//! statement, record set and blob goes through it. It ends with an explicit
//! commit or rollback; a transaction dropped while still active is rolled
//! back.

use crate::blob::{BlobReader, BlobWriter};
use crate::error::Result;
use crate::lifecycle::{Context, SlotId};
use crate::protocol::types::BlobId;
use crate::statement::Statement;

/// An active (or ended) transaction.
pub struct Transaction<'a> {
    ctx: &'a mut Context,
    slot: SlotId,
}

impl<'a> Transaction<'a> {
    pub(crate) fn begin(ctx: &'a mut Context, tpb: &[u8]) -> Result<Self> {
        let slot = ctx.begin(tpb)?;
        Ok(Self { ctx, slot })
    }

    /// Whether the transaction still holds a native handle.
    ///
    /// A non-retaining commit or rollback ends it.
    pub fn is_active(&self) -> bool {
        self.ctx.tr_handle(self.slot).is_ok()
    }

    /// Commit and end the transaction. A no-op once it has ended.
    pub fn commit(&mut self) -> Result<()> {
        self.ctx.commit(self.slot, false)
    }

    /// Commit and keep the transaction usable.
    pub fn commit_retaining(&mut self) -> Result<()> {
        self.ctx.commit(self.slot, true)
    }

    /// Roll back and end the transaction. A no-op once it has ended.
    pub fn rollback(&mut self) -> Result<()> {
        self.ctx.rollback(self.slot, false)
    }

    /// Roll back and keep the transaction usable.
    pub fn rollback_retaining(&mut self) -> Result<()> {
        self.ctx.rollback(self.slot, true)
    }

    /// Execute a statement without preparing it.
    pub fn execute(&mut self, sql: &str) -> Result<()> {
        self.ctx.execute_immediate(self.slot, sql)
    }

    /// Prepare a statement. It is dropped when the guard goes out of scope.
    pub fn prepare(&mut self, sql: &str) -> Result<Statement<'_>> {
        Statement::prepare(&mut *self.ctx, self.slot, sql, None)
    }

    /// Prepare a statement with a named cursor, for `WHERE CURRENT OF`.
    pub fn prepare_with_cursor(&mut self, sql: &str, cursor: &str) -> Result<Statement<'_>> {
        Statement::prepare(&mut *self.ctx, self.slot, sql, Some(cursor))
    }

    /// Prepare `sql`, run `f` on it, then drop the statement.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fbclient_rs::{Attachment, LoopbackClient};
    ///
    /// # fn main() -> fbclient_rs::Result<()> {
    /// let mut att = Attachment::attach(LoopbackClient::new(), "employee.fdb", &[])?;
    /// att.transaction(|tr| {
    ///     tr.statement("UPDATE EMPLOYEE SET SALARY = SALARY * ? WHERE DEPT_NO = ?", |stmt| {
    ///         let mut params = stmt.params()?;
    ///         params.set_f64(0, 1.05)?;
    ///         params.set_string(1, "600")?;
    ///         stmt.execute()
    ///     })
    /// })?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn statement<T>(
        &mut self,
        sql: &str,
        f: impl FnOnce(&mut Statement<'_>) -> Result<T>,
    ) -> Result<T> {
        Statement::scoped(&mut *self.ctx, self.slot, sql, None, f)
    }

    /// Like [`Transaction::statement`], naming the cursor.
    pub fn statement_with_cursor<T>(
        &mut self,
        sql: &str,
        cursor: &str,
        f: impl FnOnce(&mut Statement<'_>) -> Result<T>,
    ) -> Result<T> {
        Statement::scoped(&mut *self.ctx, self.slot, sql, Some(cursor), f)
    }

    /// Open an existing blob for reading. The blob is closed when `f` returns.
    pub fn open_blob<T>(
        &mut self,
        id: BlobId,
        f: impl FnOnce(&mut BlobReader<'_>) -> Result<T>,
    ) -> Result<T> {
        BlobReader::scoped(&mut *self.ctx, self.slot, id, f)
    }

    /// Create a blob, let `f` write it, close it and return its id.
    pub fn create_blob(&mut self, f: impl FnOnce(&mut BlobWriter<'_>) -> Result<()>) -> Result<BlobId> {
        BlobWriter::scoped(&mut *self.ctx, self.slot, f)
    }

    /// Whole content of a blob.
    pub fn read_blob(&mut self, id: BlobId) -> Result<Vec<u8>> {
        Ok(self.ctx.read_blob(self.slot, id)?.to_vec())
    }

    /// Store `data` in a new blob.
    pub fn write_blob(&mut self, data: &[u8]) -> Result<BlobId> {
        self.ctx.write_blob(self.slot, data)
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.is_active() {
            tracing::warn!("transaction dropped while active, rolling back");
            if let Err(e) = self.ctx.rollback(self.slot, false) {
                tracing::warn!(error = %e, "rollback on drop failed");
            }
        }
        self.ctx.release_transaction(self.slot);
    }
}

#[cfg(test)]
mod tests {
    use crate::client::loopback::LoopbackClient;
    use crate::error::Error;
    use crate::Attachment;

    #[test]
    fn test_drop_rolls_back() {
        let client = LoopbackClient::new();
        let mut att = Attachment::attach(client.clone(), "test.fdb", &[]).unwrap();
        {
            let tr = att.begin().unwrap();
            assert!(tr.is_active());
        }
        let stats = client.stats();
        assert_eq!(stats.rollbacks, 1);
        assert_eq!(stats.transactions, 0);
        assert_eq!(att.pool_stats().transactions, 1);
    }

    #[test]
    fn test_commit_ends_transaction() {
        let client = LoopbackClient::new();
        let mut att = Attachment::attach(client.clone(), "test.fdb", &[]).unwrap();
        let mut tr = att.begin().unwrap();
        tr.commit_retaining().unwrap();
        assert!(tr.is_active());
        tr.commit().unwrap();
        assert!(!tr.is_active());
        assert!(matches!(tr.execute("DELETE FROM T"), Err(Error::InvalidHandle)));
        // ended transactions accept commit and rollback as no-ops
        tr.commit().unwrap();
        tr.rollback().unwrap();
        drop(tr);
        let stats = client.stats();
        assert_eq!(stats.commits, 1);
        assert_eq!(stats.commits_retaining, 1);
        assert_eq!(stats.rollbacks, 0);
    }

    #[test]
    fn test_blob_round_trip() {
        let mut att = Attachment::attach(LoopbackClient::new(), "test.fdb", &[]).unwrap();
        att.transaction(|tr| {
            let id = tr.write_blob(b"hello blob")?;
            assert_eq!(tr.read_blob(id)?, b"hello blob");
            Ok(())
        })
        .unwrap();
        assert_eq!(att.pool_stats().blobs, 1);
    }
}
