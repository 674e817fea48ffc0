//! High-level attachment API.

use crate::client::Client;
use crate::cursor::RecordSet;
use crate::error::Result;
use crate::lifecycle::{Context, PoolStats};
use crate::protocol::connect::ConnectParams;
use crate::protocol::constants::SQL_DIALECT_CURRENT;
use crate::protocol::types::SqlValue;
use crate::statement::Statement;
use crate::transaction::Transaction;

/// A connection to one Firebird database.
///
/// The attachment owns the native client, the database handle and the pools
/// every transaction, statement, record set and blob is drawn from. It is
/// `Send` but not `Sync`: one task uses it at a time.
pub struct Attachment {
    ctx: Context,
}

impl Attachment {
    /// Attach to an existing database.
    ///
    /// # Arguments
    ///
    /// * `client` - Native client the calls go through
    /// * `path` - Database path or connection string, e.g. `localhost:employee`
    /// * `dpb` - Database parameter block, see [`crate::protocol::make_dpb`]
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fbclient_rs::{make_dpb, Attachment, LoopbackClient};
    ///
    /// # fn main() -> fbclient_rs::Result<()> {
    /// let dpb = make_dpb(|p| {
    ///     p.user_name("SYSDBA").password("masterkey");
    /// });
    /// let mut att = Attachment::attach(LoopbackClient::new(), "localhost:employee", &dpb)?;
    /// att.execute("UPDATE COUNTRY SET CURRENCY = 'Euro' WHERE COUNTRY = 'France'")?;
    /// att.close()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn attach(client: impl Client + 'static, path: &str, dpb: &[u8]) -> Result<Self> {
        let ctx = Context::open(Box::new(client), path, dpb, false, SQL_DIALECT_CURRENT)?;
        Ok(Self { ctx })
    }

    /// Create a database and attach to it.
    pub fn create(client: impl Client + 'static, path: &str, dpb: &[u8]) -> Result<Self> {
        let ctx = Context::open(Box::new(client), path, dpb, true, SQL_DIALECT_CURRENT)?;
        Ok(Self { ctx })
    }

    /// Attach with [`ConnectParams`], using its dialect.
    pub fn connect(client: impl Client + 'static, params: &ConnectParams) -> Result<Self> {
        let dpb = params.to_dpb();
        let ctx = Context::open(Box::new(client), &params.database, &dpb, false, params.dialect)?;
        Ok(Self { ctx })
    }

    /// Detach. Calling it again does nothing.
    pub fn close(&mut self) -> Result<()> {
        self.ctx.close()
    }

    /// Check if the attachment is closed.
    pub fn is_closed(&self) -> bool {
        self.ctx.is_closed()
    }

    /// SQL dialect used for prepare and execute.
    pub fn dialect(&self) -> u16 {
        self.ctx.dialect
    }

    pub fn set_dialect(&mut self, dialect: u16) {
        self.ctx.dialect = dialect;
    }

    /// Slots allocated in each pool so far.
    pub fn pool_stats(&self) -> PoolStats {
        self.ctx.pool_stats()
    }

    /// Start a transaction with the server's default parameters.
    pub fn begin(&mut self) -> Result<Transaction<'_>> {
        Transaction::begin(&mut self.ctx, &[])
    }

    /// Start a transaction with a parameter block, see [`crate::protocol::make_tpb`].
    pub fn begin_with(&mut self, tpb: &[u8]) -> Result<Transaction<'_>> {
        Transaction::begin(&mut self.ctx, tpb)
    }

    /// Run `f` in a transaction.
    ///
    /// If `f` fails the transaction is rolled back and the error returned;
    /// it is never committed, even when the rollback itself fails.
    /// Otherwise it is committed.
    pub fn transaction<T>(&mut self, f: impl FnOnce(&mut Transaction<'_>) -> Result<T>) -> Result<T> {
        self.transaction_with(&[], f)
    }

    /// Like [`Attachment::transaction`] with a parameter block.
    pub fn transaction_with<T>(
        &mut self,
        tpb: &[u8],
        f: impl FnOnce(&mut Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut tr = self.begin_with(tpb)?;
        match f(&mut tr) {
            Ok(value) => {
                // no-op if `f` already ended the transaction
                tr.commit()?;
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, "rolling back transaction");
                if let Err(rollback_err) = tr.rollback() {
                    tracing::error!(error = %rollback_err, "rollback failed, transaction left uncommitted");
                }
                Err(e)
            }
        }
    }

    /// Execute a statement without preparing it, in its own transaction.
    pub fn execute(&mut self, sql: &str) -> Result<()> {
        self.transaction(|tr| tr.execute(sql))
    }

    /// Prepare, bind `params` and execute, in its own transaction.
    pub fn execute_with(&mut self, sql: &str, params: &[SqlValue]) -> Result<()> {
        self.statement(sql, |stmt| stmt.execute_with(params))
    }

    /// Run `f` on a prepared statement in its own transaction.
    pub fn statement<T>(&mut self, sql: &str, f: impl FnOnce(&mut Statement<'_>) -> Result<T>) -> Result<T> {
        self.transaction(|tr| tr.statement(sql, f))
    }

    /// Prepare, bind `params` and open a cursor, in its own transaction.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fbclient_rs::{Attachment, LoopbackClient, SqlValue};
    ///
    /// # fn main() -> fbclient_rs::Result<()> {
    /// let mut att = Attachment::attach(LoopbackClient::new(), "employee.fdb", &[])?;
    /// let names = att.open(
    ///     "SELECT FIRST_NAME FROM EMPLOYEE WHERE DEPT_NO = ?",
    ///     &[SqlValue::from("600")],
    ///     |rs| {
    ///         let mut names = Vec::new();
    ///         rs.for_each(|row| {
    ///             names.push(row.get_string(0)?);
    ///             Ok(())
    ///         })?;
    ///         Ok(names)
    ///     },
    /// )?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn open<T>(
        &mut self,
        sql: &str,
        params: &[SqlValue],
        f: impl FnOnce(&mut RecordSet<'_>) -> Result<T>,
    ) -> Result<T> {
        self.statement(sql, |stmt| stmt.open_with(params, f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::loopback::{LoopbackClient, Script};
    use crate::error::Error;
    use crate::protocol::constants::ISC_IO_ERROR;

    #[test]
    fn test_close_is_idempotent() {
        let client = LoopbackClient::new();
        let mut att = Attachment::attach(client.clone(), "test.fdb", &[]).unwrap();
        assert!(!att.is_closed());
        att.close().unwrap();
        att.close().unwrap();
        assert!(att.is_closed());
        assert_eq!(client.stats().attachments, 0);
        assert!(matches!(att.begin(), Err(Error::InvalidHandle)));
    }

    #[test]
    fn test_drop_detaches() {
        let client = LoopbackClient::new();
        {
            let _att = Attachment::attach(client.clone(), "test.fdb", &[]).unwrap();
            assert_eq!(client.stats().attachments, 1);
        }
        let stats = client.stats();
        assert_eq!(stats.attachments, 0);
        assert_eq!(stats.statuses, 0);
    }

    #[test]
    fn test_attach_failure() {
        let client = LoopbackClient::new();
        client.refuse_attach("I/O error during \"open\" operation for file \"missing.fdb\"");
        let err = Attachment::attach(client.clone(), "missing.fdb", &[]).err().unwrap();
        assert_eq!(err.status_code(), Some(ISC_IO_ERROR));
        assert!(err.to_string().contains("missing.fdb"));
        assert_eq!(client.stats().statuses, 0);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let client = LoopbackClient::new();
        client.script("INSERT INTO T VALUES (1)", Script::fail("violation of PRIMARY or UNIQUE KEY constraint"));
        let mut att = Attachment::attach(client.clone(), "test.fdb", &[]).unwrap();
        let err = att
            .transaction(|tr| {
                tr.execute("DELETE FROM T")?;
                tr.execute("INSERT INTO T VALUES (1)")
            })
            .unwrap_err();
        assert!(err.to_string().contains("PRIMARY"));
        let stats = client.stats();
        assert_eq!(stats.rollbacks, 1);
        assert_eq!(stats.commits, 0);
        assert_eq!(stats.transactions, 0);
    }

    #[test]
    fn test_failed_rollback_is_not_committed() {
        let client = LoopbackClient::new();
        client.refuse_rollback("connection lost to database");
        let mut att = Attachment::attach(client.clone(), "test.fdb", &[]).unwrap();
        let err = att
            .transaction(|tr| {
                tr.execute("DELETE FROM T")?;
                Err::<(), _>(Error::protocol("abandoned"))
            })
            .unwrap_err();
        assert!(err.to_string().contains("abandoned"));
        let stats = client.stats();
        assert_eq!(stats.commits, 0);
        assert_eq!(stats.rollbacks, 0);
        assert_eq!(stats.transactions, 1);
    }

    #[test]
    fn test_dialect() {
        let params = ConnectParams::new("test.fdb").with_dialect(1).anonymous();
        let mut att = Attachment::connect(LoopbackClient::new(), &params).unwrap();
        assert_eq!(att.dialect(), 1);
        att.set_dialect(3);
        assert_eq!(att.dialect(), 3);
    }
}
