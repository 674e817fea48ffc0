//! Prepared statements.

use crate::cursor::RecordSet;
use crate::error::Result;
use crate::lifecycle::{Context, SlotId};
use crate::protocol::types::SqlValue;
use crate::record::Record;

/// A prepared statement inside a transaction.
///
/// The statement is dropped (`DSQL_drop`) and its descriptors are released
/// when the guard goes out of scope or on [`Statement::close`]. Closing a
/// statement never ends its transaction.
pub struct Statement<'a> {
    ctx: &'a mut Context,
    tr: SlotId,
    slot: SlotId,
    closed: bool,
}

impl<'a> Statement<'a> {
    pub(crate) fn prepare(
        ctx: &'a mut Context,
        tr: SlotId,
        sql: &str,
        cursor: Option<&str>,
    ) -> Result<Self> {
        let slot = ctx.prepare(tr, sql, cursor)?;
        Ok(Self {
            ctx,
            tr,
            slot,
            closed: false,
        })
    }

    /// Prepare, run `f`, close. A close failure is reported only when `f` succeeded.
    pub(crate) fn scoped<T>(
        ctx: &'a mut Context,
        tr: SlotId,
        sql: &str,
        cursor: Option<&str>,
        f: impl FnOnce(&mut Statement<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut stmt = Statement::prepare(ctx, tr, sql, cursor)?;
        let result = f(&mut stmt);
        let closed = stmt.close();
        match result {
            Ok(value) => closed.map(|_| value),
            Err(e) => {
                if let Err(close_err) = closed {
                    tracing::warn!(error = %close_err, "failed to drop statement");
                }
                Err(e)
            }
        }
    }

    /// Input parameters, described on first use.
    pub fn params(&mut self) -> Result<Record<'_>> {
        let input = self.ctx.input(self.slot)?;
        Ok(Record::new(&mut *self.ctx, self.tr, input))
    }

    /// Output row. After [`Statement::execute`] it holds the singleton result
    /// (`RETURNING`, `EXECUTE PROCEDURE`).
    pub fn result(&mut self) -> Result<Record<'_>> {
        let output = self.ctx.output(self.slot)?;
        Ok(Record::new(&mut *self.ctx, self.tr, output))
    }

    /// Bind `values` to the parameters in order.
    pub fn set_params(&mut self, values: &[SqlValue]) -> Result<()> {
        let mut params = self.params()?;
        for (index, value) in values.iter().enumerate() {
            params.set_value(index, value)?;
        }
        Ok(())
    }

    /// Execute with the bound parameters.
    pub fn execute(&mut self) -> Result<()> {
        self.ctx.execute(self.tr, self.slot)
    }

    /// Bind `values` and execute.
    pub fn execute_with(&mut self, values: &[SqlValue]) -> Result<()> {
        self.set_params(values)?;
        self.execute()
    }

    /// Open a cursor, fetch the first row and run `f` on the record set.
    ///
    /// The cursor is closed (`DSQL_close`) whatever `f` returns, so the
    /// statement can be opened again.
    pub fn open<T>(&mut self, f: impl FnOnce(&mut RecordSet<'_>) -> Result<T>) -> Result<T> {
        let output = self.ctx.output(self.slot)?;
        self.ctx.open_cursor(self.tr, self.slot)?;
        let rs = self.ctx.acquire_record_set();
        let result = {
            let record = Record::new(&mut *self.ctx, self.tr, output);
            let mut set = RecordSet::new(record, self.slot, rs);
            set.fetch().and_then(|_| f(&mut set))
        };
        let closed = self.ctx.close_cursor(self.slot);
        self.ctx.release_record_set(rs);
        match result {
            Ok(value) => closed.map(|_| value),
            Err(e) => {
                if let Err(close_err) = closed {
                    tracing::warn!(error = %close_err, "failed to close cursor");
                }
                Err(e)
            }
        }
    }

    /// Bind `values`, then [`Statement::open`].
    pub fn open_with<T>(
        &mut self,
        values: &[SqlValue],
        f: impl FnOnce(&mut RecordSet<'_>) -> Result<T>,
    ) -> Result<T> {
        self.set_params(values)?;
        self.open(f)
    }

    /// `isc_info_sql_stmt_*` type of the prepared statement.
    pub fn statement_type(&mut self) -> Result<u32> {
        self.ctx.statement_type(self.slot)
    }

    /// Drop the statement now and report failures.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.ctx.close_statement(self.slot)
    }
}

impl Drop for Statement<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.ctx.close_statement(self.slot) {
            tracing::warn!(error = %e, "failed to drop statement");
        }
    }
}
