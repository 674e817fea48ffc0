//! Record sets over an open cursor.

use std::ops::{Deref, DerefMut};

use crate::error::Result;
use crate::lifecycle::SlotId;
use crate::record::Record;
use crate::statement::Statement;

/// The current row of an open cursor.
///
/// A record set dereferences to the [`Record`] of its current row. It is
/// positioned on the first row when [`Statement::open`] hands it out; once
/// [`RecordSet::eof`] is true the row no longer holds data and further
/// fetches do nothing.
///
/// # Example
///
/// ```no_run
/// use fbclient_rs::{Attachment, LoopbackClient};
///
/// # fn main() -> fbclient_rs::Result<()> {
/// let mut att = Attachment::attach(LoopbackClient::new(), "employee.fdb", &[])?;
/// att.transaction(|tr| {
///     tr.statement_with_cursor("SELECT EMP_NO FROM EMPLOYEE FOR UPDATE", "EMP", |stmt| {
///         stmt.open(|rs| {
///             rs.for_each(|row| {
///                 row.statement("UPDATE EMPLOYEE SET SALARY = 0 WHERE CURRENT OF EMP", |upd| {
///                     upd.execute()
///                 })
///             })
///         })
///     })
/// })?;
/// # Ok(())
/// # }
/// ```
pub struct RecordSet<'a> {
    record: Record<'a>,
    stmt: SlotId,
    slot: SlotId,
}

impl<'a> RecordSet<'a> {
    pub(crate) fn new(record: Record<'a>, stmt: SlotId, slot: SlotId) -> Self {
        Self { record, stmt, slot }
    }

    /// Move to the next row. Returns false (and sets EOF) past the last one.
    pub fn fetch(&mut self) -> Result<bool> {
        self.record.ctx.advance(self.slot, self.stmt)
    }

    /// Whether the cursor is exhausted.
    pub fn eof(&self) -> bool {
        self.record.ctx.is_eof(self.slot).unwrap_or(true)
    }

    /// Run `f` on every remaining row, starting with the current one.
    pub fn for_each(&mut self, mut f: impl FnMut(&mut RecordSet<'a>) -> Result<()>) -> Result<()> {
        while !self.eof() {
            f(self)?;
            self.fetch()?;
        }
        Ok(())
    }

    /// Run another statement in the same transaction while the cursor stays
    /// open, e.g. an `UPDATE ... WHERE CURRENT OF`.
    pub fn statement<T>(
        &mut self,
        sql: &str,
        f: impl FnOnce(&mut Statement<'_>) -> Result<T>,
    ) -> Result<T> {
        let tr = self.record.tr;
        Statement::scoped(&mut *self.record.ctx, tr, sql, None, f)
    }
}

impl<'a> Deref for RecordSet<'a> {
    type Target = Record<'a>;

    fn deref(&self) -> &Record<'a> {
        &self.record
    }
}

impl<'a> DerefMut for RecordSet<'a> {
    fn deref_mut(&mut self) -> &mut Record<'a> {
        &mut self.record
    }
}

#[cfg(test)]
mod tests {
    use crate::client::loopback::{LoopbackClient, Script};
    use crate::error::Error;
    use crate::protocol::constants::SQL_LONG;
    use crate::protocol::types::{SqlValue, SqlVar};
    use crate::Attachment;

    fn scripted(rows: usize) -> LoopbackClient {
        let client = LoopbackClient::new();
        client.script(
            "SELECT N FROM T",
            Script::rows(
                vec![SqlVar::new(SQL_LONG, 4).named("N")],
                (0..rows as i32).map(|n| vec![SqlValue::Int(n)]).collect(),
            ),
        );
        client
    }

    #[test]
    fn test_empty_cursor_starts_at_eof() {
        let mut att = Attachment::attach(scripted(0), "test.fdb", &[]).unwrap();
        att.statement("SELECT N FROM T", |stmt| {
            stmt.open(|rs| {
                assert!(rs.eof());
                assert!(!rs.fetch()?);
                let mut calls = 0;
                rs.for_each(|_| {
                    calls += 1;
                    Ok(())
                })?;
                assert_eq!(calls, 0);
                Ok(())
            })
        })
        .unwrap();
    }

    #[test]
    fn test_fetch_after_eof_is_noop() {
        let mut att = Attachment::attach(scripted(2), "test.fdb", &[]).unwrap();
        att.statement("SELECT N FROM T", |stmt| {
            stmt.open(|rs| {
                assert_eq!(rs.get_i32(0)?, 0);
                assert!(rs.fetch()?);
                assert_eq!(rs.get_i32(0)?, 1);
                assert!(!rs.fetch()?);
                assert!(rs.eof());
                assert!(!rs.fetch()?);
                Ok(())
            })
        })
        .unwrap();
    }

    #[test]
    fn test_block_error_still_closes_cursor() {
        let mut att = Attachment::attach(scripted(3), "test.fdb", &[]).unwrap();
        att.statement("SELECT N FROM T", |stmt| {
            let err = stmt
                .open(|_| -> crate::Result<()> { Err(Error::unsupported("stop")) })
                .unwrap_err();
            assert!(matches!(err, Error::Unsupported { .. }));
            // reopening works only if the cursor was closed
            let count = stmt.open(|rs| {
                let mut n = 0;
                rs.for_each(|_| {
                    n += 1;
                    Ok(())
                })?;
                Ok(n)
            })?;
            assert_eq!(count, 3);
            Ok(())
        })
        .unwrap();
        assert_eq!(att.pool_stats().record_sets, 1);
    }
}
