//! Native client surface.
//!
//! `Client` mirrors the `isc_*` entry points of the Firebird client library.
//! Every method returns the raw status the library reports; the attachment
//! layer classifies it with [`check`] and asks [`Client::interpret`] for the
//! message text.
//!
//! Two implementations ship with the crate:
//!
//! | Client | Backed by |
//! |--------|-----------|
//! | [`loopback::LoopbackClient`] | an in-memory engine with scripted statements |
//! | `fbclient::FbClient` | `libfbclient`, with the `fbclient` feature |

pub mod loopback;

#[cfg(feature = "fbclient")]
pub mod fbclient;

use crate::error::{Error, Result};
use crate::protocol::constants::{CLASS_ERROR, CLASS_MASK};
use crate::protocol::types::{BlobId, Sqlda};

/// Native handle (`isc_db_handle`, `isc_tr_handle`, ...). Zero means "none".
pub type Handle = u32;

/// Raw status code returned by a native call.
pub type IscStatus = i64;

/// The native client library.
///
/// Handles are in/out parameters: calls that allocate write the new handle,
/// calls that free reset it to zero.
pub trait Client: Send {
    /// Allocate a status context.
    fn alloc_status(&mut self) -> Handle;

    /// Free a status context.
    fn free_status(&mut self, status: Handle);

    /// Message text for the last status stored in a context.
    fn interpret(&mut self, status: Handle) -> String;

    fn attach_database(
        &mut self,
        status: Handle,
        db: &mut Handle,
        path: &str,
        dpb: &[u8],
    ) -> IscStatus;

    fn create_database(
        &mut self,
        status: Handle,
        db: &mut Handle,
        path: &str,
        dpb: &[u8],
    ) -> IscStatus;

    fn detach_database(&mut self, status: Handle, db: &mut Handle) -> IscStatus;

    /// Execute a statement without preparing it.
    fn execute_immediate(
        &mut self,
        status: Handle,
        db: &mut Handle,
        tr: &mut Handle,
        dialect: u16,
        sql: &str,
    ) -> IscStatus;

    fn start_transaction(
        &mut self,
        status: Handle,
        tr: &mut Handle,
        db: &mut Handle,
        tpb: &[u8],
    ) -> IscStatus;

    /// Commit. A non-retaining commit frees the handle.
    fn commit_transaction(&mut self, status: Handle, tr: &mut Handle, retaining: bool)
        -> IscStatus;

    /// Roll back. A non-retaining rollback frees the handle.
    fn rollback_transaction(
        &mut self,
        status: Handle,
        tr: &mut Handle,
        retaining: bool,
    ) -> IscStatus;

    fn allocate_statement(&mut self, status: Handle, db: &mut Handle, stmt: &mut Handle)
        -> IscStatus;

    /// Prepare `sql` and describe its output columns into `output`.
    fn prepare_statement(
        &mut self,
        status: Handle,
        tr: &mut Handle,
        stmt: &mut Handle,
        dialect: u16,
        sql: &str,
        output: &mut Sqlda,
    ) -> IscStatus;

    fn set_cursor_name(&mut self, status: Handle, stmt: &mut Handle, name: &str) -> IscStatus;

    /// Describe the input parameters into `input`.
    fn describe_bind(
        &mut self,
        status: Handle,
        stmt: &mut Handle,
        dialect: u16,
        input: &mut Sqlda,
    ) -> IscStatus;

    fn sql_info(
        &mut self,
        status: Handle,
        stmt: &mut Handle,
        items: &[u8],
        buffer: &mut [u8],
    ) -> IscStatus;

    fn execute(
        &mut self,
        status: Handle,
        tr: &mut Handle,
        stmt: &mut Handle,
        dialect: u16,
        input: Option<&Sqlda>,
    ) -> IscStatus;

    /// Execute and receive a singleton row into `output`.
    fn execute2(
        &mut self,
        status: Handle,
        tr: &mut Handle,
        stmt: &mut Handle,
        dialect: u16,
        input: Option<&Sqlda>,
        output: Option<&mut Sqlda>,
    ) -> IscStatus;

    /// Fetch the next row. Returns 100 at end of cursor.
    fn fetch(&mut self, status: Handle, stmt: &mut Handle, output: &mut Sqlda) -> IscStatus;

    /// Close the cursor (`DSQL_close`) or drop the statement (`DSQL_drop`).
    fn free_statement(&mut self, status: Handle, stmt: &mut Handle, option: u16) -> IscStatus;

    fn open_blob(
        &mut self,
        status: Handle,
        db: &mut Handle,
        tr: &mut Handle,
        blob: &mut Handle,
        id: BlobId,
    ) -> IscStatus;

    fn create_blob(
        &mut self,
        status: Handle,
        db: &mut Handle,
        tr: &mut Handle,
        blob: &mut Handle,
        id: &mut BlobId,
    ) -> IscStatus;

    /// Read one segment. Returns `isc_segment` when the segment did not fit.
    fn get_segment(
        &mut self,
        status: Handle,
        blob: &mut Handle,
        actual: &mut u16,
        buffer: &mut [u8],
    ) -> IscStatus;

    fn put_segment(&mut self, status: Handle, blob: &mut Handle, data: &[u8]) -> IscStatus;

    fn blob_info(
        &mut self,
        status: Handle,
        blob: &mut Handle,
        items: &[u8],
        buffer: &mut [u8],
    ) -> IscStatus;

    fn close_blob(&mut self, status: Handle, blob: &mut Handle) -> IscStatus;
}

/// Class of a status code: 0 error, 1 warning, 2 info.
pub fn status_class(code: IscStatus) -> i64 {
    (code & CLASS_MASK) >> 30
}

/// Whether a status code is an error.
pub fn is_error(code: IscStatus) -> bool {
    code != 0 && status_class(code) == CLASS_ERROR
}

/// Turn a raw status into a `Result`.
///
/// Errors become `Error::Native` with the interpreted message. Warnings and
/// informational statuses are logged and treated as success.
pub fn check(client: &mut dyn Client, status: Handle, code: IscStatus) -> Result<()> {
    if code == 0 {
        return Ok(());
    }
    let message = client.interpret(status);
    if is_error(code) {
        return Err(Error::native(code, message));
    }
    tracing::debug!(code, %message, "native call returned a non-error status");
    Ok(())
}
