//! Bindings to the native Firebird client library (`libfbclient`).
//!
//! Each status context is an `ISC_STATUS_ARRAY` owned by the client. Row
//! buffers stay in [`Sqlda`]; an XSQLDA whose `sqldata`/`sqlind` pointers
//! point into that buffer is built around each call that exchanges rows.

use std::collections::HashMap;
use std::ffi::{c_char, c_int, c_short, c_uint, c_ushort, c_void, CString};
use std::ptr;

use super::{Client, Handle, IscStatus};
use crate::protocol::constants::{ISC_DSQL_ERROR, ISC_IO_ERROR};
use crate::protocol::types::{BlobId, SqlVar, Sqlda};

type IscStatusRaw = isize;

const ISC_STATUS_LENGTH: usize = 20;
const METADATALENGTH: usize = 68;
const SQLDA_VERSION1: c_ushort = 1;
const INTERPRET_BUFFER: usize = 1024;

type StatusVector = [IscStatusRaw; ISC_STATUS_LENGTH];

#[repr(C)]
struct XsqlVar {
    sqltype: c_short,
    sqlscale: c_short,
    sqlsubtype: c_short,
    sqllen: c_short,
    sqldata: *mut c_char,
    sqlind: *mut c_short,
    sqlname_length: c_short,
    sqlname: [c_char; METADATALENGTH],
    relname_length: c_short,
    relname: [c_char; METADATALENGTH],
    ownname_length: c_short,
    ownname: [c_char; METADATALENGTH],
    aliasname_length: c_short,
    aliasname: [c_char; METADATALENGTH],
}

#[repr(C)]
struct Xsqlda {
    version: c_short,
    sqldaid: [c_char; 8],
    sqldabc: i32,
    sqln: c_short,
    sqld: c_short,
    sqlvar: [XsqlVar; 1],
}

#[link(name = "fbclient")]
extern "C" {
    fn fb_interpret(buffer: *mut c_char, size: c_uint, status: *mut *const IscStatusRaw) -> i32;
    fn isc_attach_database(
        status: *mut IscStatusRaw,
        path_len: c_short,
        path: *const c_char,
        db: *mut Handle,
        dpb_len: c_short,
        dpb: *const c_char,
    ) -> IscStatusRaw;
    fn isc_create_database(
        status: *mut IscStatusRaw,
        path_len: c_ushort,
        path: *const c_char,
        db: *mut Handle,
        dpb_len: c_ushort,
        dpb: *const c_char,
        db_type: c_ushort,
    ) -> IscStatusRaw;
    fn isc_detach_database(status: *mut IscStatusRaw, db: *mut Handle) -> IscStatusRaw;
    fn isc_dsql_execute_immediate(
        status: *mut IscStatusRaw,
        db: *mut Handle,
        tr: *mut Handle,
        len: c_ushort,
        sql: *const c_char,
        dialect: c_ushort,
        sqlda: *const Xsqlda,
    ) -> IscStatusRaw;
    fn isc_start_transaction(status: *mut IscStatusRaw, tr: *mut Handle, count: c_short, ...) -> IscStatusRaw;
    fn isc_commit_transaction(status: *mut IscStatusRaw, tr: *mut Handle) -> IscStatusRaw;
    fn isc_commit_retaining(status: *mut IscStatusRaw, tr: *mut Handle) -> IscStatusRaw;
    fn isc_rollback_transaction(status: *mut IscStatusRaw, tr: *mut Handle) -> IscStatusRaw;
    fn isc_rollback_retaining(status: *mut IscStatusRaw, tr: *mut Handle) -> IscStatusRaw;
    fn isc_dsql_allocate_statement(status: *mut IscStatusRaw, db: *mut Handle, stmt: *mut Handle) -> IscStatusRaw;
    fn isc_dsql_prepare(
        status: *mut IscStatusRaw,
        tr: *mut Handle,
        stmt: *mut Handle,
        len: c_ushort,
        sql: *const c_char,
        dialect: c_ushort,
        sqlda: *mut Xsqlda,
    ) -> IscStatusRaw;
    fn isc_dsql_set_cursor_name(
        status: *mut IscStatusRaw,
        stmt: *mut Handle,
        name: *const c_char,
        kind: c_ushort,
    ) -> IscStatusRaw;
    fn isc_dsql_describe(status: *mut IscStatusRaw, stmt: *mut Handle, version: c_ushort, sqlda: *mut Xsqlda)
        -> IscStatusRaw;
    fn isc_dsql_describe_bind(
        status: *mut IscStatusRaw,
        stmt: *mut Handle,
        version: c_ushort,
        sqlda: *mut Xsqlda,
    ) -> IscStatusRaw;
    fn isc_dsql_sql_info(
        status: *mut IscStatusRaw,
        stmt: *mut Handle,
        items_len: c_short,
        items: *const c_char,
        buffer_len: c_short,
        buffer: *mut c_char,
    ) -> IscStatusRaw;
    fn isc_dsql_execute(
        status: *mut IscStatusRaw,
        tr: *mut Handle,
        stmt: *mut Handle,
        dialect: c_ushort,
        input: *const Xsqlda,
    ) -> IscStatusRaw;
    fn isc_dsql_execute2(
        status: *mut IscStatusRaw,
        tr: *mut Handle,
        stmt: *mut Handle,
        dialect: c_ushort,
        input: *const Xsqlda,
        output: *const Xsqlda,
    ) -> IscStatusRaw;
    fn isc_dsql_fetch(status: *mut IscStatusRaw, stmt: *mut Handle, version: c_ushort, output: *const Xsqlda)
        -> IscStatusRaw;
    fn isc_dsql_free_statement(status: *mut IscStatusRaw, stmt: *mut Handle, option: c_ushort) -> IscStatusRaw;
    fn isc_open_blob(
        status: *mut IscStatusRaw,
        db: *mut Handle,
        tr: *mut Handle,
        blob: *mut Handle,
        id: *mut u64,
    ) -> IscStatusRaw;
    fn isc_create_blob(
        status: *mut IscStatusRaw,
        db: *mut Handle,
        tr: *mut Handle,
        blob: *mut Handle,
        id: *mut u64,
    ) -> IscStatusRaw;
    fn isc_get_segment(
        status: *mut IscStatusRaw,
        blob: *mut Handle,
        actual: *mut c_ushort,
        buffer_len: c_ushort,
        buffer: *mut c_void,
    ) -> IscStatusRaw;
    fn isc_put_segment(status: *mut IscStatusRaw, blob: *mut Handle, len: c_ushort, data: *const c_void)
        -> IscStatusRaw;
    fn isc_blob_info(
        status: *mut IscStatusRaw,
        blob: *mut Handle,
        items_len: c_short,
        items: *const c_void,
        buffer_len: c_short,
        buffer: *mut c_void,
    ) -> IscStatusRaw;
    fn isc_close_blob(status: *mut IscStatusRaw, blob: *mut Handle) -> IscStatusRaw;
}

/// Zeroed XSQLDA with room for `n` columns.
struct XsqldaBuf {
    words: Vec<u64>,
    capacity: usize,
}

impl XsqldaBuf {
    fn new(n: usize) -> Self {
        let capacity = n.max(1);
        let size = std::mem::size_of::<Xsqlda>() + (capacity - 1) * std::mem::size_of::<XsqlVar>();
        let mut buf = Self {
            words: vec![0u64; size.div_ceil(8)],
            capacity,
        };
        // SAFETY: the buffer is large enough and u64-aligned, which covers Xsqlda's alignment.
        unsafe {
            let da = buf.as_mut_ptr();
            (*da).version = SQLDA_VERSION1 as c_short;
            (*da).sqln = capacity as c_short;
        }
        buf
    }

    /// XSQLDA describing `da`, with pointers into its buffer.
    fn wrap(da: &Sqlda, data: *mut u8) -> Self {
        let mut buf = Self::new(da.count());
        // SAFETY: `data` is the start of `da`'s buffer and every offset was laid out inside it.
        unsafe {
            (*buf.as_mut_ptr()).sqld = da.count() as c_short;
            for (slot, var) in buf.vars_mut().iter_mut().zip(da.vars()) {
                slot.sqltype = var.sqltype;
                slot.sqlscale = var.scale;
                slot.sqlsubtype = var.subtype;
                slot.sqllen = var.len;
                slot.sqldata = data.add(var.data_offset()).cast();
                slot.sqlind = match var.null_offset() {
                    Some(at) => data.add(at).cast(),
                    None => ptr::null_mut(),
                };
            }
        }
        buf
    }

    fn as_mut_ptr(&mut self) -> *mut Xsqlda {
        self.words.as_mut_ptr().cast()
    }

    fn sqld(&self) -> usize {
        // SAFETY: see `new`.
        let da = self.words.as_ptr().cast::<Xsqlda>();
        unsafe { (*da).sqld.max(0) as usize }
    }

    fn vars_mut(&mut self) -> &mut [XsqlVar] {
        let da = self.as_mut_ptr();
        // SAFETY: `capacity` XSQLVARs follow the header.
        unsafe { std::slice::from_raw_parts_mut(ptr::addr_of_mut!((*da).sqlvar).cast::<XsqlVar>(), self.capacity) }
    }

    /// Column descriptors reported by a describe.
    fn to_vars(&mut self) -> Vec<SqlVar> {
        let count = self.sqld().min(self.capacity);
        self.vars_mut()[..count]
            .iter()
            .map(|v| {
                let mut var = SqlVar::new(v.sqltype, v.sqllen)
                    .with_subtype(v.sqlsubtype)
                    .with_scale(v.sqlscale);
                var.name = name(&v.sqlname, v.sqlname_length);
                var.relation = name(&v.relname, v.relname_length);
                var.owner = name(&v.ownname, v.ownname_length);
                var.alias = name(&v.aliasname, v.aliasname_length);
                var
            })
            .collect()
    }
}

fn name(raw: &[c_char; METADATALENGTH], len: c_short) -> String {
    let len = (len.max(0) as usize).min(METADATALENGTH);
    let bytes: Vec<u8> = raw[..len].iter().map(|c| *c as u8).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Client backed by `libfbclient`.
#[derive(Default)]
pub struct FbClient {
    next_status: Handle,
    statuses: HashMap<Handle, Box<StatusVector>>,
    // errors raised on this side of the FFI boundary, e.g. an SQL text with a NUL byte
    local_errors: HashMap<Handle, String>,
    scratch: StatusVector,
}

impl FbClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn vector(&mut self, status: Handle) -> *mut IscStatusRaw {
        self.local_errors.remove(&status);
        match self.statuses.get_mut(&status) {
            Some(v) => v.as_mut_ptr(),
            None => self.scratch.as_mut_ptr(),
        }
    }

    fn local_error(&mut self, status: Handle, code: IscStatus, message: impl Into<String>) -> IscStatus {
        self.local_errors.insert(status, message.into());
        code
    }

    fn cstring(&mut self, status: Handle, value: &str) -> Result<CString, IscStatus> {
        CString::new(value).map_err(|_| self.local_error(status, ISC_DSQL_ERROR, "SQL text contains a NUL byte"))
    }
}

fn code(raw: IscStatusRaw) -> IscStatus {
    raw as IscStatus
}

impl Client for FbClient {
    fn alloc_status(&mut self) -> Handle {
        self.next_status += 1;
        self.statuses.insert(self.next_status, Box::new([0; ISC_STATUS_LENGTH]));
        self.next_status
    }

    fn free_status(&mut self, status: Handle) {
        self.statuses.remove(&status);
        self.local_errors.remove(&status);
    }

    fn interpret(&mut self, status: Handle) -> String {
        if let Some(message) = self.local_errors.get(&status) {
            return message.clone();
        }
        let Some(vector) = self.statuses.get(&status) else {
            return String::new();
        };
        let mut buffer = [0 as c_char; INTERPRET_BUFFER];
        let mut cursor: *const IscStatusRaw = vector.as_ptr();
        let mut lines = Vec::new();
        loop {
            // SAFETY: fb_interpret writes at most `size` bytes and advances `cursor` within the vector.
            let len = unsafe { fb_interpret(buffer.as_mut_ptr(), INTERPRET_BUFFER as c_uint, &mut cursor) };
            if len <= 0 {
                break;
            }
            let bytes: Vec<u8> = buffer[..len as usize].iter().map(|c| *c as u8).collect();
            lines.push(String::from_utf8_lossy(&bytes).into_owned());
        }
        lines.join("\n")
    }

    fn attach_database(&mut self, status: Handle, db: &mut Handle, path: &str, dpb: &[u8]) -> IscStatus {
        let sv = self.vector(status);
        // SAFETY: lengths match the buffers passed.
        code(unsafe {
            isc_attach_database(
                sv,
                path.len() as c_short,
                path.as_ptr().cast(),
                db,
                dpb.len() as c_short,
                dpb.as_ptr().cast(),
            )
        })
    }

    fn create_database(&mut self, status: Handle, db: &mut Handle, path: &str, dpb: &[u8]) -> IscStatus {
        let sv = self.vector(status);
        // SAFETY: lengths match the buffers passed.
        code(unsafe {
            isc_create_database(
                sv,
                path.len() as c_ushort,
                path.as_ptr().cast(),
                db,
                dpb.len() as c_ushort,
                dpb.as_ptr().cast(),
                0,
            )
        })
    }

    fn detach_database(&mut self, status: Handle, db: &mut Handle) -> IscStatus {
        let sv = self.vector(status);
        // SAFETY: plain handle call.
        code(unsafe { isc_detach_database(sv, db) })
    }

    fn execute_immediate(
        &mut self,
        status: Handle,
        db: &mut Handle,
        tr: &mut Handle,
        dialect: u16,
        sql: &str,
    ) -> IscStatus {
        let sql = match self.cstring(status, sql) {
            Ok(sql) => sql,
            Err(code) => return code,
        };
        let sv = self.vector(status);
        // SAFETY: `sql` is NUL-terminated, length 0 tells the library to measure it.
        code(unsafe { isc_dsql_execute_immediate(sv, db, tr, 0, sql.as_ptr(), dialect, ptr::null()) })
    }

    fn start_transaction(&mut self, status: Handle, tr: &mut Handle, db: &mut Handle, tpb: &[u8]) -> IscStatus {
        let sv = self.vector(status);
        let tpb_ptr: *const c_char = if tpb.is_empty() { ptr::null() } else { tpb.as_ptr().cast() };
        // SAFETY: one (db, tpb length, tpb) triple follows the count, ints promoted as C varargs are.
        code(unsafe { isc_start_transaction(sv, tr, 1, db as *mut Handle, tpb.len() as c_int, tpb_ptr) })
    }

    fn commit_transaction(&mut self, status: Handle, tr: &mut Handle, retaining: bool) -> IscStatus {
        let sv = self.vector(status);
        // SAFETY: plain handle call.
        code(unsafe {
            if retaining {
                isc_commit_retaining(sv, tr)
            } else {
                isc_commit_transaction(sv, tr)
            }
        })
    }

    fn rollback_transaction(&mut self, status: Handle, tr: &mut Handle, retaining: bool) -> IscStatus {
        let sv = self.vector(status);
        // SAFETY: plain handle call.
        code(unsafe {
            if retaining {
                isc_rollback_retaining(sv, tr)
            } else {
                isc_rollback_transaction(sv, tr)
            }
        })
    }

    fn allocate_statement(&mut self, status: Handle, db: &mut Handle, stmt: &mut Handle) -> IscStatus {
        let sv = self.vector(status);
        // SAFETY: plain handle call.
        code(unsafe { isc_dsql_allocate_statement(sv, db, stmt) })
    }

    fn prepare_statement(
        &mut self,
        status: Handle,
        tr: &mut Handle,
        stmt: &mut Handle,
        dialect: u16,
        sql: &str,
        output: &mut Sqlda,
    ) -> IscStatus {
        let sql = match self.cstring(status, sql) {
            Ok(sql) => sql,
            Err(code) => return code,
        };
        let sv = self.vector(status);
        let mut probe = XsqldaBuf::new(1);
        // SAFETY: `probe` has room for one column; sqld reports how many there are.
        let ret = code(unsafe { isc_dsql_prepare(sv, tr, stmt, 0, sql.as_ptr(), dialect, probe.as_mut_ptr()) });
        if ret != 0 {
            return ret;
        }
        let count = probe.sqld();
        let mut da = if count > probe.capacity {
            let mut full = XsqldaBuf::new(count);
            // SAFETY: `full` has room for `count` columns.
            let ret = code(unsafe { isc_dsql_describe(sv, stmt, SQLDA_VERSION1, full.as_mut_ptr()) });
            if ret != 0 {
                return ret;
            }
            full
        } else {
            probe
        };
        output.describe(da.to_vars());
        0
    }

    fn set_cursor_name(&mut self, status: Handle, stmt: &mut Handle, name: &str) -> IscStatus {
        let name = match self.cstring(status, name) {
            Ok(name) => name,
            Err(code) => return code,
        };
        let sv = self.vector(status);
        // SAFETY: `name` is NUL-terminated.
        code(unsafe { isc_dsql_set_cursor_name(sv, stmt, name.as_ptr(), 0) })
    }

    fn describe_bind(&mut self, status: Handle, stmt: &mut Handle, _dialect: u16, input: &mut Sqlda) -> IscStatus {
        let sv = self.vector(status);
        let mut da = XsqldaBuf::new(1);
        // SAFETY: `da` has room for `capacity` columns.
        let ret = code(unsafe { isc_dsql_describe_bind(sv, stmt, SQLDA_VERSION1, da.as_mut_ptr()) });
        if ret != 0 {
            return ret;
        }
        if da.sqld() > da.capacity {
            da = XsqldaBuf::new(da.sqld());
            // SAFETY: as above, with the reported column count.
            let ret = code(unsafe { isc_dsql_describe_bind(sv, stmt, SQLDA_VERSION1, da.as_mut_ptr()) });
            if ret != 0 {
                return ret;
            }
        }
        input.describe(da.to_vars());
        0
    }

    fn sql_info(&mut self, status: Handle, stmt: &mut Handle, items: &[u8], buffer: &mut [u8]) -> IscStatus {
        let sv = self.vector(status);
        // SAFETY: lengths match the buffers passed.
        code(unsafe {
            isc_dsql_sql_info(
                sv,
                stmt,
                items.len() as c_short,
                items.as_ptr().cast(),
                buffer.len() as c_short,
                buffer.as_mut_ptr().cast(),
            )
        })
    }

    fn execute(
        &mut self,
        status: Handle,
        tr: &mut Handle,
        stmt: &mut Handle,
        dialect: u16,
        input: Option<&Sqlda>,
    ) -> IscStatus {
        let sv = self.vector(status);
        // the library only reads through input pointers
        let mut input = input
            .filter(|da| !da.is_empty())
            .map(|da| XsqldaBuf::wrap(da, da.buffer().as_ptr().cast_mut()));
        let input_ptr = input.as_mut().map_or(ptr::null(), |da| da.as_mut_ptr().cast_const());
        // SAFETY: the wrapped buffers outlive the call.
        code(unsafe { isc_dsql_execute(sv, tr, stmt, dialect, input_ptr) })
    }

    fn execute2(
        &mut self,
        status: Handle,
        tr: &mut Handle,
        stmt: &mut Handle,
        dialect: u16,
        input: Option<&Sqlda>,
        output: Option<&mut Sqlda>,
    ) -> IscStatus {
        let sv = self.vector(status);
        let mut input = input
            .filter(|da| !da.is_empty())
            .map(|da| XsqldaBuf::wrap(da, da.buffer().as_ptr().cast_mut()));
        let mut output = output.filter(|da| !da.is_empty()).map(|da| {
            let data = da.buffer_mut().as_mut_ptr();
            XsqldaBuf::wrap(da, data)
        });
        let input_ptr = input.as_mut().map_or(ptr::null(), |da| da.as_mut_ptr().cast_const());
        let output_ptr = output.as_mut().map_or(ptr::null(), |da| da.as_mut_ptr().cast_const());
        // SAFETY: the wrapped buffers outlive the call.
        code(unsafe { isc_dsql_execute2(sv, tr, stmt, dialect, input_ptr, output_ptr) })
    }

    fn fetch(&mut self, status: Handle, stmt: &mut Handle, output: &mut Sqlda) -> IscStatus {
        let sv = self.vector(status);
        let data = output.buffer_mut().as_mut_ptr();
        let mut da = XsqldaBuf::wrap(output, data);
        // SAFETY: the wrapped buffer outlives the call.
        code(unsafe { isc_dsql_fetch(sv, stmt, SQLDA_VERSION1, da.as_mut_ptr()) })
    }

    fn free_statement(&mut self, status: Handle, stmt: &mut Handle, option: u16) -> IscStatus {
        let sv = self.vector(status);
        // SAFETY: plain handle call.
        code(unsafe { isc_dsql_free_statement(sv, stmt, option) })
    }

    fn open_blob(
        &mut self,
        status: Handle,
        db: &mut Handle,
        tr: &mut Handle,
        blob: &mut Handle,
        id: BlobId,
    ) -> IscStatus {
        let sv = self.vector(status);
        let mut quad = id.0;
        // SAFETY: `quad` has the size of ISC_QUAD and holds its native bytes.
        code(unsafe { isc_open_blob(sv, db, tr, blob, &mut quad) })
    }

    fn create_blob(
        &mut self,
        status: Handle,
        db: &mut Handle,
        tr: &mut Handle,
        blob: &mut Handle,
        id: &mut BlobId,
    ) -> IscStatus {
        let sv = self.vector(status);
        let mut quad = 0u64;
        // SAFETY: as for `open_blob`.
        let ret = code(unsafe { isc_create_blob(sv, db, tr, blob, &mut quad) });
        *id = BlobId(quad);
        ret
    }

    fn get_segment(&mut self, status: Handle, blob: &mut Handle, actual: &mut u16, buffer: &mut [u8]) -> IscStatus {
        let sv = self.vector(status);
        let len = buffer.len().min(u16::MAX as usize) as c_ushort;
        // SAFETY: the library writes at most `len` bytes.
        code(unsafe { isc_get_segment(sv, blob, actual, len, buffer.as_mut_ptr().cast()) })
    }

    fn put_segment(&mut self, status: Handle, blob: &mut Handle, data: &[u8]) -> IscStatus {
        if data.len() > u16::MAX as usize {
            return self.local_error(status, ISC_IO_ERROR, "blob segment larger than 65535 bytes");
        }
        let sv = self.vector(status);
        // SAFETY: length matches the buffer passed.
        code(unsafe { isc_put_segment(sv, blob, data.len() as c_ushort, data.as_ptr().cast()) })
    }

    fn blob_info(&mut self, status: Handle, blob: &mut Handle, items: &[u8], buffer: &mut [u8]) -> IscStatus {
        let sv = self.vector(status);
        // SAFETY: lengths match the buffers passed.
        code(unsafe {
            isc_blob_info(
                sv,
                blob,
                items.len() as c_short,
                items.as_ptr().cast(),
                buffer.len() as c_short,
                buffer.as_mut_ptr().cast(),
            )
        })
    }

    fn close_blob(&mut self, status: Handle, blob: &mut Handle) -> IscStatus {
        let sv = self.vector(status);
        // SAFETY: plain handle call.
        code(unsafe { isc_close_blob(sv, blob) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::{CS_UTF8, SQL_LONG, SQL_VARYING};

    #[test]
    fn test_wrap_points_into_buffer() {
        let mut da = Sqlda::new();
        da.describe(vec![
            SqlVar::new(SQL_LONG, 4).nullable(),
            SqlVar::new(SQL_VARYING, 20).with_subtype(CS_UTF8),
        ]);
        let data = da.buffer_mut().as_mut_ptr();
        let mut xda = XsqldaBuf::wrap(&da, data);
        assert_eq!(xda.sqld(), 2);
        let vars = xda.vars_mut();
        assert_eq!(vars[0].sqltype, SQL_LONG | 1);
        assert_eq!(vars[0].sqldata.cast::<u8>(), data);
        assert!(!vars[0].sqlind.is_null());
        assert!(vars[1].sqlind.is_null());
        assert_eq!(vars[1].sqlsubtype, CS_UTF8);
    }

    #[test]
    fn test_to_vars_reads_names() {
        let mut xda = XsqldaBuf::new(1);
        unsafe { (*xda.as_mut_ptr()).sqld = 1 };
        let v = &mut xda.vars_mut()[0];
        v.sqltype = SQL_LONG;
        v.sqllen = 4;
        for (i, b) in b"EMP_NO".iter().enumerate() {
            v.sqlname[i] = *b as c_char;
            v.aliasname[i] = *b as c_char;
        }
        v.sqlname_length = 6;
        v.aliasname_length = 6;
        let vars = xda.to_vars();
        assert_eq!(vars.len(), 1);
        assert_eq!(vars[0].name, "EMP_NO");
        assert_eq!(vars[0].alias, "EMP_NO");
        assert_eq!(vars[0].relation, "");
    }
}
