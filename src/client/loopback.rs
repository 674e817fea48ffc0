//! In-memory client for tests.
//!
//! `LoopbackClient` behaves like the native library for the calls the
//! attachment layer makes, against an engine that only knows the statements
//! it was scripted with:
//!
//! - `Script::Echo` returns the bound parameters as its output row, the way
//!   `SELECT ?, ? FROM RDB$DATABASE` or `INSERT ... RETURNING` does;
//! - `Script::Rows` is a cursor over fixed rows;
//! - `Script::Sequence` yields the next value of a counter per execution;
//! - `Script::Command` accepts parameters and returns nothing;
//! - `Script::Fail` and `Script::Invalid` fail at execute and prepare time.
//!
//! SQL that was never scripted prepares as a parameterless command. Every
//! execution is appended to a log, handles are validated, and blob contents
//! live in a shared store. Clones share the engine, so a test can keep one
//! clone for inspection while an attachment owns another.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Client, Handle, IscStatus};
use crate::protocol::constants::{
    DSQL_CLOSE, DSQL_DROP, FETCH_NO_MORE_ROWS, ISC_BAD_DB_HANDLE, ISC_BAD_REQ_HANDLE,
    ISC_BAD_SEGSTR_HANDLE, ISC_BAD_SEGSTR_ID, ISC_BAD_TRANS_HANDLE, ISC_DSQL_ERROR,
    ISC_INFO_BLOB_TOTAL_LENGTH, ISC_INFO_END, ISC_INFO_SQL_STMT_DDL, ISC_INFO_SQL_STMT_DELETE,
    ISC_INFO_SQL_STMT_EXEC_PROCEDURE, ISC_INFO_SQL_STMT_INSERT, ISC_INFO_SQL_STMT_SELECT,
    ISC_INFO_SQL_STMT_SELECT_FOR_UPD, ISC_INFO_SQL_STMT_SET_GENERATOR, ISC_INFO_SQL_STMT_TYPE,
    ISC_INFO_SQL_STMT_UPDATE, ISC_INFO_TRUNCATED, ISC_IO_ERROR, ISC_OPEN_TRANS, ISC_SEGMENT, ISC_SEGSTR_EOF,
    SQL_INT64,
};
use crate::protocol::types::{BlobId, ColumnType, SqlValue, SqlVar, Sqlda};
use crate::record::{inline_value, set_inline_value};

/// Behaviour of one scripted SQL text.
#[derive(Debug, Clone)]
pub enum Script {
    /// Parameters and output share `columns`; executing returns the parameters.
    Echo { columns: Vec<SqlVar> },
    /// A cursor over fixed rows.
    Rows {
        columns: Vec<SqlVar>,
        rows: Vec<Vec<SqlValue>>,
    },
    /// One BIGINT column named `column`, counting up from `start`.
    Sequence { column: String, start: i64 },
    /// Accepts `params`, returns no rows.
    Command { params: Vec<SqlVar> },
    /// Prepares, then fails every execution.
    Fail { code: IscStatus, message: String },
    /// Fails at prepare.
    Invalid { code: IscStatus, message: String },
}

impl Script {
    /// Cursor over `rows`.
    pub fn rows(columns: Vec<SqlVar>, rows: Vec<Vec<SqlValue>>) -> Self {
        Script::Rows { columns, rows }
    }

    /// Echo of `columns`.
    pub fn echo(columns: Vec<SqlVar>) -> Self {
        Script::Echo { columns }
    }

    /// Counter starting at `start`.
    pub fn sequence(column: impl Into<String>, start: i64) -> Self {
        Script::Sequence {
            column: column.into(),
            start,
        }
    }

    /// Command taking `params`.
    pub fn command(params: Vec<SqlVar>) -> Self {
        Script::Command { params }
    }

    /// Execution failure with a DSQL error code.
    pub fn fail(message: impl Into<String>) -> Self {
        Script::Fail {
            code: ISC_DSQL_ERROR,
            message: message.into(),
        }
    }

    fn params(&self) -> &[SqlVar] {
        match self {
            Script::Echo { columns } => columns,
            Script::Command { params } => params,
            _ => &[],
        }
    }

    fn columns(&self) -> Vec<SqlVar> {
        match self {
            Script::Echo { columns } | Script::Rows { columns, .. } => columns.clone(),
            Script::Sequence { column, .. } => vec![SqlVar::new(SQL_INT64, 8).named(column.clone())],
            _ => Vec::new(),
        }
    }
}

/// One logged execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// SQL text as prepared or executed immediately.
    pub sql: String,
    /// Bound parameter values.
    pub params: Vec<SqlValue>,
    /// Cursor name set on the statement, if any.
    pub cursor: Option<String>,
}

/// Counters and open-handle gauges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopbackStats {
    pub attachments: usize,
    pub statuses: usize,
    pub transactions: usize,
    pub statements: usize,
    pub blobs: usize,
    pub commits: usize,
    pub commits_retaining: usize,
    pub rollbacks: usize,
    pub rollbacks_retaining: usize,
}

enum PendingRow {
    Values(Vec<SqlValue>),
    Copy(Sqlda),
}

struct StatementState {
    db: Handle,
    sql: String,
    script: Script,
    cursor_name: Option<String>,
    cursor_open: bool,
    pending: VecDeque<PendingRow>,
}

enum BlobState {
    Read { id: u64, pos: usize },
    Write { id: u64, data: Vec<u8> },
}

#[derive(Default)]
struct Engine {
    next_handle: Handle,
    next_blob: u64,
    statuses: HashMap<Handle, String>,
    databases: HashSet<Handle>,
    transactions: HashMap<Handle, Handle>,
    statements: HashMap<Handle, StatementState>,
    blob_handles: HashMap<Handle, BlobState>,
    blobs: HashMap<u64, Vec<u8>>,
    scripts: HashMap<String, Script>,
    sequences: HashMap<String, i64>,
    refuse_attach: Option<String>,
    refuse_rollback: Option<String>,
    log: Vec<Execution>,
    stats: LoopbackStats,
}

fn normalize(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Statement type the server would report for `sql`.
fn statement_type(sql: &str) -> u32 {
    let upper = sql.trim_start().to_uppercase();
    let first = upper.split_whitespace().next().unwrap_or("");
    match first {
        "SELECT" | "WITH" if upper.contains(" FOR UPDATE") => ISC_INFO_SQL_STMT_SELECT_FOR_UPD,
        "SELECT" | "WITH" => ISC_INFO_SQL_STMT_SELECT,
        "INSERT" => ISC_INFO_SQL_STMT_INSERT,
        "UPDATE" | "MERGE" => ISC_INFO_SQL_STMT_UPDATE,
        "DELETE" => ISC_INFO_SQL_STMT_DELETE,
        "EXECUTE" => ISC_INFO_SQL_STMT_EXEC_PROCEDURE,
        "SET" if upper.starts_with("SET GENERATOR") => ISC_INFO_SQL_STMT_SET_GENERATOR,
        _ => ISC_INFO_SQL_STMT_DDL,
    }
}

/// Write `item, u16 LE length, value` followed by `isc_info_end`.
fn write_info(buffer: &mut [u8], items: &[(u8, Vec<u8>)]) {
    let mut pos = 0;
    for (item, value) in items {
        let needed = 3 + value.len();
        if pos + needed + 1 > buffer.len() {
            if pos < buffer.len() {
                buffer[pos] = ISC_INFO_TRUNCATED;
            }
            return;
        }
        buffer[pos] = *item;
        buffer[pos + 1..pos + 3].copy_from_slice(&(value.len() as u16).to_le_bytes());
        buffer[pos + 3..pos + needed].copy_from_slice(value);
        pos += needed;
    }
    if pos < buffer.len() {
        buffer[pos] = ISC_INFO_END;
    }
}

impl Engine {
    fn handle(&mut self) -> Handle {
        self.next_handle += 1;
        self.next_handle
    }

    fn fail(&mut self, status: Handle, code: IscStatus, message: impl Into<String>) -> IscStatus {
        if let Some(slot) = self.statuses.get_mut(&status) {
            *slot = message.into();
        }
        code
    }

    fn check_db(&mut self, status: Handle, db: Handle) -> Option<IscStatus> {
        if self.databases.contains(&db) {
            None
        } else {
            Some(self.fail(status, ISC_BAD_DB_HANDLE, "invalid database handle (no active connection)"))
        }
    }

    fn check_tr(&mut self, status: Handle, tr: Handle) -> Option<IscStatus> {
        if self.transactions.contains_key(&tr) {
            None
        } else {
            Some(self.fail(
                status,
                ISC_BAD_TRANS_HANDLE,
                "invalid transaction handle (expecting explicit transaction start)",
            ))
        }
    }

    fn check_stmt(&mut self, status: Handle, stmt: Handle) -> Option<IscStatus> {
        if self.statements.contains_key(&stmt) {
            None
        } else {
            Some(self.fail(status, ISC_BAD_REQ_HANDLE, "invalid request handle"))
        }
    }

    fn bad_blob(&mut self, status: Handle) -> IscStatus {
        self.fail(status, ISC_BAD_SEGSTR_HANDLE, "invalid BLOB handle")
    }

    fn new_blob(&mut self, data: Vec<u8>) -> u64 {
        self.next_blob += 1;
        self.blobs.insert(self.next_blob, data);
        self.next_blob
    }

    /// Values of a parameter row, blobs resolved through the store.
    fn capture(&self, input: Option<&Sqlda>) -> Vec<SqlValue> {
        let Some(da) = input else {
            return Vec::new();
        };
        (0..da.count())
            .map(|i| {
                let kind = da.column_type(i).ok().flatten().filter(|t| t.is_blob());
                if let (Some(kind), Ok(false)) = (kind, da.is_null(i)) {
                    let data = da
                        .get_blob_id(i)
                        .ok()
                        .and_then(|id| self.blobs.get(&id.0).cloned())
                        .unwrap_or_default();
                    return match kind {
                        ColumnType::BlobText => SqlValue::String(String::from_utf8_lossy(&data).into_owned()),
                        _ => SqlValue::Bytes(data),
                    };
                }
                inline_value(da, i).unwrap_or(SqlValue::Null)
            })
            .collect()
    }

    /// Write a scripted row into `output`, storing blob values.
    fn fill(&mut self, output: &mut Sqlda, row: &PendingRow) -> std::result::Result<(), String> {
        match row {
            PendingRow::Copy(src) => {
                for i in 0..output.count().min(src.count()) {
                    output.copy_column_from(i, src, i).map_err(|e| e.to_string())?;
                }
            }
            PendingRow::Values(values) => {
                for (i, value) in values.iter().enumerate().take(output.count()) {
                    let is_blob = output.column_type(i).ok().flatten().is_some_and(|t| t.is_blob());
                    let result = match value {
                        SqlValue::String(s) if is_blob => {
                            let id = self.new_blob(s.as_bytes().to_vec());
                            output.set_blob_id(i, BlobId(id))
                        }
                        SqlValue::Bytes(b) if is_blob => {
                            let id = self.new_blob(b.clone());
                            output.set_blob_id(i, BlobId(id))
                        }
                        _ => set_inline_value(output, i, value),
                    };
                    result.map_err(|e| e.to_string())?;
                }
            }
        }
        Ok(())
    }

    /// Run a prepared statement, queueing the rows it produces.
    fn run(&mut self, status: Handle, stmt: Handle, input: Option<&Sqlda>) -> IscStatus {
        let params = self.capture(input);
        let Some(state) = self.statements.get(&stmt) else {
            return self.fail(status, ISC_BAD_REQ_HANDLE, "invalid request handle");
        };
        let entry = Execution {
            sql: state.sql.clone(),
            params,
            cursor: state.cursor_name.clone(),
        };
        let script = state.script.clone();
        let key = normalize(&state.sql);
        self.log.push(entry);

        let rows: VecDeque<PendingRow> = match script {
            Script::Echo { .. } => {
                let row = input.cloned().unwrap_or_default();
                VecDeque::from([PendingRow::Copy(row)])
            }
            Script::Rows { rows, .. } => rows.into_iter().map(PendingRow::Values).collect(),
            Script::Sequence { start, .. } => {
                let next = self.sequences.entry(key).or_insert(start);
                let value = *next;
                *next += 1;
                VecDeque::from([PendingRow::Values(vec![SqlValue::Long(value)])])
            }
            Script::Command { .. } => VecDeque::new(),
            Script::Fail { code, message } | Script::Invalid { code, message } => {
                return self.fail(status, code, message);
            }
        };
        if let Some(state) = self.statements.get_mut(&stmt) {
            state.pending = rows;
        }
        0
    }
}

/// Scriptable in-memory client.
#[derive(Clone, Default)]
pub struct LoopbackClient {
    engine: Arc<Mutex<Engine>>,
}

impl LoopbackClient {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    fn engine(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Script the behaviour of `sql`. Whitespace runs are insignificant.
    pub fn script(&self, sql: &str, script: Script) -> &Self {
        self.engine().scripts.insert(normalize(sql), script);
        self
    }

    /// Make every attach and create fail with `message`.
    pub fn refuse_attach(&self, message: impl Into<String>) {
        self.engine().refuse_attach = Some(message.into());
    }

    /// Make every rollback fail with `message`, leaving the transaction open.
    pub fn refuse_rollback(&self, message: impl Into<String>) {
        self.engine().refuse_rollback = Some(message.into());
    }

    /// Every execution so far, in order.
    pub fn executions(&self) -> Vec<Execution> {
        self.engine().log.clone()
    }

    /// Executions of one SQL text.
    pub fn executions_of(&self, sql: &str) -> Vec<Execution> {
        let sql = normalize(sql);
        self.engine()
            .log
            .iter()
            .filter(|e| normalize(&e.sql) == sql)
            .cloned()
            .collect()
    }

    /// Counters and open handles.
    pub fn stats(&self) -> LoopbackStats {
        let engine = self.engine();
        LoopbackStats {
            attachments: engine.databases.len(),
            statuses: engine.statuses.len(),
            transactions: engine.transactions.len(),
            statements: engine.statements.len(),
            blobs: engine.blob_handles.len(),
            ..engine.stats
        }
    }

    /// Contents of a stored blob.
    pub fn blob(&self, id: BlobId) -> Option<Vec<u8>> {
        self.engine().blobs.get(&id.0).cloned()
    }

    /// Store a blob and return its id.
    pub fn insert_blob(&self, data: impl Into<Vec<u8>>) -> BlobId {
        BlobId(self.engine().new_blob(data.into()))
    }

    fn attach(&mut self, status: Handle, db: &mut Handle) -> IscStatus {
        let mut engine = self.engine();
        if let Some(message) = engine.refuse_attach.clone() {
            return engine.fail(status, ISC_IO_ERROR, message);
        }
        let handle = engine.handle();
        engine.databases.insert(handle);
        *db = handle;
        0
    }
}

impl Client for LoopbackClient {
    fn alloc_status(&mut self) -> Handle {
        let mut engine = self.engine();
        let handle = engine.handle();
        engine.statuses.insert(handle, String::new());
        handle
    }

    fn free_status(&mut self, status: Handle) {
        self.engine().statuses.remove(&status);
    }

    fn interpret(&mut self, status: Handle) -> String {
        self.engine().statuses.get(&status).cloned().unwrap_or_default()
    }

    fn attach_database(&mut self, status: Handle, db: &mut Handle, _path: &str, _dpb: &[u8]) -> IscStatus {
        self.attach(status, db)
    }

    fn create_database(&mut self, status: Handle, db: &mut Handle, _path: &str, _dpb: &[u8]) -> IscStatus {
        self.attach(status, db)
    }

    fn detach_database(&mut self, status: Handle, db: &mut Handle) -> IscStatus {
        let mut engine = self.engine();
        if let Some(code) = engine.check_db(status, *db) {
            return code;
        }
        let open = engine.transactions.values().filter(|owner| **owner == *db).count();
        if open > 0 {
            let message = format!("cannot disconnect database with open transactions ({} active)", open);
            return engine.fail(status, ISC_OPEN_TRANS, message);
        }
        let handle = *db;
        engine.statements.retain(|_, s| s.db != handle);
        engine.databases.remove(&handle);
        *db = 0;
        0
    }

    fn execute_immediate(
        &mut self,
        status: Handle,
        db: &mut Handle,
        tr: &mut Handle,
        _dialect: u16,
        sql: &str,
    ) -> IscStatus {
        let mut engine = self.engine();
        if let Some(code) = engine.check_db(status, *db).or_else(|| engine.check_tr(status, *tr)) {
            return code;
        }
        engine.log.push(Execution {
            sql: sql.to_string(),
            params: Vec::new(),
            cursor: None,
        });
        match engine.scripts.get(&normalize(sql)).cloned() {
            Some(Script::Fail { code, message }) | Some(Script::Invalid { code, message }) => {
                engine.fail(status, code, message)
            }
            _ => 0,
        }
    }

    fn start_transaction(&mut self, status: Handle, tr: &mut Handle, db: &mut Handle, _tpb: &[u8]) -> IscStatus {
        let mut engine = self.engine();
        if let Some(code) = engine.check_db(status, *db) {
            return code;
        }
        let handle = engine.handle();
        engine.transactions.insert(handle, *db);
        *tr = handle;
        0
    }

    fn commit_transaction(&mut self, status: Handle, tr: &mut Handle, retaining: bool) -> IscStatus {
        let mut engine = self.engine();
        if let Some(code) = engine.check_tr(status, *tr) {
            return code;
        }
        if retaining {
            engine.stats.commits_retaining += 1;
        } else {
            engine.stats.commits += 1;
            engine.transactions.remove(tr);
            *tr = 0;
        }
        0
    }

    fn rollback_transaction(&mut self, status: Handle, tr: &mut Handle, retaining: bool) -> IscStatus {
        let mut engine = self.engine();
        if let Some(code) = engine.check_tr(status, *tr) {
            return code;
        }
        if let Some(message) = engine.refuse_rollback.clone() {
            return engine.fail(status, ISC_IO_ERROR, message);
        }
        if retaining {
            engine.stats.rollbacks_retaining += 1;
        } else {
            engine.stats.rollbacks += 1;
            engine.transactions.remove(tr);
            *tr = 0;
        }
        0
    }

    fn allocate_statement(&mut self, status: Handle, db: &mut Handle, stmt: &mut Handle) -> IscStatus {
        let mut engine = self.engine();
        if let Some(code) = engine.check_db(status, *db) {
            return code;
        }
        let handle = engine.handle();
        engine.statements.insert(
            handle,
            StatementState {
                db: *db,
                sql: String::new(),
                script: Script::command(Vec::new()),
                cursor_name: None,
                cursor_open: false,
                pending: VecDeque::new(),
            },
        );
        *stmt = handle;
        0
    }

    fn prepare_statement(
        &mut self,
        status: Handle,
        tr: &mut Handle,
        stmt: &mut Handle,
        _dialect: u16,
        sql: &str,
        output: &mut Sqlda,
    ) -> IscStatus {
        let mut engine = self.engine();
        if let Some(code) = engine.check_tr(status, *tr).or_else(|| engine.check_stmt(status, *stmt)) {
            return code;
        }
        let script = engine
            .scripts
            .get(&normalize(sql))
            .cloned()
            .unwrap_or_else(|| Script::command(Vec::new()));
        if let Script::Invalid { code, message } = script {
            return engine.fail(status, code, message);
        }
        output.describe(script.columns());
        if let Some(state) = engine.statements.get_mut(stmt) {
            state.sql = sql.to_string();
            state.script = script;
            state.cursor_open = false;
            state.pending.clear();
        }
        0
    }

    fn set_cursor_name(&mut self, status: Handle, stmt: &mut Handle, name: &str) -> IscStatus {
        let mut engine = self.engine();
        match engine.statements.get_mut(stmt) {
            Some(state) => {
                state.cursor_name = Some(name.to_string());
                0
            }
            None => engine.fail(status, ISC_BAD_REQ_HANDLE, "invalid request handle"),
        }
    }

    fn describe_bind(&mut self, status: Handle, stmt: &mut Handle, _dialect: u16, input: &mut Sqlda) -> IscStatus {
        let mut engine = self.engine();
        match engine.statements.get(stmt) {
            Some(state) => {
                input.describe(state.script.params().to_vec());
                0
            }
            None => engine.fail(status, ISC_BAD_REQ_HANDLE, "invalid request handle"),
        }
    }

    fn sql_info(&mut self, status: Handle, stmt: &mut Handle, items: &[u8], buffer: &mut [u8]) -> IscStatus {
        let mut engine = self.engine();
        let Some(state) = engine.statements.get(stmt) else {
            return engine.fail(status, ISC_BAD_REQ_HANDLE, "invalid request handle");
        };
        let kind = statement_type(&state.sql);
        let reply: Vec<(u8, Vec<u8>)> = items
            .iter()
            .filter(|item| **item == ISC_INFO_SQL_STMT_TYPE)
            .map(|item| (*item, kind.to_le_bytes().to_vec()))
            .collect();
        write_info(buffer, &reply);
        0
    }

    fn execute(
        &mut self,
        status: Handle,
        tr: &mut Handle,
        stmt: &mut Handle,
        _dialect: u16,
        input: Option<&Sqlda>,
    ) -> IscStatus {
        let mut engine = self.engine();
        if let Some(code) = engine.check_tr(status, *tr).or_else(|| engine.check_stmt(status, *stmt)) {
            return code;
        }
        if engine.statements.get(stmt).is_some_and(|s| s.cursor_open) {
            return engine.fail(status, ISC_DSQL_ERROR, "Dynamic SQL Error\nAttempt to reopen an open cursor");
        }
        let code = engine.run(status, *stmt, input);
        if code == 0 {
            if let Some(state) = engine.statements.get_mut(stmt) {
                state.cursor_open = true;
            }
        }
        code
    }

    fn execute2(
        &mut self,
        status: Handle,
        tr: &mut Handle,
        stmt: &mut Handle,
        _dialect: u16,
        input: Option<&Sqlda>,
        output: Option<&mut Sqlda>,
    ) -> IscStatus {
        let mut engine = self.engine();
        if let Some(code) = engine.check_tr(status, *tr).or_else(|| engine.check_stmt(status, *stmt)) {
            return code;
        }
        let code = engine.run(status, *stmt, input);
        if code != 0 {
            return code;
        }
        let row = engine.statements.get_mut(stmt).and_then(|s| s.pending.pop_front());
        if let (Some(output), Some(row)) = (output, row) {
            if let Err(message) = engine.fill(output, &row) {
                return engine.fail(status, ISC_DSQL_ERROR, message);
            }
        }
        if let Some(state) = engine.statements.get_mut(stmt) {
            state.pending.clear();
        }
        0
    }

    fn fetch(&mut self, status: Handle, stmt: &mut Handle, output: &mut Sqlda) -> IscStatus {
        let mut engine = self.engine();
        let Some(state) = engine.statements.get_mut(stmt) else {
            return engine.fail(status, ISC_BAD_REQ_HANDLE, "invalid request handle");
        };
        if !state.cursor_open {
            return engine.fail(status, ISC_DSQL_ERROR, "Dynamic SQL Error\nAttempt to fetch from a closed cursor");
        }
        let Some(row) = state.pending.pop_front() else {
            return FETCH_NO_MORE_ROWS;
        };
        match engine.fill(output, &row) {
            Ok(()) => 0,
            Err(message) => engine.fail(status, ISC_DSQL_ERROR, message),
        }
    }

    fn free_statement(&mut self, status: Handle, stmt: &mut Handle, option: u16) -> IscStatus {
        let mut engine = self.engine();
        if let Some(code) = engine.check_stmt(status, *stmt) {
            return code;
        }
        match option {
            DSQL_DROP => {
                engine.statements.remove(stmt);
                *stmt = 0;
            }
            DSQL_CLOSE => {
                if let Some(state) = engine.statements.get_mut(stmt) {
                    state.cursor_open = false;
                    state.pending.clear();
                }
            }
            _ => {}
        }
        0
    }

    fn open_blob(
        &mut self,
        status: Handle,
        db: &mut Handle,
        tr: &mut Handle,
        blob: &mut Handle,
        id: BlobId,
    ) -> IscStatus {
        let mut engine = self.engine();
        if let Some(code) = engine.check_db(status, *db).or_else(|| engine.check_tr(status, *tr)) {
            return code;
        }
        if !engine.blobs.contains_key(&id.0) {
            return engine.fail(status, ISC_BAD_SEGSTR_ID, "invalid BLOB ID");
        }
        let handle = engine.handle();
        engine.blob_handles.insert(handle, BlobState::Read { id: id.0, pos: 0 });
        *blob = handle;
        0
    }

    fn create_blob(
        &mut self,
        status: Handle,
        db: &mut Handle,
        tr: &mut Handle,
        blob: &mut Handle,
        id: &mut BlobId,
    ) -> IscStatus {
        let mut engine = self.engine();
        if let Some(code) = engine.check_db(status, *db).or_else(|| engine.check_tr(status, *tr)) {
            return code;
        }
        let new_id = engine.new_blob(Vec::new());
        let handle = engine.handle();
        engine.blob_handles.insert(handle, BlobState::Write { id: new_id, data: Vec::new() });
        *blob = handle;
        *id = BlobId(new_id);
        0
    }

    fn get_segment(&mut self, status: Handle, blob: &mut Handle, actual: &mut u16, buffer: &mut [u8]) -> IscStatus {
        let mut engine = self.engine();
        let engine = &mut *engine;
        let Some(BlobState::Read { id, pos }) = engine.blob_handles.get_mut(blob) else {
            return engine.bad_blob(status);
        };
        let data = engine.blobs.get(&*id).map(Vec::as_slice).unwrap_or_default();
        let remaining = data.len().saturating_sub(*pos);
        if remaining == 0 {
            *actual = 0;
            return engine.fail(status, ISC_SEGSTR_EOF, "attempted retrieval of more segments than exist");
        }
        let n = remaining.min(buffer.len()).min(u16::MAX as usize);
        buffer[..n].copy_from_slice(&data[*pos..*pos + n]);
        *pos += n;
        *actual = n as u16;
        if n < remaining {
            ISC_SEGMENT
        } else {
            0
        }
    }

    fn put_segment(&mut self, status: Handle, blob: &mut Handle, data: &[u8]) -> IscStatus {
        let mut engine = self.engine();
        match engine.blob_handles.get_mut(blob) {
            Some(BlobState::Write { data: buffer, .. }) => {
                buffer.extend_from_slice(data);
                0
            }
            _ => engine.bad_blob(status),
        }
    }

    fn blob_info(&mut self, status: Handle, blob: &mut Handle, items: &[u8], buffer: &mut [u8]) -> IscStatus {
        let mut engine = self.engine();
        let length = match engine.blob_handles.get(blob) {
            Some(BlobState::Read { id, .. }) => engine.blobs.get(id).map_or(0, Vec::len),
            Some(BlobState::Write { data, .. }) => data.len(),
            None => return engine.bad_blob(status),
        };
        let reply: Vec<(u8, Vec<u8>)> = items
            .iter()
            .filter(|item| **item == ISC_INFO_BLOB_TOTAL_LENGTH)
            .map(|item| (*item, (length as u32).to_le_bytes().to_vec()))
            .collect();
        write_info(buffer, &reply);
        0
    }

    fn close_blob(&mut self, status: Handle, blob: &mut Handle) -> IscStatus {
        let mut engine = self.engine();
        match engine.blob_handles.remove(blob) {
            Some(BlobState::Write { id, data }) => {
                engine.blobs.insert(id, data);
            }
            Some(BlobState::Read { .. }) => {}
            None => return engine.bad_blob(status),
        }
        *blob = 0;
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::buffer::ReadBuffer;
    use crate::protocol::constants::{CS_UTF8, SQL_LONG, SQL_VARYING};

    fn attached() -> (LoopbackClient, Handle, Handle) {
        let mut client = LoopbackClient::new();
        let status = client.alloc_status();
        let mut db = 0;
        assert_eq!(client.attach_database(status, &mut db, "test.fdb", &[]), 0);
        (client, status, db)
    }

    #[test]
    fn test_statement_type() {
        assert_eq!(statement_type("select 1 from rdb$database"), ISC_INFO_SQL_STMT_SELECT);
        assert_eq!(statement_type("SELECT a FROM t FOR UPDATE"), ISC_INFO_SQL_STMT_SELECT_FOR_UPD);
        assert_eq!(statement_type("  insert into t values (1)"), ISC_INFO_SQL_STMT_INSERT);
        assert_eq!(statement_type("create table t (a int)"), ISC_INFO_SQL_STMT_DDL);
        assert_eq!(statement_type("execute procedure p"), ISC_INFO_SQL_STMT_EXEC_PROCEDURE);
    }

    #[test]
    fn test_write_info_truncated() {
        let mut buf = [0u8; 4];
        write_info(&mut buf, &[(ISC_INFO_BLOB_TOTAL_LENGTH, vec![1, 0, 0, 0])]);
        assert_eq!(buf[0], ISC_INFO_TRUNCATED);
    }

    #[test]
    fn test_transaction_handles() {
        let (mut client, status, mut db) = attached();
        let mut tr = 0;
        assert_eq!(client.start_transaction(status, &mut tr, &mut db, &[]), 0);
        assert_ne!(tr, 0);
        assert_eq!(client.commit_transaction(status, &mut tr, true), 0);
        assert_ne!(tr, 0);
        assert_eq!(client.commit_transaction(status, &mut tr, false), 0);
        assert_eq!(tr, 0);
        assert_eq!(client.commit_transaction(status, &mut tr, false), ISC_BAD_TRANS_HANDLE);
        assert!(client.interpret(status).contains("invalid transaction handle"));
        let stats = client.stats();
        assert_eq!((stats.commits, stats.commits_retaining), (1, 1));
    }

    #[test]
    fn test_detach_with_open_transaction() {
        let (mut client, status, mut db) = attached();
        let mut tr = 0;
        client.start_transaction(status, &mut tr, &mut db, &[]);
        assert_eq!(client.detach_database(status, &mut db), ISC_OPEN_TRANS);
        client.rollback_transaction(status, &mut tr, false);
        assert_eq!(client.detach_database(status, &mut db), 0);
        assert_eq!(db, 0);
    }

    #[test]
    fn test_rows_cursor() {
        let (mut client, status, mut db) = attached();
        client.script(
            "select id from t",
            Script::rows(
                vec![SqlVar::new(SQL_LONG, 4).named("ID")],
                vec![vec![SqlValue::Int(1)], vec![SqlValue::Int(2)]],
            ),
        );
        let (mut tr, mut stmt) = (0, 0);
        client.start_transaction(status, &mut tr, &mut db, &[]);
        client.allocate_statement(status, &mut db, &mut stmt);
        let mut out = Sqlda::new();
        assert_eq!(client.prepare_statement(status, &mut tr, &mut stmt, 3, "select  id\n from t", &mut out), 0);
        assert_eq!(out.count(), 1);
        assert_eq!(client.fetch(status, &mut stmt, &mut out), ISC_DSQL_ERROR);
        assert_eq!(client.execute(status, &mut tr, &mut stmt, 3, None), 0);
        assert_eq!(client.fetch(status, &mut stmt, &mut out), 0);
        assert_eq!(out.get_i32(0).unwrap(), 1);
        assert_eq!(client.fetch(status, &mut stmt, &mut out), 0);
        assert_eq!(out.get_i32(0).unwrap(), 2);
        assert_eq!(client.fetch(status, &mut stmt, &mut out), FETCH_NO_MORE_ROWS);
        assert_eq!(client.free_statement(status, &mut stmt, DSQL_DROP), 0);
        assert_eq!(stmt, 0);
    }

    #[test]
    fn test_echo_execute2() {
        let (mut client, status, mut db) = attached();
        let columns = vec![SqlVar::new(SQL_VARYING, 40).with_subtype(CS_UTF8).nullable()];
        client.script("select ? from rdb$database", Script::echo(columns));
        let (mut tr, mut stmt) = (0, 0);
        client.start_transaction(status, &mut tr, &mut db, &[]);
        client.allocate_statement(status, &mut db, &mut stmt);
        let mut out = Sqlda::new();
        client.prepare_statement(status, &mut tr, &mut stmt, 3, "select ? from rdb$database", &mut out);
        let mut input = Sqlda::new();
        client.describe_bind(status, &mut stmt, 3, &mut input);
        input.set_text(0, "firebird").unwrap();
        assert_eq!(client.execute2(status, &mut tr, &mut stmt, 3, Some(&input), Some(&mut out)), 0);
        assert_eq!(out.get_text(0).unwrap(), "firebird");
        let log = client.executions();
        assert_eq!(log[0].params, vec![SqlValue::String("firebird".into())]);
    }

    #[test]
    fn test_blob_segments_and_info() {
        let (mut client, status, mut db) = attached();
        let (mut tr, mut blob) = (0, 0);
        client.start_transaction(status, &mut tr, &mut db, &[]);
        let mut id = BlobId::NULL;
        assert_eq!(client.create_blob(status, &mut db, &mut tr, &mut blob, &mut id), 0);
        client.put_segment(status, &mut blob, b"hello ");
        client.put_segment(status, &mut blob, b"world");
        assert_eq!(client.close_blob(status, &mut blob), 0);
        assert_eq!(client.blob(id).as_deref(), Some(&b"hello world"[..]));

        assert_eq!(client.open_blob(status, &mut db, &mut tr, &mut blob, id), 0);
        let mut info = [0u8; 16];
        client.blob_info(status, &mut blob, &[ISC_INFO_BLOB_TOTAL_LENGTH], &mut info);
        assert_eq!(&info[..8], &[6, 4, 0, 11, 0, 0, 0, 1]);
        let length = ReadBuffer::new(&info).find_int(ISC_INFO_BLOB_TOTAL_LENGTH).unwrap();
        assert_eq!(length, Some(11));

        let mut buf = [0u8; 8];
        let mut actual = 0;
        assert_eq!(client.get_segment(status, &mut blob, &mut actual, &mut buf), ISC_SEGMENT);
        assert_eq!(&buf[..actual as usize], b"hello wo");
        assert_eq!(client.get_segment(status, &mut blob, &mut actual, &mut buf), 0);
        assert_eq!(&buf[..actual as usize], b"rld");
        assert_eq!(client.get_segment(status, &mut blob, &mut actual, &mut buf), ISC_SEGSTR_EOF);
        assert_eq!(client.close_blob(status, &mut blob), 0);
    }

    #[test]
    fn test_bad_handles() {
        let (mut client, status, _) = attached();
        let mut bogus = 999;
        let mut stmt = 0;
        assert_eq!(client.allocate_statement(status, &mut bogus, &mut stmt), ISC_BAD_DB_HANDLE);
        assert_eq!(client.free_statement(status, &mut bogus, DSQL_DROP), ISC_BAD_REQ_HANDLE);
        assert_eq!(client.close_blob(status, &mut bogus), ISC_BAD_SEGSTR_HANDLE);
    }
}
