//! Firebird client API constants.
//!
//! Values match `ibase.h` / `consts_pub.h` of the Firebird 4+ client headers.

// Status word layout
pub const ISC_MASK: i64 = 0x1400_0000;
pub const FAC_MASK: i64 = 0x00FF_0000;
pub const CODE_MASK: i64 = 0x0000_FFFF;
pub const CLASS_MASK: i64 = 0xF000_0000;

pub const CLASS_ERROR: i64 = 0;
pub const CLASS_WARNING: i64 = 1;
pub const CLASS_INFO: i64 = 2;

pub const ISC_STATUS_LENGTH: usize = 20;

// Status codes the core reacts to
pub const ISC_BAD_DB_HANDLE: i64 = 335544324;
pub const ISC_BAD_REQ_HANDLE: i64 = 335544327;
pub const ISC_BAD_SEGSTR_HANDLE: i64 = 335544328;
pub const ISC_BAD_SEGSTR_ID: i64 = 335544329;
pub const ISC_BAD_TRANS_HANDLE: i64 = 335544332;
pub const ISC_IO_ERROR: i64 = 335544344;
pub const ISC_NO_CUR_REC: i64 = 335544348;
pub const ISC_OPEN_TRANS: i64 = 335544357;
pub const ISC_SEGMENT: i64 = 335544366;
pub const ISC_SEGSTR_EOF: i64 = 335544367;
pub const ISC_DSQL_ERROR: i64 = 335544569;

/// `isc_dsql_fetch` return value once the cursor is exhausted.
pub const FETCH_NO_MORE_ROWS: i64 = 100;

// isc_dsql_free_statement options
pub const DSQL_CLOSE: u16 = 1;
pub const DSQL_DROP: u16 = 2;
pub const DSQL_UNPREPARE: u16 = 4;

pub const SQLDA_VERSION1: u16 = 1;
pub const SQL_DIALECT_CURRENT: u16 = 3;

// XSQLVAR sqltype codes (the low bit flags a nullable column)
pub const SQL_TEXT: i16 = 452;
pub const SQL_VARYING: i16 = 448;
pub const SQL_SHORT: i16 = 500;
pub const SQL_LONG: i16 = 496;
pub const SQL_FLOAT: i16 = 482;
pub const SQL_DOUBLE: i16 = 480;
pub const SQL_D_FLOAT: i16 = 530;
pub const SQL_TIMESTAMP: i16 = 510;
pub const SQL_BLOB: i16 = 520;
pub const SQL_ARRAY: i16 = 540;
pub const SQL_QUAD: i16 = 550;
pub const SQL_TYPE_TIME: i16 = 560;
pub const SQL_TYPE_DATE: i16 = 570;
pub const SQL_INT64: i16 = 580;
pub const SQL_TIMESTAMP_TZ_EX: i16 = 32748;
pub const SQL_TIME_TZ_EX: i16 = 32750;
pub const SQL_INT128: i16 = 32752;
pub const SQL_TIMESTAMP_TZ: i16 = 32754;
pub const SQL_TIME_TZ: i16 = 32756;
pub const SQL_DEC16: i16 = 32760;
pub const SQL_DEC34: i16 = 32762;
pub const SQL_BOOLEAN: i16 = 32764;
pub const SQL_NULL: i16 = 32766;

// Character sets (sqlsubtype of text columns)
pub const CS_NONE: i16 = 0;
pub const CS_BINARY: i16 = 1;
pub const CS_UTF8: i16 = 4;

/// Blob subtype for text blobs.
pub const BLOB_SUB_TYPE_TEXT: i16 = 1;

/// Largest segment moved in one `isc_get_segment`/`isc_put_segment` call.
pub const MAX_SEGMENT_SIZE: usize = i16::MAX as usize;

/// ISC day number of 1970-01-01 (ISC dates count days from 1858-11-17).
pub const ISC_EPOCH_OFFSET_DAYS: i32 = 40587;
/// ISC time is stored in units of 100 microseconds.
pub const ISC_TIME_UNITS_PER_MILLI: i32 = 10;

// Info items
pub const ISC_INFO_END: u8 = 1;
pub const ISC_INFO_TRUNCATED: u8 = 2;
pub const ISC_INFO_ERROR: u8 = 3;
pub const ISC_INFO_BLOB_TOTAL_LENGTH: u8 = 6;
pub const ISC_INFO_SQL_STMT_TYPE: u8 = 21;

// isc_info_sql_stmt_type values
pub const ISC_INFO_SQL_STMT_SELECT: u32 = 1;
pub const ISC_INFO_SQL_STMT_INSERT: u32 = 2;
pub const ISC_INFO_SQL_STMT_UPDATE: u32 = 3;
pub const ISC_INFO_SQL_STMT_DELETE: u32 = 4;
pub const ISC_INFO_SQL_STMT_DDL: u32 = 5;
pub const ISC_INFO_SQL_STMT_GET_SEGMENT: u32 = 6;
pub const ISC_INFO_SQL_STMT_PUT_SEGMENT: u32 = 7;
pub const ISC_INFO_SQL_STMT_EXEC_PROCEDURE: u32 = 8;
pub const ISC_INFO_SQL_STMT_START_TRANS: u32 = 9;
pub const ISC_INFO_SQL_STMT_COMMIT: u32 = 10;
pub const ISC_INFO_SQL_STMT_ROLLBACK: u32 = 11;
pub const ISC_INFO_SQL_STMT_SELECT_FOR_UPD: u32 = 12;
pub const ISC_INFO_SQL_STMT_SET_GENERATOR: u32 = 13;
pub const ISC_INFO_SQL_STMT_SAVEPOINT: u32 = 14;

// Database parameter block
pub const ISC_DPB_VERSION1: u8 = 1;
pub const ISC_DPB_PAGE_SIZE: u8 = 4;
pub const ISC_DPB_NUM_BUFFERS: u8 = 5;
pub const ISC_DPB_DEBUG: u8 = 7;
pub const ISC_DPB_VERIFY: u8 = 9;
pub const ISC_DPB_SWEEP: u8 = 10;
pub const ISC_DPB_ENABLE_JOURNAL: u8 = 11;
pub const ISC_DPB_DBKEY_SCOPE: u8 = 13;
pub const ISC_DPB_TRACE: u8 = 15;
pub const ISC_DPB_NO_GARBAGE_COLLECT: u8 = 16;
pub const ISC_DPB_DAMAGED: u8 = 17;
pub const ISC_DPB_ACTIVATE_SHADOW: u8 = 21;
pub const ISC_DPB_SWEEP_INTERVAL: u8 = 22;
pub const ISC_DPB_DELETE_SHADOW: u8 = 23;
pub const ISC_DPB_FORCE_WRITE: u8 = 24;
pub const ISC_DPB_NO_RESERVE: u8 = 27;
pub const ISC_DPB_USER_NAME: u8 = 28;
pub const ISC_DPB_PASSWORD: u8 = 29;
pub const ISC_DPB_INTERP: u8 = 32;
pub const ISC_DPB_DROP_WALFILE: u8 = 40;
pub const ISC_DPB_LC_CTYPE: u8 = 48;
pub const ISC_DPB_SHUTDOWN: u8 = 50;
pub const ISC_DPB_ONLINE: u8 = 51;
pub const ISC_DPB_SHUTDOWN_DELAY: u8 = 52;
pub const ISC_DPB_RESERVED: u8 = 53;
pub const ISC_DPB_OVERWRITE: u8 = 54;
pub const ISC_DPB_SEC_ATTACH: u8 = 55;
pub const ISC_DPB_DISABLE_WAL: u8 = 56;
pub const ISC_DPB_CONNECT_TIMEOUT: u8 = 57;
pub const ISC_DPB_DUMMY_PACKET_INTERVAL: u8 = 58;
pub const ISC_DPB_GBAK_ATTACH: u8 = 59;
pub const ISC_DPB_SQL_ROLE_NAME: u8 = 60;
pub const ISC_DPB_SET_PAGE_BUFFERS: u8 = 61;
pub const ISC_DPB_WORKING_DIRECTORY: u8 = 62;
pub const ISC_DPB_SQL_DIALECT: u8 = 63;
pub const ISC_DPB_SET_DB_READONLY: u8 = 64;
pub const ISC_DPB_SET_DB_SQL_DIALECT: u8 = 65;
pub const ISC_DPB_GFIX_ATTACH: u8 = 66;
pub const ISC_DPB_GSTAT_ATTACH: u8 = 67;
pub const ISC_DPB_SET_DB_CHARSET: u8 = 68;
pub const ISC_DPB_ADDRESS_PATH: u8 = 70;
pub const ISC_DPB_PROCESS_ID: u8 = 71;
pub const ISC_DPB_NO_DB_TRIGGERS: u8 = 72;
pub const ISC_DPB_TRUSTED_AUTH: u8 = 73;
pub const ISC_DPB_PROCESS_NAME: u8 = 74;
pub const ISC_DPB_ORG_FILENAME: u8 = 76;
pub const ISC_DPB_UTF8_FILENAME: u8 = 77;
pub const ISC_DPB_EXT_CALL_DEPTH: u8 = 78;
pub const ISC_DPB_AUTH_BLOCK: u8 = 79;
pub const ISC_DPB_CLIENT_VERSION: u8 = 80;
pub const ISC_DPB_REMOTE_PROTOCOL: u8 = 81;
pub const ISC_DPB_HOST_NAME: u8 = 82;
pub const ISC_DPB_OS_USER: u8 = 83;
pub const ISC_DPB_CONFIG: u8 = 87;
pub const ISC_DPB_NOLINGER: u8 = 88;
pub const ISC_DPB_RESET_ICU: u8 = 89;
pub const ISC_DPB_MAP_ATTACH: u8 = 90;
pub const ISC_DPB_SESSION_TIME_ZONE: u8 = 91;
pub const ISC_DPB_SET_DB_REPLICA: u8 = 92;
pub const ISC_DPB_SET_BIND: u8 = 93;
pub const ISC_DPB_DECFLOAT_ROUND: u8 = 94;
pub const ISC_DPB_DECFLOAT_TRAPS: u8 = 95;
pub const ISC_DPB_CLEAR_MAP: u8 = 96;
pub const ISC_DPB_UPGRADE_DB: u8 = 97;
pub const ISC_DPB_PARALLEL_WORKERS: u8 = 100;
pub const ISC_DPB_WORKER_ATTACH: u8 = 101;

// isc_dpb_set_db_replica values
pub const ISC_DPB_REPLICA_NONE: u32 = 0;
pub const ISC_DPB_REPLICA_READ_ONLY: u32 = 1;
pub const ISC_DPB_REPLICA_READ_WRITE: u32 = 2;

// Transaction parameter block
pub const ISC_TPB_VERSION1: u8 = 1;
pub const ISC_TPB_CONSISTENCY: u8 = 1;
pub const ISC_TPB_CONCURRENCY: u8 = 2;
pub const ISC_TPB_SHARED: u8 = 3;
pub const ISC_TPB_PROTECTED: u8 = 4;
pub const ISC_TPB_EXCLUSIVE: u8 = 5;
pub const ISC_TPB_WAIT: u8 = 6;
pub const ISC_TPB_NOWAIT: u8 = 7;
pub const ISC_TPB_READ: u8 = 8;
pub const ISC_TPB_WRITE: u8 = 9;
pub const ISC_TPB_LOCK_READ: u8 = 10;
pub const ISC_TPB_LOCK_WRITE: u8 = 11;
pub const ISC_TPB_IGNORE_LIMBO: u8 = 14;
pub const ISC_TPB_READ_COMMITTED: u8 = 15;
pub const ISC_TPB_AUTOCOMMIT: u8 = 16;
pub const ISC_TPB_REC_VERSION: u8 = 17;
pub const ISC_TPB_NO_REC_VERSION: u8 = 18;
pub const ISC_TPB_RESTART_REQUESTS: u8 = 19;
pub const ISC_TPB_NO_AUTO_UNDO: u8 = 20;
pub const ISC_TPB_LOCK_TIMEOUT: u8 = 21;
pub const ISC_TPB_READ_CONSISTENCY: u8 = 22;
pub const ISC_TPB_AT_SNAPSHOT_NUMBER: u8 = 23;
