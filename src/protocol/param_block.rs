//! Database and transaction parameter blocks.
//!
//! A parameter block is a version byte followed by tagged items. The block is
//! built in two passes over the same closure: the first pass counts bytes, the
//! second writes them into a buffer of exactly that size. The closure therefore
//! runs twice and must not have side effects beyond the builder.
//!
//! # Example
//!
//! ```
//! use fbclient_rs::protocol::param_block::{make_dpb, make_tpb};
//!
//! let dpb = make_dpb(|p| {
//!     p.user_name("SYSDBA").password("masterkey").sql_dialect(3);
//! });
//! assert_eq!(dpb[0], 1);
//!
//! let tpb = make_tpb(|p| {
//!     p.read_committed().rec_version().no_wait();
//! });
//! assert_eq!(tpb.as_ref(), &[1, 15, 17, 7]);
//! ```

use crate::protocol::buffer::BlockWriter;
use crate::protocol::constants::*;
use bytes::Bytes;

/// Tagged item encoder shared by both vocabularies.
#[derive(Debug)]
pub struct ParamBlockBuilder {
    sink: BlockWriter,
}

impl ParamBlockBuilder {
    /// Bare tag, one byte.
    pub fn add(&mut self, code: u8) -> &mut Self {
        self.sink.write_u8(code);
        self
    }

    /// Tag-only marker: the tag followed by a zero length.
    pub fn tag(&mut self, code: u8) -> &mut Self {
        self.sink.write_u8(code);
        self.sink.write_u8(0);
        self
    }

    /// Length-prefixed UTF-8 string.
    pub fn add_string(&mut self, code: u8, value: &str) -> &mut Self {
        self.add_bytes(code, value.as_bytes())
    }

    /// Length-prefixed bytes. Values over 255 bytes are cut at 255.
    pub fn add_bytes(&mut self, code: u8, value: &[u8]) -> &mut Self {
        let size = value.len().min(u8::MAX as usize);
        self.sink.write_u8(code);
        self.sink.write_u8(size as u8);
        self.sink.write_bytes(&value[..size]);
        self
    }

    /// Length-prefixed integer using the narrowest of 1, 2 or 4 big-endian bytes.
    pub fn add_uint(&mut self, code: u8, value: u32) -> &mut Self {
        self.sink.write_u8(code);
        if value <= u8::MAX as u32 {
            self.sink.write_u8(1);
            self.sink.write_u8(value as u8);
        } else if value <= u16::MAX as u32 {
            self.sink.write_u8(2);
            self.sink.write_u16_be(value as u16);
        } else {
            self.sink.write_u8(4);
            self.sink.write_u32_be(value);
        }
        self
    }

    /// Signed integer, encoded through its unsigned bit pattern.
    pub fn add_int(&mut self, code: u8, value: i32) -> &mut Self {
        self.add_uint(code, value as u32)
    }

    /// Boolean as a 0/1 integer.
    pub fn add_bool(&mut self, code: u8, value: bool) -> &mut Self {
        self.add_uint(code, u32::from(value))
    }

    /// Raw byte with no tag or length.
    pub fn add_ubyte(&mut self, value: u8) -> &mut Self {
        self.sink.write_u8(value);
        self
    }

    /// Raw big-endian u16 with no tag or length.
    pub fn add_ushort(&mut self, value: u16) -> &mut Self {
        self.sink.write_u16_be(value);
        self
    }
}

/// Build a parameter block with `version` as its first byte.
pub fn create_pb<F>(version: u8, build: F) -> Bytes
where
    F: Fn(&mut ParamBlockBuilder),
{
    let mut counter = ParamBlockBuilder {
        sink: BlockWriter::counting(),
    };
    counter.add_ubyte(version);
    build(&mut counter);
    let size = counter.sink.len();

    let mut filler = ParamBlockBuilder {
        sink: BlockWriter::filling(size),
    };
    filler.add_ubyte(version);
    build(&mut filler);
    debug_assert_eq!(size, filler.sink.len(), "parameter block closure is not pure");
    filler.sink.freeze()
}

/// Build a database parameter block.
///
/// The file name is flagged as UTF-8 and the connection character set is
/// always UTF-8.
pub fn make_dpb<F>(build: F) -> Bytes
where
    F: Fn(&mut DatabaseParams<'_>),
{
    create_pb(ISC_DPB_VERSION1, |pb| {
        pb.tag(ISC_DPB_UTF8_FILENAME);
        build(&mut DatabaseParams { pb: &mut *pb });
        pb.add_string(ISC_DPB_LC_CTYPE, "UTF-8");
    })
}

/// Build a transaction parameter block.
pub fn make_tpb<F>(build: F) -> Bytes
where
    F: Fn(&mut TransactionParams<'_>),
{
    create_pb(ISC_TPB_VERSION1, |pb| {
        build(&mut TransactionParams { pb });
    })
}

/// Database parameter vocabulary.
pub struct DatabaseParams<'a> {
    pb: &'a mut ParamBlockBuilder,
}

macro_rules! dpb_string {
    ($($(#[$doc:meta])* $name:ident => $code:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, value: &str) -> &mut Self {
                self.pb.add_string($code, value);
                self
            }
        )*
    };
}

macro_rules! dpb_int {
    ($($(#[$doc:meta])* $name:ident => $code:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, value: i32) -> &mut Self {
                self.pb.add_int($code, value);
                self
            }
        )*
    };
}

macro_rules! dpb_bool {
    ($($(#[$doc:meta])* $name:ident => $code:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, value: bool) -> &mut Self {
                self.pb.add_bool($code, value);
                self
            }
        )*
    };
}

impl DatabaseParams<'_> {
    /// Access the underlying encoder for tags without a typed method.
    pub fn raw(&mut self) -> &mut ParamBlockBuilder {
        &mut *self.pb
    }

    dpb_string! {
        /// Login name.
        user_name => ISC_DPB_USER_NAME;
        /// Login password.
        password => ISC_DPB_PASSWORD;
        /// Default character set of a database being created.
        set_db_charset => ISC_DPB_SET_DB_CHARSET;
        enable_journal => ISC_DPB_ENABLE_JOURNAL;
        gbak_attach => ISC_DPB_GBAK_ATTACH;
        /// SQL role.
        sql_role_name => ISC_DPB_SQL_ROLE_NAME;
        working_directory => ISC_DPB_WORKING_DIRECTORY;
        trusted_auth => ISC_DPB_TRUSTED_AUTH;
        process_name => ISC_DPB_PROCESS_NAME;
        org_filename => ISC_DPB_ORG_FILENAME;
        client_version => ISC_DPB_CLIENT_VERSION;
        remote_protocol => ISC_DPB_REMOTE_PROTOCOL;
        host_name => ISC_DPB_HOST_NAME;
        os_user => ISC_DPB_OS_USER;
        config => ISC_DPB_CONFIG;
        /// Session time zone, e.g. `"Europe/Paris"` or `"+02:00"`.
        session_time_zone => ISC_DPB_SESSION_TIME_ZONE;
        set_bind => ISC_DPB_SET_BIND;
        decfloat_round => ISC_DPB_DECFLOAT_ROUND;
        decfloat_traps => ISC_DPB_DECFLOAT_TRAPS;
    }

    dpb_int! {
        /// Page size of a database being created.
        page_size => ISC_DPB_PAGE_SIZE;
        num_buffers => ISC_DPB_NUM_BUFFERS;
        debug => ISC_DPB_DEBUG;
        verify => ISC_DPB_VERIFY;
        sweep => ISC_DPB_SWEEP;
        dbkey_scope => ISC_DPB_DBKEY_SCOPE;
        trace => ISC_DPB_TRACE;
        sweep_interval => ISC_DPB_SWEEP_INTERVAL;
        interp => ISC_DPB_INTERP;
        drop_walfile => ISC_DPB_DROP_WALFILE;
        shutdown => ISC_DPB_SHUTDOWN;
        online => ISC_DPB_ONLINE;
        shutdown_delay => ISC_DPB_SHUTDOWN_DELAY;
        /// Connect timeout in seconds.
        connect_timeout => ISC_DPB_CONNECT_TIMEOUT;
        dummy_packet_interval => ISC_DPB_DUMMY_PACKET_INTERVAL;
        set_page_buffers => ISC_DPB_SET_PAGE_BUFFERS;
        set_db_sql_dialect => ISC_DPB_SET_DB_SQL_DIALECT;
        process_id => ISC_DPB_PROCESS_ID;
        ext_call_depth => ISC_DPB_EXT_CALL_DEPTH;
        set_db_replica => ISC_DPB_SET_DB_REPLICA;
        parallel_workers => ISC_DPB_PARALLEL_WORKERS;
    }

    dpb_bool! {
        force_write => ISC_DPB_FORCE_WRITE;
        no_reserve => ISC_DPB_NO_RESERVE;
        overwrite => ISC_DPB_OVERWRITE;
        sec_attach => ISC_DPB_SEC_ATTACH;
        set_db_readonly => ISC_DPB_SET_DB_READONLY;
        no_db_triggers => ISC_DPB_NO_DB_TRIGGERS;
        clear_map => ISC_DPB_CLEAR_MAP;
    }

    /// Client SQL dialect.
    pub fn sql_dialect(&mut self, value: u32) -> &mut Self {
        self.pb.add_uint(ISC_DPB_SQL_DIALECT, value);
        self
    }

    pub fn address_path(&mut self, value: &[u8]) -> &mut Self {
        self.pb.add_bytes(ISC_DPB_ADDRESS_PATH, value);
        self
    }

    pub fn auth_block(&mut self, value: &[u8]) -> &mut Self {
        self.pb.add_bytes(ISC_DPB_AUTH_BLOCK, value);
        self
    }

    pub fn no_garbage_collect(&mut self) -> &mut Self {
        self.pb.tag(ISC_DPB_NO_GARBAGE_COLLECT);
        self
    }

    pub fn damaged(&mut self) -> &mut Self {
        self.pb.add_uint(ISC_DPB_DAMAGED, 1);
        self
    }

    pub fn activate_shadow(&mut self) -> &mut Self {
        self.pb.add(ISC_DPB_ACTIVATE_SHADOW);
        self
    }

    pub fn delete_shadow(&mut self) -> &mut Self {
        self.pb.tag(ISC_DPB_DELETE_SHADOW);
        self
    }

    pub fn reserved(&mut self) -> &mut Self {
        self.pb.add_string(ISC_DPB_RESERVED, "YES");
        self
    }

    pub fn disable_wal(&mut self) -> &mut Self {
        self.pb.tag(ISC_DPB_DISABLE_WAL);
        self
    }

    pub fn gfix_attach(&mut self) -> &mut Self {
        self.pb.tag(ISC_DPB_GFIX_ATTACH);
        self
    }

    pub fn gstat_attach(&mut self) -> &mut Self {
        self.pb.tag(ISC_DPB_GSTAT_ATTACH);
        self
    }

    pub fn no_linger(&mut self) -> &mut Self {
        self.pb.tag(ISC_DPB_NOLINGER);
        self
    }

    pub fn reset_icu(&mut self) -> &mut Self {
        self.pb.tag(ISC_DPB_RESET_ICU);
        self
    }

    pub fn map_attach(&mut self) -> &mut Self {
        self.pb.add(ISC_DPB_MAP_ATTACH);
        self
    }

    pub fn upgrade_db(&mut self) -> &mut Self {
        self.pb.add(ISC_DPB_UPGRADE_DB);
        self
    }

    pub fn worker_attach(&mut self) -> &mut Self {
        self.pb.add(ISC_DPB_WORKER_ATTACH);
        self
    }
}

/// Transaction parameter vocabulary.
pub struct TransactionParams<'a> {
    pb: &'a mut ParamBlockBuilder,
}

macro_rules! tpb_flag {
    ($($(#[$doc:meta])* $name:ident => $code:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self) -> &mut Self {
                self.pb.add($code);
                self
            }
        )*
    };
}

impl TransactionParams<'_> {
    /// Access the underlying encoder for tags without a typed method.
    pub fn raw(&mut self) -> &mut ParamBlockBuilder {
        &mut *self.pb
    }

    tpb_flag! {
        /// Table-level locking isolation.
        consistency => ISC_TPB_CONSISTENCY;
        /// Snapshot isolation.
        concurrency => ISC_TPB_CONCURRENCY;
        shared => ISC_TPB_SHARED;
        protected => ISC_TPB_PROTECTED;
        exclusive => ISC_TPB_EXCLUSIVE;
        /// Wait for conflicting locks.
        wait => ISC_TPB_WAIT;
        /// Fail immediately on lock conflicts.
        no_wait => ISC_TPB_NOWAIT;
        read => ISC_TPB_READ;
        write => ISC_TPB_WRITE;
        ignore_limbo => ISC_TPB_IGNORE_LIMBO;
        read_committed => ISC_TPB_READ_COMMITTED;
        autocommit => ISC_TPB_AUTOCOMMIT;
        rec_version => ISC_TPB_REC_VERSION;
        no_rec_version => ISC_TPB_NO_REC_VERSION;
        restart_requests => ISC_TPB_RESTART_REQUESTS;
        no_auto_undo => ISC_TPB_NO_AUTO_UNDO;
        read_consistency => ISC_TPB_READ_CONSISTENCY;
    }

    /// Reserve a table for reading.
    pub fn lock_read(&mut self, table: &str) -> &mut Self {
        self.pb.add_string(ISC_TPB_LOCK_READ, table);
        self
    }

    /// Reserve a table for writing.
    pub fn lock_write(&mut self, table: &str) -> &mut Self {
        self.pb.add_string(ISC_TPB_LOCK_WRITE, table);
        self
    }

    /// Lock wait timeout in seconds.
    pub fn lock_timeout(&mut self, seconds: i32) -> &mut Self {
        self.pb.add_int(ISC_TPB_LOCK_TIMEOUT, seconds);
        self
    }

    pub fn at_snapshot_number(&mut self, value: i32) -> &mut Self {
        self.pb.add_int(ISC_TPB_AT_SNAPSHOT_NUMBER, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::buffer::BlockWriter;

    fn counted_and_written<F: Fn(&mut ParamBlockBuilder)>(build: F) -> (usize, usize) {
        let mut counter = ParamBlockBuilder {
            sink: BlockWriter::counting(),
        };
        build(&mut counter);
        let block = create_pb(0, build);
        (counter.sink.len() + 1, block.len())
    }

    #[test]
    fn test_uint_widths() {
        let block = create_pb(1, |pb| {
            pb.add_uint(4, 255).add_uint(4, 256).add_uint(4, 65536);
        });
        assert_eq!(
            block.as_ref(),
            &[1, 4, 1, 255, 4, 2, 1, 0, 4, 4, 0, 1, 0, 0]
        );
    }

    #[test]
    fn test_negative_int_uses_four_bytes() {
        let block = create_pb(1, |pb| {
            pb.add_int(21, -1);
        });
        assert_eq!(block.as_ref(), &[1, 21, 4, 0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn test_tag_string_bool_raw() {
        let block = create_pb(2, |pb| {
            pb.tag(16)
                .add(21)
                .add_string(28, "ab")
                .add_bool(24, true)
                .add_ubyte(9)
                .add_ushort(0x0102);
        });
        assert_eq!(
            block.as_ref(),
            &[2, 16, 0, 21, 28, 2, b'a', b'b', 24, 1, 1, 9, 1, 2]
        );
    }

    #[test]
    fn test_count_equals_written_for_mixes() {
        let mixes: Vec<Box<dyn Fn(&mut ParamBlockBuilder)>> = vec![
            Box::new(|_pb: &mut ParamBlockBuilder| {}),
            Box::new(|pb: &mut ParamBlockBuilder| {
                pb.add(1);
            }),
            Box::new(|pb: &mut ParamBlockBuilder| {
                pb.tag(2).add_bytes(3, &[0; 300]);
            }),
            Box::new(|pb: &mut ParamBlockBuilder| {
                pb.add_uint(5, 0).add_uint(5, u32::MAX).add_int(6, i32::MIN);
            }),
            Box::new(|pb: &mut ParamBlockBuilder| {
                pb.add_bool(7, false).add_ubyte(8).add_ushort(9).add_string(10, "héllo");
            }),
        ];
        for build in mixes {
            let (counted, written) = counted_and_written(|pb| build(pb));
            assert_eq!(counted, written);
        }
    }

    #[test]
    fn test_make_dpb_layout() {
        let dpb = make_dpb(|p| {
            p.user_name("SYSDBA").sql_dialect(3);
        });
        let mut expected = vec![ISC_DPB_VERSION1, ISC_DPB_UTF8_FILENAME, 0];
        expected.extend_from_slice(&[ISC_DPB_USER_NAME, 6]);
        expected.extend_from_slice(b"SYSDBA");
        expected.extend_from_slice(&[ISC_DPB_SQL_DIALECT, 1, 3]);
        expected.extend_from_slice(&[ISC_DPB_LC_CTYPE, 5]);
        expected.extend_from_slice(b"UTF-8");
        assert_eq!(dpb.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_make_dpb_markers() {
        let dpb = make_dpb(|p| {
            p.no_garbage_collect().activate_shadow().damaged().reserved();
        });
        assert_eq!(
            &dpb[3..14],
            &[16, 0, 21, 17, 1, 1, 53, 3, b'Y', b'E', b'S']
        );
    }

    #[test]
    fn test_make_tpb() {
        let tpb = make_tpb(|p| {
            p.concurrency().wait().lock_timeout(5).lock_write("T");
        });
        assert_eq!(tpb.as_ref(), &[1, 2, 6, 21, 1, 5, 11, 1, b'T']);
    }

    #[test]
    fn test_empty_tpb_is_version_only() {
        assert_eq!(make_tpb(|_| {}).as_ref(), &[ISC_TPB_VERSION1]);
    }
}
