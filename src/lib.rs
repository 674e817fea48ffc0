//! Firebird client for Rust
//!
//! A scoped SQL access layer over the Firebird client library. An
//! [`Attachment`] owns the native handles; transactions, statements, record
//! sets and blobs are borrowed from it and released when their scope ends.
//!
//! The native calls go through the [`Client`] trait. [`LoopbackClient`] is an
//! in-memory engine for tests; with the `fbclient` feature,
//! `client::fbclient::FbClient` links against `libfbclient`.
//!
//! # Example
//!
//! ```no_run
//! use fbclient_rs::{make_dpb, Attachment, LoopbackClient, Result, SqlValue};
//!
//! fn main() -> Result<()> {
//!     let dpb = make_dpb(|p| {
//!         p.user_name("SYSDBA").password("masterkey");
//!     });
//!     let mut att = Attachment::attach(LoopbackClient::new(), "localhost:employee", &dpb)?;
//!
//!     att.transaction(|tr| {
//!         tr.statement("SELECT EMP_NO, FIRST_NAME FROM EMPLOYEE WHERE DEPT_NO = ?", |stmt| {
//!             stmt.open_with(&[SqlValue::from("600")], |rs| {
//!                 while !rs.eof() {
//!                     println!("{} {}", rs.get_i16(0)?, rs.get_string(1)?);
//!                     rs.fetch()?;
//!                 }
//!                 Ok(())
//!             })
//!         })
//!     })?;
//!
//!     att.close()?;
//!     Ok(())
//! }
//! ```

pub mod attachment;
pub mod blob;
pub mod client;
pub mod cursor;
pub mod error;
pub(crate) mod lifecycle;
pub mod pool;
pub mod protocol;
pub mod record;
pub mod statement;
pub mod transaction;

// Re-export main types
pub use attachment::Attachment;
pub use blob::{BlobReader, BlobWriter};
pub use client::loopback::{LoopbackClient, Script};
pub use client::Client;
pub use cursor::RecordSet;
pub use error::{Error, Result};
pub use lifecycle::PoolStats;
pub use pool::AttachmentPool;
pub use protocol::connect::ConnectParams;
pub use protocol::param_block::{make_dpb, make_tpb};
pub use protocol::types::{BlobId, ColumnType, SqlValue, SqlVar, TimeZoneId};
pub use record::Record;
pub use statement::Statement;
pub use transaction::Transaction;
