//! Native descriptor protocol: constants, parameter blocks, value codecs and
//! the XSQLDA row buffer.

pub mod buffer;
pub mod connect;
pub mod constants;
pub mod decode;
pub mod param_block;
pub mod types;

pub use buffer::{BlockWriter, ReadBuffer};
pub use connect::ConnectParams;
pub use param_block::{make_dpb, make_tpb, DatabaseParams, ParamBlockBuilder, TransactionParams};
pub use types::{BlobId, ColumnType, SqlValue, SqlVar, Sqlda, TimeZoneId};
