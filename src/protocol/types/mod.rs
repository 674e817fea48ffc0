//! Descriptor types: column metadata, row buffers and tagged values.

mod column;
mod sql_type;
mod sqlda;
mod timezone;
mod value;

pub use column::SqlVar;
pub use sql_type::{base_type, is_nullable_type, ColumnType};
pub use sqlda::{BlobId, Sqlda};
pub use timezone::TimeZoneId;
pub use value::SqlValue;
