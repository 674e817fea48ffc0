//! Column type classification.
//!
//! `ColumnType` is what callers see. It folds the raw XSQLVAR `sqltype` and
//! `sqlsubtype` pair into the accessor family a column belongs to.
//!
//! Note: nullability is the low bit of `sqltype` and is a column property,
//! not a type property.

use crate::protocol::constants::{
    BLOB_SUB_TYPE_TEXT, SQL_BLOB, SQL_BOOLEAN, SQL_DOUBLE, SQL_D_FLOAT, SQL_FLOAT, SQL_INT128,
    SQL_INT64, SQL_LONG, SQL_QUAD, SQL_SHORT, SQL_TEXT, SQL_TIMESTAMP, SQL_TIMESTAMP_TZ,
    SQL_TIMESTAMP_TZ_EX, SQL_TIME_TZ, SQL_TIME_TZ_EX, SQL_TYPE_DATE, SQL_TYPE_TIME, SQL_VARYING,
};

/// Strip the nullable flag from a raw `sqltype`.
pub const fn base_type(sqltype: i16) -> i16 {
    sqltype & !1
}

/// Whether a raw `sqltype` carries the nullable flag.
pub const fn is_nullable_type(sqltype: i16) -> bool {
    sqltype & 1 == 1
}

/// Accessor family of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// SMALLINT.
    Short,
    /// INTEGER.
    Int,
    /// BIGINT (and the legacy QUAD).
    Long,
    /// FLOAT.
    Float,
    /// DOUBLE PRECISION.
    Double,
    /// CHAR/VARCHAR with a character set.
    String,
    /// CHAR/VARCHAR in `OCTETS` / `NONE`.
    Bytes,
    /// INT128.
    Int128,
    /// BOOLEAN.
    Boolean,
    /// DATE.
    Date,
    /// TIME.
    Time,
    /// TIMESTAMP.
    DateTime,
    /// TIME WITH TIME ZONE.
    TimeTz,
    /// TIMESTAMP WITH TIME ZONE.
    DateTimeTz,
    /// BLOB of any binary subtype.
    BlobBinary,
    /// BLOB SUB_TYPE TEXT.
    BlobText,
}

impl ColumnType {
    /// Classify a raw `sqltype`/`sqlsubtype` pair.
    ///
    /// Returns `None` for types with no accessor family (arrays, DECFLOAT, ...).
    pub fn from_raw(sqltype: i16, subtype: i16) -> Option<Self> {
        Some(match base_type(sqltype) {
            SQL_SHORT => ColumnType::Short,
            SQL_LONG => ColumnType::Int,
            SQL_QUAD | SQL_INT64 => ColumnType::Long,
            SQL_FLOAT => ColumnType::Float,
            SQL_D_FLOAT | SQL_DOUBLE => ColumnType::Double,
            SQL_TEXT | SQL_VARYING => {
                if subtype != 0 {
                    ColumnType::String
                } else {
                    ColumnType::Bytes
                }
            }
            SQL_INT128 => ColumnType::Int128,
            SQL_BOOLEAN => ColumnType::Boolean,
            SQL_TYPE_DATE => ColumnType::Date,
            SQL_TYPE_TIME => ColumnType::Time,
            SQL_TIMESTAMP => ColumnType::DateTime,
            SQL_TIME_TZ | SQL_TIME_TZ_EX => ColumnType::TimeTz,
            SQL_TIMESTAMP_TZ | SQL_TIMESTAMP_TZ_EX => ColumnType::DateTimeTz,
            SQL_BLOB => {
                if subtype == BLOB_SUB_TYPE_TEXT {
                    ColumnType::BlobText
                } else {
                    ColumnType::BlobBinary
                }
            }
            _ => return None,
        })
    }

    /// Position in the exposed ordering, starting at 0 for `Short`.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Whether values of this type are fetched through the blob protocol.
    pub fn is_blob(self) -> bool {
        matches!(self, ColumnType::BlobBinary | ColumnType::BlobText)
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColumnType::Short => "SMALLINT",
            ColumnType::Int => "INTEGER",
            ColumnType::Long => "BIGINT",
            ColumnType::Float => "FLOAT",
            ColumnType::Double => "DOUBLE PRECISION",
            ColumnType::String => "VARCHAR",
            ColumnType::Bytes => "VARCHAR CHARACTER SET OCTETS",
            ColumnType::Int128 => "INT128",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Date => "DATE",
            ColumnType::Time => "TIME",
            ColumnType::DateTime => "TIMESTAMP",
            ColumnType::TimeTz => "TIME WITH TIME ZONE",
            ColumnType::DateTimeTz => "TIMESTAMP WITH TIME ZONE",
            ColumnType::BlobBinary => "BLOB",
            ColumnType::BlobText => "BLOB SUB_TYPE TEXT",
        };
        f.write_str(name)
    }
}
