//! Tagged column values.

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use num_bigint::BigInt;
use std::fmt;

/// A single column value of any supported kind.
///
/// `Record::get_value` picks the variant from the column type and scale;
/// `Record::set_value` dispatches on the variant and lets the column decide
/// whether it accepts it.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// BOOLEAN.
    Boolean(bool),
    /// SMALLINT with scale 0.
    Short(i16),
    /// INTEGER with scale 0.
    Int(i32),
    /// BIGINT with scale 0.
    Long(i64),
    /// FLOAT.
    Float(f32),
    /// DOUBLE PRECISION.
    Double(f64),
    /// Text (CHAR, VARCHAR or text BLOB).
    String(String),
    /// Binary (OCTETS text or binary BLOB).
    Bytes(Vec<u8>),
    /// INT128 with scale 0.
    BigInt(BigInt),
    /// Any exact numeric with a nonzero scale.
    Decimal(BigDecimal),
    /// DATE.
    Date(NaiveDate),
    /// TIME.
    Time(NaiveTime),
    /// TIMESTAMP.
    DateTime(NaiveDateTime),
}

impl SqlValue {
    /// Check if the value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Try to get the value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as raw bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            SqlValue::Bytes(b) => Some(b),
            SqlValue::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Try to widen an integer value to i64.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Short(v) => Some(*v as i64),
            SqlValue::Int(v) => Some(*v as i64),
            SqlValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to convert a numeric value to f64.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Float(v) => Some(*v as f64),
            SqlValue::Double(v) => Some(*v),
            _ => self.to_i64().map(|v| v as f64),
        }
    }

    /// Name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "NULL",
            SqlValue::Boolean(_) => "BOOLEAN",
            SqlValue::Short(_) => "SMALLINT",
            SqlValue::Int(_) => "INTEGER",
            SqlValue::Long(_) => "BIGINT",
            SqlValue::Float(_) => "FLOAT",
            SqlValue::Double(_) => "DOUBLE",
            SqlValue::String(_) => "STRING",
            SqlValue::Bytes(_) => "BYTES",
            SqlValue::BigInt(_) => "BIGINT(128)",
            SqlValue::Decimal(_) => "DECIMAL",
            SqlValue::Date(_) => "DATE",
            SqlValue::Time(_) => "TIME",
            SqlValue::DateTime(_) => "TIMESTAMP",
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Boolean(v) => write!(f, "{}", if *v { "TRUE" } else { "FALSE" }),
            SqlValue::Short(v) => write!(f, "{}", v),
            SqlValue::Int(v) => write!(f, "{}", v),
            SqlValue::Long(v) => write!(f, "{}", v),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Double(v) => write!(f, "{}", v),
            SqlValue::String(s) => write!(f, "{}", s),
            SqlValue::Bytes(b) => write!(f, "<BYTES: {} bytes>", b.len()),
            SqlValue::BigInt(v) => write!(f, "{}", v),
            SqlValue::Decimal(v) => write!(f, "{}", v),
            SqlValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            SqlValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.3f")),
            SqlValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.3f")),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    bool => Boolean,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    String => String,
    Vec<u8> => Bytes,
    BigInt => BigInt,
    BigDecimal => Decimal,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::String(value.to_string())
    }
}

impl From<&[u8]> for SqlValue {
    fn from(value: &[u8]) -> Self {
        SqlValue::Bytes(value.to_vec())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_null() {
        let val = SqlValue::Null;
        assert!(val.is_null());
        assert_eq!(val.as_str(), None);
        assert_eq!(format!("{}", val), "NULL");
        assert_eq!(SqlValue::from(None::<i32>), SqlValue::Null);
    }

    #[test]
    fn test_sql_value_string() {
        let val = SqlValue::from("hello");
        assert!(!val.is_null());
        assert_eq!(val.as_str(), Some("hello"));
        assert_eq!(val.as_bytes(), Some(&b"hello"[..]));
        assert_eq!(format!("{}", val), "hello");
    }

    #[test]
    fn test_sql_value_numbers() {
        assert_eq!(SqlValue::from(7i16).to_i64(), Some(7));
        assert_eq!(SqlValue::from(Some(42i64)).to_f64(), Some(42.0));
        assert_eq!(SqlValue::from(1.5f32).to_f64(), Some(1.5));
        assert_eq!(SqlValue::from(true).to_i64(), None);
        assert_eq!(SqlValue::from(true).to_string(), "TRUE");
    }

    #[test]
    fn test_sql_value_dates() {
        let d = NaiveDate::from_ymd_opt(2024, 10, 21).unwrap();
        assert_eq!(SqlValue::from(d).to_string(), "2024-10-21");
        let dt = d.and_hms_milli_opt(12, 36, 5, 120).unwrap();
        assert_eq!(SqlValue::from(dt).to_string(), "2024-10-21 12:36:05.120");
        assert_eq!(SqlValue::from(dt).kind(), "TIMESTAMP");
    }
}
