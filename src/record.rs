//! Typed access to a parameter or result row.
//!
//! A `Record` is a view over one descriptor held by the attachment. The
//! inline accessors go straight to the [`Sqlda`]; the string and byte
//! accessors also handle BLOB columns, which they read and write through the
//! transaction the record belongs to.
//!
//! # Example
//!
//! ```no_run
//! use fbclient_rs::{Attachment, LoopbackClient};
//!
//! # fn main() -> fbclient_rs::Result<()> {
//! let mut att = Attachment::attach(LoopbackClient::new(), "employee.fdb", &[])?;
//! att.statement("SELECT FIRST_NAME, HIRE_DATE FROM EMPLOYEE", |stmt| {
//!     stmt.open(|rs| {
//!         rs.for_each(|row| {
//!             let name = row.get_string(0)?;
//!             let hired = row.get_date_opt(1)?;
//!             println!("{} {:?}", name, hired);
//!             Ok(())
//!         })
//!     })
//! })?;
//! # Ok(())
//! # }
//! ```

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::error::{Error, Result};
use crate::lifecycle::{Context, SlotId};
use crate::protocol::decode::date::{epoch_days_from_isc, isc_date_from_epoch_days, isc_time_from_millis, millis_from_isc_time};
use crate::protocol::decode::{
    decode_isc_date, decode_isc_time, decompose, encode_isc_date, encode_isc_time,
    from_scaled_integer, recompose, rescale, Int128,
};
use crate::protocol::types::{BlobId, ColumnType, SqlValue, Sqlda, TimeZoneId};

/// One row of a statement's parameters or results.
pub struct Record<'a> {
    pub(crate) ctx: &'a mut Context,
    pub(crate) tr: SlotId,
    pub(crate) descriptor: SlotId,
}

macro_rules! inline_getters {
    ($($(#[$doc:meta])* $name:ident, $opt:ident -> $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&self, index: usize) -> Result<$ty> {
                self.sqlda()?.$name(index)
            }

            /// `None` when the column is NULL.
            pub fn $opt(&self, index: usize) -> Result<Option<$ty>> {
                if self.is_null(index)? {
                    return Ok(None);
                }
                self.$name(index).map(Some)
            }
        )*
    };
}

macro_rules! inline_setters {
    ($($(#[$doc:meta])* $name:ident($ty:ty);)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, index: usize, value: $ty) -> Result<()> {
                self.sqlda_mut()?.$name(index, value)
            }
        )*
    };
}

impl<'a> Record<'a> {
    pub(crate) fn new(ctx: &'a mut Context, tr: SlotId, descriptor: SlotId) -> Self {
        Self { ctx, tr, descriptor }
    }

    /// The underlying descriptor.
    pub fn sqlda(&self) -> Result<&Sqlda> {
        self.ctx.descriptor(self.descriptor)
    }

    fn sqlda_mut(&mut self) -> Result<&mut Sqlda> {
        self.ctx.descriptor_mut(self.descriptor)
    }

    // ---- metadata ----

    /// Number of columns, or 0 once the descriptor has been released.
    pub fn count(&self) -> usize {
        self.sqlda().map_or(0, Sqlda::count)
    }

    pub fn column_type(&self, index: usize) -> Result<Option<ColumnType>> {
        self.sqlda()?.column_type(index)
    }

    pub fn scale(&self, index: usize) -> Result<i16> {
        self.sqlda()?.scale(index)
    }

    pub fn len(&self, index: usize) -> Result<i16> {
        self.sqlda()?.len(index)
    }

    pub fn subtype(&self, index: usize) -> Result<i16> {
        self.sqlda()?.subtype(index)
    }

    pub fn column_name(&self, index: usize) -> Result<&str> {
        self.sqlda()?.column_name(index)
    }

    pub fn relation_name(&self, index: usize) -> Result<&str> {
        self.sqlda()?.relation_name(index)
    }

    pub fn owner_name(&self, index: usize) -> Result<&str> {
        self.sqlda()?.owner_name(index)
    }

    pub fn alias_name(&self, index: usize) -> Result<&str> {
        self.sqlda()?.alias_name(index)
    }

    /// Index of the column with this alias or name (case-insensitive).
    pub fn find(&self, name: &str) -> Option<usize> {
        self.sqlda().ok()?.find_by_name(name)
    }

    pub fn is_null(&self, index: usize) -> Result<bool> {
        self.sqlda()?.is_null(index)
    }

    pub fn set_null(&mut self, index: usize) -> Result<()> {
        self.sqlda_mut()?.set_null(index)
    }

    // ---- inline values ----

    inline_getters! {
        get_bool, get_bool_opt -> bool;
        get_i16, get_i16_opt -> i16;
        get_i32, get_i32_opt -> i32;
        get_i64, get_i64_opt -> i64;
        get_f32, get_f32_opt -> f32;
        get_f64, get_f64_opt -> f64;
        /// 128-bit value; SHORT, INTEGER and BIGINT are sign-extended.
        get_int128, get_int128_opt -> Int128;
        /// Days since 1970-01-01.
        get_epoch_days, get_epoch_days_opt -> i32;
        get_millis_of_day, get_millis_of_day_opt -> i32;
        get_blob_id, get_blob_id_opt -> BlobId;
    }

    inline_setters! {
        set_bool(bool);
        set_i16(i16);
        set_i32(i32);
        set_i64(i64);
        set_f32(f32);
        set_f64(f64);
        set_int128(Int128);
        set_epoch_days(i32);
        set_millis_of_day(i32);
        set_blob_id(BlobId);
    }

    pub fn get_time_zone_id(&self, index: usize) -> Result<TimeZoneId> {
        self.sqlda()?.get_time_zone_id(index).map(TimeZoneId::from)
    }

    pub fn set_time_zone_id(&mut self, index: usize, id: TimeZoneId) -> Result<()> {
        self.sqlda_mut()?.set_time_zone_id(index, id.id())
    }

    // ---- text, bytes and blobs ----

    fn is_blob(&self, index: usize) -> Result<Option<ColumnType>> {
        Ok(self.column_type(index)?.filter(|t| t.is_blob()))
    }

    /// Read a UTF-8 CHAR/VARCHAR or a text BLOB.
    pub fn get_string(&mut self, index: usize) -> Result<String> {
        match self.is_blob(index)? {
            Some(ColumnType::BlobText) => {
                let data = self.read_blob(index)?;
                String::from_utf8(data).map_err(|_| Error::InvalidEncoding { index })
            }
            Some(_) => Err(Error::TypeConversion { index }),
            None => self.sqlda()?.get_text(index),
        }
    }

    pub fn get_string_opt(&mut self, index: usize) -> Result<Option<String>> {
        if self.is_null(index)? {
            return Ok(None);
        }
        self.get_string(index).map(Some)
    }

    /// Read a CHAR/VARCHAR or any BLOB as bytes.
    pub fn get_bytes(&mut self, index: usize) -> Result<Vec<u8>> {
        match self.is_blob(index)? {
            Some(_) => self.read_blob(index),
            None => self.sqlda()?.get_octets(index),
        }
    }

    pub fn get_bytes_opt(&mut self, index: usize) -> Result<Option<Vec<u8>>> {
        if self.is_null(index)? {
            return Ok(None);
        }
        self.get_bytes(index).map(Some)
    }

    fn read_blob(&mut self, index: usize) -> Result<Vec<u8>> {
        let id = self.get_blob_id(index)?;
        Ok(self.ctx.read_blob(self.tr, id)?.to_vec())
    }

    /// Write a UTF-8 CHAR/VARCHAR, or store a text BLOB.
    pub fn set_string(&mut self, index: usize, value: &str) -> Result<()> {
        match self.is_blob(index)? {
            Some(ColumnType::BlobText) => self.write_blob(index, value.as_bytes()),
            Some(_) => Err(Error::TypeConversion { index }),
            None => self.sqlda_mut()?.set_text(index, value),
        }
    }

    /// Write a CHAR/VARCHAR, or store any BLOB.
    pub fn set_bytes(&mut self, index: usize, value: &[u8]) -> Result<()> {
        match self.is_blob(index)? {
            Some(_) => self.write_blob(index, value),
            None => self.sqlda_mut()?.set_octets(index, value),
        }
    }

    fn write_blob(&mut self, index: usize, data: &[u8]) -> Result<()> {
        // validate the index before a blob gets created for it
        self.sqlda()?.var(index)?;
        let id = self.ctx.write_blob(self.tr, data)?;
        self.set_blob_id(index, id)
    }

    // ---- numbers ----

    /// INT128 (or narrower integer) as a `BigInt`.
    pub fn get_big_int(&self, index: usize) -> Result<BigInt> {
        Ok(recompose(self.get_int128(index)?))
    }

    pub fn get_big_int_opt(&self, index: usize) -> Result<Option<BigInt>> {
        if self.is_null(index)? {
            return Ok(None);
        }
        self.get_big_int(index).map(Some)
    }

    /// Write an INT128. Values outside 128 bits wrap.
    pub fn set_big_int(&mut self, index: usize, value: &BigInt) -> Result<()> {
        self.set_int128(index, decompose(value))
    }

    /// Exact numeric with the column scale applied.
    pub fn get_decimal(&self, index: usize) -> Result<BigDecimal> {
        decimal_value(self.sqlda()?, index)
    }

    pub fn get_decimal_opt(&self, index: usize) -> Result<Option<BigDecimal>> {
        if self.is_null(index)? {
            return Ok(None);
        }
        self.get_decimal(index).map(Some)
    }

    /// Rescale to the column scale and write through the column's integer width.
    pub fn set_decimal(&mut self, index: usize, value: &BigDecimal) -> Result<()> {
        set_decimal_value(self.sqlda_mut()?, index, value)
    }

    // ---- dates ----

    pub fn get_date(&self, index: usize) -> Result<NaiveDate> {
        date_value(self.sqlda()?, index)
    }

    pub fn get_date_opt(&self, index: usize) -> Result<Option<NaiveDate>> {
        if self.is_null(index)? {
            return Ok(None);
        }
        self.get_date(index).map(Some)
    }

    pub fn get_time(&self, index: usize) -> Result<NaiveTime> {
        time_value(self.sqlda()?, index)
    }

    pub fn get_time_opt(&self, index: usize) -> Result<Option<NaiveTime>> {
        if self.is_null(index)? {
            return Ok(None);
        }
        self.get_time(index).map(Some)
    }

    /// TIMESTAMP, or the UTC wall time of a TIMESTAMP WITH TIME ZONE.
    pub fn get_datetime(&self, index: usize) -> Result<NaiveDateTime> {
        let da = self.sqlda()?;
        Ok(NaiveDateTime::new(date_value(da, index)?, time_value(da, index)?))
    }

    pub fn get_datetime_opt(&self, index: usize) -> Result<Option<NaiveDateTime>> {
        if self.is_null(index)? {
            return Ok(None);
        }
        self.get_datetime(index).map(Some)
    }

    pub fn set_date(&mut self, index: usize, value: NaiveDate) -> Result<()> {
        set_date_value(self.sqlda_mut()?, index, value)
    }

    pub fn set_time(&mut self, index: usize, value: NaiveTime) -> Result<()> {
        set_time_value(self.sqlda_mut()?, index, value)
    }

    pub fn set_datetime(&mut self, index: usize, value: NaiveDateTime) -> Result<()> {
        let da = self.sqlda_mut()?;
        set_date_value(da, index, value.date())?;
        set_time_value(da, index, value.time())
    }

    // ---- any ----

    /// Read a column as a tagged value.
    ///
    /// Exact numerics with a nonzero scale come back as `Decimal`. Time zone
    /// columns are `Unsupported`.
    pub fn get_value(&mut self, index: usize) -> Result<SqlValue> {
        if self.is_null(index)? {
            return Ok(SqlValue::Null);
        }
        match self.is_blob(index)? {
            Some(ColumnType::BlobText) => self.get_string(index).map(SqlValue::String),
            Some(_) => self.get_bytes(index).map(SqlValue::Bytes),
            None => inline_value(self.sqlda()?, index),
        }
    }

    /// Write a tagged value through the setter matching its variant.
    pub fn set_value(&mut self, index: usize, value: &SqlValue) -> Result<()> {
        match value {
            SqlValue::String(s) => self.set_string(index, s),
            SqlValue::Bytes(b) => self.set_bytes(index, b),
            other => set_inline_value(self.sqlda_mut()?, index, other),
        }
    }

    /// Every column as a tagged value.
    pub fn values(&mut self) -> Result<Vec<SqlValue>> {
        (0..self.count()).map(|i| self.get_value(i)).collect()
    }
}

fn decimal_value(da: &Sqlda, index: usize) -> Result<BigDecimal> {
    let unscaled = match da.column_type(index)? {
        Some(ColumnType::Short) => BigInt::from(da.get_i16(index)?),
        Some(ColumnType::Int) => BigInt::from(da.get_i32(index)?),
        Some(ColumnType::Long) => BigInt::from(da.get_i64(index)?),
        Some(ColumnType::Int128) => recompose(da.get_int128(index)?),
        _ => return Err(Error::TypeConversion { index }),
    };
    from_scaled_integer(unscaled, da.scale(index)? as i64)
}

fn set_decimal_value(da: &mut Sqlda, index: usize, value: &BigDecimal) -> Result<()> {
    let unscaled = rescale(value, da.scale(index)? as i64)?;
    let too_wide = || Error::TypeConversion { index };
    match da.column_type(index)? {
        Some(ColumnType::Short) => da.set_i16(index, unscaled.to_i16().ok_or_else(too_wide)?),
        Some(ColumnType::Int) => da.set_i32(index, unscaled.to_i32().ok_or_else(too_wide)?),
        Some(ColumnType::Long) => da.set_i64(index, unscaled.to_i64().ok_or_else(too_wide)?),
        Some(ColumnType::Int128) => {
            let wide = unscaled.to_i128().ok_or_else(too_wide)?;
            da.set_int128(index, Int128::from_i128(wide))
        }
        _ => Err(too_wide()),
    }
}

fn date_value(da: &Sqlda, index: usize) -> Result<NaiveDate> {
    decode_isc_date(isc_date_from_epoch_days(da.get_epoch_days(index)?))
}

fn time_value(da: &Sqlda, index: usize) -> Result<NaiveTime> {
    decode_isc_time(isc_time_from_millis(da.get_millis_of_day(index)?))
}

fn set_date_value(da: &mut Sqlda, index: usize, value: NaiveDate) -> Result<()> {
    da.set_epoch_days(index, epoch_days_from_isc(encode_isc_date(value)))
}

fn set_time_value(da: &mut Sqlda, index: usize, value: NaiveTime) -> Result<()> {
    da.set_millis_of_day(index, millis_from_isc_time(encode_isc_time(value)))
}

/// Tagged value of a non-BLOB column.
pub(crate) fn inline_value(da: &Sqlda, index: usize) -> Result<SqlValue> {
    if da.is_null(index)? {
        return Ok(SqlValue::Null);
    }
    let scaled = da.scale(index)? != 0;
    let value = match da.column_type(index)? {
        Some(ColumnType::Short | ColumnType::Int | ColumnType::Long | ColumnType::Int128) if scaled => {
            SqlValue::Decimal(decimal_value(da, index)?)
        }
        Some(ColumnType::Short) => SqlValue::Short(da.get_i16(index)?),
        Some(ColumnType::Int) => SqlValue::Int(da.get_i32(index)?),
        Some(ColumnType::Long) => SqlValue::Long(da.get_i64(index)?),
        Some(ColumnType::Int128) => SqlValue::BigInt(recompose(da.get_int128(index)?)),
        Some(ColumnType::Float) => SqlValue::Float(da.get_f32(index)?),
        Some(ColumnType::Double) => SqlValue::Double(da.get_f64(index)?),
        Some(ColumnType::String) => SqlValue::String(da.get_text(index)?),
        Some(ColumnType::Bytes) => SqlValue::Bytes(da.get_octets(index)?),
        Some(ColumnType::Boolean) => SqlValue::Boolean(da.get_bool(index)?),
        Some(ColumnType::Date) => SqlValue::Date(date_value(da, index)?),
        Some(ColumnType::Time) => SqlValue::Time(time_value(da, index)?),
        Some(ColumnType::DateTime) => {
            SqlValue::DateTime(NaiveDateTime::new(date_value(da, index)?, time_value(da, index)?))
        }
        Some(other) => return Err(Error::unsupported(format!("{} column {}", other, index))),
        None => {
            let sqltype = da.var(index)?.base_type();
            return Err(Error::unsupported(format!("SQL type {} in column {}", sqltype, index)));
        }
    };
    Ok(value)
}

/// Write a tagged value into a non-BLOB column.
pub(crate) fn set_inline_value(da: &mut Sqlda, index: usize, value: &SqlValue) -> Result<()> {
    match value {
        SqlValue::Null => da.set_null(index),
        SqlValue::Boolean(v) => da.set_bool(index, *v),
        SqlValue::Short(v) => da.set_i16(index, *v),
        SqlValue::Int(v) => da.set_i32(index, *v),
        SqlValue::Long(v) => da.set_i64(index, *v),
        SqlValue::Float(v) => da.set_f32(index, *v),
        SqlValue::Double(v) => da.set_f64(index, *v),
        SqlValue::String(s) => da.set_text(index, s),
        SqlValue::Bytes(b) => da.set_octets(index, b),
        SqlValue::BigInt(v) => da.set_int128(index, decompose(v)),
        SqlValue::Decimal(v) => set_decimal_value(da, index, v),
        SqlValue::Date(v) => set_date_value(da, index, *v),
        SqlValue::Time(v) => set_time_value(da, index, *v),
        SqlValue::DateTime(v) => {
            set_date_value(da, index, v.date())?;
            set_time_value(da, index, v.time())
        }
    }
}
