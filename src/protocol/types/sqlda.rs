//! Descriptor data buffer (XSQLDA).
//!
//! A `Sqlda` holds the column list reported by the client library and one
//! zeroed buffer carrying a row of values. Layout is computed once per
//! describe:
//!
//! | Type | Bytes |
//! |------|-------|
//! | TEXT | `len + 1` |
//! | VARYING | `2 + len + 1` (u16 length prefix) |
//! | FLOAT, D_FLOAT, DOUBLE | `len` (scale forced to 0) |
//! | other | `len` |
//!
//! A nullable column gets an i16 indicator right after its value, set to -1.
//! Values are stored in native byte order, as the client library expects.
//!
//! Blob contents are not part of the row: text and binary BLOB accessors live
//! on `Record`, which can reach the attachment.

use bytes::BytesMut;

use super::column::SqlVar;
use super::sql_type::ColumnType;
use crate::error::{Error, Result};
use crate::protocol::constants::{
    CS_UTF8, SQL_BLOB, SQL_BOOLEAN, SQL_DOUBLE, SQL_D_FLOAT, SQL_FLOAT, SQL_INT128, SQL_INT64,
    SQL_LONG, SQL_QUAD, SQL_SHORT, SQL_TEXT, SQL_TIMESTAMP, SQL_TIMESTAMP_TZ, SQL_TIMESTAMP_TZ_EX,
    SQL_TIME_TZ, SQL_TIME_TZ_EX, SQL_TYPE_DATE, SQL_TYPE_TIME, SQL_VARYING,
};
use crate::protocol::decode::date::{
    epoch_days_from_isc, isc_date_from_epoch_days, isc_time_from_millis, millis_from_isc_time,
};
use crate::protocol::decode::Int128;

/// Size of the i16 null indicator.
const INDICATOR_SIZE: usize = 2;
/// Size of the VARYING length prefix.
const VARY_PREFIX: usize = 2;
/// Worst-case bytes per character in UTF-8 columns.
const UTF8_MAX_BYTES: usize = 4;

/// Blob id as stored in a BLOB column (`ISC_QUAD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlobId(pub u64);

impl BlobId {
    /// The id the server uses for "no blob".
    pub const NULL: BlobId = BlobId(0);

    /// Whether this is the null blob id.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Snapshot of the layout facts of one column.
#[derive(Debug, Clone, Copy)]
struct Field {
    index: usize,
    base: i16,
    subtype: i16,
    len: usize,
    offset: usize,
}

/// One row of typed, nullable columns.
#[derive(Debug, Clone, Default)]
pub struct Sqlda {
    vars: Vec<SqlVar>,
    buffer: BytesMut,
}

impl Sqlda {
    /// Create an empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the column list and lay out a fresh zeroed buffer.
    pub fn describe(&mut self, vars: Vec<SqlVar>) {
        self.vars = vars;
        self.allocate_data_buffer();
    }

    /// Drop the columns, keeping buffer capacity for reuse.
    pub fn clear(&mut self) {
        self.vars.clear();
        self.buffer.clear();
    }

    fn allocate_data_buffer(&mut self) {
        let mut total = 0usize;
        for var in &mut self.vars {
            var.data_offset = total;
            let len = var.byte_len();
            total += match var.base_type() {
                SQL_TEXT => len + 1,
                SQL_VARYING => VARY_PREFIX + len + 1,
                SQL_FLOAT | SQL_D_FLOAT | SQL_DOUBLE => {
                    var.scale = 0;
                    len
                }
                _ => len,
            };
            if var.is_nullable() {
                var.null_offset = Some(total);
                total += INDICATOR_SIZE;
            } else {
                var.null_offset = None;
            }
        }
        self.buffer.clear();
        self.buffer.resize(total, 0);
        for var in &self.vars {
            if let Some(at) = var.null_offset {
                self.buffer[at..at + INDICATOR_SIZE].copy_from_slice(&(-1i16).to_ne_bytes());
            }
        }
    }

    /// Number of columns.
    pub fn count(&self) -> usize {
        self.vars.len()
    }

    /// Check if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// All column descriptors.
    pub fn vars(&self) -> &[SqlVar] {
        &self.vars
    }

    /// Column descriptor at `index`.
    pub fn var(&self, index: usize) -> Result<&SqlVar> {
        self.vars.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            count: self.vars.len(),
        })
    }

    /// The whole data buffer.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// The whole data buffer, mutable (client implementations write rows here).
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Find a column index by alias or name (case-insensitive).
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        let name_upper = name.to_uppercase();
        self.vars.iter().position(|v| {
            v.alias.to_uppercase() == name_upper || v.name.to_uppercase() == name_upper
        })
    }

    // ---- metadata ----

    /// Accessor family of a column, `None` for unmapped types.
    pub fn column_type(&self, index: usize) -> Result<Option<ColumnType>> {
        Ok(self.var(index)?.column_type())
    }

    /// Numeric scale of a column.
    pub fn scale(&self, index: usize) -> Result<i16> {
        Ok(self.var(index)?.scale)
    }

    /// Byte length of a column.
    pub fn len(&self, index: usize) -> Result<i16> {
        Ok(self.var(index)?.len)
    }

    /// Charset id or blob subtype of a column.
    pub fn subtype(&self, index: usize) -> Result<i16> {
        Ok(self.var(index)?.subtype)
    }

    /// Column name.
    pub fn column_name(&self, index: usize) -> Result<&str> {
        Ok(&self.var(index)?.name)
    }

    /// Relation name.
    pub fn relation_name(&self, index: usize) -> Result<&str> {
        Ok(&self.var(index)?.relation)
    }

    /// Owner name.
    pub fn owner_name(&self, index: usize) -> Result<&str> {
        Ok(&self.var(index)?.owner)
    }

    /// Alias name.
    pub fn alias_name(&self, index: usize) -> Result<&str> {
        Ok(&self.var(index)?.alias)
    }

    // ---- null handling ----

    /// Whether a column holds NULL. Non-nullable columns never do.
    pub fn is_null(&self, index: usize) -> Result<bool> {
        let var = self.var(index)?;
        Ok(match var.null_offset {
            Some(at) => self.read_i16(at) != 0,
            None => false,
        })
    }

    /// Set a column to NULL.
    ///
    /// # Errors
    /// `TypeConversion` if the column is not nullable.
    pub fn set_null(&mut self, index: usize) -> Result<()> {
        match self.var(index)?.null_offset {
            Some(at) => {
                self.write(at, &(-1i16).to_ne_bytes());
                Ok(())
            }
            None => Err(Error::TypeConversion { index }),
        }
    }

    fn mark_present(&mut self, index: usize) {
        if let Some(at) = self.vars.get(index).and_then(|v| v.null_offset) {
            self.write(at, &0i16.to_ne_bytes());
        }
    }

    // ---- raw access ----

    fn field(&self, index: usize) -> Result<Field> {
        let var = self.var(index)?;
        Ok(Field {
            index,
            base: var.base_type(),
            subtype: var.subtype,
            len: var.byte_len(),
            offset: var.data_offset,
        })
    }

    /// Field of a column that must not be NULL.
    fn present(&self, index: usize) -> Result<Field> {
        if self.is_null(index)? {
            return Err(Error::NullField { index });
        }
        self.field(index)
    }

    fn read_i16(&self, at: usize) -> i16 {
        i16::from_ne_bytes(self.read_array(at))
    }

    fn read_array<const N: usize>(&self, at: usize) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buffer[at..at + N]);
        out
    }

    /// `N` bytes at `rel` inside a value, if the column is wide enough.
    fn fixed<const N: usize>(&self, f: &Field, rel: usize) -> Result<[u8; N]> {
        if rel + N > f.len {
            return Err(Error::TypeConversion { index: f.index });
        }
        Ok(self.read_array(f.offset + rel))
    }

    fn write(&mut self, at: usize, bytes: &[u8]) {
        self.buffer[at..at + bytes.len()].copy_from_slice(bytes);
    }

    fn put<const N: usize>(&mut self, f: &Field, rel: usize, bytes: [u8; N]) -> Result<()> {
        if rel + N > f.len {
            return Err(Error::TypeConversion { index: f.index });
        }
        self.write(f.offset + rel, &bytes);
        Ok(())
    }

    /// Copy one column's value and null flag from another descriptor.
    ///
    /// Both columns must share base type and length.
    pub fn copy_column_from(&mut self, index: usize, src: &Sqlda, src_index: usize) -> Result<()> {
        let to = self.field(index)?;
        let from = src.field(src_index)?;
        if to.base != from.base || to.len != from.len {
            return Err(Error::TypeConversion { index });
        }
        let size = match to.base {
            SQL_TEXT => to.len + 1,
            SQL_VARYING => VARY_PREFIX + to.len + 1,
            _ => to.len,
        };
        let bytes = src.buffer[from.offset..from.offset + size].to_vec();
        self.write(to.offset, &bytes);
        if src.is_null(src_index)? {
            self.set_null(index)
        } else {
            self.mark_present(index);
            Ok(())
        }
    }

    // ---- getters ----

    /// Read a BOOLEAN.
    pub fn get_bool(&self, index: usize) -> Result<bool> {
        let f = self.present(index)?;
        match f.base {
            SQL_BOOLEAN => Ok(self.fixed::<1>(&f, 0)?[0] != 0),
            _ => Err(Error::TypeConversion { index }),
        }
    }

    /// Read a SMALLINT.
    pub fn get_i16(&self, index: usize) -> Result<i16> {
        let f = self.present(index)?;
        match f.base {
            SQL_SHORT => Ok(i16::from_ne_bytes(self.fixed(&f, 0)?)),
            _ => Err(Error::TypeConversion { index }),
        }
    }

    /// Read an INTEGER or SMALLINT.
    pub fn get_i32(&self, index: usize) -> Result<i32> {
        let f = self.present(index)?;
        match f.base {
            SQL_LONG => Ok(i32::from_ne_bytes(self.fixed(&f, 0)?)),
            SQL_SHORT => Ok(i16::from_ne_bytes(self.fixed(&f, 0)?) as i32),
            _ => Err(Error::TypeConversion { index }),
        }
    }

    /// Read a BIGINT, QUAD, INTEGER or SMALLINT.
    pub fn get_i64(&self, index: usize) -> Result<i64> {
        let f = self.present(index)?;
        match f.base {
            SQL_INT64 | SQL_QUAD => Ok(i64::from_ne_bytes(self.fixed(&f, 0)?)),
            SQL_LONG => Ok(i32::from_ne_bytes(self.fixed(&f, 0)?) as i64),
            SQL_SHORT => Ok(i16::from_ne_bytes(self.fixed(&f, 0)?) as i64),
            _ => Err(Error::TypeConversion { index }),
        }
    }

    /// Read a FLOAT.
    pub fn get_f32(&self, index: usize) -> Result<f32> {
        let f = self.present(index)?;
        match f.base {
            SQL_FLOAT => Ok(f32::from_ne_bytes(self.fixed(&f, 0)?)),
            _ => Err(Error::TypeConversion { index }),
        }
    }

    /// Read a FLOAT, DOUBLE or D_FLOAT.
    pub fn get_f64(&self, index: usize) -> Result<f64> {
        let f = self.present(index)?;
        match f.base {
            SQL_FLOAT => Ok(f32::from_ne_bytes(self.fixed(&f, 0)?) as f64),
            SQL_DOUBLE | SQL_D_FLOAT => Ok(f64::from_ne_bytes(self.fixed(&f, 0)?)),
            _ => Err(Error::TypeConversion { index }),
        }
    }

    /// Read an INT128, or sign-extend a narrower integer.
    pub fn get_int128(&self, index: usize) -> Result<Int128> {
        let f = self.present(index)?;
        match f.base {
            SQL_INT128 => Ok(Int128::from_ne_words(self.fixed(&f, 0)?)),
            SQL_INT64 => Ok(Int128::from_i64(i64::from_ne_bytes(self.fixed(&f, 0)?))),
            SQL_LONG => Ok(Int128::from_i64(i32::from_ne_bytes(self.fixed(&f, 0)?) as i64)),
            SQL_SHORT => Ok(Int128::from_i64(i16::from_ne_bytes(self.fixed(&f, 0)?) as i64)),
            _ => Err(Error::TypeConversion { index }),
        }
    }

    /// Read the date part as days since 1970-01-01.
    pub fn get_epoch_days(&self, index: usize) -> Result<i32> {
        let f = self.present(index)?;
        match f.base {
            SQL_TYPE_DATE | SQL_TIMESTAMP | SQL_TIMESTAMP_TZ | SQL_TIMESTAMP_TZ_EX => {
                Ok(epoch_days_from_isc(i32::from_ne_bytes(self.fixed(&f, 0)?)))
            }
            _ => Err(Error::TypeConversion { index }),
        }
    }

    /// Read the time part as milliseconds of the day.
    pub fn get_millis_of_day(&self, index: usize) -> Result<i32> {
        let f = self.present(index)?;
        match f.base {
            SQL_TYPE_TIME | SQL_TIME_TZ | SQL_TIME_TZ_EX => {
                Ok(millis_from_isc_time(u32::from_ne_bytes(self.fixed(&f, 0)?)))
            }
            SQL_TIMESTAMP | SQL_TIMESTAMP_TZ | SQL_TIMESTAMP_TZ_EX => {
                Ok(millis_from_isc_time(u32::from_ne_bytes(self.fixed(&f, 4)?)))
            }
            _ => Err(Error::TypeConversion { index }),
        }
    }

    /// Read the raw time zone id of a WITH TIME ZONE column.
    pub fn get_time_zone_id(&self, index: usize) -> Result<u16> {
        let f = self.present(index)?;
        match f.base {
            SQL_TIME_TZ | SQL_TIME_TZ_EX => Ok(u16::from_ne_bytes(self.fixed(&f, 4)?)),
            SQL_TIMESTAMP_TZ | SQL_TIMESTAMP_TZ_EX => Ok(u16::from_ne_bytes(self.fixed(&f, 8)?)),
            _ => Err(Error::TypeConversion { index }),
        }
    }

    /// Read a blob id.
    pub fn get_blob_id(&self, index: usize) -> Result<BlobId> {
        let f = self.present(index)?;
        match f.base {
            SQL_BLOB => Ok(BlobId(u64::from_ne_bytes(self.fixed(&f, 0)?))),
            _ => Err(Error::TypeConversion { index }),
        }
    }

    /// Read a UTF-8 CHAR or VARCHAR.
    ///
    /// CHAR keeps its padding up to the declared character count.
    pub fn get_text(&self, index: usize) -> Result<String> {
        let f = self.present(index)?;
        let bytes = match f.base {
            SQL_VARYING if f.subtype == CS_UTF8 => self.varying(&f),
            SQL_TEXT if f.subtype == CS_UTF8 => {
                let data = &self.buffer[f.offset..f.offset + f.len];
                &data[..utf8_prefix(data, f.len / UTF8_MAX_BYTES)]
            }
            _ => return Err(Error::TypeConversion { index }),
        };
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| Error::InvalidEncoding { index })
    }

    /// Read a CHAR or VARCHAR as raw bytes.
    pub fn get_octets(&self, index: usize) -> Result<Vec<u8>> {
        let f = self.present(index)?;
        match f.base {
            SQL_VARYING => Ok(self.varying(&f).to_vec()),
            SQL_TEXT => Ok(self.buffer[f.offset..f.offset + f.len].to_vec()),
            _ => Err(Error::TypeConversion { index }),
        }
    }

    fn varying(&self, f: &Field) -> &[u8] {
        let size = (u16::from_ne_bytes(self.read_array(f.offset)) as usize).min(f.len);
        let start = f.offset + VARY_PREFIX;
        &self.buffer[start..start + size]
    }

    // ---- setters ----

    /// Write a BOOLEAN.
    pub fn set_bool(&mut self, index: usize, value: bool) -> Result<()> {
        let f = self.field(index)?;
        match f.base {
            SQL_BOOLEAN => self.put(&f, 0, [value as u8])?,
            _ => return Err(Error::TypeConversion { index }),
        }
        self.mark_present(index);
        Ok(())
    }

    /// Write a SMALLINT into any numeric column that can hold it.
    pub fn set_i16(&mut self, index: usize, value: i16) -> Result<()> {
        let f = self.field(index)?;
        match f.base {
            SQL_SHORT => self.put(&f, 0, value.to_ne_bytes())?,
            SQL_LONG => self.put(&f, 0, (value as i32).to_ne_bytes())?,
            SQL_INT64 | SQL_QUAD => self.put(&f, 0, (value as i64).to_ne_bytes())?,
            SQL_FLOAT => self.put(&f, 0, (value as f32).to_ne_bytes())?,
            SQL_DOUBLE | SQL_D_FLOAT => self.put(&f, 0, (value as f64).to_ne_bytes())?,
            SQL_INT128 => self.put(&f, 0, Int128::from_i64(value as i64).to_ne_words())?,
            _ => return Err(Error::TypeConversion { index }),
        }
        self.mark_present(index);
        Ok(())
    }

    /// Write an INTEGER into INTEGER, BIGINT, QUAD, DOUBLE, D_FLOAT or INT128.
    pub fn set_i32(&mut self, index: usize, value: i32) -> Result<()> {
        let f = self.field(index)?;
        match f.base {
            SQL_LONG => self.put(&f, 0, value.to_ne_bytes())?,
            SQL_INT64 | SQL_QUAD => self.put(&f, 0, (value as i64).to_ne_bytes())?,
            SQL_DOUBLE | SQL_D_FLOAT => self.put(&f, 0, (value as f64).to_ne_bytes())?,
            SQL_INT128 => self.put(&f, 0, Int128::from_i64(value as i64).to_ne_words())?,
            _ => return Err(Error::TypeConversion { index }),
        }
        self.mark_present(index);
        Ok(())
    }

    /// Write a BIGINT into BIGINT, QUAD or INT128.
    pub fn set_i64(&mut self, index: usize, value: i64) -> Result<()> {
        let f = self.field(index)?;
        match f.base {
            SQL_INT64 | SQL_QUAD => self.put(&f, 0, value.to_ne_bytes())?,
            SQL_INT128 => self.put(&f, 0, Int128::from_i64(value).to_ne_words())?,
            _ => return Err(Error::TypeConversion { index }),
        }
        self.mark_present(index);
        Ok(())
    }

    /// Write a FLOAT into FLOAT, DOUBLE or D_FLOAT.
    pub fn set_f32(&mut self, index: usize, value: f32) -> Result<()> {
        let f = self.field(index)?;
        match f.base {
            SQL_FLOAT => self.put(&f, 0, value.to_ne_bytes())?,
            SQL_DOUBLE | SQL_D_FLOAT => self.put(&f, 0, (value as f64).to_ne_bytes())?,
            _ => return Err(Error::TypeConversion { index }),
        }
        self.mark_present(index);
        Ok(())
    }

    /// Write a DOUBLE or D_FLOAT.
    pub fn set_f64(&mut self, index: usize, value: f64) -> Result<()> {
        let f = self.field(index)?;
        match f.base {
            SQL_DOUBLE | SQL_D_FLOAT => self.put(&f, 0, value.to_ne_bytes())?,
            _ => return Err(Error::TypeConversion { index }),
        }
        self.mark_present(index);
        Ok(())
    }

    /// Write an INT128.
    pub fn set_int128(&mut self, index: usize, value: Int128) -> Result<()> {
        let f = self.field(index)?;
        match f.base {
            SQL_INT128 => self.put(&f, 0, value.to_ne_words())?,
            _ => return Err(Error::TypeConversion { index }),
        }
        self.mark_present(index);
        Ok(())
    }

    /// Write the date part from days since 1970-01-01.
    pub fn set_epoch_days(&mut self, index: usize, days: i32) -> Result<()> {
        let f = self.field(index)?;
        match f.base {
            SQL_TYPE_DATE | SQL_TIMESTAMP | SQL_TIMESTAMP_TZ | SQL_TIMESTAMP_TZ_EX => {
                self.put(&f, 0, isc_date_from_epoch_days(days).to_ne_bytes())?
            }
            _ => return Err(Error::TypeConversion { index }),
        }
        self.mark_present(index);
        Ok(())
    }

    /// Write the time part from milliseconds of the day.
    pub fn set_millis_of_day(&mut self, index: usize, millis: i32) -> Result<()> {
        let f = self.field(index)?;
        let units = isc_time_from_millis(millis).to_ne_bytes();
        match f.base {
            SQL_TYPE_TIME | SQL_TIME_TZ | SQL_TIME_TZ_EX => self.put(&f, 0, units)?,
            SQL_TIMESTAMP | SQL_TIMESTAMP_TZ | SQL_TIMESTAMP_TZ_EX => self.put(&f, 4, units)?,
            _ => return Err(Error::TypeConversion { index }),
        }
        self.mark_present(index);
        Ok(())
    }

    /// Write the time zone id of a WITH TIME ZONE column.
    pub fn set_time_zone_id(&mut self, index: usize, id: u16) -> Result<()> {
        let f = self.field(index)?;
        match f.base {
            SQL_TIME_TZ | SQL_TIME_TZ_EX => self.put(&f, 4, id.to_ne_bytes())?,
            SQL_TIMESTAMP_TZ | SQL_TIMESTAMP_TZ_EX => self.put(&f, 8, id.to_ne_bytes())?,
            _ => return Err(Error::TypeConversion { index }),
        }
        self.mark_present(index);
        Ok(())
    }

    /// Write a blob id.
    pub fn set_blob_id(&mut self, index: usize, id: BlobId) -> Result<()> {
        let f = self.field(index)?;
        match f.base {
            SQL_BLOB => self.put(&f, 0, id.0.to_ne_bytes())?,
            _ => return Err(Error::TypeConversion { index }),
        }
        self.mark_present(index);
        Ok(())
    }

    /// Write a UTF-8 CHAR (space-filled) or VARCHAR.
    ///
    /// # Errors
    /// `Truncation` if the value has more characters than the column declares.
    pub fn set_text(&mut self, index: usize, value: &str) -> Result<()> {
        let f = self.field(index)?;
        if f.subtype != CS_UTF8 || !matches!(f.base, SQL_VARYING | SQL_TEXT) {
            return Err(Error::TypeConversion { index });
        }
        if value.chars().count() > f.len / UTF8_MAX_BYTES || value.len() > f.len {
            return Err(Error::Truncation { index });
        }
        self.put_inline(&f, value.as_bytes(), b' ');
        self.mark_present(index);
        Ok(())
    }

    /// Write raw bytes into a CHAR or VARCHAR.
    ///
    /// CHAR is filled with spaces when it has a character set, zeros otherwise.
    pub fn set_octets(&mut self, index: usize, value: &[u8]) -> Result<()> {
        let f = self.field(index)?;
        if !matches!(f.base, SQL_VARYING | SQL_TEXT) {
            return Err(Error::TypeConversion { index });
        }
        if value.len() > f.len {
            return Err(Error::Truncation { index });
        }
        let fill = if f.subtype > 0 { b' ' } else { 0 };
        self.put_inline(&f, value, fill);
        self.mark_present(index);
        Ok(())
    }

    fn put_inline(&mut self, f: &Field, value: &[u8], fill: u8) {
        if f.base == SQL_VARYING {
            self.write(f.offset, &(value.len() as u16).to_ne_bytes());
            self.write(f.offset + VARY_PREFIX, value);
        } else {
            self.buffer[f.offset..f.offset + f.len].fill(fill);
            self.write(f.offset, value);
        }
    }
}

/// Byte length of the first `max_chars` characters of a NUL-terminated UTF-8 run.
fn utf8_prefix(data: &[u8], max_chars: usize) -> usize {
    let mut chars = 0;
    for (pos, &b) in data.iter().enumerate() {
        if b == 0 {
            return pos;
        }
        if b & 0xC0 != 0x80 {
            chars += 1;
            if chars > max_chars {
                return pos;
            }
        }
    }
    data.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::{CS_NONE, SQL_ARRAY};

    fn row() -> Sqlda {
        let mut da = Sqlda::new();
        da.describe(vec![
            SqlVar::new(SQL_SHORT, 2).named("S"),
            SqlVar::new(SQL_LONG, 4).named("I").nullable(),
            SqlVar::new(SQL_INT64, 8).named("L"),
            SqlVar::new(SQL_INT128, 16).named("H"),
            SqlVar::new(SQL_DOUBLE, 8).with_scale(-3).named("D"),
            SqlVar::new(SQL_FLOAT, 4).named("F"),
            SqlVar::new(SQL_BOOLEAN, 1).named("B").nullable(),
            SqlVar::new(SQL_TEXT, 40).with_subtype(CS_UTF8).named("C"),
            SqlVar::new(SQL_VARYING, 40).with_subtype(CS_UTF8).named("V").nullable(),
        ]);
        da
    }

    #[test]
    fn test_layout() {
        let da = row();
        let offsets: Vec<usize> = da.vars().iter().map(|v| v.data_offset()).collect();
        // indicators: I at 6, B at 45, V at 131
        assert_eq!(offsets, vec![0, 2, 8, 16, 32, 40, 44, 47, 88]);
        assert_eq!(da.vars()[1].null_offset(), Some(6));
        assert_eq!(da.vars()[8].null_offset(), Some(131));
        assert_eq!(da.buffer().len(), 133);
        assert_eq!(da.scale(4).unwrap(), 0);
    }

    #[test]
    fn test_nullables_start_null() {
        let da = row();
        assert!(da.is_null(1).unwrap());
        assert!(!da.is_null(0).unwrap());
        assert!(matches!(da.get_i32(1), Err(Error::NullField { index: 1 })));
    }

    #[test]
    fn test_null_contract() {
        let mut da = row();
        da.set_i32(1, 5).unwrap();
        assert!(!da.is_null(1).unwrap());
        da.set_null(1).unwrap();
        assert!(da.is_null(1).unwrap());
        assert!(matches!(da.get_i64(1), Err(Error::NullField { .. })));
        assert!(matches!(da.set_null(0), Err(Error::TypeConversion { index: 0 })));
    }

    #[test]
    fn test_index_out_of_bound() {
        let da = row();
        assert!(matches!(
            da.get_i16(9),
            Err(Error::IndexOutOfBounds { index: 9, count: 9 })
        ));
    }

    #[test]
    fn test_integer_widening() {
        let mut da = row();
        da.set_i16(0, -7).unwrap();
        assert_eq!(da.get_i16(0).unwrap(), -7);
        assert_eq!(da.get_i32(0).unwrap(), -7);
        assert_eq!(da.get_i64(0).unwrap(), -7);
        assert_eq!(da.get_int128(0).unwrap(), Int128::new(-7, -1));
        assert!(matches!(da.get_f64(0), Err(Error::TypeConversion { index: 0 })));

        da.set_i16(3, 12).unwrap();
        assert_eq!(da.get_int128(3).unwrap(), Int128::new(12, 0));
        da.set_i32(4, 3).unwrap();
        assert_eq!(da.get_f64(4).unwrap(), 3.0);
        assert!(da.set_i64(1, 3).is_err());
    }

    #[test]
    fn test_extremes() {
        let mut da = row();
        da.set_i16(0, i16::MAX).unwrap();
        da.set_i32(1, i32::MAX).unwrap();
        da.set_i64(2, i64::MAX).unwrap();
        da.set_int128(3, Int128::from_i64(i64::MIN)).unwrap();
        da.set_f64(4, f64::MAX).unwrap();
        da.set_f32(5, f32::MAX).unwrap();
        da.set_bool(6, true).unwrap();
        assert_eq!(da.get_i16(0).unwrap(), i16::MAX);
        assert_eq!(da.get_i32(1).unwrap(), i32::MAX);
        assert_eq!(da.get_i64(2).unwrap(), i64::MAX);
        assert_eq!(da.get_int128(3).unwrap(), Int128::new(i64::MIN, -1));
        assert_eq!(da.get_f64(4).unwrap(), f64::MAX);
        assert_eq!(da.get_f32(5).unwrap(), f32::MAX);
        assert!(da.get_bool(6).unwrap());
    }

    #[test]
    fn test_d_float_and_quad_setters() {
        let mut da = Sqlda::new();
        da.describe(vec![SqlVar::new(SQL_D_FLOAT, 8), SqlVar::new(SQL_QUAD, 8)]);

        da.set_f64(0, 2.5).unwrap();
        assert_eq!(da.get_f64(0).unwrap(), 2.5);
        da.set_f32(0, 1.5).unwrap();
        assert_eq!(da.get_f64(0).unwrap(), 1.5);
        da.set_i32(0, -4).unwrap();
        assert_eq!(da.get_f64(0).unwrap(), -4.0);
        da.set_i16(0, 9).unwrap();
        assert_eq!(da.get_f64(0).unwrap(), 9.0);

        da.set_i32(1, -17).unwrap();
        assert_eq!(da.get_i64(1).unwrap(), -17);
        assert!(matches!(da.set_f64(1, 1.0), Err(Error::TypeConversion { index: 1 })));
    }

    #[test]
    fn test_char_keeps_padding() {
        let mut da = row();
        da.set_text(7, "firebird").unwrap();
        assert_eq!(da.get_text(7).unwrap(), "firebird  ");
        da.set_text(8, "firebird").unwrap();
        assert_eq!(da.get_text(8).unwrap(), "firebird");
    }

    #[test]
    fn test_text_truncation() {
        let mut da = row();
        assert!(matches!(
            da.set_text(8, "abcdefghijk"),
            Err(Error::Truncation { index: 8 })
        ));
        da.set_text(8, "ééééééééé").unwrap();
        assert_eq!(da.get_text(8).unwrap(), "ééééééééé");
    }

    #[test]
    fn test_text_needs_utf8_column() {
        let mut da = Sqlda::new();
        da.describe(vec![
            SqlVar::new(SQL_VARYING, 8).with_subtype(CS_NONE),
            SqlVar::new(SQL_TEXT, 4).with_subtype(CS_NONE),
        ]);
        assert!(matches!(da.set_text(0, "x"), Err(Error::TypeConversion { .. })));
        da.set_octets(0, b"\x01\x02").unwrap();
        assert_eq!(da.get_octets(0).unwrap(), vec![1, 2]);
        da.set_octets(1, b"ab").unwrap();
        assert_eq!(da.get_octets(1).unwrap(), b"ab\0\0".to_vec());
        assert!(matches!(da.set_octets(1, b"abcde"), Err(Error::Truncation { index: 1 })));
    }

    #[test]
    fn test_dates_and_times() {
        let mut da = Sqlda::new();
        da.describe(vec![
            SqlVar::new(SQL_TYPE_DATE, 4),
            SqlVar::new(SQL_TYPE_TIME, 4),
            SqlVar::new(SQL_TIMESTAMP, 8),
            SqlVar::new(SQL_TIMESTAMP_TZ, 12),
            SqlVar::new(SQL_TIME_TZ, 8),
        ]);
        da.set_epoch_days(0, 0).unwrap();
        assert_eq!(&da.buffer()[0..4], &40587i32.to_ne_bytes());
        assert_eq!(da.get_epoch_days(0).unwrap(), 0);

        da.set_millis_of_day(1, 45_296_789).unwrap();
        assert_eq!(da.get_millis_of_day(1).unwrap(), 45_296_789);

        da.set_epoch_days(2, 19_000).unwrap();
        da.set_millis_of_day(2, 1_000).unwrap();
        assert_eq!(da.get_epoch_days(2).unwrap(), 19_000);
        assert_eq!(da.get_millis_of_day(2).unwrap(), 1_000);

        da.set_time_zone_id(3, 65535).unwrap();
        da.set_time_zone_id(4, 65534).unwrap();
        assert_eq!(da.get_time_zone_id(3).unwrap(), 65535);
        assert_eq!(da.get_time_zone_id(4).unwrap(), 65534);
        assert!(da.get_time_zone_id(2).is_err());
        assert!(da.get_millis_of_day(0).is_err());
    }

    #[test]
    fn test_blob_id_and_unknown_type() {
        let mut da = Sqlda::new();
        da.describe(vec![SqlVar::new(SQL_BLOB, 8).with_subtype(1), SqlVar::new(SQL_ARRAY, 8)]);
        da.set_blob_id(0, BlobId(42)).unwrap();
        assert_eq!(da.get_blob_id(0).unwrap(), BlobId(42));
        assert_eq!(da.column_type(1).unwrap(), None);
        assert!(da.get_text(0).is_err());
    }

    #[test]
    fn test_copy_column_from() {
        let mut src = row();
        src.set_text(8, "copy").unwrap();
        let mut dst = row();
        dst.copy_column_from(8, &src, 8).unwrap();
        assert_eq!(dst.get_text(8).unwrap(), "copy");
        dst.copy_column_from(1, &src, 1).unwrap();
        assert!(dst.is_null(1).unwrap());
        assert!(dst.copy_column_from(0, &src, 1).is_err());
    }

    #[test]
    fn test_utf8_prefix() {
        assert_eq!(utf8_prefix(b"firebird                                ", 10), 10);
        assert_eq!(utf8_prefix("héllo".as_bytes(), 2), 3);
        assert_eq!(utf8_prefix(b"ab\0cd", 10), 2);
    }
}
