//! Column descriptors (XSQLVAR).
//!
//! A `SqlVar` is what the client library reports for one column after
//! prepare or describe-bind, plus the two offsets the data buffer layout
//! assigns to it.

use super::sql_type::{base_type, is_nullable_type, ColumnType};

/// Metadata of one descriptor column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlVar {
    /// Raw `sqltype`, nullable flag included.
    pub sqltype: i16,
    /// Power-of-ten scale of exact numerics (never positive).
    pub scale: i16,
    /// Charset id for text, subtype for blobs.
    pub subtype: i16,
    /// Byte length of the value.
    pub len: i16,
    /// Column name.
    pub name: String,
    /// Relation the column belongs to.
    pub relation: String,
    /// Owner of the relation.
    pub owner: String,
    /// Alias given in the select list.
    pub alias: String,
    /// Offset of the value in the data buffer.
    pub(crate) data_offset: usize,
    /// Offset of the i16 null indicator, if the column is nullable.
    pub(crate) null_offset: Option<usize>,
}

impl SqlVar {
    /// Create a column of the given raw type and byte length.
    pub fn new(sqltype: i16, len: i16) -> Self {
        Self {
            sqltype,
            len,
            ..Self::default()
        }
    }

    /// Set the charset or blob subtype.
    pub fn with_subtype(mut self, subtype: i16) -> Self {
        self.subtype = subtype;
        self
    }

    /// Set the numeric scale.
    pub fn with_scale(mut self, scale: i16) -> Self {
        self.scale = scale;
        self
    }

    /// Set the column name and alias.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.alias = name.clone();
        self.name = name;
        self
    }

    /// Set relation and owner.
    pub fn in_relation(mut self, relation: impl Into<String>, owner: impl Into<String>) -> Self {
        self.relation = relation.into();
        self.owner = owner.into();
        self
    }

    /// Mark the column nullable.
    pub fn nullable(mut self) -> Self {
        self.sqltype |= 1;
        self
    }

    /// Raw type with the nullable flag stripped.
    pub fn base_type(&self) -> i16 {
        base_type(self.sqltype)
    }

    /// Whether the column accepts NULL.
    pub fn is_nullable(&self) -> bool {
        is_nullable_type(self.sqltype)
    }

    /// Accessor family, if the type has one.
    pub fn column_type(&self) -> Option<ColumnType> {
        ColumnType::from_raw(self.sqltype, self.subtype)
    }

    /// Byte length as an unsigned size.
    pub fn byte_len(&self) -> usize {
        self.len.max(0) as usize
    }

    /// Offset of the value in the data buffer.
    pub fn data_offset(&self) -> usize {
        self.data_offset
    }

    /// Offset of the null indicator in the data buffer.
    pub fn null_offset(&self) -> Option<usize> {
        self.null_offset
    }
}
