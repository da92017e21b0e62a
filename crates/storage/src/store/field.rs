#![forbid(unsafe_code)]

//! Nullable column values.
//!
//! `Field<T>` keeps SQL `NULL` apart from every legal value of `T`: `0`, `""` and `false`
//! are all present values. Reading a cell of the wrong storage class is a conversion error,
//! never a silent coercion.

use super::error::StoreError;
use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, Value, ValueRef};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field<T>(Option<T>);

impl<T> Field<T> {
    pub const fn null() -> Self {
        Self(None)
    }

    pub const fn new(value: T) -> Self {
        Self(Some(value))
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn value(&self) -> Option<&T> {
        self.0.as_ref()
    }

    pub fn set(&mut self, value: T) {
        self.0 = Some(value);
    }

    pub fn set_null(&mut self) {
        self.0 = None;
    }

    pub fn into_option(self) -> Option<T> {
        self.0
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        Field(self.0.map(f))
    }

    /// Unwraps a column declared `NOT NULL`; a null cell there means the row is corrupt.
    pub fn require(self, column: &'static str) -> Result<T, StoreError> {
        self.0
            .ok_or_else(|| StoreError::conversion(column, "unexpected NULL"))
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        Self(value)
    }
}

impl<T> From<Field<T>> for Option<T> {
    fn from(value: Field<T>) -> Self {
        value.0
    }
}

impl<T: FromSql> FromSql for Field<T> {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Self::null()),
            other => T::column_result(other).map(Self::new),
        }
    }
}

impl<T: ToSql> ToSql for Field<T> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match &self.0 {
            Some(value) => value.to_sql(),
            None => Ok(ToSqlOutput::Owned(Value::Null)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn read<T: FromSql>(sql: &str) -> Result<Field<T>, StoreError> {
        let conn = Connection::open_in_memory().expect("in-memory db");
        Ok(conn.query_row(sql, [], |row| row.get::<_, Field<T>>(0))?)
    }

    #[test]
    fn null_is_distinct_from_zero_and_empty() {
        assert!(read::<i64>("SELECT NULL").unwrap().is_null());
        assert_eq!(read::<i64>("SELECT 0").unwrap(), Field::new(0));
        assert_eq!(read::<String>("SELECT ''").unwrap(), Field::new(String::new()));
        assert_ne!(Field::new(0i64), Field::null());
        assert_eq!(Field::<i64>::null(), Field::null());
    }

    #[test]
    fn mismatched_storage_class_is_a_conversion_error() {
        let err = read::<i64>("SELECT 'abc' AS Type").unwrap_err();
        assert_eq!(err.code(), "CONVERSION");
        let err = read::<String>("SELECT 12").unwrap_err();
        assert_eq!(err.code(), "CONVERSION");
    }

    #[test]
    fn require_rejects_null() {
        assert_eq!(Field::new(5i64).require("Id").unwrap(), 5);
        let err = Field::<i64>::null().require("Id").unwrap_err();
        assert!(matches!(err, StoreError::Conversion { ref column, .. } if column == "Id"));
    }

    #[test]
    fn binds_null_and_values() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let is_null: bool = conn
            .query_row("SELECT ?1 IS NULL", [Field::<i64>::null()], |row| row.get(0))
            .unwrap();
        assert!(is_null);
        let value: i64 = conn
            .query_row("SELECT ?1 + 1", [Field::new(41i64)], |row| row.get(0))
            .unwrap();
        assert_eq!(value, 42);
    }
}
