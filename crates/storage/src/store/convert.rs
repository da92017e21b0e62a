#![forbid(unsafe_code)]

//! Column encodings that SQLite has no native type for.

use super::error::StoreError;
use super::field::Field;
use alm_core::{NodeType, UserType};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");

pub(crate) fn boolean_to_integer(value: bool) -> i64 {
    i64::from(value)
}

pub(crate) fn integer_to_boolean(
    column: &'static str,
    value: Field<i64>,
) -> Result<bool, StoreError> {
    match value.require(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(StoreError::conversion(
            column,
            format!("{other} is not a boolean"),
        )),
    }
}

pub(crate) fn integer_to_node_type(
    column: &'static str,
    value: Field<i64>,
) -> Result<NodeType, StoreError> {
    let code = value.require(column)?;
    NodeType::from_code(code)
        .ok_or_else(|| StoreError::conversion(column, format!("unknown node type {code}")))
}

pub(crate) fn integer_to_user_type(
    column: &'static str,
    value: Field<i64>,
) -> Result<UserType, StoreError> {
    let code = value.require(column)?;
    UserType::from_code(code)
        .ok_or_else(|| StoreError::conversion(column, format!("unknown user type {code}")))
}

/// Stored as UTC text with millisecond precision.
pub(crate) fn timestamp_to_text(value: OffsetDateTime) -> Result<String, StoreError> {
    value
        .to_offset(time::UtcOffset::UTC)
        .format(TIMESTAMP_FORMAT)
        .map_err(|err| StoreError::conversion("Timestamp", err.to_string()))
}

pub(crate) fn text_to_timestamp(
    column: &'static str,
    value: Field<String>,
) -> Result<OffsetDateTime, StoreError> {
    let text = value.require(column)?;
    PrimitiveDateTime::parse(&text, TIMESTAMP_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|err| StoreError::conversion(column, format!("{text:?}: {err}")))
}

/// Current UTC time truncated to what the timestamp column can hold.
pub(crate) fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(u32::from(now.millisecond()) * 1_000_000)
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_accept_only_zero_and_one() {
        assert!(!integer_to_boolean("Active", Field::new(0)).unwrap());
        assert!(integer_to_boolean("Active", Field::new(1)).unwrap());
        assert_eq!(
            integer_to_boolean("Active", Field::new(2)).unwrap_err().code(),
            "CONVERSION"
        );
        assert_eq!(
            integer_to_boolean("Active", Field::null()).unwrap_err().code(),
            "CONVERSION"
        );
    }

    #[test]
    fn node_type_codes_are_strict() {
        assert_eq!(
            integer_to_node_type("Type", Field::new(1)).unwrap(),
            NodeType::Project
        );
        assert!(integer_to_node_type("Type", Field::new(9)).is_err());
    }

    #[test]
    fn timestamps_keep_milliseconds() {
        let now = now_utc();
        let text = timestamp_to_text(now).unwrap();
        assert_eq!(text.len(), "2014-05-24 10:11:12.123".len());
        let parsed = text_to_timestamp("Timestamp", Field::new(text)).unwrap();
        assert_eq!(parsed, now);
        assert!(text_to_timestamp("Timestamp", Field::new("yesterday".to_string())).is_err());
    }
}
