#![forbid(unsafe_code)]

use alm_core::{NameError, TreeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(rusqlite::Error),
    #[error("store is not connected")]
    NotConnected,
    #[error("conversion failed for {column}: {detail}")]
    Conversion { column: String, detail: String },
    #[error("structural violation: {0}")]
    StructuralViolation(String),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("transaction {op} failed: {detail}")]
    TransactionFailure { op: &'static str, detail: String },
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("schema mismatch: {0}")]
    SchemaMismatch(&'static str),
    #[error("authentication failed")]
    AuthenticationFailed,
    #[error("no acting user (log in first)")]
    NoActingUser,
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO",
            Self::Sql(_) => "SQL",
            Self::NotConnected => "NOT_CONNECTED",
            Self::Conversion { .. } => "CONVERSION",
            Self::StructuralViolation(_) => "STRUCTURAL_VIOLATION",
            Self::Validation(_) => "VALIDATION",
            Self::TransactionFailure { .. } => "TRANSACTION_FAILURE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::SchemaMismatch(_) => "SCHEMA_MISMATCH",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::NoActingUser => "NO_ACTING_USER",
        }
    }

    pub(crate) fn conversion(column: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Conversion {
            column: column.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn structural(detail: impl Into<String>) -> Self {
        Self::StructuralViolation(detail.into())
    }

    pub(crate) fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }

    pub(crate) fn transaction(op: &'static str, err: impl std::fmt::Display) -> Self {
        Self::TransactionFailure {
            op,
            detail: err.to_string(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::InvalidColumnType(_, column, found) => {
                Self::conversion(column, format!("unexpected {found} value"))
            }
            rusqlite::Error::FromSqlConversionFailure(index, found, err) => {
                Self::conversion(format!("column #{index}"), format!("{found}: {err}"))
            }
            rusqlite::Error::IntegralValueOutOfRange(index, value) => Self::conversion(
                format!("column #{index}"),
                format!("integer {value} out of range"),
            ),
            other => Self::Sql(other),
        }
    }
}

impl From<TreeError> for StoreError {
    fn from(value: TreeError) -> Self {
        Self::structural(value.to_string())
    }
}

impl From<NameError> for StoreError {
    fn from(value: NameError) -> Self {
        Self::validation(value.message())
    }
}
