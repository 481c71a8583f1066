//! Единый тип ошибок публичного API.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OfxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("source not found: {0}")]
    SourceNotFound(String),

    #[error("markup error: {0}")]
    Markup(String),

    #[error("bad timestamp: {0}")]
    Timestamp(String),

    #[error("bad amount: {0}")]
    Amount(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, OfxError>;
