use thiserror::Error;

use crate::data_source::SourceError;
use crate::routing::RouteTrace;
use crate::window::DateWindow;
use crate::Symbol;

/// Validation and contract errors exposed by `vestval-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid source '{value}', expected one of yahoo, alphavantage")]
    InvalidSource { value: String },
    #[error("currency must be a 3-letter ISO code: '{value}'")]
    InvalidCurrency { value: String },
    #[error("unknown company '{value}', expected one of meta, google, amazon")]
    UnknownCompany { value: String },

    #[error("invalid date '{value}', expected YYYY-MM-DD or an RFC3339 timestamp")]
    InvalidDate { value: String },
    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("field '{field}' must be greater than zero (division by zero)")]
    DivisionByZero { field: &'static str },

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("schema_version must match vMAJOR.MINOR.PATCH: '{value}'")]
    InvalidSchemaVersion { value: String },
    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

impl ValidationError {
    /// True for the failures a user fixes by re-entering a number.
    pub const fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::NonFiniteValue { .. } | Self::NegativeValue { .. } | Self::DivisionByZero { .. }
        )
    }
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Every candidate provider failed; `trace` records each attempt.
    #[error("price source failed: {error}")]
    Source {
        error: SourceError,
        trace: Box<RouteTrace>,
    },

    #[error("no usable closing prices for {symbol} in {window}")]
    NoData { symbol: Symbol, window: DateWindow },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "core.validation",
            Self::Source { error, .. } => error.code(),
            Self::NoData { .. } => "core.no_data",
            Self::Serialization(_) => "core.serialization",
        }
    }
}
