use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::Date;

use crate::{Symbol, UtcDateTime, ValidationError};

time::serde::format_description!(pub(crate) iso_date, Date, "[year]-[month]-[day]");

/// Latest traded price for a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: Symbol,
    pub price: f64,
    pub currency: String,
    pub as_of: UtcDateTime,
}

impl Quote {
    pub fn new(
        symbol: Symbol,
        price: f64,
        currency: impl AsRef<str>,
        as_of: UtcDateTime,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("price", price)?;

        Ok(Self {
            symbol,
            price,
            currency: validate_currency_code(currency.as_ref())?,
            as_of,
        })
    }
}

/// One trading day's closing price as delivered by a feed.
///
/// `close` is `None` when the feed had no usable number for that day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub close: Option<f64>,
}

impl DailyClose {
    pub const fn new(date: Date, close: Option<f64>) -> Self {
        Self { date, close }
    }

    /// The close, if it is a finite number.
    pub fn valid_close(&self) -> Option<f64> {
        self.close.filter(|value| value.is_finite())
    }

    /// Normalizes a feed date key into a calendar date.
    ///
    /// Feeds disagree on shape (`2023-10-02`, `2023-10-02 16:00:00`,
    /// `2023-10-2`), so only the leading date part is read and each
    /// component is parsed numerically.
    pub fn parse_date(raw: &str) -> Result<Date, ValidationError> {
        let trimmed = raw.trim();
        let date_part = trimmed
            .split(|ch: char| ch == 'T' || ch == ' ')
            .next()
            .unwrap_or(trimmed);
        parse_calendar_date(date_part).map_err(|_| ValidationError::InvalidDate {
            value: raw.to_owned(),
        })
    }
}

/// Daily closes for one ticker, in feed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub symbol: Symbol,
    pub closes: Vec<DailyClose>,
}

impl DailySeries {
    pub fn new(symbol: Symbol, mut closes: Vec<DailyClose>) -> Self {
        closes.sort_by_key(|close| close.date);
        Self { symbol, closes }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

/// Strict `YEAR-MONTH-DAY` parser; month and day may omit the leading zero.
pub fn parse_calendar_date(input: &str) -> Result<Date, ValidationError> {
    Date::parse(
        input.trim(),
        format_description!("[year]-[month padding:none]-[day padding:none]"),
    )
    .map_err(|_| ValidationError::InvalidDate {
        value: input.to_owned(),
    })
}

/// Validate and normalize currency to uppercase 3-letter code.
pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}

pub(crate) fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
