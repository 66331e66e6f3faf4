//! Previous-calendar-month window resolution.
//!
//! The reference price of a grant is the average close over the calendar
//! month *before* vesting starts. Given any anchor date this module yields
//! that month as an inclusive `[start, end]` pair.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

use crate::domain::{iso_date, parse_calendar_date};
use crate::ValidationError;

/// Inclusive calendar-month range: first day through last day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    #[serde(with = "iso_date")]
    pub start: Date,
    #[serde(with = "iso_date")]
    pub end: Date,
}

impl DateWindow {
    /// Parse an anchor string and resolve the month before it.
    pub fn previous_month_of(anchor: &str) -> Result<Self, ValidationError> {
        resolve_previous_month_window(parse_anchor(anchor)?)
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, 28 through 31.
    pub fn len_days(&self) -> u8 {
        self.end.day()
    }

    /// Human label such as `October 2023`.
    pub fn label(&self) -> String {
        format!("{} {}", self.start.month(), self.start.year())
    }
}

impl Display for DateWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Resolve the calendar month immediately preceding `anchor`'s month.
///
/// The end is the day before the first of the anchor's month, so month
/// length and leap years fall out of the calendar instead of a table.
pub fn resolve_previous_month_window(anchor: Date) -> Result<DateWindow, ValidationError> {
    let out_of_range = || ValidationError::InvalidDate {
        value: anchor.to_string(),
    };

    let first_of_anchor_month = anchor.replace_day(1).map_err(|_| out_of_range())?;
    let end = first_of_anchor_month
        .previous_day()
        .ok_or_else(out_of_range)?;
    let start = end.replace_day(1).map_err(|_| out_of_range())?;

    Ok(DateWindow { start, end })
}

/// Parse a user-supplied anchor.
///
/// Accepts `YYYY-MM-DD` or an RFC3339 timestamp. For timestamps the
/// calendar date is taken as written, not shifted to UTC.
pub fn parse_anchor(input: &str) -> Result<Date, ValidationError> {
    let trimmed = input.trim();
    if let Ok(timestamp) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(timestamp.date());
    }

    parse_calendar_date(trimmed).map_err(|_| ValidationError::InvalidDate {
        value: input.to_owned(),
    })
}
