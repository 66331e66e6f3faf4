//! # Domain Models
//!
//! Canonical value types shared by the price adapters and the valuation
//! code.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Quote`] | Latest traded price for a ticker |
//! | [`DailyClose`] | One day's close, possibly missing |
//! | [`DailySeries`] | Date-ordered closes for one ticker |
//! | [`Symbol`] | Validated ticker |
//! | [`UtcDateTime`] | UTC instant |
//! | [`Company`] | Employer lookup with display attributes |
//!
//! Constructors validate their inputs, so a value that exists is usable.

mod company;
mod models;
mod symbol;
mod timestamp;

pub(crate) use models::{iso_date, validate_non_negative};

pub use company::{Company, Theme, COMPANIES};
pub use models::{parse_calendar_date, validate_currency_code, DailyClose, DailySeries, Quote};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
