//! Average closing price over a date window.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::window::DateWindow;
use crate::DailyClose;

/// Mean close over a window, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageClose {
    pub price: f64,
    /// Number of closes that contributed to the mean.
    pub data_points: usize,
}

/// Average the valid closes that fall inside `window`.
///
/// Entries outside the window and entries without a finite close are
/// skipped. Returns `None` when nothing usable remains; an empty window
/// never averages to zero.
pub fn average_close(series: &[DailyClose], window: &DateWindow) -> Option<AverageClose> {
    let mut sum = Decimal::ZERO;
    let mut data_points = 0_usize;
    for close in series
        .iter()
        .filter(|entry| window.contains(entry.date))
        .filter_map(DailyClose::valid_close)
    {
        let Some(close) = Decimal::from_f64(close) else {
            tracing::debug!(close, "skipping close outside decimal range");
            continue;
        };
        sum = sum.checked_add(close)?;
        data_points += 1;
    }

    if data_points == 0 {
        tracing::debug!(%window, entries = series.len(), "no usable closes in window");
        return None;
    }

    let mean = sum.checked_div(Decimal::from(data_points))?;
    Some(AverageClose {
        price: round_to_cents(mean).to_f64()?,
        data_points,
    })
}

/// Round half-up (away from zero) to two decimal places.
pub fn round_to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
