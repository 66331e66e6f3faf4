//! Compensation package valuation.
//!
//! A four-year grant is annualized by dividing by exactly 4, both at the
//! current price and at its original dollar value, so the gain or loss
//! compares one year's slice against one year's slice. No rounding happens
//! here; see [`crate::format`] for presentation.

use serde::{Deserialize, Serialize};

use crate::domain::validate_non_negative;
use crate::ValidationError;

/// Number of years the grant vests over.
pub const VESTING_YEARS: f64 = 4.0;

/// Scalar inputs to [`calculate_package`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationInput {
    pub base_salary: f64,
    /// Bonus as a fraction of base salary (`0.15` is 15%).
    pub bonus_rate: f64,
    /// Dollar value of the whole four-year grant.
    pub total_grant_value: f64,
    /// Price used to convert the grant into a share count.
    pub reference_price: f64,
    pub current_price: f64,
}

impl ValuationInput {
    pub fn new(
        base_salary: f64,
        bonus_rate: f64,
        total_grant_value: f64,
        reference_price: f64,
        current_price: f64,
    ) -> Result<Self, ValidationError> {
        let input = Self {
            base_salary,
            bonus_rate,
            total_grant_value,
            reference_price,
            current_price,
        };
        input.validate()?;
        Ok(input)
    }

    /// Checks run in order: finiteness, divisors, then signs.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("base_salary", self.base_salary),
            ("bonus_rate", self.bonus_rate),
            ("total_grant_value", self.total_grant_value),
            ("reference_price", self.reference_price),
            ("current_price", self.current_price),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ValidationError::NonFiniteValue { field: *field });
        }

        if self.reference_price <= 0.0 {
            return Err(ValidationError::DivisionByZero {
                field: "reference_price",
            });
        }
        if self.total_grant_value <= 0.0 {
            return Err(ValidationError::DivisionByZero {
                field: "total_grant_value",
            });
        }

        validate_non_negative("base_salary", self.base_salary)?;
        validate_non_negative("bonus_rate", self.bonus_rate)?;
        validate_non_negative("current_price", self.current_price)?;
        Ok(())
    }
}

/// Derived package figures, unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    /// Base salary plus bonus.
    pub cash_comp: f64,
    pub share_count: f64,
    /// One year of vesting valued at the current price.
    pub current_annual_equity_value: f64,
    pub total_present_value: f64,
    /// One year of vesting at the grant's original dollar value.
    pub original_annual_value: f64,
    pub gain_loss: f64,
    pub gain_loss_percent: f64,
}

impl ValuationResult {
    pub fn is_gain(&self) -> bool {
        self.gain_loss >= 0.0
    }
}

/// Compute the present value of an offer.
pub fn calculate_package(input: &ValuationInput) -> Result<ValuationResult, ValidationError> {
    input.validate()?;

    let cash_comp = input.base_salary * (1.0 + input.bonus_rate);
    let share_count = input.total_grant_value / input.reference_price;
    let current_annual_equity_value = (share_count * input.current_price) / VESTING_YEARS;
    let total_present_value = cash_comp + current_annual_equity_value;
    let original_annual_value = input.total_grant_value / VESTING_YEARS;
    let gain_loss = current_annual_equity_value - original_annual_value;
    let gain_loss_percent = (gain_loss / original_annual_value) * 100.0;

    Ok(ValuationResult {
        cash_comp,
        share_count,
        current_annual_equity_value,
        total_present_value,
        original_annual_value,
        gain_loss,
        gain_loss_percent,
    })
}
