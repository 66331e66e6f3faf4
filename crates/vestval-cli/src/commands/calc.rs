use serde::Serialize;

use vestval_core::format::{format_percent, format_price, format_shares, format_usd};
use vestval_core::{calculate_package, ValuationInput, ValuationResult};

use crate::cli::CalcArgs;
use crate::error::CliError;

use super::{CommandResult, Row};

#[derive(Debug, Serialize)]
struct CalcResponseData {
    input: ValuationInput,
    result: ValuationResult,
}

pub fn run(args: &CalcArgs) -> Result<CommandResult, CliError> {
    let input = ValuationInput::new(
        args.package.base_salary,
        args.package.bonus_rate(),
        args.package.grant,
        args.reference_price,
        args.current_price,
    )?;
    let result = calculate_package(&input)?;

    let rows = valuation_rows(&input, &result);
    let data = serde_json::to_value(CalcResponseData { input, result })?;
    Ok(CommandResult::ok(data).with_rows(rows))
}

/// Table rows shared by `calc` and `value`.
pub(super) fn valuation_rows(input: &ValuationInput, result: &ValuationResult) -> Vec<Row> {
    let direction = if result.is_gain() { "gain" } else { "loss" };
    vec![
        (String::from("reference price"), format_price(input.reference_price)),
        (String::from("current price"), format_price(input.current_price)),
        (String::from("cash compensation"), format_usd(result.cash_comp)),
        (String::from("shares granted"), format_shares(result.share_count)),
        (
            String::from("annual equity (today)"),
            format_usd(result.current_annual_equity_value),
        ),
        (
            String::from("annual equity (at grant)"),
            format_usd(result.original_annual_value),
        ),
        (
            format!("annual {direction}"),
            format!(
                "{} ({})",
                format_usd(result.gain_loss),
                format_percent(result.gain_loss_percent)
            ),
        ),
        (
            String::from("total present value"),
            format_usd(result.total_present_value),
        ),
    ]
}
