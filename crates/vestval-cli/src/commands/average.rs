use vestval_core::format::format_price;
use vestval_core::{parse_anchor, OfferValuator, Symbol};

use crate::cli::AverageArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &AverageArgs, valuator: &OfferValuator) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let anchor = parse_anchor(&args.start_date)?;

    let reference = match valuator.reference_price(&symbol, anchor).await {
        Ok(reference) => reference,
        Err(error) => return CommandResult::failed(error),
    };

    let rows = vec![
        (String::from("symbol"), reference.symbol.to_string()),
        (String::from("month"), reference.month.clone()),
        (String::from("average close"), format_price(reference.price)),
        (
            String::from("trading days"),
            reference.data_points.to_string(),
        ),
        (String::from("source"), reference.source.to_string()),
    ];
    let trace = reference.trace.clone();
    let data = serde_json::to_value(reference)?;

    Ok(CommandResult::ok(data).with_rows(rows).with_trace(trace))
}
