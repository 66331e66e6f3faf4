use vestval_core::format::format_price;
use vestval_core::{OfferValuator, Symbol};

use crate::cli::QuoteArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &QuoteArgs, valuator: &OfferValuator) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;

    let point = match valuator.current_price(&symbol).await {
        Ok(point) => point,
        Err(error) => return CommandResult::failed(error),
    };

    let rows = vec![
        (String::from("symbol"), point.symbol.to_string()),
        (
            String::from("price"),
            format!("{} {}", format_price(point.price), point.currency),
        ),
        (String::from("as of"), point.as_of.format_rfc3339()),
        (String::from("source"), point.source.to_string()),
    ];
    let trace = point.trace.clone();
    let data = serde_json::to_value(point)?;

    Ok(CommandResult::ok(data).with_rows(rows).with_trace(trace))
}
