use serde::Serialize;

use vestval_core::{
    parse_anchor, Company, OfferTerms, OfferValuation, OfferValuator, Symbol, ValidationError,
};

use crate::cli::ValueArgs;
use crate::error::CliError;

use super::calc::valuation_rows;
use super::CommandResult;

#[derive(Debug, Serialize)]
struct ValueResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    company: Option<&'static Company>,
    #[serde(flatten)]
    valuation: OfferValuation,
}

pub async fn run(args: &ValueArgs, valuator: &OfferValuator) -> Result<CommandResult, CliError> {
    let (company, symbol) = match (&args.company, &args.symbol) {
        (Some(key), _) => {
            let company = Company::find(key)?;
            (Some(company), company.symbol()?)
        }
        (None, Some(raw)) => (None, Symbol::parse(raw)?),
        (None, None) => return Err(ValidationError::EmptySymbol.into()),
    };

    let terms = OfferTerms {
        symbol,
        base_salary: args.package.base_salary,
        bonus_rate: args.package.bonus_rate(),
        total_grant_value: args.package.grant,
        vest_start: parse_anchor(&args.start_date)?,
        reference_price: args.reference_price,
        current_price: args.current_price,
    };

    let valuation = match valuator.value_offer(&terms).await {
        Ok(valuation) => valuation,
        Err(error) => return CommandResult::failed(error),
    };

    let mut rows = Vec::new();
    if let Some(company) = company {
        rows.push((String::from("company"), format!("{} ({})", company.name, company.ticker)));
    } else {
        rows.push((String::from("symbol"), valuation.symbol.to_string()));
    }
    let basis = match &valuation.reference {
        Some(reference) => format!(
            "{} average, {} trading days via {}",
            reference.month, reference.data_points, reference.source
        ),
        None => format!("{} (supplied)", valuation.window.label()),
    };
    rows.push((String::from("reference month"), basis));
    rows.extend(valuation_rows(&valuation.input, &valuation.result));

    let trace = valuation.trace.clone();
    let data = serde_json::to_value(ValueResponseData { company, valuation })?;

    Ok(CommandResult::ok(data).with_rows(rows).with_trace(trace))
}
