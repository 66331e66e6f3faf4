use serde::Serialize;

use vestval_core::{Company, COMPANIES};

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct CompaniesResponseData {
    companies: &'static [Company],
}

pub fn run() -> Result<CommandResult, CliError> {
    let rows = COMPANIES
        .iter()
        .map(|company| {
            (
                company.id.to_owned(),
                format!("{} ({})", company.name, company.ticker),
            )
        })
        .collect();
    let data = serde_json::to_value(CompaniesResponseData {
        companies: &COMPANIES,
    })?;

    Ok(CommandResult::ok(data).with_rows(rows))
}
