use serde::Serialize;

use vestval_core::{ProviderId, SourceRouter};

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct SourceStatus {
    id: ProviderId,
    registered: bool,
    status: &'static str,
    score: u16,
    capabilities: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct SourcesResponseData {
    sources: Vec<SourceStatus>,
}

pub async fn run(router: &SourceRouter) -> Result<CommandResult, CliError> {
    let mut sources = Vec::with_capacity(ProviderId::ALL.len());
    for id in ProviderId::ALL {
        let status = match router.snapshot(id).await {
            Some(snapshot) => SourceStatus {
                id,
                registered: true,
                status: snapshot.status_label(),
                score: snapshot.health.score,
                capabilities: snapshot.capabilities.supported_endpoints(),
            },
            None => SourceStatus {
                id,
                registered: false,
                status: "not_configured",
                score: 0,
                capabilities: Vec::new(),
            },
        };
        sources.push(status);
    }

    let rows = sources
        .iter()
        .map(|source| {
            let detail = if source.capabilities.is_empty() {
                String::from(source.status)
            } else {
                format!("{} [{}]", source.status, source.capabilities.join(", "))
            };
            (source.id.to_string(), detail)
        })
        .collect();

    let alphavantage_missing = sources
        .iter()
        .any(|source| source.id == ProviderId::Alphavantage && !source.registered);

    let mut result = CommandResult::ok(serde_json::to_value(SourcesResponseData { sources })?)
        .with_rows(rows);
    if alphavantage_missing {
        result
            .warnings
            .push(String::from("alphavantage needs VESTVAL_ALPHAVANTAGE_API_KEY"));
    }
    Ok(result)
}
