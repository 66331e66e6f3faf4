mod average;
mod calc;
mod companies;
mod quote;
mod sources;
mod value;
mod window;

use std::sync::Arc;

use serde_json::Value;
use vestval_core::{
    ConfigError, CoreError, Envelope, EnvelopeError, OfferValuator, ProviderId, RouteTrace,
    Settings, SourceRouter, SourceRouterBuilder, SourceStrategy,
};

use crate::cli::{Cli, Command, SourceSelector};
use crate::error::CliError;
use crate::metadata::Metadata;

/// One label/value line of table output.
pub type Row = (String, String);

pub struct CommandResult {
    pub data: Value,
    pub rows: Vec<Row>,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
    pub source_chain: Vec<ProviderId>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            rows: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            latency_ms: 0,
            source_chain: Vec::new(),
        }
    }

    /// A lookup that ran but produced nothing usable.
    ///
    /// Source outages and empty months are reported in the envelope together
    /// with every provider that was tried; input mistakes still abort the
    /// command.
    pub fn failed(error: CoreError) -> Result<Self, CliError> {
        match error {
            CoreError::Source { error, trace } => {
                let mut result = Self::ok(Value::Null).with_trace(*trace);
                if result.errors.is_empty() {
                    result.errors.push(
                        EnvelopeError::new(error.code(), error.message())?
                            .with_retryable(error.retryable()),
                    );
                }
                Ok(result)
            }
            error @ CoreError::NoData { .. } => {
                let envelope_error =
                    EnvelopeError::new(error.code(), error.to_string())?.with_retryable(false);
                Ok(Self::ok(Value::Null).with_errors(vec![envelope_error]))
            }
            other => Err(other.into()),
        }
    }

    pub fn with_row(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.rows.push((label.into(), value.into()));
        self
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn with_trace(mut self, trace: RouteTrace) -> Self {
        self.source_chain = trace.source_chain;
        self.warnings.extend(trace.warnings);
        self.errors.extend(trace.errors);
        self.latency_ms = trace.latency_ms;
        self
    }
}

/// Envelope plus the table rows that go with it.
pub struct Outcome {
    pub envelope: Envelope<Value>,
    pub rows: Vec<Row>,
}

pub async fn run(cli: &Cli) -> Result<Outcome, CliError> {
    let router = router_for(cli, Settings::from_env)?;
    run_with_router(cli, router).await
}

/// Settings are only read, and a transport only built, for commands that
/// consult a price source.
fn router_for<F>(cli: &Cli, settings: F) -> Result<Arc<SourceRouter>, CliError>
where
    F: FnOnce() -> Result<Settings, ConfigError>,
{
    if !cli.command.needs_router() {
        return Ok(Arc::new(SourceRouter::new(Vec::new())));
    }

    let mut settings = settings()?;
    if let Some(timeout_ms) = cli.timeout_ms {
        settings.timeout_ms = timeout_ms;
    }
    tracing::debug!(?settings, "resolved settings");

    Ok(Arc::new(SourceRouterBuilder::new(settings).build()))
}

pub async fn run_with_router(cli: &Cli, router: Arc<SourceRouter>) -> Result<Outcome, CliError> {
    let valuator = OfferValuator::new(router.clone(), to_source_strategy(cli.source));

    let result = match &cli.command {
        Command::Window(args) => window::run(args)?,
        Command::Calc(args) => calc::run(args)?,
        Command::Quote(args) => quote::run(args, &valuator).await?,
        Command::Average(args) => average::run(args, &valuator).await?,
        Command::Value(args) => value::run(args, &valuator).await?,
        Command::Companies => companies::run()?,
        Command::Sources => sources::run(&router).await?,
    };

    let CommandResult {
        data,
        rows,
        warnings,
        errors,
        latency_ms,
        source_chain,
    } = result;

    let mut metadata = Metadata::new(source_chain, latency_ms);
    for warning in warnings {
        metadata.push_warning(warning);
    }

    let envelope = Envelope::with_errors(metadata.into_envelope_meta()?, data, errors)?;
    Ok(Outcome { envelope, rows })
}

fn to_source_strategy(source: SourceSelector) -> SourceStrategy {
    match source {
        SourceSelector::Auto => SourceStrategy::Auto,
        SourceSelector::Yahoo => SourceStrategy::Strict(ProviderId::Yahoo),
        SourceSelector::Alphavantage => SourceStrategy::Strict(ProviderId::Alphavantage),
    }
}
