use std::io::{self, Write};

use serde_json::Value;
use vestval_core::Envelope;

use crate::cli::OutputFormat;
use crate::commands::Row;
use crate::error::CliError;

pub fn render(
    envelope: &Envelope<Value>,
    rows: &[Row],
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => write_json(&mut out, envelope, pretty)?,
        OutputFormat::Table => write_table(&mut out, envelope, rows)?,
    }
    out.flush()?;
    Ok(())
}

fn write_json<W: Write>(
    out: &mut W,
    envelope: &Envelope<Value>,
    pretty: bool,
) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(envelope)?
    } else {
        serde_json::to_string(envelope)?
    };
    writeln!(out, "{payload}")?;
    Ok(())
}

fn write_table<W: Write>(
    out: &mut W,
    envelope: &Envelope<Value>,
    rows: &[Row],
) -> Result<(), CliError> {
    let width = rows
        .iter()
        .map(|(label, _)| label.len())
        .max()
        .unwrap_or(0);
    for (label, value) in rows {
        writeln!(out, "{label:<width$}  {value}")?;
    }
    if rows.is_empty() && !envelope.data.is_null() {
        writeln!(out, "{}", serde_json::to_string_pretty(&envelope.data)?)?;
    }

    if !envelope.meta.source_chain.is_empty() {
        let chain = envelope
            .meta
            .source_chain
            .iter()
            .map(|source| source.as_str())
            .collect::<Vec<_>>()
            .join(" -> ");
        writeln!(out)?;
        writeln!(out, "sources: {chain} ({} ms)", envelope.meta.latency_ms)?;
    }

    for warning in &envelope.meta.warnings {
        writeln!(out, "warning: {warning}")?;
    }
    for error in &envelope.errors {
        writeln!(out, "error: {} ({})", error.message, error.code)?;
    }

    Ok(())
}
