use serde::Serialize;

use vestval_core::{parse_anchor, resolve_previous_month_window, DateWindow};

use crate::cli::WindowArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct WindowResponseData {
    anchor: String,
    #[serde(flatten)]
    window: DateWindow,
    month: String,
    days: u8,
}

pub fn run(args: &WindowArgs) -> Result<CommandResult, CliError> {
    let anchor = parse_anchor(&args.date)?;
    let window = resolve_previous_month_window(anchor)?;

    let data = WindowResponseData {
        anchor: anchor.to_string(),
        window,
        month: window.label(),
        days: window.len_days(),
    };

    Ok(CommandResult::ok(serde_json::to_value(&data)?)
        .with_row("anchor", data.anchor)
        .with_row("month", data.month)
        .with_row("start", window.start.to_string())
        .with_row("end", window.end.to_string())
        .with_row("days", data.days.to_string()))
}
