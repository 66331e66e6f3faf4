//! CLI argument definitions for vestval.
//!
//! # Commands
//!
//! | Command | Network | Description |
//! |---------|---------|-------------|
//! | `window` | no | Previous-month window for an anchor date |
//! | `calc` | no | Value a package from explicit prices |
//! | `quote` | yes | Current price for a symbol |
//! | `average` | yes | Previous-month average close |
//! | `value` | yes | Full offer valuation |
//! | `companies` | no | Known employers and their tickers |
//! | `sources` | no | Registered providers and their local health |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--source` | `auto` | Source selection strategy |
//! | `--timeout-ms` | `VESTVAL_TIMEOUT_MS` or 5000 | Per-request timeout |
//! | `-v` | off | Debug logging on stderr |
//!
//! # Examples
//!
//! ```bash
//! vestval window 2023-11-15
//! vestval calc --base-salary 150000 --bonus-percent 15 --grant 400000 \
//!     --reference-price 100 --current-price 150 --format table
//! vestval value --company meta --base-salary 150000 --bonus-percent 15 \
//!     --grant 400000 --start-date 2023-11-15
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Present value of an offer with a stock grant.
#[derive(Debug, Parser)]
#[command(
    name = "vestval",
    author,
    version,
    about = "Present value of a job offer with a four-year stock grant",
    long_about = "vestval converts a stock grant into shares at the average close of the \
month before vesting starts, then values one year of vesting at today's price.\n\
\n\
Use 'vestval <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Source selection strategy for price lookups.
    #[arg(long, global = true, value_enum, default_value_t = SourceSelector::Auto)]
    pub source: SourceSelector,

    /// Per-request timeout in milliseconds. Overrides VESTVAL_TIMEOUT_MS.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Log debug events to stderr. RUST_LOG takes precedence.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned key/value rows with formatted currency.
    Table,
    /// Single JSON envelope.
    Json,
}

/// Source selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceSelector {
    /// Health-scored selection with fallback.
    Auto,
    /// Use Yahoo Finance only.
    Yahoo,
    /// Use Alpha Vantage only.
    Alphavantage,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Previous calendar month for an anchor date.
    ///
    ///   vestval window 2023-11-15
    ///   vestval window 2024-01-10T09:30:00Z
    Window(WindowArgs),

    /// Value a package from explicit prices, without any network calls.
    Calc(CalcArgs),

    /// Current price for a symbol.
    Quote(QuoteArgs),

    /// Average close over the month before a start date.
    Average(AverageArgs),

    /// Full offer valuation, fetching whichever prices are not given.
    Value(ValueArgs),

    /// List known employers.
    Companies,

    /// List registered price sources.
    Sources,
}

impl Command {
    /// Offline commands never consult a price source.
    pub const fn needs_router(&self) -> bool {
        !matches!(self, Self::Window(_) | Self::Calc(_) | Self::Companies)
    }
}

#[derive(Debug, Args)]
pub struct WindowArgs {
    /// Anchor date, YYYY-MM-DD or RFC3339.
    pub date: String,
}

/// Compensation figures shared by `calc` and `value`.
#[derive(Debug, Args)]
pub struct PackageArgs {
    /// Annual base salary in USD.
    #[arg(long)]
    pub base_salary: f64,

    /// Target bonus as a percentage of base (15 means 15%).
    #[arg(long, default_value_t = 0.0)]
    pub bonus_percent: f64,

    /// Dollar value of the whole four-year grant.
    #[arg(long)]
    pub grant: f64,
}

impl PackageArgs {
    pub fn bonus_rate(&self) -> f64 {
        self.bonus_percent / 100.0
    }
}

#[derive(Debug, Args)]
pub struct CalcArgs {
    #[command(flatten)]
    pub package: PackageArgs,

    /// Price used to convert the grant into shares.
    #[arg(long)]
    pub reference_price: f64,

    /// Price used to value the shares today.
    #[arg(long)]
    pub current_price: f64,
}

#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Market symbol, e.g. META.
    pub symbol: String,
}

#[derive(Debug, Args)]
pub struct AverageArgs {
    /// Market symbol, e.g. META.
    pub symbol: String,

    /// Vesting start date; the month before it is averaged.
    #[arg(long)]
    pub start_date: String,
}

#[derive(Debug, Args)]
pub struct ValueArgs {
    /// Employer id or ticker (meta, google, amazon).
    #[arg(long, conflicts_with = "symbol", required_unless_present = "symbol")]
    pub company: Option<String>,

    /// Any market symbol, for employers not in the company list.
    #[arg(long)]
    pub symbol: Option<String>,

    #[command(flatten)]
    pub package: PackageArgs,

    /// Vesting start date, YYYY-MM-DD or RFC3339.
    #[arg(long)]
    pub start_date: String,

    /// Skip the lookup and use this reference price.
    #[arg(long)]
    pub reference_price: Option<f64>,

    /// Skip the lookup and use this current price.
    #[arg(long)]
    pub current_price: Option<f64>,
}
