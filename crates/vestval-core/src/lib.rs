//! # Vestval Core
//!
//! Present-value estimates for job offers that pay partly in stock.
//!
//! ## Overview
//!
//! A grant is converted to shares at the average close of the calendar
//! month before vesting starts, then revalued at today's price. This crate
//! holds:
//!
//! - **Pure calculations**: the previous-month window, the average close and
//!   the package valuation
//! - **Price adapters** for Yahoo Finance and Alpha Vantage behind the
//!   [`DataSource`] trait
//! - **Routing** with health-scored fallback, circuit breaking, retries and
//!   per-provider quotas
//! - **Orchestration** that ties fetched prices to the calculations
//! - **Response envelope** for machine-readable output
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`window`] | Previous-calendar-month date window |
//! | [`average`] | Average close over a window |
//! | [`valuation`] | Compensation package arithmetic |
//! | [`pricing`] | Routed price lookups and full offer valuation |
//! | [`adapters`] | Yahoo and Alpha Vantage adapters |
//! | [`routing`] | Source selection and fallback |
//! | [`data_source`] | Adapter trait and request types |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`circuit_breaker`] | Per-provider circuit breaker |
//! | [`retry`] | Retry budget and backoff |
//! | [`throttling`] | Provider call quotas |
//! | [`provider_policy`] | Default quota and breaker settings per provider |
//! | [`config`] | Settings from environment variables |
//! | [`domain`] | Symbols, quotes, daily closes, companies |
//! | [`envelope`] | Response envelope with metadata |
//! | [`format`] | Currency, share and percent rendering |
//! | [`error`] | Core error types |
//! | [`source`] | Provider identifiers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vestval_core::{OfferTerms, OfferValuator, Settings, SourceRouterBuilder, SourceStrategy, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = SourceRouterBuilder::new(Settings::from_env()?).build();
//!     let valuator = OfferValuator::new(Arc::new(router), SourceStrategy::Auto);
//!
//!     let valuation = valuator
//!         .value_offer(&OfferTerms {
//!             symbol: Symbol::parse("META")?,
//!             base_salary: 150_000.0,
//!             bonus_rate: 0.15,
//!             total_grant_value: 400_000.0,
//!             vest_start: time::macros::date!(2023 - 11 - 15),
//!             reference_price: None,
//!             current_price: None,
//!         })
//!         .await?;
//!
//!     println!("{}", vestval_core::format::format_usd(valuation.result.total_present_value));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / User     │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Offer Valuator  │────▶│ window / average │
//! └────────┬────────┘     │ / valuation      │
//!          │              └──────────────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  Source Router  │────▶│ Circuit Breaker  │
//! └────────┬────────┘     │ Throttle / Retry │
//!          │              └──────────────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Data Source     │────▶│ HTTP Client      │
//! │ (Adapter Trait) │     │ (reqwest/static) │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! The pure functions return [`ValidationError`]. Adapters return
//! [`SourceError`], whose kind drives fallback:
//!
//! ```rust
//! use vestval_core::{SourceError, SourceErrorKind};
//!
//! fn should_try_next(error: &SourceError) -> bool {
//!     matches!(
//!         error.kind(),
//!         SourceErrorKind::RateLimited | SourceErrorKind::Unavailable
//!     )
//! }
//! ```
//!
//! [`CoreError`] unifies both plus the no-data case for the orchestrator.
//!
//! ## Security
//!
//! - The Alpha Vantage key is read from the environment and redacted from
//!   `Debug` output
//! - All HTTP requests use TLS via reqwest

pub mod adapters;
pub mod average;
pub mod circuit_breaker;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod format;
pub mod http_client;
pub mod pricing;
pub mod provider_policy;
pub mod retry;
pub mod routing;
pub mod source;
pub mod throttling;
pub mod valuation;
pub mod window;

// Pure calculations
pub use average::{average_close, AverageClose};
pub use valuation::{calculate_package, ValuationInput, ValuationResult, VESTING_YEARS};
pub use window::{parse_anchor, resolve_previous_month_window, DateWindow};

// Adapter implementations
pub use adapters::{AlphaVantageAdapter, YahooAdapter};

// Circuit breaker
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

// Configuration
pub use config::{ConfigError, Settings};

// Data source trait and types
pub use data_source::{
    CapabilitySet, DailySeriesRequest, DataSource, Endpoint, HealthState, HealthStatus,
    QuoteRequest, SourceError, SourceErrorKind,
};

// Domain models
pub use domain::{Company, DailyClose, DailySeries, Quote, Symbol, Theme, UtcDateTime, COMPANIES};

// Envelope types
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};

// Error types
pub use error::{CoreError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient,
    StaticHttpClient,
};

// Orchestration
pub use pricing::{OfferTerms, OfferValuation, OfferValuator, PricePoint, ReferencePrice};

// Provider policies
pub use provider_policy::ProviderPolicy;

// Retry logic
pub use retry::{Backoff, RetryConfig};

// Routing types
pub use routing::{
    RouteFailure, RouteResult, RouteSuccess, RouteTrace, SourceRouter, SourceRouterBuilder,
    SourceSnapshot, SourceStrategy,
};

// Source identifiers
pub use source::ProviderId;

// Throttling
pub use throttling::Throttle;
