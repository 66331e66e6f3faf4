use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use time::Time;

use super::{validation_to_error, Upstream};
use crate::circuit_breaker::CircuitBreakerConfig;
use crate::data_source::{
    CapabilitySet, DailySeriesRequest, DataSource, HealthStatus, QuoteRequest, SourceError,
    SourceFuture,
};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::provider_policy::ProviderPolicy;
use crate::retry::RetryConfig;
use crate::throttling::Throttle;
use crate::{DailyClose, DailySeries, ProviderId, Quote, UtcDateTime};

const QUERY_URL: &str = "https://www.alphavantage.co/query";
const SCORE: u16 = 70;

/// Alpha Vantage adapter, throttled to the free tier's 5 calls per minute.
#[derive(Clone)]
pub struct AlphaVantageAdapter {
    upstream: Upstream,
    auth: HttpAuth,
}

impl AlphaVantageAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        let policy = ProviderPolicy::alphavantage_default();
        Self {
            upstream: Upstream::new(
                ProviderId::Alphavantage,
                http_client,
                policy.circuit,
                Throttle::from_policy(&policy),
            ),
            auth: HttpAuth::QueryParam {
                name: String::from("apikey"),
                value: api_key.into(),
            },
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.upstream.set_retry(retry);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.upstream.set_timeout_ms(timeout_ms);
        self
    }

    pub fn with_circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.upstream.set_circuit(config);
        self
    }

    fn query(&self, function: &str, symbol: &str) -> HttpRequest {
        HttpRequest::get(QUERY_URL)
            .with_query("function", function)
            .with_query("symbol", symbol)
            .with_auth(&self.auth)
    }

    async fn fetch_quote(&self, req: QuoteRequest) -> Result<Quote, SourceError> {
        let body = self
            .upstream
            .fetch(self.query("GLOBAL_QUOTE", req.symbol.as_str()))
            .await?;
        let payload: GlobalQuoteResponse = parse_payload(&body)?;

        let quote = payload
            .global_quote
            .filter(|quote| quote.price.is_some())
            .ok_or_else(|| {
                SourceError::invalid_request(format!("alphavantage has no quote for {}", req.symbol))
            })?;
        let price = quote
            .price
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .ok_or_else(|| SourceError::internal("alphavantage price is not a number"))?;
        let as_of = match quote.latest_trading_day.as_deref() {
            Some(raw) => {
                let date = DailyClose::parse_date(raw).map_err(validation_to_error)?;
                UtcDateTime::from_unix_seconds(
                    date.with_time(Time::MIDNIGHT).assume_utc().unix_timestamp(),
                )
                .map_err(validation_to_error)?
            }
            None => UtcDateTime::now(),
        };

        Quote::new(req.symbol, price, "USD", as_of).map_err(validation_to_error)
    }

    async fn fetch_daily(&self, req: DailySeriesRequest) -> Result<DailySeries, SourceError> {
        let request = self
            .query("TIME_SERIES_DAILY", req.symbol.as_str())
            .with_query("outputsize", "full");
        let body = self.upstream.fetch(request).await?;
        let payload: DailyResponse = parse_payload(&body)?;

        let entries = payload
            .time_series
            .ok_or_else(|| SourceError::internal("alphavantage response has no daily series"))?;

        let mut closes = Vec::new();
        for (raw_date, entry) in entries {
            let date = match DailyClose::parse_date(&raw_date) {
                Ok(date) => date,
                Err(_) => {
                    tracing::debug!(symbol = %req.symbol, raw_date = %raw_date, "skipping unparseable date key");
                    continue;
                }
            };
            // The full history spans decades; keep only what the window needs.
            if !req.window.contains(date) {
                continue;
            }
            let close = entry.close.and_then(|raw| raw.trim().parse::<f64>().ok());
            closes.push(DailyClose::new(date, close));
        }

        Ok(DailySeries::new(req.symbol, closes))
    }
}

impl DataSource for AlphaVantageAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Alphavantage
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::full()
    }

    fn quote<'a>(&'a self, req: QuoteRequest) -> SourceFuture<'a, Quote> {
        Box::pin(self.fetch_quote(req))
    }

    fn daily_closes<'a>(&'a self, req: DailySeriesRequest) -> SourceFuture<'a, DailySeries> {
        Box::pin(self.fetch_daily(req))
    }

    fn health<'a>(&'a self) -> Pin<Box<dyn Future<Output = HealthStatus> + Send + 'a>> {
        Box::pin(async move { self.upstream.health(SCORE) })
    }
}

/// Decode a payload after checking for the service's in-band errors.
///
/// Alpha Vantage answers `200 OK` for bad symbols (`Error Message`) and
/// for quota exhaustion (`Note` or `Information`).
fn parse_payload<T>(body: &str) -> Result<T, SourceError>
where
    T: for<'de> Deserialize<'de>,
{
    let value: Value = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse alphavantage response: {e}")))?;

    if let Some(message) = value.get("Error Message").and_then(Value::as_str) {
        return Err(SourceError::invalid_request(format!("alphavantage: {message}")));
    }
    for key in ["Note", "Information"] {
        if let Some(message) = value.get(key).and_then(Value::as_str) {
            return Err(SourceError::rate_limited(format!("alphavantage: {message}")));
        }
    }

    serde_json::from_value(value)
        .map_err(|e| SourceError::internal(format!("unexpected alphavantage payload: {e}")))
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote", default)]
    global_quote: Option<GlobalQuote>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price", default)]
    price: Option<String>,
    #[serde(rename = "07. latest trading day", default)]
    latest_trading_day: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(rename = "Time Series (Daily)", default)]
    time_series: Option<BTreeMap<String, DailyEntry>>,
}

#[derive(Debug, Deserialize)]
struct DailyEntry {
    #[serde(rename = "4. close", default)]
    close: Option<String>,
}
