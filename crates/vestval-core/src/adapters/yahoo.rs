use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use time::{Date, OffsetDateTime, Time};

use super::{validation_to_error, Upstream};
use crate::circuit_breaker::CircuitBreakerConfig;
use crate::data_source::{
    CapabilitySet, DailySeriesRequest, DataSource, HealthStatus, QuoteRequest, SourceError,
    SourceFuture,
};
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider_policy::ProviderPolicy;
use crate::retry::RetryConfig;
use crate::throttling::Throttle;
use crate::window::DateWindow;
use crate::{DailyClose, DailySeries, ProviderId, Quote, Symbol, UtcDateTime};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SCORE: u16 = 78;

/// Yahoo Finance chart endpoint adapter. Needs no API key.
#[derive(Clone)]
pub struct YahooAdapter {
    upstream: Upstream,
}

impl YahooAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        let policy = ProviderPolicy::yahoo_default();
        Self {
            upstream: Upstream::new(
                ProviderId::Yahoo,
                http_client,
                policy.circuit,
                Throttle::from_policy(&policy),
            ),
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

    fn chart_request(symbol: &Symbol) -> HttpRequest {
        HttpRequest::get(format!("{CHART_URL}/{}", symbol.url_encoded()))
            .with_header("referer", "https://finance.yahoo.com/")
            .with_query("interval", "1d")
    }

    async fn fetch_quote(&self, req: QuoteRequest) -> Result<Quote, SourceError> {
        let request = Self::chart_request(&req.symbol).with_query("range", "1d");
        let body = self.upstream.fetch(request).await?;
        let result = parse_chart(&body)?;

        let price = result
            .meta
            .regular_market_price
            .filter(|price| price.is_finite())
            .ok_or_else(|| {
                SourceError::unavailable(format!("yahoo returned no market price for {}", req.symbol))
            })?;
        let as_of = match result.meta.regular_market_time {
            Some(seconds) => UtcDateTime::from_unix_seconds(seconds).map_err(validation_to_error)?,
            None => UtcDateTime::now(),
        };
        let currency = result.meta.currency.as_deref().unwrap_or("USD");

        Quote::new(req.symbol, price, currency, as_of).map_err(validation_to_error)
    }

    async fn fetch_daily(&self, req: DailySeriesRequest) -> Result<DailySeries, SourceError> {
        let (period1, period2) = chart_period(&req.window)?;
        let request = Self::chart_request(&req.symbol)
            .with_query("period1", period1.to_string())
            .with_query("period2", period2.to_string());
        let body = self.upstream.fetch(request).await?;
        let result = parse_chart(&body)?;

        let offset = result.meta.gmtoffset.unwrap_or(0);
        let timestamps = result.timestamp.unwrap_or_default();
        let closes = result
            .indicators
            .and_then(|indicators| indicators.quote.into_iter().next())
            .map(|quote| quote.close)
            .unwrap_or_default();

        let mut series = Vec::with_capacity(timestamps.len());
        for (index, seconds) in timestamps.into_iter().enumerate() {
            let Some(date) = exchange_date(seconds, offset) else {
                tracing::debug!(symbol = %req.symbol, seconds, "skipping out-of-range timestamp");
                continue;
            };
            let close = closes.get(index).copied().flatten();
            series.push(DailyClose::new(date, close));
        }

        Ok(DailySeries::new(req.symbol, series))
    }
}

impl DataSource for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
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

/// Epoch bounds for a window: start of the first day through start of the
/// day after the last, so the final day is included.
fn chart_period(window: &DateWindow) -> Result<(i64, i64), SourceError> {
    let after_end = window.end.next_day().ok_or_else(|| {
        SourceError::invalid_request(format!("window {window} ends at the last representable date"))
    })?;
    Ok((midnight_utc(window.start), midnight_utc(after_end)))
}

fn midnight_utc(date: Date) -> i64 {
    date.with_time(Time::MIDNIGHT).assume_utc().unix_timestamp()
}

/// Trading date in the exchange's own timezone.
fn exchange_date(seconds: i64, gmtoffset: i64) -> Option<Date> {
    let local = seconds.checked_add(gmtoffset)?;
    OffsetDateTime::from_unix_timestamp(local)
        .ok()
        .map(OffsetDateTime::date)
}

fn parse_chart(body: &str) -> Result<ChartResult, SourceError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = response.chart.error {
        let detail = error.description.unwrap_or(error.code);
        return Err(SourceError::invalid_request(format!("yahoo chart error: {detail}")));
    }

    response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::unavailable("no chart data in yahoo response"))
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: Option<ChartIndicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    regular_market_time: Option<i64>,
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::{HealthState, SourceErrorKind};
    use crate::http_client::{HttpError, HttpResponse, StaticHttpClient};
    use crate::window::resolve_previous_month_window;
    use std::time::Duration;
    use time::macros::date;

    const QUOTE_BODY: &str = r#"{"chart":{"result":[{"meta":{"currency":"USD","symbol":"META",
        "regularMarketPrice":335.85,"regularMarketTime":1700082000,"gmtoffset":-18000},
        "timestamp":[],"indicators":{"quote":[{}]}}],"error":null}}"#;

    const DAILY_BODY: &str = r#"{"chart":{"result":[{"meta":{"currency":"USD","gmtoffset":-14400},
        "timestamp":[1696253400,1696339800,1696426200],
        "indicators":{"quote":[{"close":[300.21,null,305.58]}]}}],"error":null}}"#;

    fn adapter(client: Arc<StaticHttpClient>) -> YahooAdapter {
        YahooAdapter::new(client).with_retry(RetryConfig::no_retry())
    }

    fn meta() -> Symbol {
        Symbol::parse("META").expect("valid symbol")
    }

    #[tokio::test]
    async fn quote_reads_regular_market_price() {
        let client = Arc::new(StaticHttpClient::new().respond_json("/chart/META", QUOTE_BODY));
        let quote = adapter(client.clone())
            .quote(QuoteRequest::new(meta()))
            .await
            .expect("quote parses");

        assert_eq!(quote.price, 335.85);
        assert_eq!(quote.currency, "USD");
        assert_eq!(quote.as_of.format_rfc3339(), "2023-11-15T21:00:00Z");

        let requests = client.requests();
        assert_eq!(requests[0].query_value("range"), Some("1d"));
        assert_eq!(requests[0].query_value("interval"), Some("1d"));
    }

    #[tokio::test]
    async fn daily_series_spans_whole_window_and_keeps_missing_closes() {
        let client = Arc::new(StaticHttpClient::new().respond_json("/chart/META", DAILY_BODY));
        let window = resolve_previous_month_window(date!(2023 - 11 - 15)).expect("window");

        let series = adapter(client.clone())
            .daily_closes(DailySeriesRequest::new(meta(), window))
            .await
            .expect("series parses");

        assert_eq!(series.len(), 3);
        assert_eq!(series.closes[0], DailyClose::new(date!(2023 - 10 - 02), Some(300.21)));
        assert_eq!(series.closes[1].close, None);
        assert_eq!(series.closes[2].date, date!(2023 - 10 - 04));

        let requests = client.requests();

        let request = &requests[0];
        // 2023-10-01T00:00:00Z and 2023-11-01T00:00:00Z
        assert_eq!(request.query_value("period1"), Some("1696118400"));
        assert_eq!(request.query_value("period2"), Some("1698796800"));
    }

    #[tokio::test]
    async fn chart_error_payload_is_invalid_request() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let client = Arc::new(StaticHttpClient::new().respond_json("/chart/", body));

        let error = adapter(client)
            .quote(QuoteRequest::new(meta()))
            .await
            .expect_err("error payload");

        assert_eq!(error.kind(), SourceErrorKind::InvalidRequest);
        assert!(error.message().contains("delisted"));
    }

    #[tokio::test]
    async fn missing_market_price_is_unavailable() {
        let body = r#"{"chart":{"result":[{"meta":{"currency":"USD"}}],"error":null}}"#;
        let client = Arc::new(StaticHttpClient::new().respond_json("/chart/", body));

        let error = adapter(client)
            .quote(QuoteRequest::new(meta()))
            .await
            .expect_err("no price");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn circuit_opens_after_repeated_transport_failures() {
        let client = Arc::new(StaticHttpClient::new().fail("/chart/", HttpError::new("timeout")));
        let adapter = adapter(client.clone()).with_circuit_breaker(CircuitBreakerConfig {
            failure_threshold: 3,
            open_timeout: Duration::from_secs(60),
        });

        for _ in 0..3 {
            let error = adapter
                .quote(QuoteRequest::new(meta()))
                .await
                .expect_err("transport fails");
            assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        }

        let health = adapter.health().await;
        assert_eq!(health.state, HealthState::Unhealthy);

        let error = adapter
            .quote(QuoteRequest::new(meta()))
            .await
            .expect_err("breaker blocks");
        assert!(error.message().contains("circuit is open"));
        assert_eq!(client.requests().len(), 3);
    }

    #[tokio::test]
    async fn server_error_status_is_unavailable() {
        let client = Arc::new(
            StaticHttpClient::new().respond("/chart/", HttpResponse::with_status(502, "bad gateway")),
        );
        let error = adapter(client)
            .quote(QuoteRequest::new(meta()))
            .await
            .expect_err("502");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    }
}
