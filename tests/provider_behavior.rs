//! Behavior tests for price lookups across providers: fallback, breaker
//! trips and in-band provider errors, all over a scripted transport.

use time::macros::date;
use vestval_core::{
    average_close, resolve_previous_month_window, DailySeriesRequest, QuoteRequest,
    SourceErrorKind,
};
use vestval_tests::*;

const YAHOO: &str = "finance.yahoo.com";
const ALPHAVANTAGE: &str = "alphavantage.co";

fn requests_to(client: &StaticHttpClient, host: &str) -> usize {
    client
        .requests()
        .iter()
        .filter(|request| request.url.contains(host))
        .count()
}

// =============================================================================
// Fallback between providers
// =============================================================================

#[tokio::test]
async fn rate_limited_yahoo_falls_back_to_alphavantage_for_the_reference_month() {
    // Given: Yahoo is throttling us and Alpha Vantage has October's closes
    let client = Arc::new(
        StaticHttpClient::new()
            .respond(YAHOO, HttpResponse::with_status(429, "{}"))
            .respond_json(
                ALPHAVANTAGE,
                alphavantage_daily_body(&[
                    ("2023-11-01", "346.29"),
                    ("2023-10-31", "310.00"),
                    ("2023-10-02", "300.00"),
                    ("2023-09-29", "300.21"),
                ]),
            ),
    );
    let router = scripted_router(client.clone(), Some("demo-key"));
    let window = resolve_previous_month_window(date!(2023 - 11 - 15)).expect("window");

    // When: the reference month is requested with auto routing
    let routed = router
        .route_daily(
            &DailySeriesRequest::new(symbol("META"), window),
            SourceStrategy::Auto,
        )
        .await
        .expect("fallback answers");

    // Then: Alpha Vantage answered after Yahoo was tried
    assert_eq!(routed.selected_source, ProviderId::Alphavantage);
    assert_eq!(
        routed.source_chain,
        vec![ProviderId::Yahoo, ProviderId::Alphavantage]
    );
    assert_eq!(routed.errors[0].code, "source.rate_limited");
    assert_eq!(routed.warnings.len(), 1);

    // And: only October closes are averaged
    let average = average_close(&routed.data.closes, &window).expect("closes in window");
    assert_eq!(average.data_points, 2);
    assert_eq!(average.price, 305.0);
}

#[tokio::test]
async fn unknown_symbol_fails_everywhere_with_one_error_per_provider() {
    let client = Arc::new(
        StaticHttpClient::new()
            .respond_json(
                YAHOO,
                r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
            )
            .respond_json(
                ALPHAVANTAGE,
                r#"{"Error Message":"Invalid API call. Please retry or visit the documentation."}"#,
            ),
    );
    let router = scripted_router(client, Some("demo-key"));

    let failure = router
        .route_quote(&QuoteRequest::new(symbol("ZZZZ")), SourceStrategy::Auto)
        .await
        .expect_err("no provider knows the symbol");

    assert_eq!(failure.errors.len(), 2);
    assert!(failure
        .errors
        .iter()
        .all(|error| error.code == "source.invalid_request" && error.retryable == Some(false)));
    assert_eq!(failure.last_error.kind(), SourceErrorKind::InvalidRequest);
}

// =============================================================================
// Circuit breaking
// =============================================================================

#[tokio::test]
async fn failing_yahoo_is_skipped_once_its_circuit_opens() {
    // Given: Yahoo is down and Alpha Vantage is healthy
    let client = Arc::new(
        StaticHttpClient::new()
            .respond(YAHOO, HttpResponse::with_status(503, "{}"))
            .respond_json(ALPHAVANTAGE, alphavantage_quote_body("335.85")),
    );
    let router = scripted_router(client.clone(), Some("demo-key"));
    let request = QuoteRequest::new(symbol("META"));

    // When: three lookups fail over from Yahoo
    for _ in 0..3 {
        let routed = router
            .route_quote(&request, SourceStrategy::Auto)
            .await
            .expect("fallback answers");
        assert_eq!(routed.selected_source, ProviderId::Alphavantage);
    }

    // Then: Yahoo's circuit is open and reported as unhealthy
    let snapshot = router.snapshot(ProviderId::Yahoo).await.expect("registered");
    assert_eq!(snapshot.status_label(), "unhealthy");

    // And: the next lookup goes straight to Alpha Vantage
    let routed = router
        .route_quote(&request, SourceStrategy::Auto)
        .await
        .expect("healthy provider answers");
    assert_eq!(routed.source_chain[0], ProviderId::Alphavantage);
    assert!(routed.errors.is_empty());
    assert_eq!(requests_to(&client, YAHOO), 3);
    assert_eq!(routed.data.price, 335.85);
}

// =============================================================================
// Strict source selection
// =============================================================================

#[tokio::test]
async fn alphavantage_quota_note_is_reported_as_rate_limited() {
    let client = Arc::new(StaticHttpClient::new().respond_json(
        ALPHAVANTAGE,
        r#"{"Note":"Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#,
    ));
    let router = scripted_router(client.clone(), Some("demo-key"));

    let failure = router
        .route_quote(
            &QuoteRequest::new(symbol("META")),
            SourceStrategy::Strict(ProviderId::Alphavantage),
        )
        .await
        .expect_err("quota exhausted");

    assert_eq!(failure.source_chain, vec![ProviderId::Alphavantage]);
    assert_eq!(failure.last_error.kind(), SourceErrorKind::RateLimited);
    assert!(failure.last_error.retryable());
    assert_eq!(requests_to(&client, YAHOO), 0);
}

#[tokio::test]
async fn alphavantage_without_a_key_is_not_registered() {
    let client = Arc::new(StaticHttpClient::new());
    let router = scripted_router(client.clone(), None);

    let failure = router
        .route_quote(
            &QuoteRequest::new(symbol("META")),
            SourceStrategy::Strict(ProviderId::Alphavantage),
        )
        .await
        .expect_err("adapter missing");

    assert_eq!(failure.errors[0].code, "source.adapter_not_registered");
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn yahoo_reference_month_request_spans_the_whole_month() {
    let client = Arc::new(StaticHttpClient::new().respond_json(
        YAHOO,
        yahoo_daily_body(
            "META",
            &[
                (date!(2023 - 10 - 02), Some(306.82)),
                (date!(2023 - 10 - 31), Some(301.27)),
            ],
        ),
    ));
    let router = scripted_router(client.clone(), None);
    let window = resolve_previous_month_window(date!(2023 - 11 - 15)).expect("window");

    let routed = router
        .route_daily(
            &DailySeriesRequest::new(symbol("META"), window),
            SourceStrategy::Strict(ProviderId::Yahoo),
        )
        .await
        .expect("series");

    let requests = client.requests();

    let request = &requests[0];
    assert_eq!(request.query_value("period1"), Some("1696118400"));
    assert_eq!(request.query_value("period2"), Some("1698796800"));
    assert_eq!(
        routed.data.closes.last().map(|close| close.date),
        Some(date!(2023 - 10 - 31))
    );
}
