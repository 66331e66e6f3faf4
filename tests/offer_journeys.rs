//! Behavior tests for the full offer flow: pick an employer, price the
//! grant against last month's average, and value it at today's price.

use time::macros::date;
use vestval_core::{Company, CoreError, OfferTerms, OfferValuator, ValidationError};
use vestval_tests::*;

const YAHOO_DAILY: &str = "period1=";
const YAHOO_QUOTE: &str = "range=1d";

fn valuator(client: Arc<StaticHttpClient>) -> OfferValuator {
    OfferValuator::new(Arc::new(scripted_router(client, None)), SourceStrategy::Auto)
}

fn meta_offer() -> OfferTerms {
    let company = Company::find("meta").expect("meta is listed");
    OfferTerms {
        symbol: company.symbol().expect("listed ticker is valid"),
        base_salary: 150_000.0,
        bonus_rate: 0.15,
        total_grant_value: 400_000.0,
        vest_start: date!(2023 - 11 - 15),
        reference_price: None,
        current_price: None,
    }
}

fn october_closes(closes: &[Option<f64>]) -> String {
    let days = [
        date!(2023 - 10 - 02),
        date!(2023 - 10 - 03),
        date!(2023 - 10 - 04),
        date!(2023 - 10 - 05),
    ];
    let series = days
        .iter()
        .copied()
        .zip(closes.iter().copied())
        .collect::<Vec<_>>();
    yahoo_daily_body("META", &series)
}

// =============================================================================
// Journey: value an offer end to end
// =============================================================================

#[tokio::test]
async fn candidate_sees_grant_value_grow_with_the_stock() {
    // Given: META averaged $100 in October and trades at $150 today
    let client = Arc::new(
        StaticHttpClient::new()
            .respond_json(
                YAHOO_DAILY,
                october_closes(&[Some(90.0), Some(110.0), None, Some(100.0)]),
            )
            .respond_json(YAHOO_QUOTE, yahoo_quote_body("META", 150.0)),
    );

    // When: a November start date is valued
    let valuation = valuator(client.clone())
        .value_offer(&meta_offer())
        .await
        .expect("offer is valued");

    // Then: the grant buys 4,000 shares priced off October
    let reference = valuation.reference.as_ref().expect("reference was fetched");
    assert_eq!(reference.month, "October 2023");
    assert_eq!(reference.price, 100.0);
    assert_eq!(reference.data_points, 3);
    assert_eq!(valuation.result.share_count, 4_000.0);

    // And: one year of vesting is worth $50,000 more than granted
    assert_eq!(valuation.result.gain_loss, 50_000.0);
    assert!((valuation.result.total_present_value - 322_500.0).abs() < 1e-6);

    // And: both prices came from Yahoo
    assert_eq!(
        valuation.trace.source_chain,
        vec![ProviderId::Yahoo, ProviderId::Yahoo]
    );
    assert_eq!(client.requests().len(), 2);
}

#[tokio::test]
async fn candidate_can_type_the_reference_price_and_fetch_only_today() {
    let client = Arc::new(
        StaticHttpClient::new().respond_json(YAHOO_QUOTE, yahoo_quote_body("META", 50.0)),
    );

    let valuation = valuator(client.clone())
        .value_offer(&OfferTerms {
            reference_price: Some(100.0),
            ..meta_offer()
        })
        .await
        .expect("offer is valued");

    assert!(valuation.reference.is_none());
    assert_eq!(valuation.current.as_ref().map(|point| point.price), Some(50.0));
    assert_eq!(valuation.result.gain_loss, -50_000.0);
    assert!(!valuation.result.is_gain());
    assert_eq!(client.requests().len(), 1);
}

#[tokio::test]
async fn valuation_serializes_dates_and_sources_for_machines() {
    let client = Arc::new(
        StaticHttpClient::new()
            .respond_json(YAHOO_DAILY, october_closes(&[Some(100.0)]))
            .respond_json(YAHOO_QUOTE, yahoo_quote_body("META", 150.0)),
    );

    let valuation = valuator(client)
        .value_offer(&meta_offer())
        .await
        .expect("offer is valued");
    let json = serde_json::to_value(&valuation).expect("serializes");

    assert_eq!(json["symbol"], "META");
    assert_eq!(json["window"]["start"], "2023-10-01");
    assert_eq!(json["window"]["end"], "2023-10-31");
    assert_eq!(json["reference"]["source"], "yahoo");
    assert_eq!(json["current"]["price"], 150.0);
    assert!(json.get("trace").is_none());
}

// =============================================================================
// Journey: things that stop a valuation
// =============================================================================

#[tokio::test]
async fn month_without_trading_data_is_reported_as_no_data() {
    let client = Arc::new(
        StaticHttpClient::new()
            .respond_json(YAHOO_DAILY, october_closes(&[None, None]))
            .respond_json(YAHOO_QUOTE, yahoo_quote_body("META", 150.0)),
    );

    let error = valuator(client)
        .value_offer(&meta_offer())
        .await
        .expect_err("no closes to average");

    match error {
        CoreError::NoData { symbol, window } => {
            assert_eq!(symbol.as_str(), "META");
            assert_eq!(window.label(), "October 2023");
        }
        other => panic!("expected no data, got {other:?}"),
    }
}

#[test]
fn unknown_employer_is_rejected_before_any_lookup() {
    assert!(matches!(
        Company::find("initech"),
        Err(ValidationError::UnknownCompany { .. })
    ));
    assert_eq!(
        Company::find("googl").map(|company| company.name),
        Ok("Google")
    );
}

#[tokio::test]
async fn typed_zero_reference_price_is_an_input_error() {
    let client = Arc::new(StaticHttpClient::new());

    let error = valuator(client.clone())
        .value_offer(&OfferTerms {
            reference_price: Some(0.0),
            current_price: Some(150.0),
            ..meta_offer()
        })
        .await
        .expect_err("cannot size the grant");

    assert!(matches!(
        error,
        CoreError::Validation(ValidationError::DivisionByZero {
            field: "reference_price"
        })
    ));
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn outage_everywhere_reports_each_provider_that_was_tried() {
    // Given: Yahoo is down and Alpha Vantage has exhausted its quota
    let client = Arc::new(
        StaticHttpClient::new()
            .respond("finance.yahoo.com", HttpResponse::with_status(503, "{}"))
            .respond("alphavantage.co", HttpResponse::with_status(429, "{}")),
    );
    let router = scripted_router(client, Some("demo-key"));
    let valuator = OfferValuator::new(Arc::new(router), SourceStrategy::Auto);

    // When: today's price is requested
    let error = valuator
        .current_price(&symbol("META"))
        .await
        .expect_err("no provider answers");

    // Then: the error keeps the whole attempt chain
    let CoreError::Source { error, trace } = error else {
        panic!("expected a source failure");
    };
    assert_eq!(error.code(), "source.rate_limited");
    assert_eq!(
        trace.source_chain,
        vec![ProviderId::Yahoo, ProviderId::Alphavantage]
    );
    let codes = trace
        .errors
        .iter()
        .map(|error| (error.source, error.code.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        codes,
        vec![
            (Some(ProviderId::Yahoo), "source.unavailable"),
            (Some(ProviderId::Alphavantage), "source.rate_limited"),
        ]
    );
}
