//! Price lookups and full offer valuation over a [`SourceRouter`].
//!
//! The three pure pieces ([`crate::window`], [`crate::average`],
//! [`crate::valuation`]) never touch the network. This module is where
//! routed fetches are combined with them.

use std::sync::Arc;

use serde::Serialize;
use time::Date;
use tracing::Instrument;

use crate::average::average_close;
use crate::data_source::{DailySeriesRequest, QuoteRequest};
use crate::routing::{RouteFailure, RouteTrace, SourceRouter, SourceStrategy};
use crate::valuation::{calculate_package, ValuationInput, ValuationResult};
use crate::window::{resolve_previous_month_window, DateWindow};
use crate::{CoreError, ProviderId, Symbol, UtcDateTime};

/// Latest traded price and the provider that supplied it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub symbol: Symbol,
    pub price: f64,
    pub currency: String,
    pub as_of: UtcDateTime,
    pub source: ProviderId,
    #[serde(skip)]
    pub trace: RouteTrace,
}

/// Previous-month average close used to size a grant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferencePrice {
    pub symbol: Symbol,
    pub price: f64,
    pub data_points: usize,
    pub window: DateWindow,
    /// e.g. `October 2023`
    pub month: String,
    pub source: ProviderId,
    #[serde(skip)]
    pub trace: RouteTrace,
}

/// What the candidate was offered.
///
/// `reference_price` and `current_price` are looked up when left empty.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferTerms {
    pub symbol: Symbol,
    pub base_salary: f64,
    /// Fraction of base salary, `0.15` for 15%.
    pub bonus_rate: f64,
    pub total_grant_value: f64,
    pub vest_start: Date,
    pub reference_price: Option<f64>,
    pub current_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferValuation {
    pub symbol: Symbol,
    pub window: DateWindow,
    pub input: ValuationInput,
    pub result: ValuationResult,
    /// Present when the reference price was fetched rather than supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferencePrice>,
    /// Present when the current price was fetched rather than supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<PricePoint>,
    #[serde(skip)]
    pub trace: RouteTrace,
}

pub struct OfferValuator {
    router: Arc<SourceRouter>,
    strategy: SourceStrategy,
}

impl OfferValuator {
    pub fn new(router: Arc<SourceRouter>, strategy: SourceStrategy) -> Self {
        Self { router, strategy }
    }

    pub fn strategy(&self) -> SourceStrategy {
        self.strategy
    }

    pub async fn current_price(&self, symbol: &Symbol) -> Result<PricePoint, CoreError> {
        let request = QuoteRequest::new(symbol.clone());
        let span = tracing::debug_span!("current_price", %symbol);
        let routed = self
            .router
            .route_quote(&request, self.strategy)
            .instrument(span)
            .await
            .map_err(route_error)?;

        let (quote, source, trace) = routed.into_parts();
        tracing::debug!(%symbol, %source, price = quote.price, "fetched current price");

        Ok(PricePoint {
            symbol: quote.symbol,
            price: quote.price,
            currency: quote.currency,
            as_of: quote.as_of,
            source,
            trace,
        })
    }

    /// Average close over the calendar month before `anchor`.
    pub async fn reference_price(
        &self,
        symbol: &Symbol,
        anchor: Date,
    ) -> Result<ReferencePrice, CoreError> {
        let window = resolve_previous_month_window(anchor)?;
        let request = DailySeriesRequest::new(symbol.clone(), window);
        let span = tracing::debug_span!("reference_price", %symbol, %window);
        let routed = self
            .router
            .route_daily(&request, self.strategy)
            .instrument(span)
            .await
            .map_err(route_error)?;

        let (series, source, trace) = routed.into_parts();
        let Some(average) = average_close(&series.closes, &window) else {
            return Err(CoreError::NoData {
                symbol: symbol.clone(),
                window,
            });
        };

        tracing::debug!(
            %symbol,
            %window,
            %source,
            price = average.price,
            data_points = average.data_points,
            "computed reference price"
        );

        Ok(ReferencePrice {
            symbol: symbol.clone(),
            price: average.price,
            data_points: average.data_points,
            window,
            month: window.label(),
            source,
            trace,
        })
    }

    pub async fn value_offer(&self, terms: &OfferTerms) -> Result<OfferValuation, CoreError> {
        let window = resolve_previous_month_window(terms.vest_start)?;

        let (reference, current, reference_price, current_price) =
            match (terms.reference_price, terms.current_price) {
                (Some(reference_price), Some(current_price)) => {
                    (None, None, reference_price, current_price)
                }
                (None, Some(current_price)) => {
                    let reference = self.reference_price(&terms.symbol, terms.vest_start).await?;
                    let reference_price = reference.price;
                    (Some(reference), None, reference_price, current_price)
                }
                (Some(reference_price), None) => {
                    let current = self.current_price(&terms.symbol).await?;
                    let current_price = current.price;
                    (None, Some(current), reference_price, current_price)
                }
                (None, None) => {
                    let (reference, current) = tokio::join!(
                        self.reference_price(&terms.symbol, terms.vest_start),
                        self.current_price(&terms.symbol)
                    );
                    let (reference, current) = (reference?, current?);
                    let (reference_price, current_price) = (reference.price, current.price);
                    (Some(reference), Some(current), reference_price, current_price)
                }
            };

        let input = ValuationInput::new(
            terms.base_salary,
            terms.bonus_rate,
            terms.total_grant_value,
            reference_price,
            current_price,
        )?;
        let result = calculate_package(&input)?;

        let mut trace = RouteTrace::default();
        if let Some(reference) = &reference {
            trace.merge(&reference.trace);
        }
        if let Some(current) = &current {
            trace.merge(&current.trace);
        }

        tracing::info!(
            symbol = %terms.symbol,
            total_present_value = result.total_present_value,
            gain_loss = result.gain_loss,
            "valued offer"
        );

        Ok(OfferValuation {
            symbol: terms.symbol.clone(),
            window,
            input,
            result,
            reference,
            current,
            trace,
        })
    }
}

fn route_error(failure: RouteFailure) -> CoreError {
    tracing::warn!(
        chain = ?failure.source_chain,
        errors = failure.errors.len(),
        "no price source answered"
    );
    let (error, trace) = failure.into_parts();
    CoreError::Source {
        error,
        trace: Box::new(trace),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpResponse, StaticHttpClient};
    use crate::routing::SourceRouterBuilder;
    use crate::{Settings, ValidationError};
    use time::macros::date;

    const QUOTE_BODY: &str = r#"{"chart":{"result":[{"meta":{"currency":"USD","symbol":"META","regularMarketPrice":150.0,"regularMarketTime":1700064000},"timestamp":[],"indicators":{"quote":[{"close":[]}]}}],"error":null}}"#;

    const OCTOBER_BODY: &str = r#"{"chart":{"result":[{"meta":{"currency":"USD","symbol":"META","gmtoffset":-14400},"timestamp":[1696253400,1696339800,1698672600],"indicators":{"quote":[{"close":[90.0,null,110.0]}]}}],"error":null}}"#;

    fn valuator(client: StaticHttpClient) -> OfferValuator {
        let router = SourceRouterBuilder::new(Settings {
            max_retries: 0,
            ..Settings::default()
        })
        .with_http_client(Arc::new(client))
        .build();
        OfferValuator::new(Arc::new(router), SourceStrategy::Auto)
    }

    fn meta() -> Symbol {
        Symbol::parse("META").expect("valid symbol")
    }

    fn terms() -> OfferTerms {
        OfferTerms {
            symbol: meta(),
            base_salary: 150_000.0,
            bonus_rate: 0.15,
            total_grant_value: 400_000.0,
            vest_start: date!(2023 - 11 - 15),
            reference_price: None,
            current_price: None,
        }
    }

    #[tokio::test]
    async fn reference_price_averages_previous_month() {
        let valuator = valuator(StaticHttpClient::new().respond_json("period1", OCTOBER_BODY));

        let reference = valuator
            .reference_price(&meta(), date!(2023 - 11 - 15))
            .await
            .expect("reference price");

        assert_eq!(reference.price, 100.0);
        assert_eq!(reference.data_points, 2);
        assert_eq!(reference.month, "October 2023");
        assert_eq!(reference.source, ProviderId::Yahoo);
        assert_eq!(reference.trace.source_chain, vec![ProviderId::Yahoo]);
    }

    #[tokio::test]
    async fn empty_month_is_no_data() {
        let body = r#"{"chart":{"result":[{"meta":{"currency":"USD"},"timestamp":[],"indicators":{"quote":[{"close":[]}]}}],"error":null}}"#;
        let valuator = valuator(StaticHttpClient::new().respond_json("period1", body));

        let error = valuator
            .reference_price(&meta(), date!(2023 - 11 - 15))
            .await
            .expect_err("no closes");

        assert!(matches!(error, CoreError::NoData { .. }));
        assert_eq!(error.code(), "core.no_data");
    }

    #[tokio::test]
    async fn value_offer_fetches_missing_prices() {
        let client = StaticHttpClient::new()
            .respond_json("period1", OCTOBER_BODY)
            .respond_json("range", QUOTE_BODY);
        let valuation = valuator(client).value_offer(&terms()).await.expect("valued");

        assert_eq!(valuation.input.reference_price, 100.0);
        assert_eq!(valuation.input.current_price, 150.0);
        assert_eq!(valuation.result.share_count, 4_000.0);
        assert!((valuation.result.total_present_value - 322_500.0).abs() < 1e-6);
        assert_eq!(valuation.result.gain_loss, 50_000.0);
        assert!(valuation.reference.is_some());
        assert!(valuation.current.is_some());
        assert_eq!(valuation.trace.source_chain.len(), 2);
    }

    #[tokio::test]
    async fn supplied_prices_skip_the_network() {
        let client = Arc::new(StaticHttpClient::new());
        let router = SourceRouterBuilder::new(Settings::default())
            .with_http_client(client.clone())
            .build();
        let valuator = OfferValuator::new(Arc::new(router), SourceStrategy::Auto);

        let valuation = valuator
            .value_offer(&OfferTerms {
                reference_price: Some(100.0),
                current_price: Some(50.0),
                ..terms()
            })
            .await
            .expect("valued offline");

        assert_eq!(valuation.result.gain_loss, -50_000.0);
        assert_eq!(valuation.window.label(), "October 2023");
        assert!(valuation.trace.source_chain.is_empty());
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn zero_supplied_reference_is_rejected() {
        let valuation = valuator(StaticHttpClient::new())
            .value_offer(&OfferTerms {
                reference_price: Some(0.0),
                current_price: Some(150.0),
                ..terms()
            })
            .await;

        assert!(matches!(
            valuation,
            Err(CoreError::Validation(ValidationError::DivisionByZero {
                field: "reference_price"
            }))
        ));
    }

    #[tokio::test]
    async fn provider_outage_surfaces_as_source_error() {
        let client = StaticHttpClient::new().respond("chart", HttpResponse::with_status(503, "{}"));
        let error = valuator(client)
            .current_price(&meta())
            .await
            .expect_err("outage");

        assert_eq!(error.code(), "source.unavailable");
    }
}
