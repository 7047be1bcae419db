//! Currency rate resolution.
//! One MyPt has a fixed base value in USD; a per-currency rate is derived
//! from the first usable source in a strict priority order: live exchange
//! rates, then a backend-supplied value, then a static fallback table.

pub mod live;

pub use live::{ExchangeRateClient, RateFetchError};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ClientError;

/// Fixed base value of one MyPt in USD.
pub const BASE_VALUE_USD: f64 = 0.024;

/// Last-resort per-currency multipliers, kept in sync with the backend's own
/// fallback table.
const FALLBACK_RATES: &[(&str, f64)] = &[
    ("USD", 0.024),
    ("EUR", 0.0208),
    ("GBP", 0.0179),
    ("NGN", 38.26),
    ("PKR", 6.74),
    ("XAF", 13.61),
];

const CURRENCY_SYMBOLS: &[(&str, &str)] = &[
    ("USD", "$"),
    ("EUR", "€"),
    ("GBP", "£"),
    ("NGN", "₦"),
    ("PKR", "₨"),
    ("XAF", "FCFA"),
];

/// Which source won the priority race for a resolved rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    Live,
    Backend,
    Fallback,
}

/// A fully resolved MyPts-to-currency rate. Exactly one source wins per
/// resolution; a resolver never hands out a zero rate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRate {
    pub currency: String,
    pub value_per_my_pt: f64,
    pub symbol: String,
    pub source: RateSource,
}

pub fn currency_symbol(code: &str) -> String {
    CURRENCY_SYMBOLS
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, symbol)| symbol.to_string())
        .unwrap_or_else(|| code.to_string())
}

pub fn fallback_rate(code: &str) -> Option<f64> {
    FALLBACK_RATES
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, rate)| *rate)
}

fn usable(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Resolves `value_per_my_pt(currency)` by trying sources in priority order.
/// Fails closed: when every source is exhausted the caller gets
/// `UnsupportedCurrency` (unknown code) or `RateUnavailable` (a source
/// answered with an unusable zero/non-finite value), never a silent zero.
#[derive(Clone)]
pub struct RateResolver {
    live: Option<ExchangeRateClient>,
}

impl RateResolver {
    pub fn new(live: ExchangeRateClient) -> Self {
        Self { live: Some(live) }
    }

    /// A resolver with no live source; backend values and the fallback table
    /// still apply. Used when no rate service endpoint is configured.
    pub fn offline() -> Self {
        Self { live: None }
    }

    pub async fn resolve(
        &self,
        currency: &str,
        backend_value: Option<f64>,
    ) -> Result<ResolvedRate, ClientError> {
        let code = currency.trim().to_ascii_uppercase();
        let mut saw_unusable = false;

        if let Some(live) = &self.live {
            match live.usd_rate(&code).await {
                Ok(Some(rate)) if usable(rate) => {
                    return Ok(self.resolved(code, BASE_VALUE_USD * rate, RateSource::Live));
                }
                Ok(Some(rate)) => {
                    warn!("Live source returned unusable rate {} for {}", rate, code);
                    saw_unusable = true;
                }
                Ok(None) => debug!("No live rate for {}", code),
                Err(e) => warn!("Live rate lookup failed for {}: {}", code, e),
            }
        }

        if let Some(rate) = backend_value {
            if usable(rate) {
                return Ok(self.resolved(code, rate, RateSource::Backend));
            }
            debug!("Ignoring unusable backend rate {} for {}", rate, code);
            saw_unusable = true;
        }

        if let Some(rate) = fallback_rate(&code) {
            return Ok(self.resolved(code, rate, RateSource::Fallback));
        }

        if saw_unusable {
            Err(ClientError::RateUnavailable(code))
        } else {
            Err(ClientError::UnsupportedCurrency(code))
        }
    }

    fn resolved(&self, currency: String, value_per_my_pt: f64, source: RateSource) -> ResolvedRate {
        let symbol = currency_symbol(&currency);
        ResolvedRate {
            currency,
            value_per_my_pt,
            symbol,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn live_rate_beats_backend_and_fallback() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rates")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":true,"data":{"rates":{"EUR":0.85}}}"#)
            .create_async()
            .await;

        let resolver = RateResolver::new(ExchangeRateClient::new(
            format!("{}/rates", server.url()),
            Duration::from_secs(5),
        ));

        // backend offers 0.0208 and the fallback table agrees, but the live
        // derivation 0.024 * 0.85 must win
        let rate = resolver.resolve("EUR", Some(0.0208)).await.unwrap();
        assert_eq!(rate.source, RateSource::Live);
        assert!((rate.value_per_my_pt - 0.0204).abs() < 1e-9);
    }

    #[tokio::test]
    async fn live_failure_falls_through_to_backend() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rates")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let resolver = RateResolver::new(ExchangeRateClient::new(
            format!("{}/rates", server.url()),
            Duration::from_secs(5),
        ));

        let rate = resolver.resolve("EUR", Some(0.0208)).await.unwrap();
        assert_eq!(rate.source, RateSource::Backend);
        assert_eq!(rate.value_per_my_pt, 0.0208);
    }

    #[tokio::test]
    async fn backend_rate_wins_without_live_source() {
        let resolver = RateResolver::offline();

        let rate = resolver.resolve("eur", Some(0.021)).await.unwrap();
        assert_eq!(rate.source, RateSource::Backend);
        assert_eq!(rate.value_per_my_pt, 0.021);
        assert_eq!(rate.currency, "EUR");
        assert_eq!(rate.symbol, "€");
    }

    #[tokio::test]
    async fn zero_backend_rate_falls_through_to_table() {
        let resolver = RateResolver::offline();

        let rate = resolver.resolve("XAF", Some(0.0)).await.unwrap();
        assert_eq!(rate.source, RateSource::Fallback);
        assert_eq!(rate.value_per_my_pt, 13.61);
        assert_eq!(rate.symbol, "FCFA");
    }

    #[tokio::test]
    async fn unknown_currency_fails_closed() {
        let resolver = RateResolver::offline();

        let err = resolver.resolve("ZZZ", None).await.unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedCurrency(code) if code == "ZZZ"));
    }

    #[tokio::test]
    async fn unusable_sources_report_rate_unavailable() {
        let resolver = RateResolver::offline();

        // zero backend value for a currency absent from the fallback table
        let err = resolver.resolve("JPY", Some(0.0)).await.unwrap_err();
        assert!(matches!(err, ClientError::RateUnavailable(code) if code == "JPY"));
    }

    #[test]
    fn unlisted_symbol_falls_back_to_code() {
        assert_eq!(currency_symbol("USD"), "$");
        assert_eq!(currency_symbol("JPY"), "JPY");
    }
}
