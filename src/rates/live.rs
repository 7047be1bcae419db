use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RateFetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid response from rate service: {0}")]
    InvalidResponse(String),
    #[error("rate service circuit breaker is open")]
    CircuitOpen,
}

#[derive(Debug, Deserialize)]
struct RatesEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<RatesData>,
}

#[derive(Debug, Deserialize)]
struct RatesData {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// HTTP client for the live exchange-rate proxy. Returns USD-relative rates
/// keyed by 3-letter currency code. A circuit breaker keeps a flapping rate
/// service from delaying every valuation; a tripped breaker reads as "live
/// source unavailable" and the resolver falls through to its next source.
#[derive(Clone)]
pub struct ExchangeRateClient {
    client: Client,
    endpoint: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl ExchangeRateClient {
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_default();

        let backoff = backoff::equal_jittered(Duration::from_secs(30), Duration::from_secs(60));
        let policy = failure_policy::consecutive_failures(3, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        ExchangeRateClient {
            client,
            endpoint,
            circuit_breaker,
        }
    }

    /// Returns the current state of the circuit breaker.
    pub fn circuit_state(&self) -> String {
        if self.circuit_breaker.is_call_permitted() {
            "closed".to_string()
        } else {
            "open".to_string()
        }
    }

    /// Fetches the USD->`currency` rate. `Ok(None)` means the service
    /// answered but has no entry for that currency.
    pub async fn usd_rate(&self, currency: &str) -> Result<Option<f64>, RateFetchError> {
        let client = self.client.clone();
        let url = self.endpoint.clone();
        let code = currency.to_string();

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client.get(&url).query(&[("base", "USD")]).send().await?;

                if !response.status().is_success() {
                    return Err(RateFetchError::InvalidResponse(format!(
                        "rate service returned status {}",
                        response.status()
                    )));
                }

                let envelope = response.json::<RatesEnvelope>().await?;
                if !envelope.success {
                    return Err(RateFetchError::InvalidResponse(
                        "rate service declared failure".to_string(),
                    ));
                }

                let rate = envelope
                    .data
                    .map(|data| data.rates)
                    .and_then(|rates| rates.get(&code).copied());
                Ok(rate)
            })
            .await;

        match result {
            Ok(rate) => Ok(rate),
            Err(FailsafeError::Rejected) => Err(RateFetchError::CircuitOpen),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}
