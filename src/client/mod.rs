//! Typed façade over the points-economy REST API.
//! Every request carries the credential chain, active-profile scoping, a
//! cache-busting token on reads, and a fixed timeout; every response is
//! normalized through the envelope module before decoding.

pub mod envelope;

pub use envelope::Envelope;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{PaymentMethod, Profile, Transaction, TransactionType};
use crate::enricher::{EnrichmentOutcome, MetadataEnricher, ProfileCache, ProfileSource};
use crate::error::ClientError;
use crate::rates::{ExchangeRateClient, RateResolver, RateSource};
use crate::validation;
use crate::valuation;

/// Paginated transaction listing. The pagination echo comes back from the
/// backend unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    pub has_more: bool,
}

/// Balance with its valuation re-derived through the rate resolver, so a
/// broken backend rate can never surface as a zero display value.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummary {
    pub balance: i64,
    pub currency: String,
    pub value_per_my_pt: f64,
    pub total_value: f64,
    pub formatted: String,
    pub rate_source: RateSource,
}

#[derive(Debug, Clone)]
pub struct LocalTransactionFilters {
    pub status: Option<crate::domain::TransactionStatus>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for LocalTransactionFilters {
    fn default() -> Self {
        // deliberately broad; payment-method filtering happens client-side
        Self {
            status: None,
            limit: 100,
            offset: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBalance {
    balance: i64,
    #[serde(default)]
    value: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawValue {
    #[serde(default)]
    value_per_my_pt: Option<f64>,
}

#[derive(Clone)]
pub struct MyPtsClient {
    http: reqwest::Client,
    config: Config,
    resolver: RateResolver,
    profile_cache: Arc<ProfileCache>,
}

impl MyPtsClient {
    pub fn new(config: Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_default();

        let resolver = match &config.exchange_rate_url {
            Some(endpoint) => RateResolver::new(ExchangeRateClient::new(
                endpoint.clone(),
                config.request_timeout(),
            )),
            None => RateResolver::offline(),
        };

        MyPtsClient {
            http,
            config,
            resolver,
            profile_cache: Arc::new(ProfileCache::new()),
        }
    }

    /// Replaces the rate resolver, mainly for tests that pin a source.
    pub fn with_resolver(config: Config, resolver: RateResolver) -> Self {
        let mut client = Self::new(config);
        client.resolver = resolver;
        client
    }

    /// Sets or clears the per-client override credential, the highest rung of
    /// the auth chain.
    pub fn set_override_token(&mut self, token: Option<String>) {
        self.config.auth.override_token = token;
    }

    pub fn set_active_profile(&mut self, profile_id: Option<String>) {
        self.config.active_profile_id = profile_id;
    }

    /// The session-scoped profile cache shared with enrichment. Cleared on
    /// navigation by the embedding UI.
    pub fn profile_cache(&self) -> Arc<ProfileCache> {
        Arc::clone(&self.profile_cache)
    }

    // --- reads ---

    /// Fetches the balance and re-derives `value_per_my_pt` for the requested
    /// currency through the resolver, even when the backend already supplied
    /// one; live rates take precedence.
    pub async fn get_balance(&self, currency: &str) -> Result<BalanceSummary, ClientError> {
        self.balance(currency, None).await
    }

    /// [`get_balance`](Self::get_balance) in the configured default currency.
    pub async fn get_balance_default(&self) -> Result<BalanceSummary, ClientError> {
        let currency = self.config.default_currency.clone();
        self.balance(&currency, None).await
    }

    /// Same as [`get_balance`](Self::get_balance) but scoped to a specific
    /// profile instead of the active one.
    pub async fn get_balance_for_profile(
        &self,
        currency: &str,
        profile_id: &str,
    ) -> Result<BalanceSummary, ClientError> {
        self.balance(currency, Some(profile_id)).await
    }

    async fn balance(
        &self,
        currency: &str,
        profile_override: Option<&str>,
    ) -> Result<BalanceSummary, ClientError> {
        let mut query = vec![("currency", currency.to_string())];
        if let Some(profile_id) = profile_override {
            query.push(("profileId", profile_id.to_string()));
        }

        let envelope = self.get_json("/my-pts/balance", &query).await?;
        let raw: RawBalance = envelope.decode()?;

        let backend_rate = raw.value.as_ref().and_then(|value| value.value_per_my_pt);
        let rate = self.resolver.resolve(currency, backend_rate).await?;
        let value = valuation::to_currency(raw.balance as f64, &rate);

        Ok(BalanceSummary {
            balance: raw.balance,
            currency: rate.currency.clone(),
            value_per_my_pt: rate.value_per_my_pt,
            total_value: value.total_value,
            formatted: value.formatted,
            rate_source: rate.source,
        })
    }

    pub async fn list_transactions(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<TransactionPage, ClientError> {
        let envelope = self
            .get_json(
                "/my-pts/transactions",
                &[("limit", limit.to_string()), ("offset", offset.to_string())],
            )
            .await?;
        envelope.decode()
    }

    pub async fn list_transactions_by_type(
        &self,
        tx_type: &TransactionType,
        limit: u32,
        offset: u32,
    ) -> Result<TransactionPage, ClientError> {
        let envelope = self
            .get_json(
                &format!("/my-pts/transactions/type/{}", tx_type.as_str()),
                &[("limit", limit.to_string()), ("offset", offset.to_string())],
            )
            .await?;
        envelope.decode()
    }

    pub async fn get_transaction(&self, id: &str) -> Result<Transaction, ClientError> {
        let envelope = self
            .get_json(&format!("/my-pts/transactions/{}", id), &[])
            .await?;
        decode_transaction(envelope)
    }

    pub async fn get_transaction_by_reference(
        &self,
        reference_id: &str,
    ) -> Result<Transaction, ClientError> {
        let envelope = self
            .get_json(&format!("/my-pts/transactions/reference/{}", reference_id), &[])
            .await?;
        decode_transaction(envelope)
    }

    // --- mutations ---

    pub async fn buy(
        &self,
        amount: i64,
        payment_method: &PaymentMethod,
    ) -> Result<Transaction, ClientError> {
        validation::validate_positive_amount(amount)
            .map_err(|err| ClientError::ValidationFailure(vec![err]))?;

        let envelope = self
            .post_json(
                "/my-pts/buy",
                json!({
                    "amount": amount,
                    "paymentMethod": payment_method.as_str(),
                }),
            )
            .await?;
        decode_transaction(envelope)
    }

    /// Pre-validates locally before any network I/O: the amount must be
    /// positive and covered by the known balance, and the account details
    /// must match the payment method's required fields. Pre-validation is an
    /// optimization, not a substitute for backend validation.
    pub async fn sell(
        &self,
        amount: i64,
        payment_method: &PaymentMethod,
        account_details: &Map<String, Value>,
        current_balance: i64,
    ) -> Result<Transaction, ClientError> {
        validation::validate_positive_amount(amount)
            .map_err(|err| ClientError::ValidationFailure(vec![err]))?;

        if amount > current_balance {
            return Err(ClientError::InsufficientBalance {
                requested: amount,
                available: current_balance,
            });
        }

        validation::validate_account_details(payment_method, account_details)
            .map_err(ClientError::ValidationFailure)?;

        let envelope = self
            .post_json(
                "/my-pts/sell",
                json!({
                    "amount": amount,
                    "paymentMethod": payment_method.as_str(),
                    "accountDetails": account_details,
                }),
            )
            .await?;
        decode_transaction(envelope)
    }

    // --- admin ---

    /// Fetches a broad transaction set, keeps only manually settled payment
    /// methods, then enriches the remainder with profile secondary IDs.
    pub async fn list_local_transactions(
        &self,
        filters: &LocalTransactionFilters,
    ) -> Result<EnrichmentOutcome, ClientError> {
        let mut query = vec![
            ("limit", filters.limit.to_string()),
            ("offset", filters.offset.to_string()),
        ];
        if let Some(status) = filters.status {
            query.push(("status", status.as_str().to_string()));
        }

        let envelope = self.get_json("/admin/my-pts/transactions", &query).await?;
        let page: TransactionPage = envelope.decode()?;

        let local: Vec<Transaction> = page
            .transactions
            .into_iter()
            .filter(|tx| {
                tx.metadata
                    .payment_method
                    .as_ref()
                    .map(PaymentMethod::is_local)
                    .unwrap_or(false)
            })
            .collect();

        debug!("{} local transaction(s) after payment-method filter", local.len());

        let enricher = MetadataEnricher::with_cache(self.clone(), self.profile_cache());
        Ok(enricher.enrich(&local).await)
    }

    /// Moves a RESERVED local transaction toward COMPLETED. Requires the
    /// payment reference recorded by the admin.
    pub async fn process_local_transaction(
        &self,
        tx: &Transaction,
        payment_reference: &str,
        notes: Option<&str>,
    ) -> Result<Transaction, ClientError> {
        require_reserved(tx)?;
        let payment_reference = validation::sanitize_string(payment_reference);
        let notes = notes.map(validation::sanitize_string);
        validate_admin_fields(&payment_reference, notes.as_deref())?;

        let envelope = self
            .post_json(
                &format!("/admin/my-pts/transactions/{}/process", tx.id),
                json!({
                    "paymentReference": payment_reference,
                    "notes": notes,
                }),
            )
            .await?;

        info!("Processed local transaction {}", tx.id);
        decode_transaction(envelope)
    }

    /// Approves a RESERVED sell transaction; the backend deducts the
    /// profile's balance.
    pub async fn approve_sell_transaction(
        &self,
        tx: &Transaction,
        payment_reference: &str,
        notes: Option<&str>,
    ) -> Result<Transaction, ClientError> {
        require_reserved(tx)?;
        let payment_reference = validation::sanitize_string(payment_reference);
        let notes = notes.map(validation::sanitize_string);
        validate_admin_fields(&payment_reference, notes.as_deref())?;

        let envelope = self
            .post_json(
                &format!("/admin/my-pts/transactions/{}/approve", tx.id),
                json!({
                    "paymentReference": payment_reference,
                    "notes": notes,
                }),
            )
            .await?;

        info!("Approved sell transaction {}", tx.id);
        decode_transaction(envelope)
    }

    /// Rejects a RESERVED sell transaction; no balance change happens.
    pub async fn reject_sell_transaction(
        &self,
        tx: &Transaction,
        reason: &str,
    ) -> Result<Transaction, ClientError> {
        require_reserved(tx)?;
        let reason = validation::sanitize_string(reason);
        let mut errors = Vec::new();
        errors.extend(validation::validate_required("reason", &reason).err());
        errors.extend(
            validation::validate_max_len("reason", &reason, validation::ADMIN_NOTES_MAX_LEN).err(),
        );
        if !errors.is_empty() {
            return Err(ClientError::ValidationFailure(errors));
        }

        let envelope = self
            .post_json(
                &format!("/admin/my-pts/transactions/{}/reject", tx.id),
                json!({ "reason": reason }),
            )
            .await?;

        info!("Rejected sell transaction {}", tx.id);
        decode_transaction(envelope)
    }

    // --- plumbing ---

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url.trim_end_matches('/'), path)
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Envelope, ClientError> {
        let mut pairs: Vec<(&str, String)> = query.to_vec();
        // cache buster: an intermediate cache must never serve stale balances
        pairs.push(("_t", Uuid::new_v4().to_string()));
        let already_scoped = query.iter().any(|(key, _)| *key == "profileId");
        if !already_scoped {
            if let Some(profile_id) = &self.config.active_profile_id {
                pairs.push(("profileId", profile_id.clone()));
            }
        }

        let mut request = self.http.get(self.url(path)).query(&pairs);
        if let Some(token) = self.config.auth.bearer() {
            request = request.bearer_auth(token);
        }

        debug!("GET {}", path);
        self.dispatch(request).await
    }

    async fn post_json(&self, path: &str, mut body: Value) -> Result<Envelope, ClientError> {
        if let Some(profile_id) = &self.config.active_profile_id {
            if let Value::Object(map) = &mut body {
                map.entry("profileId")
                    .or_insert_with(|| Value::String(profile_id.clone()));
            }
        }

        let mut request = self.http.post(self.url(path));
        if let Some(profile_id) = &self.config.active_profile_id {
            request = request.query(&[("profileId", profile_id.as_str())]);
        }
        if let Some(token) = self.config.auth.bearer() {
            request = request.bearer_auth(token);
        }

        debug!("POST {}", path);
        self.dispatch(request.json(&body)).await
    }

    async fn dispatch(&self, request: reqwest::RequestBuilder) -> Result<Envelope, ClientError> {
        let timeout_secs = self.config.request_timeout_secs;
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from_transport(e, timeout_secs))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            // surfaced distinctly so the UI can prompt re-authentication;
            // never retried here
            return Err(ClientError::AuthenticationFailure {
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ClientError::from_transport(e, timeout_secs))?;
        let body: Value = serde_json::from_str(&text).map_err(|e| {
            if status.is_success() {
                ClientError::InvalidResponse(e.to_string())
            } else {
                ClientError::Backend(format!("backend returned status {}", status))
            }
        })?;

        let envelope = Envelope::normalize(body)?;
        if !status.is_success() {
            return Err(envelope.failure_error(status));
        }

        Ok(envelope)
    }
}

#[async_trait]
impl ProfileSource for MyPtsClient {
    async fn fetch_profile(&self, profile_id: &str) -> Result<Profile, ClientError> {
        let envelope = self
            .get_json(&format!("/profiles/{}", profile_id), &[])
            .await?;
        let data = envelope.into_result()?;
        let value = match data {
            Value::Object(ref map) if map.contains_key("profile") => map["profile"].clone(),
            other => other,
        };
        serde_json::from_value(value).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

/// Admin inputs are free-form text typed into a form; bound them before they
/// travel, collecting every problem so the form can show all of them at once.
fn validate_admin_fields(payment_reference: &str, notes: Option<&str>) -> Result<(), ClientError> {
    let mut errors = Vec::new();
    errors.extend(validation::validate_required("paymentReference", payment_reference).err());
    errors.extend(
        validation::validate_max_len(
            "paymentReference",
            payment_reference,
            validation::PAYMENT_REFERENCE_MAX_LEN,
        )
        .err(),
    );
    if let Some(notes) = notes {
        errors.extend(
            validation::validate_max_len("notes", notes, validation::ADMIN_NOTES_MAX_LEN).err(),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ClientError::ValidationFailure(errors))
    }
}

fn require_reserved(tx: &Transaction) -> Result<(), ClientError> {
    if !tx.is_admin_actionable() {
        return Err(ClientError::StateConflict {
            id: tx.id.clone(),
            status: tx.status.as_str().to_string(),
        });
    }

    Ok(())
}

/// Single-record payloads arrive either bare or wrapped in a `transaction`
/// key; accept both.
fn decode_transaction(envelope: Envelope) -> Result<Transaction, ClientError> {
    let data = envelope.into_result()?;
    let value = match data {
        Value::Object(ref map) if map.contains_key("transaction") => map["transaction"].clone(),
        other => other,
    };
    serde_json::from_value(value).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}
