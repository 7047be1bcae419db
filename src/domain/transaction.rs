//! Transaction domain entity.
//! Client-side projection of a points-economy transaction; read-only here,
//! the backend owns the lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::payment::PaymentMethod;

/// Closed set of transaction kinds. Wire values the client does not know are
/// preserved opaquely instead of rejected, so new backend kinds round-trip
/// through old clients unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionType {
    BuyMyPts,
    SellMyPts,
    EarnMyPts,
    SpendMyPts,
    DonateMyPts,
    AwardMyPts,
    Other(String),
}

impl TransactionType {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionType::BuyMyPts => "BUY_MYPTS",
            TransactionType::SellMyPts => "SELL_MYPTS",
            TransactionType::EarnMyPts => "EARN_MYPTS",
            TransactionType::SpendMyPts => "SPEND_MYPTS",
            TransactionType::DonateMyPts => "DONATE_MYPTS",
            TransactionType::AwardMyPts => "AWARD_MYPTS",
            TransactionType::Other(raw) => raw,
        }
    }
}

impl From<String> for TransactionType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "BUY_MYPTS" => TransactionType::BuyMyPts,
            "SELL_MYPTS" => TransactionType::SellMyPts,
            "EARN_MYPTS" => TransactionType::EarnMyPts,
            "SPEND_MYPTS" => TransactionType::SpendMyPts,
            "DONATE_MYPTS" => TransactionType::DonateMyPts,
            "AWARD_MYPTS" => TransactionType::AwardMyPts,
            _ => TransactionType::Other(raw),
        }
    }
}

impl From<TransactionType> for String {
    fn from(value: TransactionType) -> Self {
        value.as_str().to_string()
    }
}

/// Transaction lifecycle states as observed by the client. Only `Reserved`
/// transactions are admin-actionable; the backend enforces the full state
/// machine, the client only gates which actions it will attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Reserved,
    Pending,
    Completed,
    Failed,
    Cancelled,
    Rejected,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Reserved => "RESERVED",
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Cancelled => "CANCELLED",
            TransactionStatus::Rejected => "REJECTED",
        }
    }
}

/// Open metadata bag attached to a transaction. Well-known keys are typed;
/// everything else is preserved verbatim in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_secondary_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub profile_id: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    /// Signed depending on context; display layers show the magnitude.
    pub amount: i64,
    /// Balance snapshot taken when the transaction was created, never mutated.
    pub balance: i64,
    #[serde(default)]
    pub metadata: TransactionMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Whether approve/reject/process may be offered for this transaction.
    pub fn is_admin_actionable(&self) -> bool {
        self.status == TransactionStatus::Reserved
    }

    pub fn display_amount(&self) -> i64 {
        self.amount.abs()
    }
}
