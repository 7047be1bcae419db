use serde::{Deserialize, Serialize};

/// Payment methods the points economy accepts. Consolidates the string
/// literals previously scattered across callers into one closed enumeration
/// with a required-fields schema per variant; unknown wire values are
/// preserved opaquely like unknown transaction types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
    MobileMoney,
    PakistaniLocal,
    Local,
    BankTransfer,
    Card,
    Paypal,
    Other(String),
}

impl PaymentMethod {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentMethod::MobileMoney => "mobile_money",
            PaymentMethod::PakistaniLocal => "pakistani_local",
            PaymentMethod::Local => "local",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Card => "card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Other(raw) => raw,
        }
    }

    /// Account-detail fields that must be present and non-empty before a sell
    /// request is allowed to leave the client.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            PaymentMethod::MobileMoney => &["provider", "phoneNumber"],
            PaymentMethod::PakistaniLocal => &["bankName", "accountNumber", "accountTitle"],
            PaymentMethod::Local | PaymentMethod::BankTransfer => {
                &["bankName", "accountNumber", "accountName"]
            }
            PaymentMethod::Paypal => &["email"],
            // card details are collected by the payment provider, not us
            PaymentMethod::Card | PaymentMethod::Other(_) => &[],
        }
    }

    /// Whether this method is settled manually by an admin rather than by a
    /// payment provider. These are the only methods surfaced in the admin
    /// local-transaction review queue.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            PaymentMethod::MobileMoney | PaymentMethod::PakistaniLocal | PaymentMethod::Local
        )
    }
}

impl From<String> for PaymentMethod {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "mobile_money" => PaymentMethod::MobileMoney,
            "pakistani_local" => PaymentMethod::PakistaniLocal,
            "local" => PaymentMethod::Local,
            "bank_transfer" => PaymentMethod::BankTransfer,
            "card" => PaymentMethod::Card,
            "paypal" => PaymentMethod::Paypal,
            _ => PaymentMethod::Other(raw),
        }
    }
}

impl From<PaymentMethod> for String {
    fn from(value: PaymentMethod) -> Self {
        value.as_str().to_string()
    }
}
