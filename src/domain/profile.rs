use serde::{Deserialize, Serialize};

/// Minimal read-through projection of a profile. The backend owns profiles;
/// the client only caches this view for metadata enrichment and balance
/// display, and may discard it at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(alias = "_id")]
    pub id: String,
    /// Human-facing alias; absent for profiles that never claimed one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_id: Option<String>,
    #[serde(default)]
    pub balance: i64,
}
