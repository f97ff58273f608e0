use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A client is "root" iff `for_workspace_id` is set (rate-limit fields are
/// then always null) and "basic" iff it is unset (rate-limit fields are
/// either all null or all set — enforced at creation, not by the type).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub version: i64,
    pub workspace_id: String,
    pub for_workspace_id: Option<String>,
    pub api_id: String,
    pub rate_limit_bucket_size: Option<i64>,
    pub rate_limit_refill_amount: Option<i64>,
    pub rate_limit_refill_interval_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Client {
    pub fn is_root(&self) -> bool {
        self.for_workspace_id.is_some()
    }

    pub fn has_rate_limit(&self) -> bool {
        self.rate_limit_bucket_size.is_some()
    }
}
