//! Audit trail entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the append-only diagnostic trail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    /// Assigned by the store on append
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Free-text tag, e.g. `add_draft_item`
    #[serde(alias = "type")]
    pub action: String,
    #[serde(default)]
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(action: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            id: None,
            action: action.into(),
            details: details.into(),
            timestamp: Utc::now(),
        }
    }
}
