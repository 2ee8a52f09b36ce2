//! Commission earnings for an agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single commission line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Commission {
    /// Commission identifier.
    pub id: String,
    /// Amount in dollars.
    pub amount: f64,
    /// Payout status such as `pending` or `paid`.
    #[serde(default)]
    pub status: Option<String>,
    /// What the commission was earned for.
    #[serde(default)]
    pub description: Option<String>,
    /// When the commission was credited.
    pub created_at: DateTime<Utc>,
}

impl Commission {
    /// Whether the commission is still awaiting payout.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case("pending"))
    }
}

/// Payload of `GET /api/commissions/agent/{agentId}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EarningsSummary {
    /// Lifetime earnings.
    #[serde(default)]
    pub total_earned: f64,
    /// Earnings since the start of the current week.
    #[serde(default)]
    pub this_week: f64,
    /// Sum of commissions not yet paid out.
    #[serde(default)]
    pub pending: f64,
    /// Individual commission lines.
    #[serde(default)]
    pub commissions: Vec<Commission>,
}
