use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub budget_id: i64,
    pub name: String,
    /// User-set spending limit.
    pub amount: Decimal,
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

/// A budget together with its derived aggregates. `total_spend` and
/// `total_item` are computed from the expense rows at read time, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSummary {
    #[serde(flatten)]
    pub budget: Budget,
    pub total_spend: Decimal,
    pub total_item: i64,
}
