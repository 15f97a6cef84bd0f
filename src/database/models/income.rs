use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single income row. Recurring rows carry `frequency` and roll over on a
/// schedule; non-recurring rows carry an optional `end_date` instead.
///
/// `income_type` and `frequency` are kept as the stored text: the recurring
/// evaluator owns the policy for malformed values (skip and report, never
/// default), so decoding must not fail the whole list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Income {
    pub income_id: i64,
    pub name: String,
    pub amount: Decimal,
    pub income_type: String, // "recurring" or "non-recurring"
    pub frequency: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub last_processed: Option<NaiveDate>,
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

impl Income {
    pub fn is_recurring(&self) -> bool {
        self.income_type == "recurring"
    }
}
