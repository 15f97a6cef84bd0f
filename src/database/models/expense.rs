use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub expense_id: i64,
    pub budget_id: i64,
    pub name: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
