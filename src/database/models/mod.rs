pub mod budget;
pub mod expense;
pub mod income;
pub mod notification;

pub use budget::{Budget, BudgetSummary};
pub use expense::Expense;
pub use income::Income;
pub use notification::Notification;
