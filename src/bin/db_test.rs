// Manual smoke run for the store adapter against a throwaway database.

use budget_tracker::database::db::queries::{self, NewIncome};
use chrono::NaiveDate;
use dotenvy::dotenv;
use rust_decimal::Decimal;
use sqlx::sqlite::SqlitePoolOptions;
use std::str::FromStr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // One connection so the in-memory default stays a single database.
    let db_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    println!("Migrations ran successfully!");

    let owner = "smoke@example.com";

    // ----------------------------------------------------
    // TEST: USERS
    // ----------------------------------------------------
    println!("\n--- Testing: ensure_user ---");
    assert!(queries::ensure_user(&pool, owner).await?, "first sight should insert");
    assert!(!queries::ensure_user(&pool, owner).await?, "second sight should not");

    // ----------------------------------------------------
    // TEST: BUDGETS + EXPENSES
    // ----------------------------------------------------
    println!("\n--- Testing: create_budget ---");
    let budget =
        queries::create_budget(&pool, owner, "Groceries", Decimal::from_str("400").unwrap())
            .await?;
    println!("   > Budget created: {:?}", budget);
    assert!(budget.budget_id > 0, "Failed to create budget, ID invalid.");

    queries::create_expense(&pool, budget.budget_id, "Coffee", Decimal::from_str("4.50").unwrap(), None)
        .await?;
    queries::create_expense(&pool, budget.budget_id, "Milk", Decimal::from_str("2.25").unwrap(), None)
        .await?;

    println!("\n--- Testing: sum_expenses_by_budget ---");
    let (total, count) = queries::sum_expenses_by_budget(&pool, budget.budget_id).await?;
    println!("   > total={} count={}", total, count);
    assert_eq!(total, Decimal::from_str("6.75").unwrap());
    assert_eq!(count, 2);

    // ----------------------------------------------------
    // TEST: INCOMES
    // ----------------------------------------------------
    println!("\n--- Testing: create_income / list_recurring_incomes ---");
    let income = queries::create_income(
        &pool,
        owner,
        &NewIncome {
            name: "Salary",
            amount: Decimal::from_str("2500").unwrap(),
            income_type: "recurring",
            frequency: Some("monthly"),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
        },
    )
    .await?;
    assert!(income.last_processed.is_none(), "new income must start unprocessed");

    let recurring = queries::list_recurring_incomes(&pool).await?;
    assert_eq!(recurring.len(), 1);

    let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    queries::update_last_processed(&pool, income.income_id, today).await?;
    let recurring = queries::list_recurring_incomes(&pool).await?;
    assert_eq!(recurring[0].last_processed, Some(today));

    // ----------------------------------------------------
    // TEST: NOTIFICATIONS
    // ----------------------------------------------------
    println!("\n--- Testing: notifications ---");
    queries::create_notification(&pool, owner, "first").await?;
    queries::create_notification(&pool, owner, "second").await?;
    let list = queries::list_notifications(&pool, owner).await?;
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].message, "second", "most recent must come first");

    let cleared = queries::clear_notifications(&pool, owner).await?;
    assert_eq!(cleared, 2);

    println!("\nAll smoke checks passed!");
    Ok(())
}
