// Store adapter tests against an in-memory SQLite database.

use std::str::FromStr;

use budget_tracker::core::csv_import::parse_expense_csv;
use budget_tracker::database::db::queries::{self, NewIncome};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

// A single connection keeps every query on the same in-memory database.
async fn test_pool() -> Pool<Sqlite> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[tokio::test]
async fn budget_aggregates_sum_and_count_expenses() {
    let pool = test_pool().await;
    let budget = queries::create_budget(&pool, "a@example.com", "Food", dec("100"))
        .await
        .unwrap();

    queries::create_expense(&pool, budget.budget_id, "Coffee", dec("10"), None)
        .await
        .unwrap();
    queries::create_expense(&pool, budget.budget_id, "Lunch", dec("15"), None)
        .await
        .unwrap();

    let (total, count) = queries::sum_expenses_by_budget(&pool, budget.budget_id)
        .await
        .unwrap();
    assert_eq!(total, dec("25"));
    assert_eq!(count, 2);
}

#[tokio::test]
async fn empty_budget_aggregates_to_zero() {
    let pool = test_pool().await;
    let budget = queries::create_budget(&pool, "a@example.com", "Travel", dec("500"))
        .await
        .unwrap();

    let (total, count) = queries::sum_expenses_by_budget(&pool, budget.budget_id)
        .await
        .unwrap();
    assert_eq!(total, Decimal::ZERO);
    assert_eq!(count, 0);
}

#[tokio::test]
async fn deleting_a_budget_removes_its_expenses() {
    let pool = test_pool().await;
    let owner = "a@example.com";
    let budget = queries::create_budget(&pool, owner, "Food", dec("100"))
        .await
        .unwrap();
    queries::create_expense(&pool, budget.budget_id, "Coffee", dec("4.50"), None)
        .await
        .unwrap();

    assert!(queries::delete_budget(&pool, owner, budget.budget_id).await.unwrap());
    let (total, count) = queries::sum_expenses_by_budget(&pool, budget.budget_id)
        .await
        .unwrap();
    assert_eq!(total, Decimal::ZERO);
    assert_eq!(count, 0);
}

#[tokio::test]
async fn budgets_are_scoped_to_their_owner() {
    let pool = test_pool().await;
    let budget = queries::create_budget(&pool, "a@example.com", "Food", dec("100"))
        .await
        .unwrap();

    assert!(queries::get_budget(&pool, "b@example.com", budget.budget_id)
        .await
        .unwrap()
        .is_none());
    assert!(!queries::delete_budget(&pool, "b@example.com", budget.budget_id)
        .await
        .unwrap());
}

#[tokio::test]
async fn notifications_list_most_recent_first() {
    let pool = test_pool().await;
    let user = "a@example.com";

    queries::create_notification(&pool, user, "t1").await.unwrap();
    queries::create_notification(&pool, user, "t2").await.unwrap();
    queries::create_notification(&pool, user, "t3").await.unwrap();

    let messages: Vec<String> = queries::list_notifications(&pool, user)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.message)
        .collect();
    assert_eq!(messages, ["t3", "t2", "t1"]);
}

#[tokio::test]
async fn clearing_notifications_only_touches_the_caller() {
    let pool = test_pool().await;
    queries::create_notification(&pool, "a@example.com", "for a").await.unwrap();
    queries::create_notification(&pool, "b@example.com", "for b").await.unwrap();

    let cleared = queries::clear_notifications(&pool, "a@example.com").await.unwrap();
    assert_eq!(cleared, 1);

    let remaining = queries::list_notifications(&pool, "b@example.com").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].message, "for b");
}

#[tokio::test]
async fn mark_notification_read_flips_the_flag() {
    let pool = test_pool().await;
    let user = "a@example.com";
    let id = queries::create_notification(&pool, user, "hello").await.unwrap();

    assert!(queries::mark_notification_read(&pool, user, id, true).await.unwrap());
    let list = queries::list_notifications(&pool, user).await.unwrap();
    assert!(list[0].read);

    // Someone else's id is a miss, not a cross-user write.
    assert!(!queries::mark_notification_read(&pool, "b@example.com", id, false)
        .await
        .unwrap());
}

#[tokio::test]
async fn new_income_starts_with_no_rollover_state() {
    let pool = test_pool().await;
    let income = queries::create_income(
        &pool,
        "a@example.com",
        &NewIncome {
            name: "Salary",
            amount: dec("2500"),
            income_type: "recurring",
            frequency: Some("monthly"),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
        },
    )
    .await
    .unwrap();

    assert!(income.last_processed.is_none());

    let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    queries::update_last_processed(&pool, income.income_id, date).await.unwrap();

    let rows = queries::list_recurring_incomes(&pool).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].last_processed, Some(date));
    assert_eq!(rows[0].frequency.as_deref(), Some("monthly"));
}

#[tokio::test]
async fn csv_batch_insert_lands_every_row() {
    let pool = test_pool().await;
    let budget = queries::create_budget(&pool, "a@example.com", "Food", dec("100"))
        .await
        .unwrap();

    let records = parse_expense_csv(
        "date,name,amount,description\n\
         2024-01-05,Coffee,4.50,morning\n\
         2024-01-06,Lunch,12.00,",
    )
    .unwrap();

    let inserted = queries::insert_expense_batch(&pool, budget.budget_id, &records)
        .await
        .unwrap();
    assert_eq!(inserted, 2);

    let expenses = queries::list_expenses(&pool, budget.budget_id).await.unwrap();
    assert_eq!(expenses.len(), 2);
    assert_eq!(expenses[0].name, "Lunch");
    assert_eq!(expenses[1].description.as_deref(), Some("morning"));

    let (total, count) = queries::sum_expenses_by_budget(&pool, budget.budget_id)
        .await
        .unwrap();
    assert_eq!(total, dec("16.50"));
    assert_eq!(count, 2);
}
