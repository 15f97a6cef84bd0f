use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

use crate::core::csv_import::CsvRecord;
use crate::database::models::{Budget, BudgetSummary, Expense, Income, Notification};

/*
This file contains the CRUD logic for every entity and is the only place
that talks SQL. Money columns are TEXT holding exact decimal strings, so
amounts are decoded through `Decimal::from_str_exact` instead of FromRow.
 */

fn decimal_column(row: &SqliteRow, name: &str) -> Result<Decimal, sqlx::Error> {
    let text: String = row.try_get(name)?;
    Decimal::from_str_exact(&text)
        .map_err(|e| sqlx::Error::Decode(format!("invalid decimal in '{name}': {e}").into()))
}

/*==========User Queries===========*/

// Records the caller the first time it is seen. Returns true when the row
// was actually inserted, which is the "first sign-in" signal.
pub async fn ensure_user(pool: &Pool<Sqlite>, email: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (email, created_at)
        VALUES (?, ?)
        ON CONFLICT(email) DO NOTHING
        "#,
    )
    .bind(email)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_users(pool: &Pool<Sqlite>) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query("SELECT email FROM users ORDER BY email ASC")
        .fetch_all(pool)
        .await?;

    rows.iter().map(|r| r.try_get("email")).collect()
}

/*==========Budget Queries===========*/

fn map_budget(row: &SqliteRow) -> Result<Budget, sqlx::Error> {
    Ok(Budget {
        budget_id: row.try_get("budget_id")?,
        name: row.try_get("name")?,
        amount: decimal_column(row, "amount")?,
        owner: row.try_get("owner")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn create_budget(
    pool: &Pool<Sqlite>,
    owner: &str,
    name: &str,
    amount: Decimal,
) -> Result<Budget, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO budgets (name, amount, owner, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING budget_id, name, amount, owner, created_at
        "#,
    )
    .bind(name)
    .bind(amount.to_string())
    .bind(owner)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    map_budget(&row)
}

pub async fn get_budget(
    pool: &Pool<Sqlite>,
    owner: &str,
    budget_id: i64,
) -> Result<Option<Budget>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT budget_id, name, amount, owner, created_at
        FROM budgets
        WHERE budget_id = ? AND owner = ?
        "#,
    )
    .bind(budget_id)
    .bind(owner)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(map_budget).transpose()
}

pub async fn list_budgets(pool: &Pool<Sqlite>, owner: &str) -> Result<Vec<Budget>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT budget_id, name, amount, owner, created_at
        FROM budgets
        WHERE owner = ?
        ORDER BY budget_id ASC
        "#,
    )
    .bind(owner)
    .fetch_all(pool)
    .await?
    .iter()
    .map(map_budget)
    .collect()
}

pub async fn update_budget(
    pool: &Pool<Sqlite>,
    owner: &str,
    budget_id: i64,
    name: &str,
    amount: Decimal,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE budgets
        SET name = ?, amount = ?
        WHERE budget_id = ? AND owner = ?
        "#,
    )
    .bind(name)
    .bind(amount.to_string())
    .bind(budget_id)
    .bind(owner)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// Deleting a budget removes its expense rows in the same transaction.
pub async fn delete_budget(
    pool: &Pool<Sqlite>,
    owner: &str,
    budget_id: i64,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        DELETE FROM expenses
        WHERE budget_id IN (SELECT budget_id FROM budgets WHERE budget_id = ? AND owner = ?)
        "#,
    )
    .bind(budget_id)
    .bind(owner)
    .execute(&mut *tx)
    .await?;

    let result = sqlx::query("DELETE FROM budgets WHERE budget_id = ? AND owner = ?")
        .bind(budget_id)
        .bind(owner)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(result.rows_affected() > 0)
}

/// Derived spend for one budget: exact sum plus row count. The amounts are
/// summed in Rust so TEXT decimals never round-trip through floats.
pub async fn sum_expenses_by_budget(
    pool: &Pool<Sqlite>,
    budget_id: i64,
) -> Result<(Decimal, i64), sqlx::Error> {
    let rows = sqlx::query("SELECT amount FROM expenses WHERE budget_id = ?")
        .bind(budget_id)
        .fetch_all(pool)
        .await?;

    let mut total = Decimal::ZERO;
    for row in &rows {
        total += decimal_column(row, "amount")?;
    }

    Ok((total, rows.len() as i64))
}

pub async fn budget_summaries(
    pool: &Pool<Sqlite>,
    owner: &str,
) -> Result<Vec<BudgetSummary>, sqlx::Error> {
    let budgets = list_budgets(pool, owner).await?;

    let mut out = Vec::with_capacity(budgets.len());
    for budget in budgets {
        let (total_spend, total_item) = sum_expenses_by_budget(pool, budget.budget_id).await?;
        out.push(BudgetSummary {
            budget,
            total_spend,
            total_item,
        });
    }
    Ok(out)
}

/*==========Expense Queries===========*/

fn map_expense(row: &SqliteRow) -> Result<Expense, sqlx::Error> {
    Ok(Expense {
        expense_id: row.try_get("expense_id")?,
        budget_id: row.try_get("budget_id")?,
        name: row.try_get("name")?,
        amount: decimal_column(row, "amount")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn create_expense(
    pool: &Pool<Sqlite>,
    budget_id: i64,
    name: &str,
    amount: Decimal,
    description: Option<&str>,
) -> Result<Expense, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO expenses (budget_id, name, amount, description, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING expense_id, budget_id, name, amount, description, created_at
        "#,
    )
    .bind(budget_id)
    .bind(name)
    .bind(amount.to_string())
    .bind(description)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    map_expense(&row)
}

pub async fn list_expenses(
    pool: &Pool<Sqlite>,
    budget_id: i64,
) -> Result<Vec<Expense>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT expense_id, budget_id, name, amount, description, created_at
        FROM expenses
        WHERE budget_id = ?
        ORDER BY created_at DESC, expense_id DESC
        "#,
    )
    .bind(budget_id)
    .fetch_all(pool)
    .await?
    .iter()
    .map(map_expense)
    .collect()
}

pub async fn delete_expense(
    pool: &Pool<Sqlite>,
    owner: &str,
    expense_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM expenses
        WHERE expense_id = ?
          AND budget_id IN (SELECT budget_id FROM budgets WHERE owner = ?)
        "#,
    )
    .bind(expense_id)
    .bind(owner)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// Batch insert for a validated CSV import. All rows land or none do.
pub async fn insert_expense_batch(
    pool: &Pool<Sqlite>,
    budget_id: i64,
    records: &[CsvRecord],
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    for record in records {
        let created_at: DateTime<Utc> = record
            .date
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc();
        let description = (!record.description.is_empty()).then_some(record.description.as_str());

        sqlx::query(
            r#"
            INSERT INTO expenses (budget_id, name, amount, description, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(budget_id)
        .bind(&record.name)
        .bind(record.amount.to_string())
        .bind(description)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(records.len() as u64)
}

// Total spend across all of a user's budgets, for reports and advice.
pub async fn total_spend(pool: &Pool<Sqlite>, owner: &str) -> Result<Decimal, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT e.amount
        FROM expenses e
        JOIN budgets b ON b.budget_id = e.budget_id
        WHERE b.owner = ?
        "#,
    )
    .bind(owner)
    .fetch_all(pool)
    .await?;

    let mut total = Decimal::ZERO;
    for row in &rows {
        total += decimal_column(row, "amount")?;
    }
    Ok(total)
}

/*==========Income Queries===========*/

fn map_income(row: &SqliteRow) -> Result<Income, sqlx::Error> {
    Ok(Income {
        income_id: row.try_get("income_id")?,
        name: row.try_get("name")?,
        amount: decimal_column(row, "amount")?,
        income_type: row.try_get("income_type")?,
        frequency: row.try_get("frequency")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        last_processed: row.try_get("last_processed")?,
        owner: row.try_get("owner")?,
        created_at: row.try_get("created_at")?,
    })
}

pub struct NewIncome<'a> {
    pub name: &'a str,
    pub amount: Decimal,
    pub income_type: &'a str,
    pub frequency: Option<&'a str>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

pub async fn create_income(
    pool: &Pool<Sqlite>,
    owner: &str,
    income: &NewIncome<'_>,
) -> Result<Income, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO incomes
            (name, amount, income_type, frequency, start_date, end_date,
             last_processed, owner, created_at)
        VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?)
        RETURNING income_id, name, amount, income_type, frequency, start_date,
                  end_date, last_processed, owner, created_at
        "#,
    )
    .bind(income.name)
    .bind(income.amount.to_string())
    .bind(income.income_type)
    .bind(income.frequency)
    .bind(income.start_date)
    .bind(income.end_date)
    .bind(owner)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    map_income(&row)
}

pub async fn list_incomes(pool: &Pool<Sqlite>, owner: &str) -> Result<Vec<Income>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT income_id, name, amount, income_type, frequency, start_date,
               end_date, last_processed, owner, created_at
        FROM incomes
        WHERE owner = ?
        ORDER BY income_id ASC
        "#,
    )
    .bind(owner)
    .fetch_all(pool)
    .await?
    .iter()
    .map(map_income)
    .collect()
}

// All recurring rows across every owner; input set for the rollover pass.
pub async fn list_recurring_incomes(pool: &Pool<Sqlite>) -> Result<Vec<Income>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT income_id, name, amount, income_type, frequency, start_date,
               end_date, last_processed, owner, created_at
        FROM incomes
        WHERE income_type = 'recurring'
        ORDER BY income_id ASC
        "#,
    )
    .fetch_all(pool)
    .await?
    .iter()
    .map(map_income)
    .collect()
}

// Only the evaluator's outcome ever lands here; name/amount edits go
// through update_income.
pub async fn update_last_processed(
    pool: &Pool<Sqlite>,
    income_id: i64,
    date: NaiveDate,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE incomes SET last_processed = ? WHERE income_id = ?")
        .bind(date)
        .bind(income_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn update_income(
    pool: &Pool<Sqlite>,
    owner: &str,
    income_id: i64,
    name: &str,
    amount: Decimal,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE incomes
        SET name = ?, amount = ?
        WHERE income_id = ? AND owner = ?
        "#,
    )
    .bind(name)
    .bind(amount.to_string())
    .bind(income_id)
    .bind(owner)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_income(
    pool: &Pool<Sqlite>,
    owner: &str,
    income_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM incomes WHERE income_id = ? AND owner = ?")
        .bind(income_id)
        .bind(owner)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/*==========Notification Queries===========*/

pub async fn create_notification(
    pool: &Pool<Sqlite>,
    recipient: &str,
    message: &str,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO notifications (recipient, message, read, created_at)
        VALUES (?, ?, 0, ?)
        RETURNING notification_id
        "#,
    )
    .bind(recipient)
    .bind(message)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    row.try_get("notification_id")
}

// Most recent first; the id tie-break keeps same-timestamp rows stable.
pub async fn list_notifications(
    pool: &Pool<Sqlite>,
    recipient: &str,
) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(
        r#"
        SELECT notification_id, recipient, message, read, created_at
        FROM notifications
        WHERE recipient = ?
        ORDER BY created_at DESC, notification_id DESC
        "#,
    )
    .bind(recipient)
    .fetch_all(pool)
    .await
}

pub async fn mark_notification_read(
    pool: &Pool<Sqlite>,
    recipient: &str,
    notification_id: i64,
    read: bool,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE notifications
        SET read = ?
        WHERE notification_id = ? AND recipient = ?
        "#,
    )
    .bind(read)
    .bind(notification_id)
    .bind(recipient)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// Scoped to the caller. The system this replaces cleared every user's
// notifications here; that was a bug, not a contract.
pub async fn clear_notifications(pool: &Pool<Sqlite>, recipient: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notifications WHERE recipient = ?")
        .bind(recipient)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
