use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::ai::AdviceMetrics;
use crate::backend::auth::AuthUser;
use crate::backend::error::ApiError;
use crate::backend::AppState;
use crate::core::csv_import::parse_expense_csv;
use crate::core::recurring::{self, Frequency};
use crate::database::db::queries::{self, NewIncome};
use crate::database::models::Income;

fn require_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation("name is required".to_string()));
    }
    Ok(())
}

fn require_positive(amount: Decimal) -> Result<(), ApiError> {
    if amount <= Decimal::ZERO {
        return Err(ApiError::Validation(
            "amount must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/*==========Budgets===========*/

#[derive(Debug, Deserialize)]
pub struct BudgetRequest {
    pub name: String,
    pub amount: Decimal,
}

pub async fn create_budget(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<BudgetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_name(&req.name)?;
    require_positive(req.amount)?;

    let budget = queries::create_budget(&state.db, &user, req.name.trim(), req.amount).await?;
    Ok((StatusCode::CREATED, Json(budget)))
}

pub async fn list_budgets(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let summaries = queries::budget_summaries(&state.db, &user).await?;
    Ok(Json(summaries))
}

pub async fn get_budget(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(budget_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let budget = queries::get_budget(&state.db, &user, budget_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let (total_spend, total_item) = queries::sum_expenses_by_budget(&state.db, budget_id).await?;

    Ok(Json(crate::database::models::BudgetSummary {
        budget,
        total_spend,
        total_item,
    }))
}

pub async fn update_budget(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(budget_id): Path<i64>,
    Json(req): Json<BudgetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_name(&req.name)?;
    require_positive(req.amount)?;

    let updated =
        queries::update_budget(&state.db, &user, budget_id, req.name.trim(), req.amount).await?;
    if !updated {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "updated": true })))
}

pub async fn delete_budget(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(budget_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if !queries::delete_budget(&state.db, &user, budget_id).await? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "deleted": true })))
}

/*==========Expenses===========*/

#[derive(Debug, Deserialize)]
pub struct ExpenseRequest {
    pub name: String,
    pub amount: Decimal,
    pub description: Option<String>,
}

pub async fn create_expense(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(budget_id): Path<i64>,
    Json(req): Json<ExpenseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_name(&req.name)?;
    require_positive(req.amount)?;

    queries::get_budget(&state.db, &user, budget_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let expense = queries::create_expense(
        &state.db,
        budget_id,
        req.name.trim(),
        req.amount,
        req.description.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn list_expenses(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(budget_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    queries::get_budget(&state.db, &user, budget_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let expenses = queries::list_expenses(&state.db, budget_id).await?;
    Ok(Json(expenses))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(expense_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if !queries::delete_expense(&state.db, &user, expense_id).await? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "deleted": true })))
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub budget_id: i64,
    /// Raw CSV text: header line, then date,name,amount,description rows.
    pub content: String,
}

// All-or-nothing: one invalid row rejects the whole batch with the full
// per-row error list.
pub async fn import_expenses(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<ImportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    queries::get_budget(&state.db, &user, req.budget_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let records = parse_expense_csv(&req.content).map_err(ApiError::CsvRejected)?;
    let imported = queries::insert_expense_batch(&state.db, req.budget_id, &records).await?;

    Ok((StatusCode::CREATED, Json(json!({ "imported": imported }))))
}

/*==========Incomes===========*/

#[derive(Debug, Deserialize)]
pub struct CreateIncomeRequest {
    pub name: String,
    pub amount: Decimal,
    pub income_type: String,
    pub frequency: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

// Exactly one of frequency/end_date may be populated, decided by the type.
fn validate_income_shape(req: &CreateIncomeRequest) -> Result<(), ApiError> {
    match req.income_type.as_str() {
        "recurring" => {
            let frequency = req.frequency.as_deref().ok_or_else(|| {
                ApiError::Validation("frequency is required for recurring incomes".to_string())
            })?;
            frequency
                .parse::<Frequency>()
                .map_err(|e| ApiError::Validation(e.to_string()))?;
            if req.end_date.is_some() {
                return Err(ApiError::Validation(
                    "end_date is not allowed for recurring incomes".to_string(),
                ));
            }
        }
        "non-recurring" => {
            if req.frequency.is_some() {
                return Err(ApiError::Validation(
                    "frequency is only allowed for recurring incomes".to_string(),
                ));
            }
        }
        other => {
            return Err(ApiError::Validation(format!(
                "unknown income type '{other}'"
            )));
        }
    }
    Ok(())
}

/// Income as served to clients: the row plus whether it still counts
/// toward active totals (non-recurring rows expire with their end date).
#[derive(Debug, Serialize)]
pub struct IncomeView {
    #[serde(flatten)]
    pub income: Income,
    pub active: bool,
}

fn income_active(income: &Income, today: NaiveDate) -> bool {
    income.is_recurring() || income.end_date.is_none_or(|end| end >= today)
}

fn total_active_income(incomes: &[Income], today: NaiveDate) -> Decimal {
    incomes
        .iter()
        .filter(|income| income_active(income, today))
        .map(|income| income.amount)
        .sum()
}

pub async fn create_income(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateIncomeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_name(&req.name)?;
    require_positive(req.amount)?;
    validate_income_shape(&req)?;

    let income = queries::create_income(
        &state.db,
        &user,
        &NewIncome {
            name: req.name.trim(),
            amount: req.amount,
            income_type: &req.income_type,
            frequency: req.frequency.as_deref(),
            start_date: req.start_date,
            end_date: req.end_date,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(income)))
}

pub async fn list_incomes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let today = Utc::now().date_naive();
    let views: Vec<IncomeView> = queries::list_incomes(&state.db, &user)
        .await?
        .into_iter()
        .map(|income| {
            let active = income_active(&income, today);
            IncomeView { income, active }
        })
        .collect();

    Ok(Json(views))
}

#[derive(Debug, Deserialize)]
pub struct UpdateIncomeRequest {
    pub name: String,
    pub amount: Decimal,
}

// Only name and amount are user-editable; the rollover state belongs to
// the evaluator.
pub async fn update_income(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(income_id): Path<i64>,
    Json(req): Json<UpdateIncomeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_name(&req.name)?;
    require_positive(req.amount)?;

    if !queries::update_income(&state.db, &user, income_id, req.name.trim(), req.amount).await? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "updated": true })))
}

pub async fn delete_income(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(income_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if !queries::delete_income(&state.db, &user, income_id).await? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "deleted": true })))
}

/*==========Notifications===========*/

pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = queries::list_notifications(&state.db, &user).await?;
    Ok(Json(notifications))
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub read: bool,
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(notification_id): Path<i64>,
    Json(req): Json<MarkReadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !queries::mark_notification_read(&state.db, &user, notification_id, req.read).await? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "read": req.read })))
}

pub async fn clear_notifications(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let cleared = queries::clear_notifications(&state.db, &user).await?;
    Ok(Json(json!({ "cleared": cleared })))
}

/*==========AI===========*/

pub async fn generate_advice(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let today = Utc::now().date_naive();
    let summaries = queries::budget_summaries(&state.db, &user).await?;
    let incomes = queries::list_incomes(&state.db, &user).await?;

    let metrics = AdviceMetrics {
        total_budget: summaries.iter().map(|s| s.budget.amount).sum(),
        total_spend: summaries.iter().map(|s| s.total_spend).sum(),
        total_income: total_active_income(&incomes, today),
        budget_count: summaries.len(),
    };

    let advice = state.ai.generate_advice(&metrics).await?;
    Ok(Json(json!({ "advice": advice })))
}

#[derive(Debug, Deserialize)]
pub struct ReceiptRequest {
    /// Base64-encoded image bytes.
    pub image: String,
    #[serde(default = "default_mime")]
    pub mime_type: String,
}

fn default_mime() -> String {
    "image/jpeg".to_string()
}

pub async fn scan_receipt(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(req): Json<ReceiptRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let image = BASE64
        .decode(req.image.as_bytes())
        .map_err(|_| ApiError::Validation("image must be base64-encoded".to_string()))?;

    let receipt = state.ai.extract_receipt(&image, &req.mime_type).await?;
    Ok(Json(receipt))
}

/*==========Cron entry points===========*/

// The scheduler is an external HTTP caller; it identifies itself with a
// shared bearer secret instead of a user session.
fn require_cron(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let secret = &state.config.cron_secret;
    if secret.is_empty() {
        return Err(ApiError::Unauthorized);
    }

    let expected = format!("Bearer {secret}");
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if presented == Some(expected.as_str()) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

/// Daily rollover. Safe to invoke more than once per day: a row already
/// rolled over today is no longer due.
pub async fn cron_recurring(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_cron(&state, &headers)?;

    let today = Utc::now().date_naive();
    let rows = queries::list_recurring_incomes(&state.db).await?;
    let report = recurring::evaluate(today, &rows);

    let mut processed = 0u64;
    for outcome in report.due() {
        queries::update_last_processed(&state.db, outcome.income_id, today).await?;
        let message = format!("Recurring income '{}' was applied for {}", outcome.name, today);
        queries::create_notification(&state.db, &outcome.owner, &message).await?;
        processed += 1;
    }

    for issue in &report.issues {
        tracing::warn!(
            income_id = issue.income_id,
            reason = %issue.reason,
            "skipped recurring income row"
        );
    }

    Ok(Json(json!({
        "status": "ok",
        "date": today,
        "processed": processed,
        "skipped": report.issues,
    })))
}

pub async fn cron_keepalive(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_cron(&state, &headers)?;

    sqlx::query("SELECT 1").fetch_one(&state.db).await?;
    Ok(Json(json!({ "status": "ok" })))
}

/// Monthly summary: one notification per known user with their totals.
pub async fn cron_report(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_cron(&state, &headers)?;

    let today = Utc::now().date_naive();
    let users = queries::list_users(&state.db).await?;

    let mut notified = 0u64;
    for user in &users {
        let spend = queries::total_spend(&state.db, user).await?;
        let incomes = queries::list_incomes(&state.db, user).await?;
        let income = total_active_income(&incomes, today);

        let message =
            format!("Monthly report as of {today}: {spend} spent, {income} active income.");
        queries::create_notification(&state.db, user, &message).await?;
        notified += 1;
    }

    Ok(Json(json!({ "status": "ok", "notified": notified })))
}
