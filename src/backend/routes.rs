use axum::routing::{delete, get, patch, post, put};
use axum::Router;

use crate::backend::{handlers, AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/budgets",
            post(handlers::create_budget).get(handlers::list_budgets),
        )
        .route(
            "/api/budgets/{id}",
            get(handlers::get_budget)
                .put(handlers::update_budget)
                .delete(handlers::delete_budget),
        )
        .route(
            "/api/budgets/{id}/expenses",
            post(handlers::create_expense).get(handlers::list_expenses),
        )
        .route("/api/expenses/{id}", delete(handlers::delete_expense))
        .route("/api/expenses/import", post(handlers::import_expenses))
        .route(
            "/api/incomes",
            post(handlers::create_income).get(handlers::list_incomes),
        )
        .route(
            "/api/incomes/{id}",
            put(handlers::update_income).delete(handlers::delete_income),
        )
        .route(
            "/api/notifications",
            get(handlers::list_notifications).delete(handlers::clear_notifications),
        )
        .route(
            "/api/notifications/{id}",
            patch(handlers::mark_notification_read),
        )
        .route("/api/ai/advice", post(handlers::generate_advice))
        .route("/api/ai/receipt", post(handlers::scan_receipt))
        .route("/api/cron/recurring", get(handlers::cron_recurring))
        .route("/api/cron/keepalive", get(handlers::cron_keepalive))
        .route("/api/cron/report", get(handlers::cron_report))
}
