pub mod auth;
pub mod error;
mod handlers;
mod routes;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use sqlx::{Pool, Sqlite};

use crate::ai::{AdviceService, GeminiClient};
use crate::config::Config;
use crate::notify::{HttpMailer, Mailer};

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub config: Arc<Config>,
    pub ai: Arc<dyn AdviceService>,
    pub mailer: Arc<dyn Mailer>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "Backend is running" }))
        .merge(routes::api_routes())
        .with_state(state)
}

pub async fn run_server(pool: Pool<Sqlite>, config: Config) -> anyhow::Result<()> {
    let ai = GeminiClient::new(config.gemini_api_key.clone(), config.gemini_model.clone());
    let mailer = HttpMailer::new(
        config.mail_api_url.clone(),
        config.mail_api_key.clone(),
        config.mail_from.clone(),
    );

    let addr = config.bind_addr;
    let state = AppState {
        db: pool,
        config: Arc::new(config),
        ai: Arc::new(ai),
        mailer: Arc::new(mailer),
    };

    tracing::info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
