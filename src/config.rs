use std::env;
use std::net::SocketAddr;

use anyhow::Result;

/// Runtime configuration, collected once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// API key for the generative-AI service; empty disables the AI endpoints.
    pub gemini_api_key: String,
    pub gemini_model: String,
    /// Mail relay endpoint + key; empty disables the welcome mail.
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from: String,
    /// Shared secret the external cron caller must present.
    pub cron_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse::<SocketAddr>()?;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://./budget_tracker.db".to_string()),
            bind_addr,
            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            mail_api_url: env::var("MAIL_API_URL").unwrap_or_default(),
            mail_api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "noreply@budget-tracker.local".to_string()),
            cron_secret: env::var("CRON_SECRET").unwrap_or_default(),
        })
    }
}
