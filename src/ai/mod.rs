//! Generative-AI capability: financial advice text and receipt-image
//! extraction. The concrete provider sits behind [`AdviceService`] so
//! handlers and tests never depend on the wire format below.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI service is not configured")]
    NotConfigured,
    #[error("AI service request failed")]
    Request(#[from] reqwest::Error),
    #[error("AI service returned an unusable response: {0}")]
    BadResponse(String),
}

/// Aggregates fed into the advice prompt.
#[derive(Debug, Clone)]
pub struct AdviceMetrics {
    pub total_budget: Decimal,
    pub total_spend: Decimal,
    pub total_income: Decimal,
    pub budget_count: usize,
}

#[async_trait]
pub trait AdviceService: Send + Sync {
    async fn generate_advice(&self, metrics: &AdviceMetrics) -> Result<String, AiError>;

    /// Extracts receipt line items from an image. Returns the parsed JSON
    /// object; an empty object means the model judged the image not to be
    /// a receipt.
    async fn extract_receipt(&self, image: &[u8], mime_type: &str) -> Result<Value, AiError>;
}

const RECEIPT_PROMPT: &str = "You are given a photo of a purchase receipt. \
Extract the merchant name, purchase date (YYYY-MM-DD), total amount, and the \
line items as {\"name\", \"amount\"} pairs. Respond with a single JSON object \
{\"merchant\", \"date\", \"total\", \"items\"} and nothing else. If the image \
is not a receipt, respond with exactly {}.";

/// Client for a Gemini-style `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        )
    }

    async fn generate(&self, body: Value) -> Result<String, AiError> {
        if self.api_key.is_empty() {
            return Err(AiError::NotConfigured);
        }

        let response: GenerateResponse = self
            .http
            .post(self.endpoint())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| AiError::BadResponse("no candidate text".to_string()))
    }
}

#[async_trait]
impl AdviceService for GeminiClient {
    async fn generate_advice(&self, metrics: &AdviceMetrics) -> Result<String, AiError> {
        let prompt = format!(
            "Based on these personal finance figures - total budget {}, total \
             spend {}, total income {} across {} budgets - give two short, \
             concrete pieces of advice to help the user manage their money \
             better. Plain text, no markdown.",
            metrics.total_budget, metrics.total_spend, metrics.total_income, metrics.budget_count
        );

        let text = self
            .generate(json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
            .await?;

        Ok(text.trim().to_string())
    }

    async fn extract_receipt(&self, image: &[u8], mime_type: &str) -> Result<Value, AiError> {
        let body = json!({
            "contents": [{
                "parts": [
                    { "text": RECEIPT_PROMPT },
                    { "inline_data": { "mime_type": mime_type, "data": BASE64.encode(image) } },
                ]
            }]
        });

        let text = self.generate(body).await?;
        parse_model_json(&text)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

/// Models often wrap JSON answers in a markdown code fence despite the
/// prompt; strip one before parsing.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    inner.trim()
}

/// Parses the model's reply as a single JSON object. Malformed replies are
/// an error (never retried); `{}` passes through as the not-a-receipt
/// marker.
fn parse_model_json(text: &str) -> Result<Value, AiError> {
    let cleaned = strip_code_fences(text);
    let value: Value = serde_json::from_str(cleaned)
        .map_err(|e| AiError::BadResponse(format!("invalid JSON: {e}")))?;

    if value.is_object() {
        Ok(value)
    } else {
        Err(AiError::BadResponse("expected a JSON object".to_string()))
    }
}
