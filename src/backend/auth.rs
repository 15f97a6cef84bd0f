use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::backend::error::ApiError;
use crate::backend::AppState;
use crate::database::db::queries;

/// The upstream auth provider verifies the session and forwards the
/// caller's identity in this header; the backend trusts it as-is.
const USER_HEADER: &str = "x-user-email";

/// Verified caller identity. Extraction fails with 401 when the header is
/// absent. The first request from a new identity registers the user and
/// fires the welcome mail without blocking the response.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let email = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ApiError::Unauthorized)?
            .to_string();

        if queries::ensure_user(&state.db, &email).await? {
            let mailer = state.mailer.clone();
            let recipient = email.clone();
            tokio::spawn(async move {
                if let Err(err) = mailer.send_welcome(&recipient).await {
                    tracing::warn!(recipient = %recipient, error = %err, "welcome mail failed");
                }
            });
        }

        Ok(AuthUser(email))
    }
}
