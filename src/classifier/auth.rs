// src/classifier/auth.rs
//! Bearer token acquisition. Tokens are not cached: every classification
//! fetches a fresh one.

use std::time::Duration;

use reqwest::header::ACCEPT;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::ClassifierSettings;

/// Upper bound for the token request.
const TOKEN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token endpoint returned {0}")]
    Status(u16),

    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange client credentials (HTTP Basic) plus scope for an access token.
/// Each call carries a fresh `RqUID` correlation id.
pub async fn fetch_access_token(
    http: &reqwest::Client,
    settings: &ClassifierSettings,
) -> Result<String, AuthError> {
    let creds = &settings.credentials;
    let resp = http
        .post(&settings.auth_url)
        .timeout(TOKEN_TIMEOUT)
        .basic_auth(&creds.client_id, Some(&creds.client_secret))
        .header(ACCEPT, "application/json")
        .header("RqUID", Uuid::new_v4().to_string())
        .form(&[("scope", settings.scope.as_str())])
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(AuthError::Status(status.as_u16()));
    }
    let body: TokenResponse = resp.json().await?;
    Ok(body.access_token)
}
