//! Credential validation against the live Kling API.
//!
//! Validation issues a token and fires one minimal text-to-video creation
//! call. Interpretation of the probe is deliberately vendor-specific: 429 is
//! quota/balance exhaustion, and a 400 that is not about authorization counts
//! as "credentials work".

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth;
use crate::config::Credentials;
use crate::error::CredentialError;

/// Timeout for the validation probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Validate an access/secret key pair. Performs exactly one outbound call,
/// with no retries.
pub async fn validate_credentials(
    credentials: &Credentials,
    base_url: &str,
) -> Result<(), CredentialError> {
    if credentials.access_key.trim().is_empty() {
        return Err(CredentialError::MissingAccessKey);
    }
    if credentials.secret_key.trim().is_empty() {
        return Err(CredentialError::MissingSecretKey);
    }

    let token = auth::issue_token(&credentials.access_key, &credentials.secret_key)?;

    let url = format!(
        "{}/v1/videos/text2video",
        base_url.trim_end_matches('/')
    );
    let payload = json!({
        "model_name": "kling-v1",
        "prompt": "hello",
        "duration": "5",
        "aspect_ratio": "16:9",
    });

    info!("probing Kling API to validate credentials");
    let response = reqwest::Client::new()
        .post(&url)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .json(&payload)
        .timeout(PROBE_TIMEOUT)
        .send()
        .await
        .map_err(|e| CredentialError::Unreachable(e.to_string()))?;

    let status = response.status().as_u16();
    if status == 429 {
        warn!("credential probe returned 429");
        return Err(CredentialError::InsufficientBalance);
    }

    let body = response.text().await.unwrap_or_default();

    if status != 200 && status != 400 {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| body.clone());
        warn!(status, "credential probe rejected");
        return Err(CredentialError::Rejected { status, message });
    }

    if status == 400 {
        // A 400 unrelated to auth still proves the token was accepted.
        match serde_json::from_str::<Value>(&body) {
            Ok(value) => {
                let message = value
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                if message.contains("Authorization") || message.contains("token") {
                    return Err(CredentialError::AuthenticationFailed(message.to_string()));
                }
            }
            Err(_) => return Err(CredentialError::NonJsonResponse),
        }
    }

    info!("credential probe accepted");
    Ok(())
}
