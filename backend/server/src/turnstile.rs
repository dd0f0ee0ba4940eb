//! # Turnstile
//!
//! Cloudflare's challenge-response check. The browser widget hands the form a token, we trade it
//! together with our secret for a verdict.
//!
//! ```sh
//! curl -X POST https://challenges.cloudflare.com/turnstile/v0/siteverify \
//!     -H 'content-type: application/json' \
//!     -d '{"response":"<token>","secret":"<secret>"}'
//! ```
//!
//! Anything that goes wrong on the way, including a timeout, is a failed verdict.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::error;

pub const SITEVERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";
pub const VALIDATION_FAILED: &str = "Validation failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub success: bool,
    pub error: Option<String>,
}

impl Verdict {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait BotCheck: Send + Sync {
    async fn verify(&self, token: &str) -> Verdict;
}

#[derive(Serialize)]
struct SiteverifyRequest<'a> {
    response: &'a str,
    secret: &'a str,
}

#[derive(Deserialize)]
struct SiteverifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

pub struct Turnstile {
    client: Client,
    secret: String,
    endpoint: String,
}

impl Turnstile {
    pub fn new(secret: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_endpoint(secret, timeout, SITEVERIFY_URL.to_string())
    }

    pub fn with_endpoint(
        secret: String,
        timeout: Duration,
        endpoint: String,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            secret,
            endpoint,
        })
    }

    async fn siteverify(&self, token: &str) -> Result<SiteverifyResponse, reqwest::Error> {
        self.client
            .post(&self.endpoint)
            .json(&SiteverifyRequest {
                response: token,
                secret: &self.secret,
            })
            .send()
            .await?
            .json()
            .await
    }
}

#[async_trait]
impl BotCheck for Turnstile {
    async fn verify(&self, token: &str) -> Verdict {
        match self.siteverify(token).await {
            Ok(response) => Verdict {
                success: response.success,
                error: response.error_codes.into_iter().next(),
            },
            Err(e) => {
                error!("Turnstile validation error: {e}");
                Verdict::failed(VALIDATION_FAILED)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{from_value, json, to_value};

    use super::*;

    #[test]
    fn test_siteverify_response() {
        let response: SiteverifyResponse = from_value(json!({
            "success": false,
            "error-codes": ["invalid-input-response", "timeout-or-duplicate"]
        }))
        .unwrap();

        assert!(!response.success);
        assert_eq!(response.error_codes[0], "invalid-input-response");

        let response: SiteverifyResponse = from_value(json!({ "success": true })).unwrap();
        assert!(response.success);
        assert!(response.error_codes.is_empty());
    }

    #[test]
    fn test_verdict_json() {
        assert_eq!(
            to_value(Verdict::failed(VALIDATION_FAILED)).unwrap(),
            json!({ "success": false, "error": "Validation failed" })
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails() {
        let turnstile = Turnstile::with_endpoint(
            "secret".to_string(),
            Duration::from_millis(500),
            "http://127.0.0.1:9/siteverify".to_string(),
        )
        .unwrap();

        assert_eq!(
            turnstile.verify("token").await,
            Verdict::failed(VALIDATION_FAILED)
        );
    }
}
