use std::time::Duration;

use axum::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::receipt::parser::ParsedReceipt;

/// Optional second pass over a parsed receipt. Implementations may call out
/// to an LLM to correct item names or totals; the rule-based result must
/// stand on its own, so a `None` here is never an error.
#[async_trait]
pub trait ReceiptVerifier: Send + Sync {
    async fn verify(&self, raw_text: &str, parsed: &ParsedReceipt) -> Option<ParsedReceipt>;
}

/// Used when no verifier is configured and in tests.
#[derive(Clone)]
pub struct NoopVerifier;

#[async_trait]
impl ReceiptVerifier for NoopVerifier {
    async fn verify(&self, _raw_text: &str, _parsed: &ParsedReceipt) -> Option<ParsedReceipt> {
        None
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    raw_text: &'a str,
    parsed: &'a ParsedReceipt,
}

/// POSTs the raw text and the rule-based parse to an external endpoint and
/// expects a corrected receipt back. Every transport or decoding failure
/// falls back to the rule-based result silently.
pub struct HttpVerifier {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpVerifier {
    pub fn new(url: String, token: Option<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client, url, token })
    }
}

#[async_trait]
impl ReceiptVerifier for HttpVerifier {
    async fn verify(&self, raw_text: &str, parsed: &ParsedReceipt) -> Option<ParsedReceipt> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&VerifyRequest { raw_text, parsed });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(error = %e, "receipt verifier unreachable, using rule-based parse");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(status = %response.status(), "receipt verifier rejected request");
            return None;
        }

        match response.json::<ParsedReceipt>().await {
            Ok(mut verified) => {
                verified.source = "llm".to_string();
                Some(verified)
            }
            Err(e) => {
                debug!(error = %e, "receipt verifier returned malformed body");
                None
            }
        }
    }
}
