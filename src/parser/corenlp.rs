//! HTTP client for a CoreNLP server

use super::{ParserClient, ParserError, RetryPolicy};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Configuration for the CoreNLP client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server to talk to; when unset the supervised server's address is used
    pub url: Option<String>,
    /// Timeout for a single parse request in milliseconds
    pub request_timeout_ms: u64,
    /// Ask the server to split tokens on whitespace only, so contractions
    /// supplied as one corpus token stay one leaf
    pub whitespace_tokenize: bool,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: None,
            request_timeout_ms: 60_000,
            whitespace_tokenize: false,
            retry: RetryPolicy::default(),
        }
    }
}

/// Annotators requested for every sentence
const ANNOTATORS: &str = "tokenize,ssplit,pos,parse";

#[derive(Debug, Deserialize)]
struct AnnotationResponse {
    #[serde(default)]
    sentences: Vec<AnnotatedSentence>,
}

#[derive(Debug, Deserialize)]
struct AnnotatedSentence {
    #[serde(default)]
    parse: Option<String>,
}

/// Parser client speaking the CoreNLP server's HTTP protocol.
///
/// Each request posts the sentence text with a `properties` query that
/// forces a single sentence and JSON output; the first sentence's `parse`
/// field is returned.
#[derive(Debug, Clone)]
pub struct CoreNlpClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    properties: String,
    retry: RetryPolicy,
}

impl CoreNlpClient {
    pub fn new(base_url: impl Into<String>, config: &ClientConfig) -> Self {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let mut properties = serde_json::json!({
            "annotators": ANNOTATORS,
            "outputFormat": "json",
            "ssplit.isOneSentence": "true",
        });
        if config.whitespace_tokenize {
            properties["tokenize.whitespace"] = serde_json::Value::from("true");
        }

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            properties: properties.to_string(),
            retry: config.retry.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn classify(&self, error: reqwest::Error) -> ParserError {
        if error.is_timeout() {
            ParserError::Timeout(self.timeout)
        } else {
            ParserError::Unreachable(format!("{}: {}", self.base_url, error))
        }
    }

    async fn request_once(&self, text: &str) -> Result<String, ParserError> {
        let response = self
            .http
            .post(format!("{}/", self.base_url))
            .query(&[("properties", self.properties.as_str())])
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(text.to_string())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        if !status.is_success() {
            return Err(ParserError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        first_parse(&body)
    }
}

/// Pull the first sentence's parse out of a CoreNLP JSON response
pub(crate) fn first_parse(body: &str) -> Result<String, ParserError> {
    let response: AnnotationResponse = serde_json::from_str(body)
        .map_err(|e| ParserError::InvalidResponse(format!("not an annotation document: {}", e)))?;
    response
        .sentences
        .into_iter()
        .next()
        .ok_or_else(|| ParserError::InvalidResponse("response has no sentences".to_string()))?
        .parse
        .ok_or_else(|| ParserError::InvalidResponse("first sentence has no parse".to_string()))
}

#[async_trait]
impl ParserClient for CoreNlpClient {
    async fn is_available(&self) -> bool {
        match self.http.get(format!("{}/live", self.base_url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    #[instrument(name = "corenlp_parse", skip(self, text), fields(chars = text.len()))]
    async fn parse(&self, text: &str) -> Result<String, ParserError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.request_once(text).await {
                Ok(tree) => {
                    debug!(attempt, "parse received");
                    return Ok(tree);
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    warn!(attempt, max_attempts, error = %e, "parse request failed, retrying");
                }
                Err(e) => return Err(e),
            }
            tokio::time::sleep(self.retry.backoff(attempt)).await;
        }
    }
}
