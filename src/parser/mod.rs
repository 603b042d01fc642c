//! Parser service client
//!
//! Defines the client trait for the external constituency parser and the
//! errors a request can end in. Two implementations:
//! - `CoreNlpClient`: HTTP client for a CoreNLP server (production)
//! - `MockParser`: returns preconfigured parses (testing)
//!
//! The service answers one sentence per request with a bracketed tree; the
//! caller turns that text into a [`crate::tree::ParseTree`].

mod corenlp;

pub use corenlp::{ClientConfig, CoreNlpClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// Errors from parser client operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error("parser service unreachable: {0}")]
    Unreachable(String),

    #[error("parser request timed out after {0:?}")]
    Timeout(Duration),

    #[error("parser rejected request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid parser response: {0}")]
    InvalidResponse(String),
}

impl ParserError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ParserError::Unreachable(_) | ParserError::Timeout(_) => true,
            ParserError::Rejected { status, .. } => *status >= 500,
            ParserError::InvalidResponse(_) => false,
        }
    }
}

/// Bounded retry with linear backoff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 250,
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based)
    pub fn backoff(&self, attempt: usize) -> Duration {
        Duration::from_millis(self.base_backoff_ms.saturating_mul(attempt as u64))
    }
}

/// Client trait for the parsing service.
///
/// Abstracts over transport so the corpus driver doesn't depend on how the
/// parser is reached.
#[async_trait]
pub trait ParserClient: Send + Sync {
    /// Check if the service is reachable.
    async fn is_available(&self) -> bool;

    /// Parse one sentence, returning the best parse as bracketed tree text.
    async fn parse(&self, text: &str) -> Result<String, ParserError>;
}

/// Mock parser for testing. Returns preconfigured parses keyed by the
/// exact request text, and remembers every request it received.
pub struct MockParser {
    available: bool,
    responses: HashMap<String, Result<String, ParserError>>,
    requests: Mutex<Vec<String>>,
}

impl MockParser {
    /// Create a mock parser that reports as available.
    pub fn available() -> Self {
        Self {
            available: true,
            responses: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock parser that reports as unavailable.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::available()
        }
    }

    /// Register the bracketed tree returned for `text`.
    pub fn with_tree(mut self, text: impl Into<String>, tree: impl Into<String>) -> Self {
        self.responses.insert(text.into(), Ok(tree.into()));
        self
    }

    /// Register a failure for `text`.
    pub fn with_failure(mut self, text: impl Into<String>, error: ParserError) -> Self {
        self.responses.insert(text.into(), Err(error));
        self
    }

    /// Texts received so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ParserClient for MockParser {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn parse(&self, text: &str) -> Result<String, ParserError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(text.to_string());
        }
        if !self.available {
            return Err(ParserError::Unreachable(
                "mock parser configured as unavailable".to_string(),
            ));
        }
        match self.responses.get(text) {
            Some(response) => response.clone(),
            None => Err(ParserError::InvalidResponse(format!(
                "no mock parse for '{}'",
                text
            ))),
        }
    }
}
