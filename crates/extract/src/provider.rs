use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider returned an empty completion")]
    EmptyResponse,
}

/// One link of the inference fallback chain.
///
/// Implementations render the request over their own transport and return
/// the model's raw text payload. Envelope unwrapping (chat-completion
/// choices, content blocks, candidate parts) is the implementation's
/// concern; fence stripping and JSON validation happen in the resolver.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, prompt: &str) -> Result<String, ProviderError>;
}

// ── Mock provider (used for chain-order tests) ────────────────────────────────

/// Returns a canned payload or a canned failure, counting invocations so
/// tests can assert which links of the chain were actually consulted.
pub struct MockProvider {
    name: &'static str,
    payload: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn succeeding(name: &'static str, payload: impl Into<String>) -> Self {
        Self { name, payload: Some(payload.into()), calls: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn failing(name: &'static str) -> Self {
        Self { name, payload: None, calls: Arc::new(AtomicUsize::new(0)) }
    }

    /// Handle to the invocation counter; stays readable after the provider
    /// has been boxed into a chain.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl InferenceProvider for MockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn attempt(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.payload {
            Some(payload) => Ok(payload.clone()),
            None => Err(ProviderError::EmptyResponse),
        }
    }
}
