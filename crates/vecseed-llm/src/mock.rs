//! Test-only mock embedding provider.

use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::EmbeddingProvider;

/// Deterministic embedder: every text maps to a vector derived from its bytes.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    pub dim: usize,
    /// Fail the call with this 0-based index (counting `embed_batch` calls).
    pub fail_on_call: Option<usize>,
    /// Milliseconds to sleep before returning a response.
    pub delay_ms: u64,
    calls: Arc<Mutex<Vec<usize>>>,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self {
            dim: 8,
            fail_on_call: None,
            delay_ms: 0,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockEmbedder {
    #[must_use]
    pub fn with_dim(dim: usize) -> Self {
        Self {
            dim,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_on_call: Some(0),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Batch sizes of every `embed_batch` call so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim.max(1)];
        for (i, b) in text.bytes().enumerate() {
            let slot = i % v.len();
            v[slot] += f32::from(b) / 255.0;
        }
        v
    }
}

impl EmbeddingProvider for MockEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(texts.len());
            calls.len() - 1
        };
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.fail_on_call == Some(call) {
            return Err(LlmError::Other("mock embedding error".into()));
        }
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn model(&self) -> &str {
        "mock-embedding"
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
