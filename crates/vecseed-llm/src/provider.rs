use std::future::Future;

use crate::error::LlmError;

/// A backend that turns texts into fixed-length vectors.
///
/// Implementations must preserve input order: `result[i]` is the embedding of
/// `texts[i]`, and `result.len() == texts.len()`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts in one request.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to communicate or the response is invalid.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, LlmError>> + Send;

    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails or returns no vector.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send {
        let input = vec![text.to_owned()];
        async move {
            let mut vectors = self.embed_batch(&input).await?;
            vectors.pop().ok_or(LlmError::EmptyResponse {
                provider: self.name(),
            })
        }
    }

    /// Model identifier sent to the provider.
    fn model(&self) -> &str;

    fn name(&self) -> &'static str;
}
