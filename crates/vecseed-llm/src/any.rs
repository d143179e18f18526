#[cfg(feature = "mock")]
use crate::mock::MockEmbedder;
use crate::openai::OpenAiEmbedder;
use crate::{LlmError, provider::EmbeddingProvider};

/// Generates a match over all `AnyEmbedder` variants, binding the inner provider
/// and evaluating the given expression for each arm.
macro_rules! delegate_embedder {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyEmbedder::OpenAi($p) => $expr,
            #[cfg(feature = "mock")]
            AnyEmbedder::Mock($p) => $expr,
        }
    };
}

#[derive(Debug, Clone)]
pub enum AnyEmbedder {
    OpenAi(OpenAiEmbedder),
    #[cfg(feature = "mock")]
    Mock(MockEmbedder),
}

impl EmbeddingProvider for AnyEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        delegate_embedder!(self, |p| p.embed_batch(texts).await)
    }

    fn model(&self) -> &str {
        delegate_embedder!(self, |p| p.model())
    }

    fn name(&self) -> &'static str {
        delegate_embedder!(self, |p| p.name())
    }
}
