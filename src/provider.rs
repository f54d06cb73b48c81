use crate::{Error, GenerationRequest, Response};

/// A trait for text completion providers.
/// All responses are internally streamed - use `response.stream()` for streaming
/// or `response.text().await` for buffered text.
#[async_trait::async_trait]
pub trait TextProvider: Send + Sync + 'static {
    /// Generate a completion for the given request (internally always streams).
    async fn generate(&self, request: &GenerationRequest) -> Result<Response, Error>;
}
