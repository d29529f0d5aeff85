//! Ports for the embedding and text-completion upstreams.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by embedding and completion adapters.
    pub enum GenerativeClientError {
        /// The upstream rejected the request or was unreachable.
        Upstream { message: String } =>
            "generative upstream failed: {message}",
        /// The upstream returned a payload the adapter could not use.
        MalformedResponse { message: String } =>
            "generative upstream returned malformed response: {message}",
    }
}

/// A generated embedding with usage accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingResponse {
    /// Dense vector of [`super::EMBEDDING_DIMENSIONS`] dimensions.
    pub vector: Vec<f32>,
    pub prompt_tokens: u32,
    pub cost_usd: f64,
}

/// Port for the text-embedding upstream.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<EmbeddingResponse, GenerativeClientError>;
}

/// Sampling parameters for a completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 500,
        }
    }
}

/// Port for the text-completion upstream.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: CompletionParams,
    ) -> Result<String, GenerativeClientError>;
}

/// Fixture embedding client returning a constant zero vector.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureEmbeddingClient;

#[async_trait]
impl EmbeddingClient for FixtureEmbeddingClient {
    async fn embed(&self, _text: &str) -> Result<EmbeddingResponse, GenerativeClientError> {
        Ok(EmbeddingResponse {
            vector: vec![0.0; super::EMBEDDING_DIMENSIONS],
            prompt_tokens: 0,
            cost_usd: 0.0,
        })
    }
}

/// Fixture completion client returning a canned question.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCompletionClient;

#[async_trait]
impl CompletionClient for FixtureCompletionClient {
    async fn complete(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _params: CompletionParams,
    ) -> Result<String, GenerativeClientError> {
        Ok("What have you been curious about lately?".to_owned())
    }
}
