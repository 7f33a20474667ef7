use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// One piece of a multimodal user message, sent in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    ImageUrl(String),
}

/// Output shape the provider must enforce at generation time, so the reply is
/// guaranteed to parse without free-text heuristics.
#[derive(Debug, Clone)]
pub struct OutputSchema {
    pub name: &'static str,
    pub schema: serde_json::Value,
}

#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("model refused the request: {0}")]
    Refused(String),

    #[error("model returned no output text")]
    EmptyOutput,

    #[error("request cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),
}

/// A provider that can answer one schema-constrained question about images.
#[async_trait]
pub trait VisionClient: Send + Sync {
    /// Run one multimodal completion and return the raw structured-output text.
    ///
    /// `instructions` is the system-level task description; `parts` is the user
    /// message content in send order. The provider binds `format` server-side,
    /// so a successful return is text that parses under that schema.
    async fn complete_structured(
        &self,
        instructions: &str,
        parts: &[ContentPart],
        format: &OutputSchema,
        temperature: f32,
        cancel: &CancellationToken,
    ) -> Result<String, LlmError>;

    /// Get the model name being used
    fn model_name(&self) -> &str;
}
