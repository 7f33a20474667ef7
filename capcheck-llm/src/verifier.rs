//! Schema-constrained visual verification of one candidate image.
use crate::traits::{ContentPart, LlmError, OutputSchema, VisionClient};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Verdict produced by the model, validated server-side against
/// [`verdict_schema`] so it always carries both fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub result: bool,
    pub reasoning: String,
}

#[derive(Debug, Error)]
pub enum VerifyError {
    /// Any failure of the underlying model call, transport- or API-side.
    #[error("failed to get a response about the image: {source}")]
    Llm {
        #[from]
        source: LlmError,
    },
    /// The model answered, but not with the promised two-field object.
    #[error("verdict did not match the expected schema: {0}")]
    Schema(String),
}

const SYSTEM_INSTRUCTIONS: &str = "You compare product photos. You will be shown three \
reference images of an object, then one candidate image. Decide whether the candidate \
image shows the same object as the references. Judge only what is visible.";

/// Schema the provider binds at generation time.
pub fn verdict_schema() -> OutputSchema {
    OutputSchema {
        name: "verification_result",
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "result": {
                    "type": "boolean",
                    "description": "true when the candidate image shows the object"
                },
                "reasoning": {
                    "type": "string",
                    "description": "short visual justification for the verdict"
                }
            },
            "required": ["result", "reasoning"],
            "additionalProperties": false
        }),
    }
}

pub struct VisualVerifier {
    client: Arc<dyn VisionClient>,
    references: [String; 3],
    instruction: String,
}

impl VisualVerifier {
    /// `references` are the three known-good shots of the object; `instruction`
    /// describes what to look for in plain language.
    pub fn new(client: Arc<dyn VisionClient>, references: [String; 3], instruction: String) -> Self {
        Self {
            client,
            references,
            instruction,
        }
    }

    /// Ask the model whether `image_url` shows the configured object.
    ///
    /// Sampling is pinned to temperature 0 so repeated calls on identical input
    /// are expected to be stable. The parsed verdict is returned unmodified.
    pub async fn verify(
        &self,
        image_url: &str,
        cancel: &CancellationToken,
    ) -> Result<VerificationResult, VerifyError> {
        let user_text = format!(
            "{}\n\nThe first three images are the references. The final image is the \
             candidate. Answer with `result` (true or false) and a short `reasoning`.",
            self.instruction
        );

        let mut parts = Vec::with_capacity(self.references.len() + 2);
        parts.push(ContentPart::Text(user_text));
        for reference in &self.references {
            parts.push(ContentPart::ImageUrl(reference.clone()));
        }
        // Candidate goes last so the "final image" wording holds.
        parts.push(ContentPart::ImageUrl(image_url.to_string()));

        tracing::info!(
            model = self.client.model_name(),
            image_url,
            "verifying candidate image"
        );

        let raw = self
            .client
            .complete_structured(SYSTEM_INSTRUCTIONS, &parts, &verdict_schema(), 0.0, cancel)
            .await?;

        let verdict: VerificationResult =
            serde_json::from_str(&raw).map_err(|e| VerifyError::Schema(e.to_string()))?;

        tracing::debug!(result = verdict.result, "verdict parsed");
        Ok(verdict)
    }
}
