//! Vision-capable LLM integration for capcheck.
//!
//! This crate exposes the [`traits::VisionClient`] seam, a concrete OpenAI
//! implementation speaking the Responses API, and the [`verifier::VisualVerifier`]
//! that turns one candidate image plus three reference images into a
//! schema-validated verdict. It also provides a convenience function to build a
//! client from a [`capcheck_config::LlmConfig`].
//!
//! # Examples
//! ```no_run
//! use capcheck_config::LlmConfig;
//! use capcheck_llm::client_from_config;
//!
//! # fn main() -> Result<(), capcheck_llm::traits::LlmError> {
//! let cfg = LlmConfig::Openai {
//!     model: "gpt-4o".to_string(),
//!     auth_token: "sk-test".to_string(),
//!     endpoint: "https://api.openai.com/v1/".to_string(),
//!     max_output_tokens: None,
//! };
//! let client = client_from_config(&cfg)?;
//! assert_eq!(client.model_name(), "gpt-4o");
//! # Ok(())
//! # }
//! ```
pub mod legacy;
pub mod openai;
pub mod traits;
pub mod verifier;

use capcheck_config::LlmConfig;
use openai::OpenAiClient;
use std::sync::Arc;
use traits::{LlmError, VisionClient};

/// Build the configured provider client.
pub fn client_from_config(config: &LlmConfig) -> Result<Arc<dyn VisionClient>, LlmError> {
    match config {
        LlmConfig::Openai {
            model,
            auth_token,
            endpoint,
            max_output_tokens,
        } => {
            let client = OpenAiClient::new(auth_token.clone(), model.clone(), endpoint)?
                .with_max_output_tokens(*max_output_tokens);
            Ok(Arc::new(client))
        }
    }
}
