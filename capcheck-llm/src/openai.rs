use crate::traits::{ContentPart, LlmError, OutputSchema, VisionClient};
use async_trait::async_trait;
use capcheck_http::{Auth, HttpClient, HttpError, RequestOpts};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/";

// Vision requests upload no pixels but the model still has to fetch and look at
// every image URL, so allow well beyond the shared client default.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(120);

pub struct OpenAiClient {
    client: HttpClient,
    api_key: String,
    model: String,
    max_output_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ResponsesApiRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    input: Vec<InputMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    text: TextOptions<'a>,
}

#[derive(Serialize)]
struct InputMessage<'a> {
    role: &'a str,
    content: Vec<InputPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum InputPart<'a> {
    #[serde(rename = "input_text")]
    Text { text: &'a str },
    #[serde(rename = "input_image")]
    Image { image_url: &'a str },
}

#[derive(Serialize)]
struct TextOptions<'a> {
    format: SchemaFormat<'a>,
}

#[derive(Serialize)]
struct SchemaFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
    schema: &'a serde_json::Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResponsesApiResponse {
    pub id: String,
    pub object: String,
    pub created_at: i64,
    pub status: String,
    pub model: String,
    #[serde(default)]
    pub output: Vec<ResponseMessage>,
}

/// One element in the `output` array
#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: Option<String>,
    #[serde(default)]
    pub content: Vec<ResponseContent>,
}

/// One part of the message `content`
#[derive(Debug, Deserialize)]
pub struct ResponseContent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub refusal: String,
}

impl OpenAiClient {
    /// Create a new client for the given API key, model, and endpoint.
    ///
    /// `endpoint` is normally [`DEFAULT_OPENAI_ENDPOINT`]; tests and
    /// OpenAI-compatible gateways substitute their own base URL.
    pub fn new(api_key: String, model: String, endpoint: &str) -> Result<Self, LlmError> {
        let client = HttpClient::new(endpoint)
            .map_err(|e| LlmError::Config(format!("HttpClient init failed: {e}")))?
            .with_timeout(RESPONSE_TIMEOUT);

        Ok(Self {
            client,
            api_key,
            model,
            max_output_tokens: None,
        })
    }

    /// Cap the model's output length. `None` leaves the provider default.
    pub fn with_max_output_tokens(mut self, limit: Option<u32>) -> Self {
        self.max_output_tokens = limit;
        self
    }
}

#[async_trait]
impl VisionClient for OpenAiClient {
    async fn complete_structured(
        &self,
        instructions: &str,
        parts: &[ContentPart],
        format: &OutputSchema,
        temperature: f32,
        cancel: &CancellationToken,
    ) -> Result<String, LlmError> {
        let content: Vec<InputPart> = parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => InputPart::Text { text },
                ContentPart::ImageUrl(url) => InputPart::Image { image_url: url },
            })
            .collect();

        let req = ResponsesApiRequest {
            model: &self.model,
            instructions,
            input: vec![InputMessage {
                role: "user",
                content,
            }],
            temperature,
            max_output_tokens: self.max_output_tokens,
            text: TextOptions {
                format: SchemaFormat {
                    kind: "json_schema",
                    name: format.name,
                    schema: &format.schema,
                    strict: true,
                },
            },
        };

        let resp: ResponsesApiResponse = self
            .client
            .post_json(
                "responses",
                &req,
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.api_key)),
                    cancel: Some(cancel.clone()),
                    ..Default::default()
                },
            )
            .await
            .map_err(http_to_llm)?;

        tracing::debug!(
            id = %resp.id,
            model = %resp.model,
            status = %resp.status,
            "OpenAI response received"
        );

        if let Some(refused) = resp
            .output
            .iter()
            .flat_map(|msg| &msg.content)
            .find(|c| c.kind == "refusal" && !c.refusal.is_empty())
        {
            return Err(LlmError::Refused(refused.refusal.clone()));
        }

        resp.output
            .iter()
            .flat_map(|msg| &msg.content)
            .find(|c| c.kind == "output_text")
            .map(|c| c.text.clone())
            .ok_or(LlmError::EmptyOutput)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn http_to_llm(e: HttpError) -> LlmError {
    match e {
        HttpError::Cancelled => LlmError::Cancelled,
        HttpError::Api {
            status, message, ..
        } => LlmError::Api(format!("{status}: {message}")),
        HttpError::Decode(msg, _) => LlmError::Api(format!("unexpected response body: {msg}")),
        HttpError::Url(msg) | HttpError::Build(msg) => LlmError::Config(msg),
        HttpError::Network(msg) => LlmError::Transport(msg),
    }
}
