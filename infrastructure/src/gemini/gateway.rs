//! [`CompletionGateway`] adapter for the Gemini `generateContent` endpoint

use super::error::{BLOCKED_FINISH_REASONS, map_http_error, map_transport_error, parse_retry_after};
use super::protocol::{
    Content, GenerateContentRequest, GenerateContentResponse, ROLE_MODEL, ROLE_USER,
};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use persona_chat_application::{CompletionGateway, GatewayError, Reply};
use persona_chat_domain::{Attachment, ContextEntry, Role, Segment};
use reqwest::header::RETRY_AFTER;
use std::time::Duration;
use tracing::{debug, info, warn};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Stand-in text for a turn whose only content was an attachment
const ATTACHMENT_PLACEHOLDER: &str = "[attachment]";

/// Connection settings for [`GeminiGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiSettings {
    /// `None` makes every call fail with `Auth`
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// HTTP-level timeout; the turn controller applies its own bound on top
    pub request_timeout: Option<Duration>,
}

/// Gemini REST client
pub struct GeminiGateway {
    client: reqwest::Client,
    settings: GeminiSettings,
}

impl GeminiGateway {
    pub fn new(settings: GeminiSettings) -> Result<Self, GatewayError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::TransientFailure(format!("HTTP client setup: {}", e)))?;

        info!(model = %settings.model, base_url = %settings.base_url, "Gemini gateway ready");
        Ok(Self { client, settings })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn model_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }

    fn api_key(&self) -> Result<&str, GatewayError> {
        self.settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| GatewayError::Auth("no API key configured".to_string()))
    }

    async fn error_from(response: reqwest::Response) -> GatewayError {
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let body = response.text().await.unwrap_or_default();
        debug!(status, "Gemini error body: {}", body);
        map_http_error(status, retry_after, &body)
    }
}

#[async_trait]
impl CompletionGateway for GeminiGateway {
    async fn complete(
        &self,
        context: &[ContextEntry],
        new_input: &str,
    ) -> Result<Reply, GatewayError> {
        let api_key = self.api_key()?;
        let request = build_request(context, new_input);
        debug!(
            model = %self.settings.model,
            contents = request.contents.len(),
            "Sending generateContent"
        );

        let response = self
            .client
            .post(format!("{}:generateContent", self.model_url()))
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            GatewayError::TransientFailure(format!("unreadable generateContent reply: {}", e))
        })?;
        interpret_response(body)
    }

    /// Fetches the model resource; a rejected key fails here before any
    /// conversation starts.
    async fn check_credentials(&self) -> Result<(), GatewayError> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .get(self.model_url())
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;

        if response.status().is_success() {
            debug!(model = %self.settings.model, "Gemini credentials accepted");
            Ok(())
        } else {
            Err(Self::error_from(response).await)
        }
    }
}

/// Build the request body: prior turns followed by the new user input.
///
/// The instruction seed goes out as a `user` content, assistant turns as
/// `model`. Entries without text (attachment-only turns) are sent as a
/// placeholder so user and model contents keep alternating.
pub fn build_request(context: &[ContextEntry], new_input: &str) -> GenerateContentRequest {
    let mut contents: Vec<Content> = context
        .iter()
        .map(|entry| {
            let role = match entry.role {
                Role::Instruction | Role::User => ROLE_USER,
                Role::Assistant => ROLE_MODEL,
            };
            let text = if entry.text.trim().is_empty() {
                ATTACHMENT_PLACEHOLDER.to_string()
            } else {
                entry.text.clone()
            };
            Content::text(role, text)
        })
        .collect();
    contents.push(Content::text(ROLE_USER, new_input));
    GenerateContentRequest { contents }
}

/// Turn a successful HTTP body into a reply, detecting blocked output.
pub fn interpret_response(response: GenerateContentResponse) -> Result<Reply, GatewayError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.clone())
    {
        return Err(GatewayError::ContentBlocked(reason));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(GatewayError::TransientFailure(
            "reply contained no candidates".to_string(),
        ));
    };

    if let Some(reason) = candidate.finish_reason.as_deref()
        && BLOCKED_FINISH_REASONS.contains(&reason)
    {
        return Err(GatewayError::ContentBlocked(reason.to_string()));
    }

    let mut segments = Vec::new();
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(text) = part.text {
            segments.push(Segment::Text(text));
        }
        if let Some(inline) = part.inline_data {
            match STANDARD.decode(inline.data.as_bytes()) {
                Ok(bytes) => {
                    segments.push(Segment::Attachment(Attachment::inline(inline.mime_type, bytes)))
                }
                Err(e) => warn!(media_type = %inline.mime_type, "Dropping undecodable inline data: {}", e),
            }
        }
    }

    Ok(Reply::new(segments))
}
