//! Gemini `generateContent` client.
//!
//! Blocking on purpose: batch calls run strictly one after another, so an
//! async runtime would buy nothing.

use super::{
    GenerationRequest, ImageService, ServiceError, reinforce_edit_instruction,
    reinforce_generation_prompt,
};
use crate::config::ServiceConfig;
use crate::credentials::ApiKey;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Finish reasons that mean the content was refused.
const SAFETY_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "IMAGE_SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[serde(default)]
    data: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

pub struct GeminiService {
    client: Client,
    endpoint: String,
    model: String,
}

impl GeminiService {
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn post(&self, key: &ApiKey, body: &Value) -> Result<Vec<u8>, ServiceError> {
        tracing::debug!(model = %self.model, "generateContent request");
        let response = self
            .client
            .post(self.generate_url())
            .header(API_KEY_HEADER, key.expose())
            .json(body)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            tracing::warn!(status = status.as_u16(), "generation service error");
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message,
            });
        }
        parse_image_response(&text)
    }
}

fn generation_body(prompt: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
    })
}

fn edit_body(image: &[u8], instruction: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                { "inlineData": { "mimeType": "image/png", "data": STANDARD.encode(image) } },
                { "text": instruction },
            ],
        }],
        "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
    })
}

/// Pull the first inline image out of a `generateContent` response body.
fn parse_image_response(body: &str) -> Result<Vec<u8>, ServiceError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::UnexpectedResponse(format!("invalid JSON: {e}")))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ServiceError::SafetyBlocked {
            reason: Some(reason),
        });
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::UnexpectedResponse("no candidates".into()))?;

    if let Some(reason) = candidate
        .finish_reason
        .filter(|r| SAFETY_FINISH_REASONS.contains(&r.as_str()))
    {
        return Err(ServiceError::SafetyBlocked {
            reason: Some(reason),
        });
    }

    let data = candidate
        .content
        .into_iter()
        .flat_map(|c| c.parts)
        .filter_map(|p| p.inline_data)
        .map(|d| d.data)
        .find(|d| !d.is_empty())
        .ok_or_else(|| ServiceError::UnexpectedResponse("no image data in response".into()))?;

    Ok(STANDARD.decode(data.as_bytes())?)
}

impl ImageService for GeminiService {
    fn generate(
        &self,
        key: &ApiKey,
        request: &GenerationRequest<'_>,
    ) -> Result<Vec<u8>, ServiceError> {
        let prompt = reinforce_generation_prompt(request.prompt, request.aspect);
        self.post(key, &generation_body(&prompt))
    }

    fn edit(&self, key: &ApiKey, image: &[u8], instruction: &str) -> Result<Vec<u8>, ServiceError> {
        let instruction = reinforce_edit_instruction(instruction);
        self.post(key, &edit_body(image, &instruction))
    }

    fn validate_key(&self, key: &ApiKey) -> bool {
        let url = format!("{}/models?pageSize=1", self.endpoint);
        match self
            .client
            .get(url)
            .header(API_KEY_HEADER, key.expose())
            .send()
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "key validation request failed");
                false
            }
        }
    }
}
