use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::model::{lenient_sources, ChatMessage, LayoutData, Source};

pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Shown in the transcript whenever a consultation fails for any reason.
pub const FAILURE_MESSAGE: &str =
    "Architectural consultation failed. Please check your network or API key.";

/// Checked in order at call time, before the configured key.
pub const API_KEY_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

const SYSTEM_INSTRUCTION: &str = r#"You are "Architect AI", a senior architectural consultant and space planner.
You help users with:
1. Spatial layouts and floor plans
2. Materials and finishes
3. Sustainability and building code questions
4. Conceptual massing and site planning

Whenever the user asks for a layout or space plan, answer with a professional written explanation AND a structured layout.

Layout rules:
- Room coordinates and sizes are relative, on a 0-100 scale.
- totalWidth and totalHeight describe the bounding box (normally 100).
- Allowed room types: 'living', 'bedroom', 'kitchen', 'bathroom', 'hallway', 'outdoor', 'office', 'dining', 'other'.

For questions about real places, current materials or building codes, use the search tool and cite the URLs you relied on.

Respond with valid JSON only, shaped exactly like this:
{
  "message": "Architectural advice and description...",
  "layout": {
    "rooms": [
      { "id": "uuid", "name": "Master Suite", "x": 0, "y": 0, "width": 50, "height": 40, "type": "bedroom" }
    ],
    "totalWidth": 100,
    "totalHeight": 100,
    "description": "Short title of the plan"
  },
  "sources": [
    { "title": "Source Name", "url": "https://..." }
  ]
}

Set "layout" to null when no layout is needed. Set "sources" to an empty array when no sources were used."#;

/// Everything that can go wrong talking to Gemini. None of these reach the
/// caller of [`GeminiClient::consult`]; they are logged and replaced by the
/// fallback response.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("no API key configured (set API_KEY or GEMINI_API_KEY, or api_key in the config file)")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("could not decode Gemini response: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error("model reply did not contain a message")]
    MissingMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

impl Content {
    fn text(role: &'static str, text: &str) -> Self {
        Self {
            role,
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct GoogleSearch {}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub google_search: GoogleSearch,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub system_instruction: SystemInstruction,
    pub tools: Vec<Tool>,
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    /// Prior turns first, then `prompt` as the newest user turn.
    pub fn new(prompt: &str, history: &[ChatMessage]) -> Self {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|msg| Content::text(msg.role.as_str(), &msg.text))
            .collect();
        contents.push(Content::text("user", prompt));

        Self {
            contents,
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: SYSTEM_INSTRUCTION.to_string(),
                }],
            },
            tools: vec![Tool {
                google_search: GoogleSearch::default(),
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
            },
        }
    }
}

/// Structural constraint handed to the provider alongside the instruction.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "message": { "type": "STRING" },
            "layout": {
                "type": "OBJECT",
                "nullable": true,
                "properties": {
                    "totalWidth": { "type": "NUMBER" },
                    "totalHeight": { "type": "NUMBER" },
                    "description": { "type": "STRING" },
                    "rooms": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "id": { "type": "STRING" },
                                "name": { "type": "STRING" },
                                "x": { "type": "NUMBER" },
                                "y": { "type": "NUMBER" },
                                "width": { "type": "NUMBER" },
                                "height": { "type": "NUMBER" },
                                "type": { "type": "STRING" }
                            },
                            "required": ["id", "name", "x", "y", "width", "height", "type"]
                        }
                    }
                },
                "required": ["rooms", "totalWidth", "totalHeight"]
            },
            "sources": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "url": { "type": "STRING" }
                    }
                }
            }
        },
        "required": ["message"]
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebChunk>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebChunk {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl GenerateContentResponse {
    /// All text parts of the first candidate, concatenated.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    /// Search citations the provider attached to the first candidate.
    pub fn grounding_sources(&self) -> Vec<Source> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|meta| {
                meta.grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .filter_map(|web| Source::from_parts(web.title.as_deref(), web.uri.as_deref()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Normalized result of one consultation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsultResponse {
    pub message: String,
    pub layout: Option<LayoutData>,
    pub sources: Vec<Source>,
}

impl ConsultResponse {
    pub fn fallback() -> Self {
        Self {
            message: FAILURE_MESSAGE.to_string(),
            layout: None,
            sources: Vec::new(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.message == FAILURE_MESSAGE && self.layout.is_none() && self.sources.is_empty()
    }
}

/// Parses the model's text payload. Anything that is not a JSON object
/// becomes an empty object.
pub fn parse_payload(text: &str) -> Map<String, Value> {
    if text.trim().is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            warn!(kind = json_kind(&other), "model payload is not a JSON object");
            Map::new()
        }
        Err(err) => {
            warn!(error = %err, "model payload is not valid JSON");
            Map::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Turns a provider envelope into a response: declared sources first,
/// grounding citations after them.
pub fn interpret(response: &GenerateContentResponse) -> Result<ConsultResponse, GatewayError> {
    let payload = parse_payload(&response.text());

    let message = payload
        .get("message")
        .and_then(Value::as_str)
        .ok_or(GatewayError::MissingMessage)?
        .to_string();

    let layout = match payload.get("layout") {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value::<LayoutData>(value.clone()) {
            Ok(layout) => Some(layout),
            Err(err) => {
                warn!(error = %err, "discarding malformed layout");
                None
            }
        },
    };

    let mut sources = lenient_sources(payload.get("sources"));
    sources.extend(response.grounding_sources());

    Ok(ConsultResponse {
        message,
        layout,
        sources,
    })
}

/// The failure policy: every error is logged and becomes the fallback.
pub fn settle(result: Result<ConsultResponse, GatewayError>) -> ConsultResponse {
    match result {
        Ok(response) => response,
        Err(err) => {
            error!(error = %err, "Gemini API error");
            ConsultResponse::fallback()
        }
    }
}

/// Env vars win over the configured key; blank values are ignored.
pub fn pick_api_key<F>(env: F, configured: Option<&str>) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_VARS
        .iter()
        .find_map(|name| env(name))
        .or_else(|| configured.map(str::to_string))
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    configured_key: Option<String>,
    env_lookup: fn(&str) -> Option<String>,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str, configured_key: Option<String>) -> Self {
        Self::with_http_client(Client::new(), base_url, model, configured_key)
    }

    pub fn with_http_client(
        client: Client,
        base_url: &str,
        model: &str,
        configured_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            configured_key,
            env_lookup: process_env,
        }
    }

    #[cfg(test)]
    fn with_env_lookup(mut self, lookup: fn(&str) -> Option<String>) -> Self {
        self.env_lookup = lookup;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Resolved on every call so a key exported mid-session is picked up.
    fn api_key(&self) -> Option<String> {
        pick_api_key(self.env_lookup, self.configured_key.as_deref())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    pub async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GatewayError> {
        let api_key = self.api_key().ok_or(GatewayError::MissingApiKey)?;

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Never fails: errors are logged and turned into [`ConsultResponse::fallback`].
    pub async fn consult(&self, prompt: &str, history: &[ChatMessage]) -> ConsultResponse {
        let request = GenerateContentRequest::new(prompt, history);
        info!(model = %self.model, turns = request.contents.len(), "sending consultation");

        let result = match self.generate(&request).await {
            Ok(envelope) => interpret(&envelope),
            Err(err) => Err(err),
        };
        let response = settle(result);

        debug!(
            has_layout = response.layout.is_some(),
            sources = response.sources.len(),
            fallback = response.is_fallback(),
            "consultation finished"
        );
        response
    }
}
