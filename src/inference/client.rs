//! Generation client for the remote Gemini service.
//!
//! Exposes exactly two operations through [`GenerationService`]: a
//! conversational turn (with tool declarations) and a schema-constrained
//! structured generation. Every call is one outbound exchange. There is no
//! caching, retrying, streaming or fallback here; failures go straight back
//! to the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use super::config::{resolve_active_model, CoachConfig, ModelConfig};
use super::errors::InferenceError;
use super::response::{classify_http_error, parse_generate_response};
use super::types::{
    Content, ConverseResponse, GenerateContentRequest, GenerationConfig, HistoryEntry, Role,
    SafetySetting, SchemaSpec, ToolBlock, ToolSpec, HARM_CATEGORIES,
};

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// MIME type requested for structured generation.
const JSON_MIME_TYPE: &str = "application/json";

// ─── GenerationService ───────────────────────────────────────────────────────

/// The two operations the coach needs from a generation backend.
///
/// Object safe so the coordinator can hold an `Arc<dyn GenerationService>`
/// and tests can substitute a scripted fake.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Run one conversational turn.
    ///
    /// `history` is already trimmed by the caller; it is sent as-is.
    async fn converse(
        &self,
        message: &str,
        history: &[HistoryEntry],
        tools: &ToolSpec,
    ) -> Result<ConverseResponse, InferenceError>;

    /// Request output constrained to `schema`. Returns the raw payload text.
    async fn synthesize_structured(
        &self,
        prompt: &str,
        schema: &SchemaSpec,
    ) -> Result<String, InferenceError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn GenerationService) {}
};

// ─── GeminiClient ────────────────────────────────────────────────────────────

/// [`GenerationService`] backed by the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    http: HttpClient,
    model_key: String,
    model: ModelConfig,
    system_instruction: String,
}

impl GeminiClient {
    /// Create a client for the active model in `config`.
    ///
    /// Does NOT check connectivity — that happens on the first request.
    pub fn from_config(
        config: &CoachConfig,
        system_instruction: impl Into<String>,
    ) -> Result<Self, InferenceError> {
        let (key, model) = resolve_active_model(config)?;

        if model.api_key.trim().is_empty() {
            tracing::warn!(model = %key, "no API key configured, requests will be rejected");
        }

        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(model.request_timeout())
            .build()
            .map_err(|e| InferenceError::Transport {
                endpoint: model.base_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            model_key: key,
            model,
            system_instruction: system_instruction.into(),
        })
    }

    /// The name of the configured model.
    pub fn current_model_name(&self) -> &str {
        &self.model.display_name
    }

    /// Model id used in the request URL.
    fn model_id(&self) -> &str {
        self.model.model_name.as_deref().unwrap_or(&self.model_key)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.model.base_url.trim_end_matches('/'),
            self.model_id()
        )
    }

    fn safety_settings(&self) -> Vec<SafetySetting> {
        HARM_CATEGORIES
            .iter()
            .map(|category| SafetySetting {
                category: (*category).to_string(),
                threshold: self.model.safety_threshold.clone(),
            })
            .collect()
    }

    /// Build the conversational request body.
    fn build_converse_request(
        &self,
        message: &str,
        history: &[HistoryEntry],
        tools: &ToolSpec,
    ) -> GenerateContentRequest {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|h| Content::text(Some(h.role), h.text.clone()))
            .collect();
        contents.push(Content::text(Some(Role::User), message));

        let tools = if tools.declarations.is_empty() {
            Vec::new()
        } else {
            vec![ToolBlock {
                function_declarations: tools.declarations.clone(),
            }]
        };

        GenerateContentRequest {
            system_instruction: Some(Content::text(None, self.system_instruction.clone())),
            contents,
            tools,
            safety_settings: self.safety_settings(),
            generation_config: self.model.temperature.map(|t| GenerationConfig {
                temperature: Some(t),
                ..GenerationConfig::default()
            }),
        }
    }

    /// Build the structured request body.
    fn build_structured_request(&self, prompt: &str, schema: &SchemaSpec) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Some(Content::text(None, self.system_instruction.clone())),
            contents: vec![Content::text(Some(Role::User), prompt)],
            tools: Vec::new(),
            safety_settings: self.safety_settings(),
            generation_config: Some(GenerationConfig {
                temperature: self.model.temperature,
                response_mime_type: Some(JSON_MIME_TYPE.to_string()),
                response_schema: Some(schema.0.clone()),
            }),
        }
    }

    /// Send one request and decode the response.
    async fn send(&self, body: &GenerateContentRequest) -> Result<ConverseResponse, InferenceError> {
        let url = self.endpoint();

        // Metadata only; the body can be large and the key must not be logged.
        tracing::info!(
            url = %url,
            model = %self.model_id(),
            content_count = body.contents.len(),
            tool_count = body.tools.first().map(|t| t.function_declarations.len()).unwrap_or(0),
            structured = body
                .generation_config
                .as_ref()
                .map(|g| g.response_schema.is_some())
                .unwrap_or(false),
            "=== LLM REQUEST ==="
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.model.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| InferenceError::Transport {
                endpoint: url.clone(),
                reason: if e.is_timeout() {
                    format!("request timed out after {}s", self.model.request_timeout_secs)
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        let body_text = response.text().await.map_err(|e| InferenceError::Transport {
            endpoint: url.clone(),
            reason: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            let err = classify_http_error(&url, status.as_u16(), &body_text);
            tracing::warn!(status = status.as_u16(), kind = err.kind(), "generation request failed");
            return Err(err);
        }

        parse_generate_response(&url, &body_text)
    }
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn converse(
        &self,
        message: &str,
        history: &[HistoryEntry],
        tools: &ToolSpec,
    ) -> Result<ConverseResponse, InferenceError> {
        let body = self.build_converse_request(message, history, tools);
        let resp = self.send(&body).await?;
        tracing::debug!(
            text_len = resp.text.len(),
            tool_calls = resp.tool_calls.len(),
            "conversational response received"
        );
        Ok(resp)
    }

    async fn synthesize_structured(
        &self,
        prompt: &str,
        schema: &SchemaSpec,
    ) -> Result<String, InferenceError> {
        let body = self.build_structured_request(prompt, schema);
        let resp = self.send(&body).await?;
        Ok(resp.text)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::types::FunctionDeclaration;

    fn test_config(base_url: &str) -> CoachConfig {
        let mut config = CoachConfig::builtin();
        let model = config
            .models
            .get_mut(crate::inference::config::DEFAULT_MODEL_KEY)
            .unwrap();
        model.base_url = base_url.to_string();
        model.api_key = "test-key".to_string();
        model.request_timeout_secs = 2;
        config
    }

    fn plan_tools() -> ToolSpec {
        ToolSpec {
            declarations: vec![FunctionDeclaration {
                name: "create_workout_plan".into(),
                description: "build a plan".into(),
                parameters: serde_json::json!({"type": "OBJECT", "properties": {}}),
            }],
        }
    }

    #[test]
    fn test_endpoint_uses_model_key() {
        let client = GeminiClient::from_config(&test_config("http://localhost:9/v1beta/models/"), "sys")
            .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(client.current_model_name(), "Gemini 2.5 Flash");
    }

    #[test]
    fn test_converse_request_appends_message_after_history() {
        let client = GeminiClient::from_config(&test_config("http://localhost:9"), "coach").unwrap();
        let history = vec![
            HistoryEntry {
                role: Role::Model,
                text: "Ready.".into(),
            },
            HistoryEntry {
                role: Role::User,
                text: "Hi".into(),
            },
        ];
        let req = client.build_converse_request("Plan please", &history, &plan_tools());
        let json = serde_json::to_value(&req).unwrap();

        let contents = json["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "model");
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(contents[2]["parts"][0]["text"], "Plan please");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "coach");
        assert_eq!(
            json["tools"][0]["functionDeclarations"][0]["name"],
            "create_workout_plan"
        );
        assert_eq!(json["safetySettings"].as_array().unwrap().len(), 4);
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_structured_request_sets_json_mime_and_schema() {
        let client = GeminiClient::from_config(&test_config("http://localhost:9"), "coach").unwrap();
        let schema = SchemaSpec(serde_json::json!({"type": "OBJECT", "required": ["title"]}));
        let req = client.build_structured_request("make a plan", &schema);
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["generationConfig"]["responseSchema"]["required"][0], "title");
        assert!(json.get("tools").is_none());
        assert_eq!(json["contents"][0]["parts"][0]["text"], "make a plan");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Port 1 on loopback refuses connections.
        let client = GeminiClient::from_config(&test_config("http://127.0.0.1:1"), "coach").unwrap();
        let err = client
            .converse("hello", &[], &ToolSpec::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::Transport { .. }), "got {err:?}");
    }

    #[test]
    fn test_missing_active_model_is_config_error() {
        let mut config = test_config("http://localhost:9");
        config.active_model = "missing".into();
        let result = GeminiClient::from_config(&config, "coach");
        assert!(matches!(result, Err(InferenceError::ConfigError { .. })));
    }
}
