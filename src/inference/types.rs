//! Shared types for the generation client.
//!
//! The request/response structs mirror the Gemini `generateContent` REST API.
//! The remaining types (`HistoryEntry`, `ToolSpec`, `SchemaSpec`,
//! `ConverseResponse`, `ToolCall`) are the client's public surface and do not
//! leak any wire detail to the coach core.

use serde::{Deserialize, Serialize};

// ─── Client Surface ──────────────────────────────────────────────────────────

/// Who authored a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One prior turn handed to `converse` as context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
}

/// The set of function declarations offered to the model on a conversational turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolSpec {
    pub declarations: Vec<FunctionDeclaration>,
}

/// A single callable function advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    /// OpenAPI-style object schema describing the arguments.
    pub parameters: serde_json::Value,
}

/// Response schema for a structured generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaSpec(pub serde_json::Value);

/// A tool invocation embedded in a conversational response.
///
/// `args` is whatever the service sent. It has not been validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Result of a conversational turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConverseResponse {
    /// Concatenated text parts. Empty when the model only called a tool.
    pub text: String,
    /// Tool invocations in the order the model emitted them.
    pub tool_calls: Vec<ToolCall>,
}

// ─── Request Types ───────────────────────────────────────────────────────────

/// Request body for `POST {base_url}/{model}:generateContent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolBlock>,
    pub safety_settings: Vec<SafetySetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// A role-tagged list of parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<TextPart>,
}

impl Content {
    pub fn text(role: Option<Role>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(|r| r.as_str().to_string()),
            parts: vec![TextPart { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextPart {
    pub text: String,
}

/// `tools: [{functionDeclarations: [...]}]`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolBlock {
    pub function_declarations: Vec<FunctionDeclaration>,
}

/// Per-category safety threshold.
#[derive(Debug, Clone, Serialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

/// The four harm categories the coach relaxes.
pub const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Sampling and output-format controls.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
}

// ─── Response Types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// A response part carries either text or a function call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub function_call: Option<ToolCall>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_rest_casing() {
        let req = GenerateContentRequest {
            system_instruction: Some(Content::text(None, "be direct")),
            contents: vec![Content::text(Some(Role::User), "hi")],
            tools: vec![ToolBlock {
                function_declarations: vec![FunctionDeclaration {
                    name: "create_workout_plan".into(),
                    description: "d".into(),
                    parameters: serde_json::json!({"type": "OBJECT"}),
                }],
            }],
            safety_settings: vec![SafetySetting {
                category: HARM_CATEGORIES[0].into(),
                threshold: "BLOCK_NONE".into(),
            }],
            generation_config: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be direct");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(
            json["tools"][0]["functionDeclarations"][0]["name"],
            "create_workout_plan"
        );
        assert_eq!(json["safetySettings"][0]["threshold"], "BLOCK_NONE");
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_tools_omitted_when_empty() {
        let req = GenerateContentRequest {
            system_instruction: None,
            contents: vec![],
            tools: vec![],
            safety_settings: vec![],
            generation_config: Some(GenerationConfig {
                temperature: None,
                response_mime_type: Some("application/json".into()),
                response_schema: Some(serde_json::json!({"type": "OBJECT"})),
            }),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("\"tools\""));
        assert!(json.contains("\"responseMimeType\":\"application/json\""));
        assert!(json.contains("\"responseSchema\""));
        assert!(!json.contains("temperature"));
    }

    #[test]
    fn test_response_part_with_function_call() {
        let body = r#"{"candidates":[{"content":{"parts":[
            {"text":"On it."},
            {"functionCall":{"name":"create_workout_plan","args":{"goal":"Hyrox"}}}
        ]},"finishReason":"STOP"}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(body).unwrap();
        let parts = &resp.candidates[0].content.as_ref().unwrap().parts;
        assert_eq!(parts[0].text.as_deref(), Some("On it."));
        let call = parts[1].function_call.as_ref().unwrap();
        assert_eq!(call.name, "create_workout_plan");
        assert_eq!(call.args["goal"], "Hyrox");
    }
}
