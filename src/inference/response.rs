//! Decoding of `generateContent` responses.
//!
//! Turns a raw HTTP status + body into either a [`ConverseResponse`] or a
//! structured payload string, classifying failures into the error taxonomy.
//! Nothing here validates tool arguments or payload structure.

use super::errors::InferenceError;
use super::types::{ConverseResponse, ErrorEnvelope, GenerateContentResponse};

/// Finish reasons that mean the candidate was withheld by safety filtering.
const SAFETY_FINISH_REASONS: [&str; 4] = ["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

/// Classify a non-2xx HTTP response.
///
/// 4xx means the service looked at the request and declined it (quota,
/// permissions, malformed request). 5xx means it could not answer at all.
pub fn classify_http_error(endpoint: &str, status: u16, body: &str) -> InferenceError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| {
            let status_text = envelope.error.status.unwrap_or_default();
            let msg = envelope.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string());

    if (400..500).contains(&status) {
        InferenceError::ServiceRejection {
            status: Some(status),
            reason: message,
        }
    } else {
        InferenceError::Transport {
            endpoint: endpoint.to_string(),
            reason: format!("HTTP {status}: {message}"),
        }
    }
}

/// Parse a successful response body.
///
/// Text is the concatenation of every text part of the first candidate;
/// tool calls are every `functionCall` part in emission order.
pub fn parse_generate_response(
    endpoint: &str,
    body: &str,
) -> Result<ConverseResponse, InferenceError> {
    let resp: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| InferenceError::Transport {
            endpoint: endpoint.to_string(),
            reason: format!("malformed response body: {e}"),
        })?;

    if let Some(reason) = resp
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(InferenceError::ServiceRejection {
            status: None,
            reason: format!("prompt blocked: {reason}"),
        });
    }

    let Some(candidate) = resp.candidates.into_iter().next() else {
        return Ok(ConverseResponse::default());
    };

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();

    if parts.is_empty() {
        if let Some(reason) = candidate
            .finish_reason
            .as_deref()
            .filter(|r| SAFETY_FINISH_REASONS.contains(r))
        {
            return Err(InferenceError::ServiceRejection {
                status: None,
                reason: format!("response withheld: {reason}"),
            });
        }
    }

    let mut out = ConverseResponse::default();
    for part in parts {
        if let Some(text) = part.text {
            out.text.push_str(&text);
        }
        if let Some(call) = part.function_call {
            out.tool_calls.push(call);
        }
    }

    Ok(out)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
