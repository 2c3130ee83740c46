//! Scripted generation service for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::inference::types::{ConverseResponse, HistoryEntry, SchemaSpec, ToolCall, ToolSpec};
use crate::inference::{GenerationService, InferenceError};

/// Replays queued results in order and records what it was asked.
/// An exhausted queue answers with a transport error.
#[derive(Default)]
pub struct ScriptedService {
    converse: Mutex<VecDeque<Result<ConverseResponse, InferenceError>>>,
    structured: Mutex<VecDeque<Result<String, InferenceError>>>,
    converse_calls: Mutex<Vec<(String, Vec<HistoryEntry>)>>,
    structured_prompts: Mutex<Vec<String>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_converse(&self, result: Result<ConverseResponse, InferenceError>) {
        self.converse.lock().unwrap().push_back(result);
    }

    pub fn push_reply(&self, text: &str) {
        self.push_converse(Ok(ConverseResponse {
            text: text.to_string(),
            tool_calls: vec![],
        }));
    }

    pub fn push_tool_call(&self, text: &str, name: &str, args: serde_json::Value) {
        self.push_converse(Ok(ConverseResponse {
            text: text.to_string(),
            tool_calls: vec![ToolCall {
                name: name.to_string(),
                args,
            }],
        }));
    }

    pub fn push_structured(&self, result: Result<String, InferenceError>) {
        self.structured.lock().unwrap().push_back(result);
    }

    pub fn converse_calls(&self) -> Vec<(String, Vec<HistoryEntry>)> {
        self.converse_calls.lock().unwrap().clone()
    }

    pub fn structured_prompts(&self) -> Vec<String> {
        self.structured_prompts.lock().unwrap().clone()
    }
}

fn exhausted() -> InferenceError {
    InferenceError::Transport {
        endpoint: "scripted".into(),
        reason: "no scripted response left".into(),
    }
}

#[async_trait]
impl GenerationService for ScriptedService {
    async fn converse(
        &self,
        message: &str,
        history: &[HistoryEntry],
        _tools: &ToolSpec,
    ) -> Result<ConverseResponse, InferenceError> {
        self.converse_calls
            .lock()
            .unwrap()
            .push((message.to_string(), history.to_vec()));
        self.converse
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted()))
    }

    async fn synthesize_structured(
        &self,
        prompt: &str,
        _schema: &SchemaSpec,
    ) -> Result<String, InferenceError> {
        self.structured_prompts.lock().unwrap().push(prompt.to_string());
        self.structured
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted()))
    }
}

/// A well-formed plan payload with `sessions` training days.
pub fn plan_json(sessions: usize) -> String {
    let sessions: Vec<_> = (1..=sessions)
        .map(|i| {
            json!({
                "day": format!("Day {i}"),
                "focus": if i % 2 == 0 { "Engine" } else { "Strength" },
                "warmup": ["Row 500m easy", "Banded hip openers"],
                "mainWork": [format!("Back squat 5x{i} @ RPE 8"), "Sled push 4x20m"],
                "accessory": ["Farmer carry 3x40m"],
            })
        })
        .collect();

    json!({
        "title": "Hybrid Engine Block",
        "durationWeeks": 8,
        "goal": "Improve Hyrox Time",
        "analysis": "Concurrent periodization balancing threshold work with heavy compounds.",
        "sessions": sessions,
    })
    .to_string()
}
