//! Inference — client for the remote generation service.
//!
//! This module handles all communication with the model endpoint:
//! - Conversational turns with function declarations
//! - Schema-constrained structured generation
//! - Response decoding and error classification
//! - Configuration loading from `_models/config.yaml`
//!
//! The coach core only sees the [`GenerationService`] trait, so the backend
//! can be swapped (or faked in tests) without touching the core.

pub mod client;
pub mod config;
pub mod errors;
pub mod response;
pub mod types;

// Re-exports for convenience
pub use client::{GeminiClient, GenerationService};
pub use config::{CoachConfig, ModelConfig};
pub use errors::InferenceError;
pub use types::{ConverseResponse, HistoryEntry, Role, SchemaSpec, ToolCall, ToolSpec};
