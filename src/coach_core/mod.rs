//! Coach Core — conversation, plan requests and plan synthesis.
//!
//! Submodules:
//! - `coordinator`: Single owner of mode, chat log, form and builder view
//! - `conversation`: Append-only chat log with a sliding context window
//! - `extractor`: Finds a plan tool call in a model response
//! - `reconciler`: Merges untrusted plan arguments over the current form
//! - `synthesis`: Prompt → structured generation → plan document
//! - `prompts`: System instruction, tool declaration, plan schema
//! - `activity`: In-flight call flags shared with the surface
//! - `types`: Shared types across the coach core
//! - `errors`: Coach-level error types

pub mod activity;
pub mod conversation;
pub mod coordinator;
pub mod errors;
pub mod extractor;
pub mod prompts;
pub mod reconciler;
pub mod synthesis;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use activity::{ActivityHandle, CallKind};
pub use conversation::ConversationLog;
pub use coordinator::{
    ChatOutcome, CoordinatorSettings, HandledMessage, ModeCoordinator, PendingTransition,
    SynthesisOutcome, TransitionTicket,
};
pub use errors::CoachError;
pub use synthesis::PlanSynthesizer;
pub use types::{
    BuilderView, ConversationTurn, DaysPerWeek, FitnessLevel, Mode, PlanDocument, PlanParameters,
    PlanRequest, Session,
};
