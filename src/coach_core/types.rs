//! Shared types for the coach core.
//!
//! Conversation turns, plan parameters (trusted and untrusted), the plan
//! document, and the mode/builder state enums used by the coordinator.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::inference::types::Role;

use super::errors::CoachError;

// ─── Conversation ───────────────────────────────────────────────────────────

/// A single message in the chat log. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

// ─── Plan Parameters ────────────────────────────────────────────────────────

/// Athlete experience level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FitnessLevel {
    Beginner,
    Intermediate,
    Advanced,
    Elite,
}

impl FitnessLevel {
    pub const ALL: [FitnessLevel; 4] = [
        FitnessLevel::Beginner,
        FitnessLevel::Intermediate,
        FitnessLevel::Advanced,
        FitnessLevel::Elite,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FitnessLevel::Beginner => "Beginner",
            FitnessLevel::Intermediate => "Intermediate",
            FitnessLevel::Advanced => "Advanced",
            FitnessLevel::Elite => "Elite",
        }
    }
}

impl fmt::Display for FitnessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FitnessLevel {
    type Err = CoachError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FitnessLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoachError::InvalidParameters {
                reason: format!("unknown fitness level '{wanted}'"),
            })
    }
}

/// Training days per week, always within `[3, 6]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DaysPerWeek(u8);

impl DaysPerWeek {
    pub const MIN: u8 = 3;
    pub const MAX: u8 = 6;

    pub fn new(days: u8) -> Result<Self, CoachError> {
        if (Self::MIN..=Self::MAX).contains(&days) {
            Ok(Self(days))
        } else {
            Err(CoachError::InvalidParameters {
                reason: format!(
                    "days per week must be between {} and {}, got {days}",
                    Self::MIN,
                    Self::MAX
                ),
            })
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for DaysPerWeek {
    type Error = CoachError;

    fn try_from(days: u8) -> Result<Self, Self::Error> {
        Self::new(days)
    }
}

impl From<DaysPerWeek> for u8 {
    fn from(days: DaysPerWeek) -> Self {
        days.0
    }
}

impl fmt::Display for DaysPerWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Complete, trusted plan parameters. Owned by the builder form.
///
/// Every field is always set and valid; the only way to get one from model
/// output is through [`super::reconciler::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanParameters {
    pub goal: String,
    pub fitness_level: FitnessLevel,
    pub days_per_week: DaysPerWeek,
    pub equipment: String,
    /// Empty when the athlete reports none.
    #[serde(default)]
    pub injuries: String,
}

impl Default for PlanParameters {
    fn default() -> Self {
        Self {
            goal: "Improve Hyrox Time".to_string(),
            fitness_level: FitnessLevel::Intermediate,
            days_per_week: DaysPerWeek(4),
            equipment: "Full Gym (CrossFit Box)".to_string(),
            injuries: String::new(),
        }
    }
}

/// Untrusted, partially-filled plan parameters decoded from a tool call.
///
/// Each field holds the raw JSON value the model sent, unvalidated. Nothing
/// in here may drive synthesis until it has been reconciled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanRequest {
    pub goal: Option<serde_json::Value>,
    pub fitness_level: Option<serde_json::Value>,
    pub days_per_week: Option<serde_json::Value>,
    pub equipment: Option<serde_json::Value>,
    pub injuries: Option<serde_json::Value>,
}

impl PlanRequest {
    /// True when the model supplied no arguments at all.
    pub fn is_empty(&self) -> bool {
        self.goal.is_none()
            && self.fitness_level.is_none()
            && self.days_per_week.is_none()
            && self.equipment.is_none()
            && self.injuries.is_none()
    }
}

// ─── Plan Document ──────────────────────────────────────────────────────────

/// One training day within a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub day: String,
    pub focus: String,
    pub warmup: Vec<String>,
    pub main_work: Vec<String>,
    pub accessory: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A fully structured training program. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocument {
    pub title: String,
    #[serde(deserialize_with = "deserialize_whole_number")]
    pub duration_weeks: u32,
    pub goal: String,
    pub analysis: String,
    pub sessions: Vec<Session>,
}

/// Accept `12` as well as `12.0`; the schema only promises a NUMBER.
fn deserialize_whole_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Number::deserialize(deserializer)?;
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).map_err(|_| D::Error::custom(format!("{n} is out of range")));
    }
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) => Ok(f as u32),
        _ => Err(D::Error::custom(format!(
            "expected a non-negative whole number, got {value}"
        ))),
    }
}

// ─── Mode ───────────────────────────────────────────────────────────────────

/// Which surface is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Chat,
    Builder,
}

/// Builder sub-state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BuilderView {
    /// Collecting input; waiting for an explicit submit.
    #[default]
    Form,
    /// Showing a synthesized plan.
    Result(PlanDocument),
}

// ─── Tests ──────────────────────────────────────────────────────────────────
