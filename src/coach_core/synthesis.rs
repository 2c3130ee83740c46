//! Plan synthesis pipeline.
//!
//! Prompt → schema-constrained generation → deserialize into a
//! [`PlanDocument`]. Either a complete document comes back or an error does;
//! nothing partial escapes. Beyond a successful parse the service's schema
//! adherence is trusted: session count, empty arrays and numeric sanity are
//! not enforced here.

use std::sync::Arc;

use crate::inference::{GenerationService, InferenceError};

use super::prompts::{build_plan_prompt, plan_schema};
use super::types::{PlanDocument, PlanParameters};

/// Drives structured generation for plan documents. Holds no per-call state.
#[derive(Clone)]
pub struct PlanSynthesizer {
    service: Arc<dyn GenerationService>,
}

impl PlanSynthesizer {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self { service }
    }

    /// Generate a new plan document for `params`.
    pub async fn synthesize(&self, params: &PlanParameters) -> Result<PlanDocument, InferenceError> {
        let prompt = build_plan_prompt(params);

        tracing::info!(
            goal = %params.goal,
            level = %params.fitness_level,
            days = params.days_per_week.get(),
            "synthesizing plan"
        );

        let payload = self
            .service
            .synthesize_structured(&prompt, &plan_schema())
            .await?;

        let plan = parse_plan_payload(&payload)?;

        let expected = usize::from(params.days_per_week.get());
        if plan.sessions.len() != expected {
            // Accepted as-is; the count is the service's responsibility.
            tracing::warn!(
                expected,
                actual = plan.sessions.len(),
                "plan session count does not match days per week"
            );
        }

        tracing::info!(
            title = %plan.title,
            weeks = plan.duration_weeks,
            sessions = plan.sessions.len(),
            "plan synthesized"
        );

        Ok(plan)
    }
}

/// Deserialize a structured payload into a plan document.
pub fn parse_plan_payload(payload: &str) -> Result<PlanDocument, InferenceError> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(InferenceError::EmptyResponse);
    }

    serde_json::from_str::<PlanDocument>(strip_code_fence(trimmed)).map_err(|e| {
        InferenceError::SchemaViolation {
            reason: e.to_string(),
            raw_response: payload.to_string(),
        }
    })
}

/// Strip a surrounding markdown code fence (```json … ```), if present.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // The info string (```json) runs to the first newline; a one-line fence has none.
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest.strip_prefix("json").unwrap_or(rest),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach_core::testing::{plan_json, ScriptedService};
    use crate::coach_core::types::DaysPerWeek;

    #[test]
    fn test_parse_valid_payload() {
        let plan = parse_plan_payload(&plan_json(3)).unwrap();
        assert_eq!(plan.sessions.len(), 3);
        assert_eq!(plan.sessions[0].day, "Day 1");
    }

    #[test]
    fn test_parse_blank_payload_is_empty_response() {
        assert!(matches!(parse_plan_payload(""), Err(InferenceError::EmptyResponse)));
        assert!(matches!(parse_plan_payload(" \n "), Err(InferenceError::EmptyResponse)));
    }

    #[test]
    fn test_parse_missing_required_field_is_schema_violation() {
        let payload = r#"{"title":"t","durationWeeks":4,"goal":"g","sessions":[]}"#;
        match parse_plan_payload(payload) {
            Err(InferenceError::SchemaViolation { reason, raw_response }) => {
                assert!(reason.contains("analysis"), "reason was {reason}");
                assert_eq!(raw_response, payload);
            }
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_truncated_json_is_schema_violation() {
        let payload = r#"{"title":"t","durationWeeks":4,"#;
        assert!(matches!(
            parse_plan_payload(payload),
            Err(InferenceError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn test_parse_fenced_payload() {
        let fenced = format!("```json\n{}\n```", plan_json(2));
        assert_eq!(parse_plan_payload(&fenced).unwrap().sessions.len(), 2);
    }

    #[test]
    fn test_parse_single_line_fenced_payload() {
        let fenced = format!("```{}```", plan_json(2));
        assert_eq!(parse_plan_payload(&fenced).unwrap().sessions.len(), 2);

        let tagged = format!("```json {}```", plan_json(3));
        assert_eq!(parse_plan_payload(&tagged).unwrap().sessions.len(), 3);
    }

    #[test]
    fn test_strip_code_fence_passthrough() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_synthesize_sends_prompt_and_schema() {
        let service = Arc::new(ScriptedService::new());
        service.push_structured(Ok(plan_json(4)));
        let synth = PlanSynthesizer::new(service.clone());

        let params = PlanParameters::default();
        let plan = synth.synthesize(&params).await.unwrap();
        assert_eq!(plan.sessions.len(), 4);

        let prompts = service.structured_prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("- Goal: Improve Hyrox Time"));
        assert!(prompts[0].contains("- Injuries/Limitations: None"));
    }

    #[tokio::test]
    async fn test_synthesize_accepts_session_count_mismatch() {
        let service = Arc::new(ScriptedService::new());
        service.push_structured(Ok(plan_json(2)));
        let synth = PlanSynthesizer::new(service);

        let plan = synth.synthesize(&PlanParameters::default()).await.unwrap();
        assert_eq!(plan.sessions.len(), 2);
    }

    #[tokio::test]
    async fn test_synthesize_propagates_service_errors() {
        let service = Arc::new(ScriptedService::new());
        service.push_structured(Err(InferenceError::ServiceRejection {
            status: Some(429),
            reason: "quota".into(),
        }));
        service.push_structured(Ok(String::new()));
        let synth = PlanSynthesizer::new(service);

        let params = PlanParameters::default();
        assert!(matches!(
            synth.synthesize(&params).await,
            Err(InferenceError::ServiceRejection { .. })
        ));
        assert!(matches!(
            synth.synthesize(&params).await,
            Err(InferenceError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn test_synthesize_twice_is_independent_and_non_mutating() {
        let service = Arc::new(ScriptedService::new());
        service.push_structured(Ok(plan_json(5)));
        service.push_structured(Ok(plan_json(5)));
        let synth = PlanSynthesizer::new(service.clone());

        let params = PlanParameters {
            days_per_week: DaysPerWeek::new(5).unwrap(),
            ..PlanParameters::default()
        };
        let snapshot = params.clone();

        let first = synth.synthesize(&params).await.unwrap();
        let mut second = synth.synthesize(&params).await.unwrap();

        assert_eq!(params, snapshot);
        assert_eq!(first, second);
        second.title.push_str(" (edited)");
        assert_ne!(first.title, second.title);

        let prompts = service.structured_prompts();
        assert_eq!(prompts[0], prompts[1]);
    }
}
