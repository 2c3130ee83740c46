//! Tool invocation extraction.
//!
//! Looks at a conversational response for a `create_workout_plan` call and
//! decodes its arguments into an untrusted [`PlanRequest`]. Only the first
//! call in a turn is honoured; later ones are dropped. A first call with any
//! other name means "no plan request" so unknown tool signals never block
//! ordinary chat. Argument values are copied verbatim, not validated.

use serde_json::Value;

use crate::inference::types::ConverseResponse;

use super::prompts::PLAN_TOOL_NAME;
use super::types::PlanRequest;

/// Extract a plan request from a conversational response, if it carries one.
pub fn extract(response: &ConverseResponse) -> Option<PlanRequest> {
    let call = response.tool_calls.first()?;

    if response.tool_calls.len() > 1 {
        tracing::debug!(
            discarded = response.tool_calls.len() - 1,
            "ignoring tool calls after the first"
        );
    }

    if call.name != PLAN_TOOL_NAME {
        tracing::info!(tool = %call.name, "ignoring unrecognized tool call");
        return None;
    }

    Some(decode_args(&call.args))
}

/// Decode tool arguments field by field. A non-object payload decodes to an
/// empty request.
fn decode_args(args: &Value) -> PlanRequest {
    let Some(map) = args.as_object() else {
        if !args.is_null() {
            tracing::warn!(args = %args, "plan tool arguments are not an object");
        }
        return PlanRequest::default();
    };

    let field = |name: &str| map.get(name).cloned();

    PlanRequest {
        goal: field("goal"),
        fitness_level: field("fitnessLevel"),
        days_per_week: field("daysPerWeek"),
        equipment: field("equipment"),
        injuries: field("injuries"),
    }
}
