//! Parameter reconciliation.
//!
//! Overlays an untrusted [`PlanRequest`] onto the current complete
//! [`PlanParameters`], one field at a time: a usable incoming value wins,
//! anything else keeps the base value. This is the only path by which
//! model-supplied arguments become trusted parameters. Nothing is invented;
//! every output field comes from one of the two inputs.

use serde_json::Value;

use super::types::{DaysPerWeek, FitnessLevel, PlanParameters, PlanRequest};

/// Merge `incoming` over `base`. Always returns complete parameters.
pub fn reconcile(base: &PlanParameters, incoming: &PlanRequest) -> PlanParameters {
    PlanParameters {
        goal: overlay_text("goal", incoming.goal.as_ref(), &base.goal),
        fitness_level: overlay_fitness_level(incoming.fitness_level.as_ref(), base.fitness_level),
        days_per_week: overlay_days(incoming.days_per_week.as_ref(), base.days_per_week),
        equipment: overlay_text("equipment", incoming.equipment.as_ref(), &base.equipment),
        injuries: overlay_text("injuries", incoming.injuries.as_ref(), &base.injuries),
    }
}

/// Non-blank strings win, stored verbatim. Scalars are taken as their JSON
/// text; null and containers fall back.
fn overlay_text(field: &str, incoming: Option<&Value>, base: &str) -> String {
    let candidate = match incoming {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Some(v.to_string()),
        Some(other) => {
            tracing::warn!(field, value = %other, "discarding non-scalar plan argument");
            None
        }
    };

    match candidate {
        Some(s) if !s.trim().is_empty() => s,
        _ => base.to_string(),
    }
}

fn overlay_fitness_level(incoming: Option<&Value>, base: FitnessLevel) -> FitnessLevel {
    match incoming {
        Some(Value::String(s)) if !s.trim().is_empty() => s.parse().unwrap_or_else(|_| {
            tracing::warn!(value = %s, "unrecognized fitness level, keeping form value");
            base
        }),
        Some(Value::Null) | None => base,
        Some(Value::String(_)) => base,
        Some(other) => {
            tracing::warn!(value = %other, "fitness level is not a string, keeping form value");
            base
        }
    }
}

/// Whole numbers in range win, from a JSON number or a numeric string.
/// Zero counts as absent.
fn overlay_days(incoming: Option<&Value>, base: DaysPerWeek) -> DaysPerWeek {
    let raw = match incoming {
        None | Some(Value::Null) => return base,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    let whole = raw.filter(|f| f.is_finite() && f.fract() == 0.0 && *f >= 0.0 && *f <= 255.0);

    match whole.map(|f| f as u8) {
        Some(0) => base,
        Some(days) => DaysPerWeek::new(days).unwrap_or_else(|_| {
            tracing::warn!(days, "days per week out of range, keeping form value");
            base
        }),
        None => {
            tracing::warn!(value = ?incoming, "unusable days per week, keeping form value");
            base
        }
    }
}
