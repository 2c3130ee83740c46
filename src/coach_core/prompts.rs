//! Prompt text, the plan tool declaration and the plan response schema.
//!
//! Schemas use the OpenAPI subset the generation service accepts
//! (upper-case `type` names).

use serde_json::json;

use crate::inference::types::{FunctionDeclaration, SchemaSpec, ToolSpec};

use super::types::PlanParameters;

/// Name of the function the model calls to request a program.
pub const PLAN_TOOL_NAME: &str = "create_workout_plan";

/// System instruction sent with every request.
pub const SYSTEM_INSTRUCTION: &str = "\
You are the \"HybridOne Coach\", an expert in hybrid training: powerlifting, Olympic \
weightlifting, CrossFit, Hyrox and ultra-endurance running. You have deep academic and \
practical knowledge of:\n\
1. Programming (periodization, concurrent training).\n\
2. Biomechanics and technique.\n\
3. Sports pharmacology and biochemistry, discussed scientifically and objectively for \
educational purposes, with a focus on physiology, recovery and safety.\n\
4. Nutrition and metabolism.\n\n\
You are direct, professional and motivating. Give the best evidence-based answer \
immediately, without filler.\n\n\
CRITICAL INSTRUCTION:\n\
You can generate full workout programs. If the user asks for a routine, plan, schedule or \
specific preparation (e.g. \"Make me a Hyrox program\", \"I need a 4-day split\"), you MUST \
call the `create_workout_plan` tool instead of listing exercises in chat. Ask a clarifying \
question if you need days per week or equipment, but once you have a general idea, CALL \
THE TOOL.";

/// The tool set offered on every conversational turn.
pub fn plan_tools() -> ToolSpec {
    ToolSpec {
        declarations: vec![FunctionDeclaration {
            name: PLAN_TOOL_NAME.to_string(),
            description: "Generates a comprehensive workout plan in the Program Builder. \
                Call this when the user asks for a routine, program, or schedule."
                .to_string(),
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "goal": {
                        "type": "STRING",
                        "description": "The specific training goal (e.g., Hyrox, Marathon, Strength)"
                    },
                    "fitnessLevel": {
                        "type": "STRING",
                        "description": "Beginner, Intermediate, Advanced, or Elite"
                    },
                    "daysPerWeek": {
                        "type": "NUMBER",
                        "description": "Number of training days per week"
                    },
                    "equipment": {
                        "type": "STRING",
                        "description": "Available equipment (e.g., Full Gym, Dumbbells, Bodyweight)"
                    },
                    "injuries": {
                        "type": "STRING",
                        "description": "Any injuries or limitations"
                    }
                },
                "required": ["goal"]
            }),
        }],
    }
}

/// Response schema for a [`super::types::PlanDocument`].
pub fn plan_schema() -> SchemaSpec {
    SchemaSpec(json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "durationWeeks": { "type": "NUMBER" },
            "goal": { "type": "STRING" },
            "analysis": {
                "type": "STRING",
                "description": "A comprehensive scientific breakdown of the program logic."
            },
            "sessions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "day": { "type": "STRING" },
                        "focus": { "type": "STRING" },
                        "warmup": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "mainWork": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "accessory": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "notes": { "type": "STRING" }
                    },
                    "required": ["day", "focus", "warmup", "mainWork", "accessory"]
                }
            }
        },
        "required": ["title", "durationWeeks", "goal", "sessions", "analysis"]
    }))
}

/// Build the synthesis prompt. Every parameter appears; empty injuries read "None".
pub fn build_plan_prompt(params: &PlanParameters) -> String {
    let injuries = match params.injuries.trim() {
        "" => "None",
        other => other,
    };

    format!(
        "Create a detailed workout plan based on these parameters:\n\
         - Goal: {goal}\n\
         - Fitness Level: {level}\n\
         - Days per week: {days}\n\
         - Equipment: {equipment}\n\
         - Injuries/Limitations: {injuries}\n\n\
         The programming should be specific to Hybrid/CrossFit/Hyrox methodology.\n\
         Include specific sets, reps, and intensity zones (RPE or % of 1RM).\n\
         Produce exactly one session per training day.\n\n\
         IMPORTANT:\n\
         You must also populate the 'analysis' field with a VERY DETAILED, scientific \
         explanation of the program structure. Explain:\n\
         1. The periodization model used.\n\
         2. Why specific compound movements were chosen.\n\
         3. The physiological adaptation targets (e.g., lactate threshold, aerobic capacity, \
         CNS adaptation).\n\
         4. How this specifically addresses the user's goal.\n\
         Write the analysis as a sports scientist explaining it to an athlete.",
        goal = params.goal,
        level = params.fitness_level,
        days = params.days_per_week,
        equipment = params.equipment,
    )
}
