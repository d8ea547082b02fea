//! Workout plan tools

use serde_json::{json, Value};

use super::api::FitnessApi;
use super::{Tool, ToolOutput};
use crate::error::ToolError;

/// Parameter properties shared by both plan tools
fn plan_properties() -> Value {
    json!({
        "goal": {
            "type": "string",
            "description": "Fitness goal (e.g., \"weight_loss\", \"muscle_gain\", \"endurance\")"
        },
        "fitness_level": {
            "type": "string",
            "description": "Current fitness level (e.g., \"beginner\", \"intermediate\", \"advanced\")"
        },
        "preferences": {
            "type": "array",
            "items": { "type": "string" },
            "description": "Exercise preferences (e.g., [\"cardio\", \"strength_training\"])"
        },
        "health_conditions": {
            "type": "array",
            "items": { "type": "string" },
            "description": "Health conditions to consider (e.g., [\"knee_injury\"])"
        },
        "days_per_week": {
            "type": "integer",
            "description": "Number of workout days per week (1-7)"
        },
        "session_duration": {
            "type": "integer",
            "description": "Duration of each session in minutes (15-180)"
        },
        "plan_duration_weeks": {
            "type": "integer",
            "description": "Duration of the plan in weeks (1-52)"
        },
        "lang": {
            "type": "string",
            "description": "Language code (default: \"en\")"
        }
    })
}

/// Build the workout plan request payload, applying the service
/// defaults and range checks
pub(crate) fn build_plan_payload(tool: &str, params: &Value) -> Result<Value, ToolError> {
    let goal = params["goal"].as_str().unwrap_or("general_fitness");
    let fitness_level = params["fitness_level"].as_str().unwrap_or("beginner");
    let preferences = params["preferences"]
        .as_array()
        .cloned()
        .unwrap_or_else(|| vec![json!("mixed")]);
    let health_conditions = params["health_conditions"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    let days_per_week = params["days_per_week"].as_i64().unwrap_or(3);
    let session_duration = params["session_duration"].as_i64().unwrap_or(45);
    let plan_duration_weeks = params["plan_duration_weeks"].as_i64().unwrap_or(4);
    let lang = params["lang"].as_str().unwrap_or("en");

    if !(1..=7).contains(&days_per_week) {
        return Err(ToolError::invalid_param(
            tool,
            "days_per_week (must be between 1 and 7)",
        ));
    }
    if !(15..=180).contains(&session_duration) {
        return Err(ToolError::invalid_param(
            tool,
            "session_duration (must be between 15 and 180 minutes)",
        ));
    }
    if !(1..=52).contains(&plan_duration_weeks) {
        return Err(ToolError::invalid_param(
            tool,
            "plan_duration_weeks (must be between 1 and 52 weeks)",
        ));
    }

    Ok(json!({
        "goal": goal,
        "fitness_level": fitness_level,
        "preferences": preferences,
        "health_conditions": health_conditions,
        "schedule": {
            "days_per_week": days_per_week,
            "session_duration": session_duration
        },
        "plan_duration_weeks": plan_duration_weeks,
        "lang": lang
    }))
}

/// Tool that generates a workout plan
pub struct GenerateWorkoutPlan {
    api: FitnessApi,
}

impl GenerateWorkoutPlan {
    pub fn new(api: FitnessApi) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl Tool for GenerateWorkoutPlan {
    fn name(&self) -> &str {
        "generate_workout_plan"
    }

    fn description(&self) -> &str {
        "Generate a workout plan based on the user's goal, fitness level, \
         preferences, health conditions and weekly schedule."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": plan_properties(),
            "required": []
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let payload = build_plan_payload(self.name(), &params)?;
        let result = self.api.post("/generateWorkoutPlan", &payload).await?;
        Ok(ToolOutput::new(result))
    }
}

/// Tool that generates a workout plan with additional custom goals
pub struct CustomWorkoutPlan {
    api: FitnessApi,
}

impl CustomWorkoutPlan {
    pub fn new(api: FitnessApi) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl Tool for CustomWorkoutPlan {
    fn name(&self) -> &str {
        "custom_workout_plan"
    }

    fn description(&self) -> &str {
        "Generate a custom workout plan with additional free-form goals \
         on top of the standard plan parameters."
    }

    fn parameters_schema(&self) -> Value {
        let mut properties = plan_properties();
        properties["custom_goals"] = json!({
            "type": "array",
            "items": { "type": "string" },
            "description": "Additional custom goals"
        });
        json!({
            "type": "object",
            "properties": properties,
            "required": []
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let mut payload = build_plan_payload(self.name(), &params)?;
        let custom_goals = params["custom_goals"].as_array().cloned().unwrap_or_default();
        payload["custom_goals"] = json!(custom_goals);
        let result = self.api.post("/customWorkoutPlan", &payload).await?;
        Ok(ToolOutput::new(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_applied_to_empty_params() {
        let payload = build_plan_payload("generate_workout_plan", &json!({})).unwrap();
        assert_eq!(payload["goal"], "general_fitness");
        assert_eq!(payload["fitness_level"], "beginner");
        assert_eq!(payload["preferences"], json!(["mixed"]));
        assert_eq!(payload["schedule"]["days_per_week"], 3);
        assert_eq!(payload["schedule"]["session_duration"], 45);
        assert_eq!(payload["plan_duration_weeks"], 4);
        assert_eq!(payload["lang"], "en");
    }

    #[test]
    fn explicit_params_survive() {
        let payload = build_plan_payload(
            "generate_workout_plan",
            &json!({
                "goal": "muscle_gain",
                "days_per_week": 5,
                "health_conditions": ["knee_injury"]
            }),
        )
        .unwrap();
        assert_eq!(payload["goal"], "muscle_gain");
        assert_eq!(payload["schedule"]["days_per_week"], 5);
        assert_eq!(payload["health_conditions"], json!(["knee_injury"]));
    }

    #[test]
    fn out_of_range_days_rejected() {
        let err =
            build_plan_payload("generate_workout_plan", &json!({"days_per_week": 9})).unwrap_err();
        assert!(err.to_string().contains("days_per_week"));
    }

    #[test]
    fn out_of_range_session_duration_rejected() {
        assert!(build_plan_payload("t", &json!({"session_duration": 10})).is_err());
        assert!(build_plan_payload("t", &json!({"session_duration": 200})).is_err());
    }

    #[test]
    fn custom_plan_schema_adds_custom_goals() {
        let api = FitnessApi::new(super::super::api::DEFAULT_BASE_URL, "test-key").unwrap();
        let tool = CustomWorkoutPlan::new(api);
        let schema = tool.parameters_schema();
        assert!(schema["properties"]["custom_goals"].is_object());
        assert!(schema["properties"]["days_per_week"].is_object());
    }
}
