//! Exercise lookup tool

use serde_json::{json, Value};

use super::api::FitnessApi;
use super::{Tool, ToolOutput};
use crate::error::ToolError;

/// Tool that looks up details and form cues for a single exercise
pub struct ExerciseDetails {
    api: FitnessApi,
}

impl ExerciseDetails {
    pub fn new(api: FitnessApi) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl Tool for ExerciseDetails {
    fn name(&self) -> &str {
        "exercise_details"
    }

    fn description(&self) -> &str {
        "Get details about a specific exercise: targeted muscles, \
         proper form and common mistakes."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "exercise_name": {
                    "type": "string",
                    "description": "Name of the exercise (e.g., \"push-ups\", \"squats\", \"bench press\")"
                },
                "lang": {
                    "type": "string",
                    "description": "Language code (default: \"en\")"
                }
            },
            "required": ["exercise_name"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let exercise_name = params["exercise_name"].as_str().unwrap_or("").trim();
        if exercise_name.is_empty() {
            return Err(ToolError::invalid_param(
                self.name(),
                "exercise_name (must not be blank)",
            ));
        }
        let lang = params["lang"].as_str().unwrap_or("en");

        let payload = json!({
            "exercise_name": exercise_name,
            "lang": lang
        });

        let result = self.api.post("/exerciseDetails", &payload).await?;
        Ok(ToolOutput::new(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> ExerciseDetails {
        let api = FitnessApi::new(super::super::api::DEFAULT_BASE_URL, "test-key").unwrap();
        ExerciseDetails::new(api)
    }

    #[tokio::test]
    async fn blank_exercise_name_rejected_before_any_network_call() {
        let err = tool().execute(json!({"exercise_name": "   "})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidParams { .. }));
    }

    #[test]
    fn schema_requires_exercise_name() {
        let schema = tool().parameters_schema();
        assert_eq!(schema["required"], json!(["exercise_name"]));
    }
}
