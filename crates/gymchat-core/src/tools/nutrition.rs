//! Nutrition advice tool

use serde_json::{json, Value};

use super::api::FitnessApi;
use super::{Tool, ToolOutput};
use crate::error::ToolError;

const ACTIVITY_LEVELS: &[&str] = &["sedentary", "light", "moderate", "active", "very_active"];

/// Build the nutrition advice payload, applying defaults and weight
/// range checks
pub(crate) fn build_nutrition_payload(tool: &str, params: &Value) -> Result<Value, ToolError> {
    let goal = params["goal"].as_str().unwrap_or("maintain_weight");
    let dietary_restrictions = params["dietary_restrictions"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    let current_weight = params["current_weight"].as_f64().unwrap_or(70.0);
    let target_weight = params["target_weight"].as_f64().unwrap_or(current_weight);
    let lang = params["lang"].as_str().unwrap_or("en");

    if !(30.0..=300.0).contains(&current_weight) {
        return Err(ToolError::invalid_param(
            tool,
            "current_weight (must be between 30 and 300 kg)",
        ));
    }
    if !(30.0..=300.0).contains(&target_weight) {
        return Err(ToolError::invalid_param(
            tool,
            "target_weight (must be between 30 and 300 kg)",
        ));
    }

    // Unknown activity levels fall back to moderate rather than failing
    let daily_activity_level = params["daily_activity_level"]
        .as_str()
        .filter(|l| ACTIVITY_LEVELS.contains(l))
        .unwrap_or("moderate");

    Ok(json!({
        "goal": goal,
        "dietary_restrictions": dietary_restrictions,
        "current_weight": current_weight,
        "target_weight": target_weight,
        "daily_activity_level": daily_activity_level,
        "lang": lang
    }))
}

/// Tool that produces nutrition advice for a weight goal
pub struct NutritionAdvice {
    api: FitnessApi,
}

impl NutritionAdvice {
    pub fn new(api: FitnessApi) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl Tool for NutritionAdvice {
    fn name(&self) -> &str {
        "nutrition_advice"
    }

    fn description(&self) -> &str {
        "Generate nutrition advice for a weight goal, taking dietary \
         restrictions and daily activity level into account."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "goal": {
                    "type": "string",
                    "description": "Nutrition goal (e.g., \"weight_loss\", \"weight_gain\", \"maintain_weight\")"
                },
                "dietary_restrictions": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Dietary restrictions (e.g., [\"vegetarian\", \"gluten_free\"])"
                },
                "current_weight": {
                    "type": "number",
                    "description": "Current weight in kg (30-300)"
                },
                "target_weight": {
                    "type": "number",
                    "description": "Target weight in kg (30-300)"
                },
                "daily_activity_level": {
                    "type": "string",
                    "description": "Activity level: sedentary, light, moderate, active or very_active"
                },
                "lang": {
                    "type": "string",
                    "description": "Language code (default: \"en\")"
                }
            },
            "required": []
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let payload = build_nutrition_payload(self.name(), &params)?;
        let result = self.api.post("/nutritionAdvice", &payload).await?;
        Ok(ToolOutput::new(result))
    }
}
