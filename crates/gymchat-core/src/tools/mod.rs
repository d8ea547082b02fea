//! Tool system for Gymchat
//!
//! Tools are the capabilities the model may invoke. Each tool has:
//! - A name and description for the LLM
//! - A JSON schema for parameters
//! - An execute method
//!
//! The fitness tools each make a single outbound call to the workout
//! planner API; `remote` bridges tools served by an MCP server into a
//! local registry.

pub mod api;
pub mod exercise;
pub mod nutrition;
pub mod remote;
pub mod workout;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ToolError;

/// Output from a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The output content (can be text, JSON, etc.)
    pub content: Value,
}

impl ToolOutput {
    pub fn new(content: impl Into<Value>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Tool definition for LLM consumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Core trait for all tools
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (used by LLM to invoke)
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// JSON schema for parameters
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with schema-validated parameters
    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError>;

    /// Convert to tool definition for LLM
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Registry of available tools
///
/// Populated once at startup, then shared read-only between sessions.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, rejecting duplicate names
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::AlreadyRegistered(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Catalog of all tool definitions, sorted by name for a
    /// deterministic presentation to the model
    pub fn catalog(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }
}

/// Build the standard fitness tool registry backed by one shared API
/// client
pub fn fitness_registry(api: api::FitnessApi) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(workout::GenerateWorkoutPlan::new(api.clone())))?;
    registry.register(Arc::new(workout::CustomWorkoutPlan::new(api.clone())))?;
    registry.register(Arc::new(nutrition::NutritionAdvice::new(api.clone())))?;
    registry.register(Arc::new(exercise::ExerciseDetails::new(api)))?;
    Ok(registry)
}

/// Validate arguments against a tool's parameter schema
///
/// Checks the schema subset the tools declare: an object with typed
/// `properties` and a `required` list. Returns every violated field
/// (missing required or mistyped) so the model sees the full picture
/// in one pass.
pub fn validate_arguments(def: &ToolDefinition, args: &Value) -> Result<(), ToolError> {
    let mut violations: Vec<String> = Vec::new();

    let empty = serde_json::Map::new();
    let args_obj = match args {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => {
            return Err(ToolError::invalid_param(
                &def.name,
                "arguments must be a JSON object",
            ))
        }
    };

    let properties = def.parameters.get("properties").and_then(|p| p.as_object());

    if let Some(required) = def.parameters.get("required").and_then(|r| r.as_array()) {
        for field in required.iter().filter_map(|f| f.as_str()) {
            if !args_obj.contains_key(field) || args_obj[field].is_null() {
                violations.push(format!("{} (missing)", field));
            }
        }
    }

    if let Some(props) = properties {
        for (field, value) in args_obj {
            let Some(spec) = props.get(field) else {
                // Unknown fields are tolerated; handlers ignore them
                continue;
            };
            if value.is_null() {
                continue;
            }
            let Some(expected) = spec.get("type").and_then(|t| t.as_str()) else {
                continue;
            };
            if !type_matches(expected, value) {
                violations.push(format!("{} (expected {})", field, expected));
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ToolError::InvalidParams {
            tool: def.name.clone(),
            fields: violations,
        })
    }
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        // Whole-number floats are accepted as integers; models emit both
        "integer" => value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn def() -> ToolDefinition {
        ToolDefinition {
            name: "exercise_details".to_string(),
            description: "test".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "exercise_name": { "type": "string" },
                    "sets": { "type": "integer" },
                    "lang": { "type": "string" }
                },
                "required": ["exercise_name"]
            }),
        }
    }

    #[test]
    fn valid_arguments_pass() {
        let args = json!({"exercise_name": "squat", "sets": 3});
        assert!(validate_arguments(&def(), &args).is_ok());
    }

    #[test]
    fn missing_required_field_is_reported() {
        let err = validate_arguments(&def(), &json!({"lang": "en"})).unwrap_err();
        match err {
            ToolError::InvalidParams { fields, .. } => {
                assert_eq!(fields, vec!["exercise_name (missing)"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mistyped_fields_are_all_collected() {
        let args = json!({"exercise_name": 42, "sets": "three"});
        let err = validate_arguments(&def(), &args).unwrap_err();
        match err {
            ToolError::InvalidParams { fields, .. } => {
                assert_eq!(fields.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn whole_number_float_counts_as_integer() {
        let args = json!({"exercise_name": "squat", "sets": 3.0});
        assert!(validate_arguments(&def(), &args).is_ok());
    }

    #[test]
    fn non_object_arguments_rejected() {
        assert!(validate_arguments(&def(), &json!([1, 2])).is_err());
    }

    struct Stub(&'static str);

    #[async_trait::async_trait]
    impl Tool for Stub {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "stub"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}, "required": []})
        }

        async fn execute(&self, _params: Value) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::new(json!({})))
        }
    }

    #[test]
    fn duplicate_registration_is_rejected_and_keeps_the_original() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Stub("squat_lookup"))).unwrap();

        let err = registry
            .register(Arc::new(Stub("squat_lookup")))
            .unwrap_err();
        assert!(matches!(err, ToolError::AlreadyRegistered(name) if name == "squat_lookup"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn repeated_lookup_yields_the_same_tool_and_definition() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Stub("squat_lookup"))).unwrap();

        let first = registry.get("squat_lookup").unwrap();
        let second = registry.get("squat_lookup").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.to_definition(), second.to_definition());
    }
}
