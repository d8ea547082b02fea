//! HTTP client for the workout planner API
//!
//! All fitness tools go through this client: one POST per tool
//! execution, a fixed request timeout, and no retries (retry policy
//! lives with the orchestrator, not down here).

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error};

use crate::error::ToolError;

/// Default base URL of the workout planner service
pub const DEFAULT_BASE_URL: &str =
    "https://ai-workout-planner-exercise-fitness-nutrition-guide.p.rapidapi.com";

/// Request timeout for the fitness data provider
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared client for the fitness data provider
#[derive(Clone)]
pub struct FitnessApi {
    client: reqwest::Client,
    base_url: Arc<str>,
    api_key: Arc<str>,
    api_host: Arc<str>,
}

impl FitnessApi {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("gymchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to create client: {}", e)))?;

        let host = base_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').into(),
            api_key: api_key.into(),
            api_host: host.into(),
        })
    }

    /// POST a payload to an endpoint and return the JSON body
    pub async fn post(&self, endpoint: &str, payload: &Value) -> Result<Value, ToolError> {
        let url = format!("{}{}?noqueue=1", self.base_url, endpoint);
        debug!(%url, "Fitness API request");

        let response = self
            .client
            .post(&url)
            .header("x-rapidapi-key", self.api_key.as_ref())
            .header("x-rapidapi-host", self.api_host.as_ref())
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ToolError::ExecutionFailed("Fitness API request timed out".to_string())
                } else {
                    ToolError::ExecutionFailed(format!("Fitness API request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Fitness API error response");
            return Err(ToolError::ExecutionFailed(format!(
                "Fitness API returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("Invalid JSON from fitness API: {}", e)))
    }
}
