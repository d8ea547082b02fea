//! Orchestrator loop integration tests
//!
//! A scripted backend stands in for the model so every loop path can
//! be driven deterministically: happy-path tool use, self-correction
//! after a bad call, retry exhaustion, iteration caps and
//! cancellation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use gymchat_core::{
    CancelHandle, Error, ModelBackend, ModelTurn, Orchestrator, OrchestratorConfig, Role, Tool,
    ToolCall, ToolError, ToolExecutor, ToolOutput, ToolRegistry,
};

/// Backend that replays a fixed script of responses
struct ScriptedBackend {
    script: Mutex<Vec<gymchat_core::Result<ModelTurn>>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    fn new(script: Vec<gymchat_core::Result<ModelTurn>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ModelBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _transcript: &[gymchat_core::ChatMessage],
        _catalog: &[gymchat_core::ToolDefinition],
    ) -> gymchat_core::Result<ModelTurn> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            // Scripts that run dry end the conversation politely
            return Ok(ModelTurn::final_answer("(script exhausted)"));
        }
        script.remove(0)
    }
}

/// Local stand-in for the exercise lookup tool
struct ExerciseLookup {
    executions: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Tool for ExerciseLookup {
    fn name(&self) -> &str {
        "exercise_details"
    }

    fn description(&self) -> &str {
        "Look up an exercise"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "exercise_name": { "type": "string" }
            },
            "required": ["exercise_name"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        let name = params["exercise_name"].as_str().unwrap_or("unknown");
        Ok(ToolOutput::new(json!({
            "exercise": name,
            "form_cues": "keep a neutral spine, drive through the heels"
        })))
    }
}

struct Harness {
    orchestrator: Orchestrator,
    backend: Arc<ScriptedBackend>,
    executions: Arc<AtomicUsize>,
}

fn harness(script: Vec<gymchat_core::Result<ModelTurn>>) -> Harness {
    harness_with_config(script, test_config())
}

fn harness_with_config(
    script: Vec<gymchat_core::Result<ModelTurn>>,
    config: OrchestratorConfig,
) -> Harness {
    let executions = Arc::new(AtomicUsize::new(0));
    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(ExerciseLookup {
            executions: executions.clone(),
        }))
        .unwrap();

    let backend = ScriptedBackend::new(script);
    let orchestrator = Orchestrator::new(
        backend.clone(),
        ToolExecutor::new(Arc::new(registry)),
        config,
    );

    Harness {
        orchestrator,
        backend,
        executions,
    }
}

fn test_config() -> OrchestratorConfig {
    OrchestratorConfig {
        max_iterations: 4,
        backend_attempts: 3,
        retry_base_delay: Duration::from_millis(1),
    }
}

fn lookup_call(exercise: &str) -> ToolCall {
    ToolCall {
        id: "call-1".to_string(),
        name: "exercise_details".to_string(),
        arguments: json!({ "exercise_name": exercise }),
    }
}

#[tokio::test]
async fn scenario_a_single_tool_call_to_final_answer() {
    let mut h = harness(vec![
        Ok(ModelTurn::tool_request(vec![lookup_call("squat")])),
        Ok(ModelTurn::final_answer(
            "For squats: keep a neutral spine and drive through the heels.",
        )),
    ]);

    let answer = h
        .orchestrator
        .submit("What's the proper form for squats?")
        .await
        .unwrap();

    assert!(answer.contains("neutral spine"));
    assert_eq!(h.executions.load(Ordering::SeqCst), 1);

    // user, assistant(tool call), tool result, assistant(final)
    let transcript = h.orchestrator.transcript();
    assert_eq!(transcript.len(), 4);
    assert_eq!(transcript[0].role, Role::User);
    assert_eq!(transcript[1].role, Role::Assistant);
    assert_eq!(transcript[2].role, Role::ToolResult);
    assert_eq!(transcript[3].role, Role::Assistant);
}

#[tokio::test]
async fn tool_result_payload_equals_handler_output() {
    let mut h = harness(vec![
        Ok(ModelTurn::tool_request(vec![lookup_call("deadlift")])),
        Ok(ModelTurn::final_answer("done")),
    ]);

    h.orchestrator.submit("deadlift form?").await.unwrap();

    let results: Vec<_> = h
        .orchestrator
        .transcript()
        .iter()
        .filter(|m| m.role == Role::ToolResult)
        .collect();
    assert_eq!(results.len(), 1);

    let expected = json!({
        "exercise": "deadlift",
        "form_cues": "keep a neutral spine, drive through the heels"
    });
    assert_eq!(
        serde_json::from_str::<Value>(&results[0].content).unwrap(),
        expected
    );
    assert!(!results[0].is_error);
}

#[tokio::test]
async fn scenario_b_unknown_tool_becomes_evidence_and_loop_recovers() {
    let bogus = ToolCall {
        id: "call-9".to_string(),
        name: "unknown_tool".to_string(),
        arguments: json!({}),
    };
    let mut h = harness(vec![
        Ok(ModelTurn::tool_request(vec![bogus])),
        Ok(ModelTurn::final_answer(
            "I could not look that up, but squats target the quads.",
        )),
    ]);

    let answer = h.orchestrator.submit("squat muscles?").await.unwrap();
    assert!(answer.contains("quads"));

    let error_result = h
        .orchestrator
        .transcript()
        .iter()
        .find(|m| m.role == Role::ToolResult)
        .unwrap();
    assert!(error_result.is_error);
    assert!(error_result.content.contains("Tool not found"));
    // No handler ran for the unknown tool
    assert_eq!(h.executions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_arguments_fed_back_for_self_correction() {
    let bad_call = ToolCall {
        id: "call-2".to_string(),
        name: "exercise_details".to_string(),
        arguments: json!({ "exercise_name": 42 }),
    };
    let mut h = harness(vec![
        Ok(ModelTurn::tool_request(vec![bad_call])),
        Ok(ModelTurn::tool_request(vec![lookup_call("lunge")])),
        Ok(ModelTurn::final_answer("Lunges: step forward, knee over ankle.")),
    ]);

    let answer = h.orchestrator.submit("lunge form?").await.unwrap();
    assert!(answer.contains("Lunges"));

    let results: Vec<_> = h
        .orchestrator
        .transcript()
        .iter()
        .filter(|m| m.role == Role::ToolResult)
        .collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_error);
    assert!(results[0].content.contains("exercise_name"));
    assert!(!results[1].is_error);
    // The mistyped call never reached the handler
    assert_eq!(h.executions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn scenario_c_backend_failures_exhaust_retry_budget() {
    let mut h = harness(vec![
        Err(Error::Backend("connect timeout".to_string())),
        Err(Error::Backend("connect timeout".to_string())),
        Err(Error::Backend("connect timeout".to_string())),
    ]);

    let err = h.orchestrator.submit("hello").await.unwrap_err();
    assert!(matches!(err, Error::Backend(_)));
    // All three attempts consumed, no tool ever executed
    assert_eq!(h.backend.call_count(), 3);
    assert_eq!(h.executions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn transient_backend_failure_recovers_within_budget() {
    let mut h = harness(vec![
        Err(Error::Backend("connection reset".to_string())),
        Ok(ModelTurn::final_answer("Recovered fine.")),
    ]);

    let answer = h.orchestrator.submit("hello").await.unwrap();
    assert_eq!(answer, "Recovered fine.");
    assert_eq!(h.backend.call_count(), 2);
}

#[tokio::test]
async fn empty_model_response_is_a_backend_error() {
    let mut h = harness(vec![
        Ok(ModelTurn::default()),
        Ok(ModelTurn::default()),
        Ok(ModelTurn::default()),
    ]);

    let err = h.orchestrator.submit("hello").await.unwrap_err();
    assert!(matches!(err, Error::Backend(_)));
}

#[tokio::test]
async fn iteration_cap_stops_an_endless_tool_loop() {
    // Model keeps asking for tools forever
    let script: Vec<gymchat_core::Result<ModelTurn>> = (0..20)
        .map(|_| Ok(ModelTurn::tool_request(vec![lookup_call("squat")])))
        .collect();
    let mut h = harness(script);

    let err = h.orchestrator.submit("loop forever").await.unwrap_err();
    assert!(matches!(err, Error::IterationLimit(4)));
    // One execution per iteration, bounded by the cap
    assert_eq!(h.executions.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn stale_cancel_does_not_poison_the_next_turn() {
    let mut h = harness(vec![Ok(ModelTurn::final_answer("all good"))]);

    let handle: CancelHandle = h.orchestrator.cancel_handle();
    handle.cancel();
    assert!(handle.is_cancelled());

    // submit() resets the flag before the first pass, so a cancel
    // left over from a previous turn does not abort this one
    let answer = h.orchestrator.submit("hello").await.unwrap();
    assert_eq!(answer, "all good");
    assert!(!handle.is_cancelled());
}

/// Tool that raises the cancel flag from within its own execution, as
/// if the user hit Ctrl-C while the call was in flight
struct CancelWhileRunning {
    handle: Arc<Mutex<Option<CancelHandle>>>,
    executions: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Tool for CancelWhileRunning {
    fn name(&self) -> &str {
        "exercise_details"
    }

    fn description(&self) -> &str {
        "Look up an exercise"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "exercise_name": { "type": "string" } },
            "required": ["exercise_name"]
        })
    }

    async fn execute(&self, _params: Value) -> Result<ToolOutput, ToolError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().unwrap().as_ref() {
            handle.cancel();
        }
        Ok(ToolOutput::new(json!({ "exercise": "squat" })))
    }
}

#[tokio::test]
async fn cancel_during_a_tool_call_lets_it_finish_then_stops_the_turn() {
    let handle_slot: Arc<Mutex<Option<CancelHandle>>> = Arc::new(Mutex::new(None));
    let executions = Arc::new(AtomicUsize::new(0));

    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(CancelWhileRunning {
            handle: handle_slot.clone(),
            executions: executions.clone(),
        }))
        .unwrap();

    let backend = ScriptedBackend::new(vec![
        Ok(ModelTurn::tool_request(vec![lookup_call("squat")])),
        Ok(ModelTurn::final_answer("never reached")),
    ]);
    let mut orchestrator = Orchestrator::new(
        backend.clone(),
        ToolExecutor::new(Arc::new(registry)),
        test_config(),
    );
    *handle_slot.lock().unwrap() = Some(orchestrator.cancel_handle());

    let err = orchestrator.submit("squat form?").await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));

    // The in-flight call ran to completion and its result was recorded
    assert_eq!(executions.load(Ordering::SeqCst), 1);
    let results: Vec<_> = orchestrator
        .transcript()
        .iter()
        .filter(|m| m.role == Role::ToolResult)
        .collect();
    assert_eq!(results.len(), 1);
    assert!(!results[0].is_error);

    // But the model was never consulted again after the cancel
    assert_eq!(backend.call_count(), 1);
    assert!(orchestrator
        .transcript()
        .iter()
        .all(|m| m.content != "never reached"));
}

#[tokio::test]
async fn clear_history_resets_the_transcript() {
    let mut h = harness(vec![
        Ok(ModelTurn::final_answer("Hi!")),
        Ok(ModelTurn::final_answer("Hello again!")),
    ]);

    h.orchestrator.submit("hi").await.unwrap();
    assert_eq!(h.orchestrator.transcript().len(), 2);

    h.orchestrator.clear_history();
    assert!(h.orchestrator.transcript().is_empty());

    let answer = h.orchestrator.submit("hi again").await.unwrap();
    assert_eq!(answer, "Hello again!");
    assert_eq!(h.orchestrator.transcript().len(), 2);
}

#[tokio::test]
async fn catalog_presented_to_model_is_sorted_and_stable() {
    let h = harness(vec![]);
    let catalog = h.orchestrator.catalog();
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].name, "exercise_details");
}
