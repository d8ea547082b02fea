//! `gymchat chat` - the interactive assistant
//!
//! Spawns the tool server as a subprocess, discovers its tools over
//! MCP, and drives the orchestration loop from a readline prompt.
//! `exit`/`quit` leave, `clear` drops the conversation history, and
//! Ctrl-C during a turn cancels it without losing the session.

use std::sync::Arc;

use console::style;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::info;

use gymchat_core::tools::remote::discover_remote_tools;
use gymchat_core::{Config, Error, GenAiBackend, Orchestrator, ToolExecutor, ToolRegistry};
use gymchat_mcp::{ClientInfo, McpClient, StdioTransport};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a knowledgeable fitness assistant. \
Use the available tools to build workout plans, give nutrition advice and \
explain exercises. Ask for missing details instead of guessing, and keep \
answers practical and encouraging.";

pub async fn run(
    config: Config,
    model_override: Option<&str>,
    one_shot: Option<&str>,
) -> anyhow::Result<()> {
    config.validate_for_chat()?;

    let client = connect_tool_server(&config).await?;
    let tools = discover_remote_tools(client.clone()).await?;

    let mut registry = ToolRegistry::new();
    for tool in tools {
        registry.register(tool)?;
    }
    info!(tools = registry.len(), "Tool server connected");

    let model = model_override.or(config.model.model.as_deref());
    let system_prompt = config
        .model
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let backend = GenAiBackend::with_api_key(&config.model_api_key()?, model)
        .with_system_prompt(system_prompt);

    let mut orchestrator = Orchestrator::new(
        Arc::new(backend),
        ToolExecutor::new(Arc::new(registry)),
        config.orchestrator_config(),
    );

    let result = match one_shot {
        Some(prompt) => run_one_shot(&mut orchestrator, prompt).await,
        None => run_repl(&mut orchestrator).await,
    };

    let _ = client.close().await;
    result
}

/// Spawn `gymchat serve` (or the configured command) and complete the
/// MCP handshake
async fn connect_tool_server(config: &Config) -> anyhow::Result<Arc<McpClient<StdioTransport>>> {
    let command: Vec<String> = match &config.server_command {
        Some(cmd) if !cmd.is_empty() => cmd.clone(),
        _ => {
            let exe = std::env::current_exe()?;
            vec![exe.display().to_string(), "serve".to_string()]
        }
    };

    let args: Vec<&str> = command[1..].iter().map(String::as_str).collect();
    let transport = StdioTransport::spawn(&command[0], &args).await?;

    let mut client = McpClient::new(transport);
    let server = client
        .initialize(ClientInfo {
            name: "gymchat".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
        .await?;
    info!(server = %server.name, version = %server.version, "MCP handshake complete");

    Ok(Arc::new(client))
}

async fn run_one_shot(orchestrator: &mut Orchestrator, prompt: &str) -> anyhow::Result<()> {
    let answer = orchestrator.submit(prompt).await?;
    println!("{}", answer);
    Ok(())
}

async fn run_repl(orchestrator: &mut Orchestrator) -> anyhow::Result<()> {
    print_banner(orchestrator);

    let mut rl = DefaultEditor::new()?;

    loop {
        let line = match rl.readline(&format!("{} ", style("you>").green().bold())) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(input);

        match input {
            "exit" | "quit" => break,
            "clear" => {
                orchestrator.clear_history();
                println!("{}", style("Conversation history cleared.").dim());
                continue;
            }
            _ => {}
        }

        run_turn(orchestrator, input).await;
    }

    println!("{}", style("Goodbye! Stay strong.").dim());
    Ok(())
}

/// One user turn; Ctrl-C cancels it and returns to the prompt
///
/// Cancellation is cooperative: the signal only flips the flag, and
/// the turn keeps running until the loop checks it, so an in-flight
/// model or tool call always completes or times out on its own.
async fn run_turn(orchestrator: &mut Orchestrator, input: &str) {
    let cancel = orchestrator.cancel_handle();
    let listener = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let result = orchestrator.submit(input).await;
    listener.abort();

    match result {
        Ok(answer) => {
            println!();
            println!("{} {}", style("gymchat>").cyan().bold(), answer);
            println!();
        }
        Err(Error::Cancelled) => {
            println!();
            println!("{}", style("Turn cancelled.").yellow());
        }
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
        }
    }
}

fn print_banner(orchestrator: &Orchestrator) {
    println!();
    println!("{}", style("Gymchat - your AI fitness assistant").bold());
    println!(
        "{}",
        style(format!(
            "{} tools available. Type 'exit' to leave, 'clear' to reset the conversation.",
            orchestrator.catalog().len()
        ))
        .dim()
    );
    println!();
}
