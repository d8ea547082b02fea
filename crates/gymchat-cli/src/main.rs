//! Gymchat CLI - conversational fitness assistant
//!
//! Two faces of the same binary: `gymchat chat` runs the interactive
//! assistant, `gymchat serve` exposes the fitness tools as an MCP
//! server over stdio. Chat spawns serve as a subprocess, so a single
//! install covers both ends of the protocol.

mod chat;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;

use gymchat_core::Config;

#[derive(Parser)]
#[command(name = "gymchat")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "AI fitness assistant with workout, nutrition and exercise tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path (default: ~/.config/gymchat/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Model to use (defaults to config setting)
    #[arg(short, long)]
    model: Option<String>,

    /// Execute a single prompt and exit (non-interactive mode)
    #[arg(long)]
    one_shot: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat mode
    Chat,

    /// Run the fitness tool server over stdio
    Serve,

    /// Show available tools
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr: in serve mode stdout carries the protocol,
    // in chat mode it carries the conversation
    tracing_subscriber::fmt()
        .with_env_filter(if cli.verbose {
            "info,gymchat_core=debug,gymchat_mcp=debug"
        } else {
            "warn"
        })
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Serve) => serve::run(config).await?,
        Some(Commands::Tools) => show_tools(&config)?,
        Some(Commands::Chat) | None => {
            chat::run(config, cli.model.as_deref(), cli.one_shot.as_deref()).await?
        }
    }

    Ok(())
}

/// Print the tool catalog the assistant will be given
fn show_tools(config: &Config) -> anyhow::Result<()> {
    // A placeholder key is fine here, nothing is called
    let api = gymchat_core::FitnessApi::new(&config.fitness_api.base_url, "unset")?;
    let registry = gymchat_core::fitness_registry(api)?;

    println!("{}", style("Available Tools:").bold());
    println!();
    for def in registry.catalog() {
        println!("  {}  {}", style(&def.name).cyan(), def.description);
    }
    println!();

    Ok(())
}
