// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! orc - Agent Orchestration Core CLI
//!
//! A thin consumer of `orcd`'s HTTP API: no local state, no daemon
//! supervision, no dashboards. `orcd` is assumed to already be running.

mod client;

use anyhow::Result;
use clap::{Parser, Subcommand};

use client::{ClientError, DaemonClient};

#[derive(Parser)]
#[command(name = "orc", version, about = "Agent Orchestration Core CLI")]
struct Cli {
    /// Base URL of the orcd HTTP API
    #[arg(long, env = "ORC_DAEMON_URL", default_value = "http://127.0.0.1:4780", global = true)]
    daemon_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a fresh session for an agent
    Start {
        agent_id: String,
        /// Initial prompt to send once the session reaches running
        #[arg(long)]
        prompt: Option<String>,
    },
    /// Resume an agent's most recent resumable session, falling back to a
    /// fresh start if none exists
    Resume {
        agent_id: String,
        #[arg(long)]
        prompt: Option<String>,
    },
    /// Stop an agent's current session
    Stop {
        agent_id: String,
        /// Request a graceful shutdown instead of an immediate kill
        #[arg(long)]
        graceful: bool,
    },
    /// Kill an agent's process but keep its upstream id so a later
    /// `resume` can pick it back up, instead of stopping it for good
    Suspend { agent_id: String },
    /// Send a message to an agent's running session
    Message { agent_id: String, content: String },
    /// Dispatch daemon controls
    #[command(subcommand)]
    Dispatch(DispatchCommand),
}

#[derive(Subcommand)]
enum DispatchCommand {
    /// Trigger an out-of-cycle dispatch tick and print the resulting stats
    PollNow,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let client = DaemonClient::new(cli.daemon_url);

    if let Err(err) = run(&client, cli.command).await {
        let code = err.downcast_ref::<ClientError>().map_or(1, ClientError::exit_code);
        eprintln!("Error: {err}");
        std::process::exit(code);
    }
}

async fn run(client: &DaemonClient, command: Commands) -> Result<()> {
    match command {
        Commands::Start { agent_id, prompt } => {
            let session_id = client.start_agent(&agent_id, prompt, false).await?;
            println!("{session_id}");
        }
        Commands::Resume { agent_id, prompt } => {
            let session_id = client.start_agent(&agent_id, prompt, true).await?;
            println!("{session_id}");
        }
        Commands::Stop { agent_id, graceful } => {
            client.stop_agent(&agent_id, graceful).await?;
        }
        Commands::Suspend { agent_id } => {
            client.suspend_agent(&agent_id).await?;
        }
        Commands::Message { agent_id, content } => {
            client.message_agent(&agent_id, &content).await?;
        }
        Commands::Dispatch(DispatchCommand::PollNow) => {
            let stats = client.dispatch_poll_now().await?;
            println!("{}", serde_json::to_string_pretty(&stats).unwrap_or_default());
        }
    }
    Ok(())
}
