//! CLI module for the adaptive RAG assistant
//!
//! Subcommands:
//! - `ask`: answer a single question about a document
//! - `chat`: interactive question loop over a document
//! - `graph`: print the workflow as a Mermaid diagram

pub mod ask;
pub mod chat;
pub mod render;
pub mod session;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::workflow::WorkflowGraph;

/// Adaptive RAG - self-correcting question answering over a document
#[derive(Parser)]
#[command(name = "adaptive-rag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Extra configuration file, applied after config/default and config/local
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Answer one question about a document
    Ask(AskArgs),

    /// Ask questions about a document interactively
    Chat(ChatArgs),

    /// Print the workflow graph as a Mermaid diagram
    Graph,
}

/// Arguments for the ask command
#[derive(Args, Clone)]
pub struct AskArgs {
    /// PDF or text document to answer from (text pages separated by form feeds)
    #[arg(long, short)]
    pub file: PathBuf,

    /// Maximum number of query rewrites (overrides config)
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// The question
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,
}

/// Arguments for the chat command
#[derive(Args, Clone)]
pub struct ChatArgs {
    /// PDF or text document to answer from (text pages separated by form feeds)
    #[arg(long, short)]
    pub file: PathBuf,

    /// Maximum number of query rewrites (overrides config)
    #[arg(long)]
    pub max_iterations: Option<u32>,
}

/// Print the Mermaid diagram of the workflow
pub fn graph() -> anyhow::Result<()> {
    print!("{}", WorkflowGraph::describe().to_mermaid());
    Ok(())
}
