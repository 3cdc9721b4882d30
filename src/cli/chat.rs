//! Chat command - interactive question loop
//!
//! Every line is answered by an independent run. Ctrl-C while a question is
//! being answered cancels that run before its next step; Ctrl-C at the prompt
//! exits.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::render::{answer_turn, format_answer, TURN_FAILURE_NOTICE};
use super::{session, ChatArgs};
use crate::config::AppConfig;
use crate::infrastructure::observability::spawn_metrics_recorder;

const EXIT_COMMANDS: [&str; 2] = ["exit", "quit"];

pub async fn run(args: ChatArgs, mut config: AppConfig) -> anyhow::Result<()> {
    if let Some(max_iterations) = args.max_iterations {
        config.workflow.max_iterations = max_iterations;
    }

    let workflow = session::build_workflow(&config, &args.file).await?;
    let metrics = config
        .metrics
        .enabled
        .then(|| spawn_metrics_recorder(workflow.subscribe()));

    println!(
        "Ready. Ask questions about {} (\"exit\" to quit).",
        args.file.display()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let Some(line) = line else { break };
        let question = line.trim();

        if question.is_empty() {
            continue;
        }

        if EXIT_COMMANDS.contains(&question) {
            break;
        }

        let cancel = CancellationToken::new();
        let turn = answer_turn(&workflow, question, cancel.clone());
        tokio::pin!(turn);

        let result = loop {
            tokio::select! {
                result = &mut turn => break result,
                _ = tokio::signal::ctrl_c() => {
                    eprintln!("Cancelling...");
                    cancel.cancel();
                }
            }
        };

        match result {
            Ok(outcome) => println!("{}\n", format_answer(&outcome)),
            Err(e) if e.is_cancelled() => {
                info!(error = %e, "Turn cancelled");
                println!("Cancelled.\n");
            }
            Err(e) => {
                error!(error = %e, "Turn failed");
                println!("{}\n", TURN_FAILURE_NOTICE);
            }
        }
    }

    drop(workflow);
    if let Some(metrics) = metrics {
        let _ = metrics.await;
    }

    Ok(())
}
