//! Ask command - answers a single question

use tokio_util::sync::CancellationToken;
use tracing::error;

use super::render::{answer_turn, format_answer, TURN_FAILURE_NOTICE};
use super::{session, AskArgs};
use crate::config::AppConfig;
use crate::infrastructure::observability::spawn_metrics_recorder;

/// Index the document, answer the question and print the cited answer
pub async fn run(args: AskArgs, mut config: AppConfig) -> anyhow::Result<()> {
    if let Some(max_iterations) = args.max_iterations {
        config.workflow.max_iterations = max_iterations;
    }

    let workflow = session::build_workflow(&config, &args.file).await?;
    let metrics = config
        .metrics
        .enabled
        .then(|| spawn_metrics_recorder(workflow.subscribe()));
    let question = args.question.join(" ");

    let result = {
        let cancel = CancellationToken::new();
        let turn = answer_turn(&workflow, &question, cancel.clone());
        tokio::pin!(turn);

        loop {
            tokio::select! {
                result = &mut turn => break result,
                _ = tokio::signal::ctrl_c() => {
                    eprintln!("Cancelling...");
                    cancel.cancel();
                }
            }
        }
    };

    drop(workflow);
    if let Some(metrics) = metrics {
        let _ = metrics.await;
    }

    match result {
        Ok(outcome) => {
            println!("{}", format_answer(&outcome));
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Turn failed");
            Err(anyhow::Error::new(e).context(TURN_FAILURE_NOTICE))
        }
    }
}
