//! Terminal presentation of workflow progress and answers

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::domain::grading::BinaryScore;
use crate::domain::workflow::{
    AdaptiveRagWorkflow, GenerateDecision, GenerationCheck, NodeOutput, QualityDecision,
    RouteDecision, WorkflowError, WorkflowEvent, WorkflowOutcome,
};

pub const TURN_FAILURE_NOTICE: &str =
    "Something went wrong while answering your question. Please try again.";

const PREVIEW_CHARS: usize = 100;

/// Progress line for an event, prefixed with the step that produced it
pub fn describe_event(event: &WorkflowEvent) -> Option<String> {
    let (step, text) = match event {
        WorkflowEvent::NodeCompleted { output, .. } => match output {
            NodeOutput::Retrieved { documents } => {
                let mut text = format!("Retrieved {} passages", documents.len());
                for document in documents {
                    text.push_str(&format!(
                        "\n    [{}] {}",
                        document.source.label(),
                        preview(&document.text)
                    ));
                }
                ("Retriever", text)
            }
            NodeOutput::Filtered { kept, discarded } => (
                "Retrieval Grader",
                format!("{} relevant, {} discarded", kept, discarded),
            ),
            NodeOutput::QuestionRewritten { question } => ("Question Rewriter", question.clone()),
            NodeOutput::Generated { .. } | NodeOutput::Fallback { .. } => return None,
        },
        WorkflowEvent::RouteDecided { decision, .. } => match decision {
            RouteDecision::DecideToGenerate(GenerateDecision::Generate) => (
                "Retrieval Grader",
                "✅ Decision: Retrieved documents are relevant, generate answer.".to_string(),
            ),
            RouteDecision::DecideToGenerate(GenerateDecision::TransformQuery) => (
                "Retrieval Grader",
                "🔄 Decision: No retrieved document is relevant to the question, transform query."
                    .to_string(),
            ),
            RouteDecision::DecideToGenerate(GenerateDecision::EndWithMessage) => (
                "Retrieval Grader",
                "❌ Decision: Transform query limit reached, ending.".to_string(),
            ),
            RouteDecision::DecideGenerationQuality(QualityDecision::Useful) => return None,
            RouteDecision::DecideGenerationQuality(QualityDecision::NotUseful) => (
                "Hallucination/Answer Grader",
                "🔄 Transform query.".to_string(),
            ),
            RouteDecision::DecideGenerationQuality(QualityDecision::EndWithMessage) => (
                "Hallucination/Answer Grader",
                "❌ Decision: Transform query limit reached, ending.".to_string(),
            ),
        },
        WorkflowEvent::GenerationGraded { check, verdict, .. } => {
            let text = match (check, verdict) {
                (GenerationCheck::Groundedness, BinaryScore::Yes) => {
                    "✅ Decision: Generation is grounded in documents."
                }
                (GenerationCheck::Groundedness, BinaryScore::No) => {
                    "❌ Decision: Generation is not grounded in documents."
                }
                (GenerationCheck::Adequacy, BinaryScore::Yes) => {
                    "✅ Decision: Answer addresses question."
                }
                (GenerationCheck::Adequacy, BinaryScore::No) => {
                    "❌ Decision: Answer does not address question."
                }
            };
            let step = match check {
                GenerationCheck::Groundedness => "Hallucination Grader",
                GenerationCheck::Adequacy => "Answer Grader",
            };
            (step, text.to_string())
        }
        _ => return None,
    };

    Some(format!("[{}] {}", step, text))
}

/// Answer text followed by its distinct page citations, in first-seen order
///
/// Only answered outcomes are cited.
pub fn format_answer(outcome: &WorkflowOutcome) -> String {
    if !outcome.is_answered() {
        return outcome.generation.clone();
    }

    let mut labels: Vec<String> = Vec::new();
    for document in &outcome.source_documents {
        let label = document.source.label();
        if !labels.contains(&label) {
            labels.push(label);
        }
    }

    if labels.is_empty() {
        outcome.generation.clone()
    } else {
        format!("{}\nSources: {}", outcome.generation, labels.join(", "))
    }
}

fn skipped_notice(skipped: u64) -> String {
    format!("({} progress events skipped)", skipped)
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > PREVIEW_CHARS {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", cut)
    } else {
        flat
    }
}

/// Print progress lines to stderr until the run ends
pub async fn render_progress(rx: &mut broadcast::Receiver<WorkflowEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Some(line) = describe_event(&event) {
                    eprintln!("{}", line);
                }
                if event.is_terminal() {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Progress renderer skipped events");
                eprintln!("{}", skipped_notice(skipped));
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Run one question while rendering its progress
pub async fn answer_turn(
    workflow: &AdaptiveRagWorkflow,
    question: &str,
    cancel: CancellationToken,
) -> Result<WorkflowOutcome, WorkflowError> {
    let mut rx = workflow.subscribe();

    let (result, ()) = tokio::join!(
        workflow.run_with_cancellation(question, cancel),
        render_progress(&mut rx)
    );

    result
}
