//! Lifecycle events published while a run progresses
//!
//! Observers (a terminal renderer, a metrics recorder) subscribe to the bus and
//! never need to know how the loop is wired.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{NodeId, OutcomeStatus, RouteDecision};
use crate::domain::grading::BinaryScore;
use crate::domain::retrieval::Document;

/// Which generation check produced a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationCheck {
    Groundedness,
    Adequacy,
}

impl GenerationCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groundedness => "groundedness",
            Self::Adequacy => "adequacy",
        }
    }
}

/// Output of a completed node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeOutput {
    Retrieved { documents: Vec<Document> },
    Filtered { kept: usize, discarded: usize },
    Generated { generation: String },
    QuestionRewritten { question: String },
    Fallback { message: String },
}

/// Events emitted by the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    RunStarted {
        run_id: Uuid,
        question: String,
    },
    NodeStarted {
        run_id: Uuid,
        node: NodeId,
        iterations: u32,
    },
    NodeCompleted {
        run_id: Uuid,
        node: NodeId,
        output: NodeOutput,
    },
    DocumentGraded {
        run_id: Uuid,
        index: usize,
        verdict: BinaryScore,
    },
    GenerationGraded {
        run_id: Uuid,
        check: GenerationCheck,
        verdict: BinaryScore,
    },
    RouteDecided {
        run_id: Uuid,
        decision: RouteDecision,
        iterations: u32,
    },
    RunCompleted {
        run_id: Uuid,
        status: OutcomeStatus,
        iterations: u32,
    },
    RunFailed {
        run_id: Uuid,
        error: String,
    },
}

impl WorkflowEvent {
    pub fn run_id(&self) -> Uuid {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::NodeStarted { run_id, .. }
            | Self::NodeCompleted { run_id, .. }
            | Self::DocumentGraded { run_id, .. }
            | Self::GenerationGraded { run_id, .. }
            | Self::RouteDecided { run_id, .. }
            | Self::RunCompleted { run_id, .. }
            | Self::RunFailed { run_id, .. } => *run_id,
        }
    }

    /// Whether no further events follow for this run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RunCompleted { .. } | Self::RunFailed { .. })
    }
}

/// Broadcast bus for workflow events
#[derive(Debug)]
pub struct WorkflowEventBus {
    tx: broadcast::Sender<WorkflowEvent>,
}

impl WorkflowEventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: WorkflowEvent) {
        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }
}

impl Default for WorkflowEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
