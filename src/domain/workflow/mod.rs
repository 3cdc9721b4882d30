//! Adaptive retrieval workflow
//!
//! A bounded loop over five nodes:
//!
//! ```text
//! retrieve -> grade_documents -> [decide_to_generate]
//!     generate         -> [decide_generation_quality]
//!         useful           -> END
//!         not_useful       -> transform_query -> retrieve
//!         end_with_message -> end_with_message -> END
//!     transform_query  -> retrieve
//!     end_with_message -> END
//! ```
//!
//! Every pass through `transform_query` increments the retry counter, and both
//! routers give up once `max_iterations` rewrites have been spent.

mod config;
mod error;
mod event;
mod executor;
mod graph;
mod node;
mod outcome;
pub mod routing;
mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{WorkflowConfig, DEFAULT_FALLBACK_MESSAGE};
pub use error::{Collaborator, WorkflowError};
pub use event::{GenerationCheck, NodeOutput, WorkflowEvent, WorkflowEventBus};
pub use executor::{AdaptiveRagWorkflow, Collaborators};
pub use graph::{GraphEdge, GraphNode, WorkflowGraph};
pub use node::{
    Edge, GenerateDecision, NodeId, QualityDecision, RouteDecision, RouterId, Transition,
};
pub use outcome::{OutcomeStatus, WorkflowOutcome};
pub use state::WorkflowState;
