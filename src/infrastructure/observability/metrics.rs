//! Workflow metrics recorded through the `metrics` facade and exported to Prometheus

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::config::MetricsConfig;
use crate::domain::workflow::{NodeId, WorkflowEvent};
use crate::domain::DomainError;

pub const RUNS_TOTAL: &str = "rag_workflow_runs_total";
pub const QUERY_REWRITES_TOTAL: &str = "rag_query_rewrites_total";
pub const DOCUMENTS_GRADED_TOTAL: &str = "rag_documents_graded_total";
pub const GENERATION_GRADES_TOTAL: &str = "rag_generation_grades_total";

pub const BUILD_INFO: &str = "rag_build_info";

/// Install the Prometheus recorder and serve `/metrics` on `config.listen`
///
/// Must be called from within the tokio runtime so the listener is spawned on it.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), DomainError> {
    if !config.enabled {
        tracing::debug!("Prometheus metrics disabled");
        return Ok(());
    }

    let addr = config.listen_addr()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| DomainError::internal(format!("Failed to install metrics exporter: {}", e)))?;

    gauge!(BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    tracing::info!("Prometheus metrics served at http://{}/metrics", addr);

    Ok(())
}

/// Record the counters derived from a single event
pub fn record_workflow_event(event: &WorkflowEvent) {
    match event {
        WorkflowEvent::RunCompleted { status, .. } => {
            counter!(RUNS_TOTAL, "outcome" => status.as_str()).increment(1);
        }
        WorkflowEvent::RunFailed { .. } => {
            counter!(RUNS_TOTAL, "outcome" => "failed").increment(1);
        }
        WorkflowEvent::NodeCompleted {
            node: NodeId::TransformQuery,
            ..
        } => {
            counter!(QUERY_REWRITES_TOTAL).increment(1);
        }
        WorkflowEvent::DocumentGraded { verdict, .. } => {
            counter!(DOCUMENTS_GRADED_TOTAL, "verdict" => verdict.as_str()).increment(1);
        }
        WorkflowEvent::GenerationGraded { check, verdict, .. } => {
            counter!(
                GENERATION_GRADES_TOTAL,
                "check" => check.as_str(),
                "verdict" => verdict.as_str()
            )
            .increment(1);
        }
        _ => {}
    }
}

/// Record every event received until the bus closes
pub fn spawn_metrics_recorder(mut rx: broadcast::Receiver<WorkflowEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => record_workflow_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Metrics recorder lagged behind workflow events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
