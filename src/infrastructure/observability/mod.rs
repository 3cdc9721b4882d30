//! Observability infrastructure - Metrics

mod metrics;

pub use self::metrics::{
    init_metrics, record_workflow_event, spawn_metrics_recorder, BUILD_INFO,
    DOCUMENTS_GRADED_TOTAL, GENERATION_GRADES_TOTAL, QUERY_REWRITES_TOTAL, RUNS_TOTAL,
};
