//! Workflow driver - runs the adaptive retrieval loop to completion

use std::fmt;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use super::routing::{self, GenerationVerdict};
use super::{
    Collaborator, Edge, GenerateDecision, GenerationCheck, NodeId, NodeOutput, OutcomeStatus,
    QualityDecision, RouteDecision, RouterId, Transition, WorkflowConfig, WorkflowError,
    WorkflowEvent, WorkflowEventBus, WorkflowOutcome, WorkflowState,
};
use crate::domain::grading::{
    AnswerGenerator, AnswerGrader, GradeResult, GroundednessGrader, QuestionRewriter,
    RelevanceGrader,
};
use crate::domain::retrieval::Retriever;
use crate::domain::DomainError;

/// The six collaborators a run depends on
#[derive(Clone)]
pub struct Collaborators {
    pub retriever: Arc<dyn Retriever>,
    pub generator: Arc<dyn AnswerGenerator>,
    pub relevance_grader: Arc<dyn RelevanceGrader>,
    pub groundedness_grader: Arc<dyn GroundednessGrader>,
    pub answer_grader: Arc<dyn AnswerGrader>,
    pub rewriter: Arc<dyn QuestionRewriter>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Self-correcting retrieval loop
///
/// A run starts at `retrieve` and ends either with an accepted answer or with
/// the fallback message once `max_iterations` query rewrites have been spent.
/// Each run owns its own [`WorkflowState`], so one workflow can serve
/// concurrent runs.
#[derive(Debug, Clone)]
pub struct AdaptiveRagWorkflow {
    collaborators: Collaborators,
    config: WorkflowConfig,
    events: Arc<WorkflowEventBus>,
}

impl AdaptiveRagWorkflow {
    pub fn new(collaborators: Collaborators, config: WorkflowConfig) -> Self {
        Self {
            collaborators,
            config,
            events: Arc::new(WorkflowEventBus::default()),
        }
    }

    /// Publish events on a shared bus instead of a private one
    pub fn with_event_bus(mut self, events: Arc<WorkflowEventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn event_bus(&self) -> Arc<WorkflowEventBus> {
        Arc::clone(&self.events)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    /// Answer a question
    pub async fn run(&self, question: impl Into<String>) -> Result<WorkflowOutcome, WorkflowError> {
        self.run_with_cancellation(question, CancellationToken::new())
            .await
    }

    /// Answer a question, stopping before the next node once `cancel` fires
    pub async fn run_with_cancellation(
        &self,
        question: impl Into<String>,
        cancel: CancellationToken,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let run_id = Uuid::new_v4();
        let question = question.into();
        let span = tracing::info_span!("workflow_run", %run_id);

        async move {
            info!(max_iterations = self.config.max_iterations, "Starting workflow run");
            self.events.publish(WorkflowEvent::RunStarted {
                run_id,
                question: question.clone(),
            });

            let result = self.drive(run_id, WorkflowState::new(question), &cancel).await;

            match &result {
                Ok(outcome) => {
                    info!(
                        status = outcome.status.as_str(),
                        iterations = outcome.iterations,
                        retrieval_passes = outcome.retrieval_passes,
                        "Workflow run finished"
                    );
                    self.events.publish(WorkflowEvent::RunCompleted {
                        run_id,
                        status: outcome.status,
                        iterations: outcome.iterations,
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Workflow run failed");
                    self.events.publish(WorkflowEvent::RunFailed {
                        run_id,
                        error: e.to_string(),
                    });
                }
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn drive(
        &self,
        run_id: Uuid,
        mut state: WorkflowState,
        cancel: &CancellationToken,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let mut node = NodeId::ENTRY;
        let mut retrieval_passes = 0u32;

        loop {
            if cancel.is_cancelled() {
                info!(node = %node, "Cancellation requested");
                return Err(WorkflowError::cancelled(node));
            }

            self.events.publish(WorkflowEvent::NodeStarted {
                run_id,
                node,
                iterations: state.iterations,
            });

            match node {
                NodeId::Retrieve => {
                    retrieval_passes += 1;
                    self.retrieve(run_id, &mut state).await?;
                }
                NodeId::GradeDocuments => self.grade_documents(run_id, &mut state).await?,
                NodeId::Generate => self.generate(run_id, &mut state).await?,
                NodeId::TransformQuery => self.transform_query(run_id, &mut state).await?,
                NodeId::EndWithMessage => self.end_with_message(run_id, &mut state),
            }

            let transition = match node.edge() {
                Edge::Fixed(next) => next,
                Edge::Routed(RouterId::DecideToGenerate) => {
                    self.decide_to_generate(run_id, &state).transition()
                }
                Edge::Routed(RouterId::DecideGenerationQuality) => self
                    .decide_generation_quality(run_id, &state)
                    .await?
                    .transition(),
            };

            match transition {
                Transition::Node(next) => node = next,
                Transition::Finish(status) => {
                    return Ok(Self::finish(run_id, state, status, retrieval_passes));
                }
            }
        }
    }

    fn finish(
        run_id: Uuid,
        state: WorkflowState,
        status: OutcomeStatus,
        retrieval_passes: u32,
    ) -> WorkflowOutcome {
        let source_documents = match status {
            OutcomeStatus::Answered => state.documents,
            OutcomeStatus::Exhausted => Vec::new(),
        };

        WorkflowOutcome {
            run_id,
            status,
            generation: state.generation.unwrap_or_default(),
            source_documents,
            question: state.question,
            iterations: state.iterations,
            retrieval_passes,
        }
    }

    async fn retrieve(&self, run_id: Uuid, state: &mut WorkflowState) -> Result<(), WorkflowError> {
        info!(question = %state.question, "Retrieving documents");

        let documents = self
            .collaborators
            .retriever
            .retrieve(&state.question)
            .await
            .map_err(WorkflowError::from_collaborator(Collaborator::Retriever))?;

        debug!(count = documents.len(), "Retrieved documents");
        state.documents = documents;

        self.events.publish(WorkflowEvent::NodeCompleted {
            run_id,
            node: NodeId::Retrieve,
            output: NodeOutput::Retrieved {
                documents: state.documents.clone(),
            },
        });

        Ok(())
    }

    /// Grade every passage and keep the relevant ones in their original order
    ///
    /// All grader calls run to completion even when one fails; the first error
    /// in passage order is reported.
    async fn grade_documents(
        &self,
        run_id: Uuid,
        state: &mut WorkflowState,
    ) -> Result<(), WorkflowError> {
        info!(count = state.documents.len(), "Checking document relevance to question");

        let pending: Vec<_> = state
            .documents
            .iter()
            .map(|document| {
                let grader = Arc::clone(&self.collaborators.relevance_grader);
                let question = state.question.clone();
                let text = document.text.clone();
                async move { grader.grade_relevance(&question, &text).await }
            })
            .collect();

        let verdicts: Vec<Result<GradeResult, DomainError>> = stream::iter(pending)
            .buffered(self.config.grading_concurrency.max(1))
            .collect()
            .await;

        let verdicts = verdicts
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(WorkflowError::from_collaborator(Collaborator::RelevanceGrader))?;

        let total = verdicts.len();
        let mut kept = Vec::with_capacity(total);

        for (index, (document, grade)) in state.documents.drain(..).zip(verdicts).enumerate() {
            self.events.publish(WorkflowEvent::DocumentGraded {
                run_id,
                index,
                verdict: grade.binary_score,
            });

            if grade.is_yes() {
                debug!(index, "Document relevant");
                kept.push(document);
            } else {
                debug!(index, "Document not relevant");
            }
        }

        state.documents = kept;

        self.events.publish(WorkflowEvent::NodeCompleted {
            run_id,
            node: NodeId::GradeDocuments,
            output: NodeOutput::Filtered {
                kept: state.documents.len(),
                discarded: total - state.documents.len(),
            },
        });

        Ok(())
    }

    fn decide_to_generate(&self, run_id: Uuid, state: &WorkflowState) -> GenerateDecision {
        let decision = routing::decide_to_generate(state, self.config.max_iterations);

        match decision {
            GenerateDecision::Generate => info!("Decision: generate"),
            GenerateDecision::TransformQuery => {
                info!("Decision: no relevant documents, transform query")
            }
            GenerateDecision::EndWithMessage => {
                info!("Decision: no relevant documents and rewrite limit reached, ending")
            }
        }

        self.publish_route(run_id, RouteDecision::DecideToGenerate(decision), state);
        decision
    }

    async fn generate(&self, run_id: Uuid, state: &mut WorkflowState) -> Result<(), WorkflowError> {
        info!(documents = state.documents.len(), "Generating answer");

        let generation = self
            .collaborators
            .generator
            .generate(&state.documents, &state.question)
            .await
            .map_err(WorkflowError::from_collaborator(Collaborator::AnswerGenerator))?;

        state.generation = Some(generation.clone());

        self.events.publish(WorkflowEvent::NodeCompleted {
            run_id,
            node: NodeId::Generate,
            output: NodeOutput::Generated { generation },
        });

        Ok(())
    }

    /// Adequacy is only consulted for grounded generations
    async fn decide_generation_quality(
        &self,
        run_id: Uuid,
        state: &WorkflowState,
    ) -> Result<QualityDecision, WorkflowError> {
        let generation = state.generation.as_deref().unwrap_or_default();

        info!("Checking generation for hallucinations");
        let grounded = self
            .collaborators
            .groundedness_grader
            .grade_groundedness(&state.documents, generation)
            .await
            .map_err(WorkflowError::from_collaborator(Collaborator::GroundednessGrader))?;
        self.publish_generation_grade(run_id, GenerationCheck::Groundedness, grounded);

        let verdict = if !grounded.is_yes() {
            info!("Decision: generation is not grounded in documents");
            GenerationVerdict::NotGrounded
        } else {
            let adequate = self
                .collaborators
                .answer_grader
                .grade_adequacy(&state.question, generation)
                .await
                .map_err(WorkflowError::from_collaborator(Collaborator::AnswerGrader))?;
            self.publish_generation_grade(run_id, GenerationCheck::Adequacy, adequate);

            if adequate.is_yes() {
                info!("Decision: generation addresses question");
                GenerationVerdict::Accepted
            } else {
                info!("Decision: generation does not address question");
                GenerationVerdict::NotAdequate
            }
        };

        let decision =
            routing::decide_generation_quality(verdict, state, self.config.max_iterations);
        if decision == QualityDecision::EndWithMessage {
            info!("Rewrite limit reached, ending");
        }

        self.publish_route(run_id, RouteDecision::DecideGenerationQuality(decision), state);
        Ok(decision)
    }

    async fn transform_query(
        &self,
        run_id: Uuid,
        state: &mut WorkflowState,
    ) -> Result<(), WorkflowError> {
        state.iterations += 1;
        info!(iterations = state.iterations, "Transforming query");

        let question = self
            .collaborators
            .rewriter
            .rewrite_question(&state.question)
            .await
            .map_err(WorkflowError::from_collaborator(Collaborator::QuestionRewriter))?;

        debug!(question = %question, "Rewrote question");
        state.question = question.clone();

        self.events.publish(WorkflowEvent::NodeCompleted {
            run_id,
            node: NodeId::TransformQuery,
            output: NodeOutput::QuestionRewritten { question },
        });

        Ok(())
    }

    fn end_with_message(&self, run_id: Uuid, state: &mut WorkflowState) {
        info!("Ending with fallback message");

        let message = self.config.fallback_message.clone();
        state.generation = Some(message.clone());

        self.events.publish(WorkflowEvent::NodeCompleted {
            run_id,
            node: NodeId::EndWithMessage,
            output: NodeOutput::Fallback { message },
        });
    }

    fn publish_route(&self, run_id: Uuid, decision: RouteDecision, state: &WorkflowState) {
        debug!(
            router = %decision.router(),
            decision = decision.label(),
            iterations = state.iterations,
            "Route decided"
        );
        self.events.publish(WorkflowEvent::RouteDecided {
            run_id,
            decision,
            iterations: state.iterations,
        });
    }

    fn publish_generation_grade(&self, run_id: Uuid, check: GenerationCheck, grade: GradeResult) {
        self.events.publish(WorkflowEvent::GenerationGraded {
            run_id,
            check,
            verdict: grade.binary_score,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grading::{
        BinaryScore, MockAnswerGenerator, MockGroundednessGrader, MockQuestionRewriter,
        MockRelevanceGrader,
    };
    use crate::domain::retrieval::Document;
    use crate::domain::workflow::testing::{
        irrelevant, relevant, Harness, PrefixRelevanceGrader, ScriptedRetriever, ScriptedVerdicts,
    };

    fn workflow(harness: &Harness, max_iterations: u32) -> AdaptiveRagWorkflow {
        AdaptiveRagWorkflow::new(
            harness.collaborators(),
            WorkflowConfig::default().with_max_iterations(max_iterations),
        )
    }

    fn drain(rx: &mut broadcast::Receiver<WorkflowEvent>) -> Vec<WorkflowEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn started_nodes(events: &[WorkflowEvent]) -> Vec<(NodeId, u32)> {
        events
            .iter()
            .filter_map(|event| match event {
                WorkflowEvent::NodeStarted {
                    node, iterations, ..
                } => Some((*node, *iterations)),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_relevant_and_accepted_in_single_pass() {
        let harness = Harness::new(
            ScriptedRetriever::always(vec![relevant("paris is the capital", 1)]),
            ScriptedVerdicts::always(BinaryScore::Yes),
            ScriptedVerdicts::always(BinaryScore::Yes),
        );

        let outcome = workflow(&harness, 1).run("capital of France?").await.unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Answered);
        assert_eq!(outcome.retrieval_passes, 1);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.question, "capital of France?");
        assert_eq!(outcome.source_documents.len(), 1);
        assert_eq!(
            outcome.generation,
            "answer to 'capital of France?' from 1 passages"
        );
        assert_eq!(harness.rewriter.calls(), 0);
    }

    #[tokio::test]
    async fn test_nothing_relevant_on_either_pass_ends_with_message() {
        let harness = Harness::new(
            ScriptedRetriever::always(vec![irrelevant("weather", 1), irrelevant("sports", 2)]),
            ScriptedVerdicts::always(BinaryScore::Yes),
            ScriptedVerdicts::always(BinaryScore::Yes),
        );

        let outcome = workflow(&harness, 1).run("capital of France?").await.unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Exhausted);
        assert_eq!(outcome.generation, crate::domain::workflow::DEFAULT_FALLBACK_MESSAGE);
        assert!(outcome.source_documents.is_empty());
        assert_eq!(outcome.retrieval_passes, 2);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(harness.rewriter.calls(), 1);
        assert_eq!(harness.generator.calls(), 0);
        assert_eq!(
            harness.retriever.questions(),
            vec![
                "capital of France?".to_string(),
                "capital of France? (rewrite 1)".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_ungrounded_twice_ends_after_one_rewrite() {
        let harness = Harness::new(
            ScriptedRetriever::always(vec![relevant("paris", 1)]),
            ScriptedVerdicts::always(BinaryScore::No),
            ScriptedVerdicts::always(BinaryScore::Yes),
        );

        let outcome = workflow(&harness, 1).run("capital?").await.unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Exhausted);
        assert!(outcome.source_documents.is_empty());
        assert_eq!(outcome.retrieval_passes, 2);
        assert_eq!(harness.generator.calls(), 2);
        assert_eq!(harness.groundedness.calls(), 2);
        assert_eq!(harness.rewriter.calls(), 1);
        // Adequacy is never asked about an ungrounded answer
        assert_eq!(harness.adequacy.calls(), 0);
    }

    #[tokio::test]
    async fn test_ungrounded_then_grounded_is_answered() {
        let harness = Harness::new(
            ScriptedRetriever::always(vec![relevant("paris", 1)]),
            ScriptedVerdicts::sequence(vec![BinaryScore::No, BinaryScore::Yes]),
            ScriptedVerdicts::always(BinaryScore::Yes),
        );

        let outcome = workflow(&harness, 1).run("capital?").await.unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Answered);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.question, "capital? (rewrite 1)");
        assert_eq!(harness.adequacy.calls(), 1);
    }

    #[tokio::test]
    async fn test_inadequate_answer_retries_with_rewritten_question() {
        let harness = Harness::new(
            ScriptedRetriever::always(vec![relevant("paris", 1)]),
            ScriptedVerdicts::always(BinaryScore::Yes),
            ScriptedVerdicts::sequence(vec![BinaryScore::No, BinaryScore::Yes]),
        );

        let outcome = workflow(&harness, 2).run("capital?").await.unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Answered);
        assert_eq!(outcome.retrieval_passes, 2);
        assert_eq!(outcome.iterations, 1);
    }

    #[tokio::test]
    async fn test_recovers_when_rewritten_question_finds_passages() {
        let harness = Harness::new(
            ScriptedRetriever::sequence(vec![
                vec![irrelevant("weather", 1)],
                vec![relevant("paris", 3), irrelevant("sports", 4)],
            ]),
            ScriptedVerdicts::always(BinaryScore::Yes),
            ScriptedVerdicts::always(BinaryScore::Yes),
        );

        let outcome = workflow(&harness, 1).run("capital?").await.unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Answered);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.source_documents, vec![relevant("paris", 3)]);
    }

    #[tokio::test]
    async fn test_retrieval_passes_bounded_by_budget() {
        for max_iterations in 0..=3 {
            let harness = Harness::new(
                ScriptedRetriever::always(vec![irrelevant("noise", 1)]),
                ScriptedVerdicts::always(BinaryScore::Yes),
                ScriptedVerdicts::always(BinaryScore::Yes),
            );

            let outcome = workflow(&harness, max_iterations).run("q").await.unwrap();

            assert_eq!(outcome.status, OutcomeStatus::Exhausted);
            assert_eq!(outcome.retrieval_passes, max_iterations + 1);
            assert_eq!(outcome.iterations, max_iterations);
            assert_eq!(harness.retriever.calls(), max_iterations + 1);
        }
    }

    #[tokio::test]
    async fn test_rejected_generations_bounded_by_budget() {
        for max_iterations in 0..=3 {
            let harness = Harness::new(
                ScriptedRetriever::always(vec![relevant("paris", 1)]),
                ScriptedVerdicts::always(BinaryScore::Yes),
                ScriptedVerdicts::always(BinaryScore::No),
            );

            let outcome = workflow(&harness, max_iterations).run("q").await.unwrap();

            assert_eq!(outcome.status, OutcomeStatus::Exhausted);
            assert_eq!(harness.retriever.calls(), max_iterations + 1);
            assert_eq!(harness.generator.calls(), max_iterations + 1);
        }
    }

    #[tokio::test]
    async fn test_zero_budget_never_rewrites() {
        let harness = Harness::new(
            ScriptedRetriever::always(Vec::new()),
            ScriptedVerdicts::always(BinaryScore::Yes),
            ScriptedVerdicts::always(BinaryScore::Yes),
        );

        let outcome = workflow(&harness, 0).run("q").await.unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Exhausted);
        assert_eq!(outcome.retrieval_passes, 1);
        assert_eq!(harness.rewriter.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_retrieval_is_not_an_error() {
        let harness = Harness::new(
            ScriptedRetriever::always(Vec::new()),
            ScriptedVerdicts::always(BinaryScore::Yes),
            ScriptedVerdicts::always(BinaryScore::Yes),
        );

        let outcome = workflow(&harness, 1).run("q").await.unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Exhausted);
        assert_eq!(harness.relevance.calls(), 0);
    }

    #[tokio::test]
    async fn test_iterations_increase_by_one_per_rewrite() {
        let harness = Harness::new(
            ScriptedRetriever::always(vec![irrelevant("noise", 1)]),
            ScriptedVerdicts::always(BinaryScore::Yes),
            ScriptedVerdicts::always(BinaryScore::Yes),
        );
        let workflow = workflow(&harness, 3);
        let mut rx = workflow.subscribe();

        workflow.run("q").await.unwrap();
        let events = drain(&mut rx);
        let started = started_nodes(&events);

        for pair in started.windows(2) {
            let ((node, before), (_, after)) = (pair[0], pair[1]);
            match node {
                NodeId::TransformQuery => assert_eq!(after, before + 1),
                _ => assert_eq!(after, before),
            }
        }

        let rewrites = events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    WorkflowEvent::NodeCompleted {
                        output: NodeOutput::QuestionRewritten { .. },
                        ..
                    }
                )
            })
            .count();
        assert_eq!(rewrites, 3);
    }

    #[tokio::test]
    async fn test_event_sequence_for_accepted_answer() {
        let harness = Harness::new(
            ScriptedRetriever::always(vec![relevant("paris", 1), irrelevant("rain", 2)]),
            ScriptedVerdicts::always(BinaryScore::Yes),
            ScriptedVerdicts::always(BinaryScore::Yes),
        );
        let workflow = workflow(&harness, 1);
        let mut rx = workflow.subscribe();

        let outcome = workflow.run("capital?").await.unwrap();
        let events = drain(&mut rx);

        assert!(events.iter().all(|e| e.run_id() == outcome.run_id));
        assert!(matches!(events[0], WorkflowEvent::RunStarted { .. }));
        assert!(events.last().is_some_and(WorkflowEvent::is_terminal));

        assert_eq!(
            started_nodes(&events),
            vec![
                (NodeId::Retrieve, 0),
                (NodeId::GradeDocuments, 0),
                (NodeId::Generate, 0)
            ]
        );

        let graded: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                WorkflowEvent::DocumentGraded { index, verdict, .. } => Some((*index, *verdict)),
                _ => None,
            })
            .collect();
        assert_eq!(graded, vec![(0, BinaryScore::Yes), (1, BinaryScore::No)]);

        let routes: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                WorkflowEvent::RouteDecided { decision, .. } => Some(decision.label()),
                _ => None,
            })
            .collect();
        assert_eq!(routes, vec!["generate", "useful"]);

        assert!(events.contains(&WorkflowEvent::NodeCompleted {
            run_id: outcome.run_id,
            node: NodeId::GradeDocuments,
            output: NodeOutput::Filtered {
                kept: 1,
                discarded: 1
            },
        }));
    }

    #[tokio::test]
    async fn test_driver_only_takes_edges_of_described_graph() {
        use crate::domain::workflow::{GraphNode, WorkflowGraph};

        let graph = WorkflowGraph::describe();
        let harnesses = [
            Harness::new(
                ScriptedRetriever::always(vec![relevant("paris", 1)]),
                ScriptedVerdicts::always(BinaryScore::Yes),
                ScriptedVerdicts::always(BinaryScore::Yes),
            ),
            Harness::new(
                ScriptedRetriever::always(vec![irrelevant("rain", 1)]),
                ScriptedVerdicts::always(BinaryScore::Yes),
                ScriptedVerdicts::always(BinaryScore::Yes),
            ),
            Harness::new(
                ScriptedRetriever::always(vec![relevant("paris", 1)]),
                ScriptedVerdicts::always(BinaryScore::No),
                ScriptedVerdicts::always(BinaryScore::Yes),
            ),
            Harness::new(
                ScriptedRetriever::always(vec![relevant("paris", 1)]),
                ScriptedVerdicts::always(BinaryScore::Yes),
                ScriptedVerdicts::always(BinaryScore::No),
            ),
        ];

        for harness in &harnesses {
            let workflow = workflow(harness, 2);
            let mut rx = workflow.subscribe();
            workflow.run("capital?").await.unwrap();

            let path: Vec<_> = started_nodes(&drain(&mut rx))
                .into_iter()
                .map(|(node, _)| node)
                .collect();

            assert_eq!(path[0], NodeId::ENTRY);
            for pair in path.windows(2) {
                assert!(
                    graph.successors(pair[0]).contains(&GraphNode::Node(pair[1])),
                    "{} -> {} is not an edge",
                    pair[0],
                    pair[1]
                );
            }
            let last = path[path.len() - 1];
            assert!(graph.successors(last).contains(&GraphNode::End), "{last}");
        }
    }

    #[tokio::test]
    async fn test_filtering_preserves_order_under_concurrency() {
        let documents = vec![
            relevant("a", 1),
            irrelevant("bb", 2),
            relevant("a much longer passage", 3),
            relevant("ccc", 4),
            irrelevant("dddd", 5),
        ];
        let harness = Harness::new(
            ScriptedRetriever::always(documents),
            ScriptedVerdicts::always(BinaryScore::Yes),
            ScriptedVerdicts::always(BinaryScore::Yes),
        )
        .with_relevance(PrefixRelevanceGrader::staggered());

        let workflow = AdaptiveRagWorkflow::new(
            harness.collaborators(),
            WorkflowConfig::default().with_grading_concurrency(5),
        );
        let outcome = workflow.run("q").await.unwrap();

        let pages: Vec<_> = outcome
            .source_documents
            .iter()
            .filter_map(|d| d.source.page)
            .collect();
        assert_eq!(pages, vec![1, 3, 4]);
        assert_eq!(harness.relevance.calls(), 5);
    }

    #[tokio::test]
    async fn test_relevance_failure_fails_run_after_all_calls() {
        let mut relevance = MockRelevanceGrader::new();
        relevance
            .expect_grade_relevance()
            .times(3)
            .returning(|_, text| {
                if text.contains("broken") {
                    Err(DomainError::provider("mock", "connection reset"))
                } else {
                    Ok(GradeResult::yes())
                }
            });

        let harness = Harness::new(
            ScriptedRetriever::always(vec![
                relevant("ok", 1),
                relevant("broken", 2),
                relevant("ok again", 3),
            ]),
            ScriptedVerdicts::always(BinaryScore::Yes),
            ScriptedVerdicts::always(BinaryScore::Yes),
        );
        let mut collaborators = harness.collaborators();
        collaborators.relevance_grader = Arc::new(relevance);

        let workflow = AdaptiveRagWorkflow::new(collaborators, WorkflowConfig::default());
        let mut rx = workflow.subscribe();
        let err = workflow.run("q").await.unwrap_err();

        assert_eq!(
            err,
            WorkflowError::collaborator(
                Collaborator::RelevanceGrader,
                DomainError::provider("mock", "connection reset")
            )
        );
        assert_eq!(harness.generator.calls(), 0);

        let events = drain(&mut rx);
        assert!(matches!(events.last(), Some(WorkflowEvent::RunFailed { .. })));
    }

    #[tokio::test]
    async fn test_invalid_grade_fails_run() {
        let mut groundedness = MockGroundednessGrader::new();
        groundedness
            .expect_grade_groundedness()
            .times(1)
            .returning(|_, _| Err(DomainError::invalid_grade("\"maybe\"")));

        let harness = Harness::new(
            ScriptedRetriever::always(vec![relevant("paris", 1)]),
            ScriptedVerdicts::always(BinaryScore::Yes),
            ScriptedVerdicts::always(BinaryScore::Yes),
        );
        let mut collaborators = harness.collaborators();
        collaborators.groundedness_grader = Arc::new(groundedness);

        let err = AdaptiveRagWorkflow::new(collaborators, WorkflowConfig::default())
            .run("q")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Collaborator {
                collaborator: Collaborator::GroundednessGrader,
                source: DomainError::InvalidGrade { .. },
            }
        ));
        assert_eq!(harness.adequacy.calls(), 0);
    }

    #[tokio::test]
    async fn test_rewrite_failure_fails_run() {
        let mut rewriter = MockQuestionRewriter::new();
        rewriter
            .expect_rewrite_question()
            .times(1)
            .returning(|_| Err(DomainError::provider("mock", "empty completion")));

        let harness = Harness::new(
            ScriptedRetriever::always(Vec::new()),
            ScriptedVerdicts::always(BinaryScore::Yes),
            ScriptedVerdicts::always(BinaryScore::Yes),
        );
        let mut collaborators = harness.collaborators();
        collaborators.rewriter = Arc::new(rewriter);

        let err = AdaptiveRagWorkflow::new(collaborators, WorkflowConfig::default())
            .run("q")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Collaborator {
                collaborator: Collaborator::QuestionRewriter,
                ..
            }
        ));
        assert_eq!(harness.retriever.calls(), 1);
    }

    #[tokio::test]
    async fn test_generator_sees_only_relevant_passages() {
        let mut generator = MockAnswerGenerator::new();
        generator
            .expect_generate()
            .withf(|context: &[Document], question: &str| {
                context.len() == 1 && context[0].source.page == Some(2) && question == "q"
            })
            .times(1)
            .returning(|_, _| Ok("grounded answer".to_string()));

        let harness = Harness::new(
            ScriptedRetriever::always(vec![irrelevant("rain", 1), relevant("paris", 2)]),
            ScriptedVerdicts::always(BinaryScore::Yes),
            ScriptedVerdicts::always(BinaryScore::Yes),
        );
        let mut collaborators = harness.collaborators();
        collaborators.generator = Arc::new(generator);

        let outcome = AdaptiveRagWorkflow::new(collaborators, WorkflowConfig::default())
            .run("q")
            .await
            .unwrap();

        assert_eq!(outcome.generation, "grounded answer");
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let harness = Harness::new(
            ScriptedRetriever::always(vec![relevant("paris", 1)]),
            ScriptedVerdicts::always(BinaryScore::Yes),
            ScriptedVerdicts::always(BinaryScore::Yes),
        );
        let token = CancellationToken::new();
        token.cancel();

        let err = workflow(&harness, 1)
            .run_with_cancellation("q", token)
            .await
            .unwrap_err();

        assert_eq!(err, WorkflowError::cancelled(NodeId::Retrieve));
        assert_eq!(harness.retriever.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_between_nodes() {
        let token = CancellationToken::new();
        let harness = Harness::new(
            ScriptedRetriever::always(vec![relevant("paris", 1)]).cancelling(token.clone()),
            ScriptedVerdicts::always(BinaryScore::Yes),
            ScriptedVerdicts::always(BinaryScore::Yes),
        );

        let err = workflow(&harness, 1)
            .run_with_cancellation("q", token)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(err, WorkflowError::cancelled(NodeId::GradeDocuments));
        assert_eq!(harness.relevance.calls(), 0);
    }

    #[tokio::test]
    async fn test_shared_event_bus() {
        let bus = Arc::new(WorkflowEventBus::new(64));
        let mut rx = bus.subscribe();
        let harness = Harness::new(
            ScriptedRetriever::always(vec![relevant("paris", 1)]),
            ScriptedVerdicts::always(BinaryScore::Yes),
            ScriptedVerdicts::always(BinaryScore::Yes),
        );

        let workflow = workflow(&harness, 1).with_event_bus(bus.clone());
        assert!(Arc::ptr_eq(&workflow.event_bus(), &bus));

        workflow.run("q").await.unwrap();
        assert!(!drain(&mut rx).is_empty());
    }
}
