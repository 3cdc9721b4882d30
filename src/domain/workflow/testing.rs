//! Scripted collaborators for driving multi-pass runs in tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::Collaborators;
use crate::domain::grading::{
    AnswerGenerator, AnswerGrader, BinaryScore, GradeResult, GroundednessGrader, QuestionRewriter,
    RelevanceGrader,
};
use crate::domain::retrieval::{Document, Retriever};
use crate::domain::DomainError;

pub fn relevant(text: &str, page: u32) -> Document {
    Document::on_page(format!("relevant: {text}"), page)
}

pub fn irrelevant(text: &str, page: u32) -> Document {
    Document::on_page(format!("noise: {text}"), page)
}

/// Returns queued result sets in order, then repeats the last one
#[derive(Debug, Default)]
pub struct ScriptedRetriever {
    passes: Mutex<VecDeque<Vec<Document>>>,
    last: Mutex<Vec<Document>>,
    questions: Mutex<Vec<String>>,
    cancel_on_call: Option<CancellationToken>,
}

impl ScriptedRetriever {
    pub fn always(documents: Vec<Document>) -> Self {
        Self::sequence(vec![documents])
    }

    pub fn sequence(passes: Vec<Vec<Document>>) -> Self {
        Self {
            passes: Mutex::new(passes.into()),
            ..Self::default()
        }
    }

    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_on_call = Some(token);
        self
    }

    pub fn calls(&self) -> u32 {
        self.questions.lock().unwrap().len() as u32
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for ScriptedRetriever {
    async fn retrieve(&self, question: &str) -> Result<Vec<Document>, DomainError> {
        self.questions.lock().unwrap().push(question.to_string());

        if let Some(token) = &self.cancel_on_call {
            token.cancel();
        }

        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.passes.lock().unwrap().pop_front() {
            *last = next;
        }

        Ok(last.clone())
    }
}

/// Relevant iff the passage text starts with `relevant`
///
/// Shorter texts are delayed longer so that completions arrive out of order.
#[derive(Debug, Default)]
pub struct PrefixRelevanceGrader {
    calls: AtomicU32,
    staggered: bool,
}

impl PrefixRelevanceGrader {
    pub fn staggered() -> Self {
        Self {
            staggered: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelevanceGrader for PrefixRelevanceGrader {
    async fn grade_relevance(
        &self,
        _question: &str,
        document_text: &str,
    ) -> Result<GradeResult, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.staggered {
            let delay = 60u64.saturating_sub(document_text.len() as u64);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        Ok(BinaryScore::from(document_text.starts_with("relevant")).into())
    }
}

/// Returns queued verdicts in order, then repeats the last one
#[derive(Debug)]
pub struct ScriptedVerdicts {
    queued: Mutex<VecDeque<BinaryScore>>,
    last: Mutex<BinaryScore>,
    calls: AtomicU32,
}

impl ScriptedVerdicts {
    pub fn always(score: BinaryScore) -> Self {
        Self::sequence(vec![score])
    }

    pub fn sequence(scores: Vec<BinaryScore>) -> Self {
        Self {
            queued: Mutex::new(scores.into()),
            last: Mutex::new(BinaryScore::No),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> GradeResult {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.queued.lock().unwrap().pop_front() {
            *last = next;
        }

        GradeResult::from(*last)
    }
}

#[async_trait]
impl GroundednessGrader for ScriptedVerdicts {
    async fn grade_groundedness(
        &self,
        _documents: &[Document],
        _generation: &str,
    ) -> Result<GradeResult, DomainError> {
        Ok(self.next())
    }
}

#[async_trait]
impl AnswerGrader for ScriptedVerdicts {
    async fn grade_adequacy(
        &self,
        _question: &str,
        _generation: &str,
    ) -> Result<GradeResult, DomainError> {
        Ok(self.next())
    }
}

/// Answers with the question and the number of passages it saw
#[derive(Debug, Default)]
pub struct EchoGenerator {
    calls: AtomicU32,
}

impl EchoGenerator {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerGenerator for EchoGenerator {
    async fn generate(&self, context: &[Document], question: &str) -> Result<String, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("answer to '{}' from {} passages", question, context.len()))
    }
}

/// Appends a rewrite marker to the question
#[derive(Debug, Default)]
pub struct SuffixRewriter {
    calls: AtomicU32,
}

impl SuffixRewriter {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionRewriter for SuffixRewriter {
    async fn rewrite_question(&self, question: &str) -> Result<String, DomainError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("{question} (rewrite {n})"))
    }
}

/// Handles on every scripted collaborator of a test run
pub struct Harness {
    pub retriever: Arc<ScriptedRetriever>,
    pub relevance: Arc<PrefixRelevanceGrader>,
    pub groundedness: Arc<ScriptedVerdicts>,
    pub adequacy: Arc<ScriptedVerdicts>,
    pub generator: Arc<EchoGenerator>,
    pub rewriter: Arc<SuffixRewriter>,
}

impl Harness {
    pub fn new(
        retriever: ScriptedRetriever,
        groundedness: ScriptedVerdicts,
        adequacy: ScriptedVerdicts,
    ) -> Self {
        Self {
            retriever: Arc::new(retriever),
            relevance: Arc::new(PrefixRelevanceGrader::default()),
            groundedness: Arc::new(groundedness),
            adequacy: Arc::new(adequacy),
            generator: Arc::new(EchoGenerator::default()),
            rewriter: Arc::new(SuffixRewriter::default()),
        }
    }

    pub fn with_relevance(mut self, relevance: PrefixRelevanceGrader) -> Self {
        self.relevance = Arc::new(relevance);
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            retriever: self.retriever.clone(),
            generator: self.generator.clone(),
            relevance_grader: self.relevance.clone(),
            groundedness_grader: self.groundedness.clone(),
            answer_grader: self.adequacy.clone(),
            rewriter: self.rewriter.clone(),
        }
    }
}
