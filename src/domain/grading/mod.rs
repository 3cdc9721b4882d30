//! Grading verdicts and the language-model collaborator seams

mod collaborators;
mod score;

pub use collaborators::{
    AnswerGenerator, AnswerGrader, GroundednessGrader, QuestionRewriter, RelevanceGrader,
};
pub use score::{BinaryScore, GradeResult};

#[cfg(test)]
pub use collaborators::{
    MockAnswerGenerator, MockAnswerGrader, MockGroundednessGrader, MockQuestionRewriter,
    MockRelevanceGrader,
};
