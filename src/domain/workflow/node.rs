//! Node and routing identifiers of the adaptive retrieval loop

use std::fmt;

use serde::{Deserialize, Serialize};

use super::OutcomeStatus;

/// Nodes of the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    Retrieve,
    GradeDocuments,
    Generate,
    TransformQuery,
    EndWithMessage,
}

impl NodeId {
    pub const ALL: [NodeId; 5] = [
        NodeId::Retrieve,
        NodeId::GradeDocuments,
        NodeId::Generate,
        NodeId::TransformQuery,
        NodeId::EndWithMessage,
    ];

    /// Entry point of every run
    pub const ENTRY: NodeId = NodeId::Retrieve;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retrieve => "retrieve",
            Self::GradeDocuments => "grade_documents",
            Self::Generate => "generate",
            Self::TransformQuery => "transform_query",
            Self::EndWithMessage => "end_with_message",
        }
    }

    /// Outgoing edge of this node
    pub fn edge(&self) -> Edge {
        match self {
            Self::Retrieve => Edge::Fixed(Transition::Node(Self::GradeDocuments)),
            Self::GradeDocuments => Edge::Routed(RouterId::DecideToGenerate),
            Self::Generate => Edge::Routed(RouterId::DecideGenerationQuality),
            Self::TransformQuery => Edge::Fixed(Transition::Node(Self::Retrieve)),
            Self::EndWithMessage => Edge::Fixed(Transition::Finish(OutcomeStatus::Exhausted)),
        }
    }
}

/// How the driver leaves a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Single unconditional successor
    Fixed(Transition),
    /// Successor chosen by a router
    Routed(RouterId),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routers deciding conditional edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterId {
    DecideToGenerate,
    DecideGenerationQuality,
}

impl RouterId {
    /// Every decision this router can return
    pub fn decisions(&self) -> Vec<RouteDecision> {
        match self {
            Self::DecideToGenerate => GenerateDecision::ALL
                .into_iter()
                .map(RouteDecision::DecideToGenerate)
                .collect(),
            Self::DecideGenerationQuality => QualityDecision::ALL
                .into_iter()
                .map(RouteDecision::DecideGenerationQuality)
                .collect(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DecideToGenerate => "decide_to_generate",
            Self::DecideGenerationQuality => "decide_generation_quality",
        }
    }
}

impl fmt::Display for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the driver does after a node completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Node(NodeId),
    Finish(OutcomeStatus),
}

/// Route taken after grading documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerateDecision {
    Generate,
    TransformQuery,
    EndWithMessage,
}

impl GenerateDecision {
    pub const ALL: [GenerateDecision; 3] = [
        GenerateDecision::Generate,
        GenerateDecision::TransformQuery,
        GenerateDecision::EndWithMessage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::TransformQuery => "transform_query",
            Self::EndWithMessage => "end_with_message",
        }
    }

    pub fn transition(&self) -> Transition {
        match self {
            Self::Generate => Transition::Node(NodeId::Generate),
            Self::TransformQuery => Transition::Node(NodeId::TransformQuery),
            Self::EndWithMessage => Transition::Node(NodeId::EndWithMessage),
        }
    }
}

/// Route taken after generating an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityDecision {
    Useful,
    NotUseful,
    EndWithMessage,
}

impl QualityDecision {
    pub const ALL: [QualityDecision; 3] = [
        QualityDecision::Useful,
        QualityDecision::NotUseful,
        QualityDecision::EndWithMessage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Useful => "useful",
            Self::NotUseful => "not_useful",
            Self::EndWithMessage => "end_with_message",
        }
    }

    pub fn transition(&self) -> Transition {
        match self {
            Self::Useful => Transition::Finish(OutcomeStatus::Answered),
            Self::NotUseful => Transition::Node(NodeId::TransformQuery),
            Self::EndWithMessage => Transition::Node(NodeId::EndWithMessage),
        }
    }
}

/// A routing decision as reported to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "router", content = "decision", rename_all = "snake_case")]
pub enum RouteDecision {
    DecideToGenerate(GenerateDecision),
    DecideGenerationQuality(QualityDecision),
}

impl RouteDecision {
    pub fn router(&self) -> RouterId {
        match self {
            Self::DecideToGenerate(_) => RouterId::DecideToGenerate,
            Self::DecideGenerationQuality(_) => RouterId::DecideGenerationQuality,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::DecideToGenerate(d) => d.as_str(),
            Self::DecideGenerationQuality(d) => d.as_str(),
        }
    }

    pub fn transition(&self) -> Transition {
        match self {
            Self::DecideToGenerate(d) => d.transition(),
            Self::DecideGenerationQuality(d) => d.transition(),
        }
    }
}
