//! Static description of the transition table

use std::fmt::Write as _;

use super::{Edge, NodeId, Transition};

/// Endpoint of an edge in the rendered graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphNode {
    Start,
    Node(NodeId),
    End,
}

impl GraphNode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "__start__",
            Self::Node(node) => node.as_str(),
            Self::End => "__end__",
        }
    }

    fn from_transition(transition: Transition) -> Self {
        match transition {
            Transition::Node(node) => Self::Node(node),
            Transition::Finish(_) => Self::End,
        }
    }
}

/// A directed edge; conditional edges carry the router label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphEdge {
    pub from: GraphNode,
    pub to: GraphNode,
    pub label: Option<&'static str>,
}

/// The loop's nodes and edges, derived from [`NodeId::edge`] as the driver is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowGraph {
    pub edges: Vec<GraphEdge>,
}

impl WorkflowGraph {
    pub fn describe() -> Self {
        let mut edges = vec![GraphEdge {
            from: GraphNode::Start,
            to: GraphNode::Node(NodeId::ENTRY),
            label: None,
        }];

        for node in NodeId::ALL {
            match node.edge() {
                Edge::Fixed(next) => edges.push(GraphEdge {
                    from: GraphNode::Node(node),
                    to: GraphNode::from_transition(next),
                    label: None,
                }),
                Edge::Routed(router) => {
                    for decision in router.decisions() {
                        edges.push(GraphEdge {
                            from: GraphNode::Node(node),
                            to: GraphNode::from_transition(decision.transition()),
                            label: Some(decision.label()),
                        });
                    }
                }
            }
        }

        Self { edges }
    }

    /// Edges leaving a node
    pub fn successors(&self, from: NodeId) -> Vec<GraphNode> {
        self.edges
            .iter()
            .filter(|e| e.from == GraphNode::Node(from))
            .map(|e| e.to)
            .collect()
    }

    /// Render as a Mermaid flowchart
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD;\n");

        for edge in &self.edges {
            let _ = match edge.label {
                Some(label) => writeln!(
                    out,
                    "\t{} -. {} .-> {};",
                    edge.from.as_str(),
                    label,
                    edge.to.as_str()
                ),
                None => writeln!(out, "\t{} --> {};", edge.from.as_str(), edge.to.as_str()),
            };
        }

        out
    }
}
