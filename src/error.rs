use thiserror::Error;

use crate::graph::NodeId;

/// Errors raised by the graph model, the neighbor window and the layout engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("self-loop rejected on node {0}")]
    SelfLoop(NodeId),

    #[error("edge {a} - {b} already exists")]
    DuplicateEdge { a: NodeId, b: NodeId },

    #[error("edge {a} - {b} does not exist")]
    MissingEdge { a: NodeId, b: NodeId },

    #[error("churn needs at least 3 nodes, graph has {count}")]
    InsufficientNodes { count: usize },

    #[error("non-finite {quantity} computed for body {id}")]
    NumericInstability { id: NodeId, quantity: Quantity },
}

/// The physical quantity that went non-finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Force,
    Velocity,
    Position,
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Force => "force",
            Self::Velocity => "velocity",
            Self::Position => "position",
        })
    }
}

impl Error {
    /// Misuse of the API the caller can recover from, as opposed to an engine fault.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::NumericInstability { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
