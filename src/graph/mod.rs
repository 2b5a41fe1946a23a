mod builder;
mod dataset;
mod model;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use builder::{BuiltGraph, GraphBuilder};
pub use dataset::{DatasetGraph, DatasetNode};
pub use model::{ChurnOutcome, GraphEvent, GraphModel, NeighborChange};

/// Identifier of a dataset entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        Self(value.to_string())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    #[default]
    Fact,
    Projection,
}

impl NodeKind {
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            None | Some("Fact") => Self::Fact,
            Some(_) => Self::Projection,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Fact => "Fact",
            Self::Projection => "Projection",
        }
    }
}
