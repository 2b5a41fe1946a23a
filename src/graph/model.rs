use std::collections::{BTreeMap, BTreeSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::ChurnConfig;
use crate::error::{Error, Result};

use super::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NeighborChange {
    Add,
    Remove,
}

/// Notification queued for every directed half of an edge mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphEvent {
    pub change: NeighborChange,
    pub node: NodeId,
    pub neighbor: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChurnOutcome {
    Added(NodeId, NodeId),
    Removed(NodeId, NodeId),
    /// The picked node sits at the degree floor, so nothing was removed.
    Unchanged(NodeId),
}

/// The live, wired graph: symmetric adjacency among known nodes.
///
/// Edges only change through `add_edge`/`remove_edge`, which keep both
/// directions in step and queue a pair of [`GraphEvent`]s.
pub struct GraphModel {
    adjacency: BTreeMap<NodeId, BTreeSet<NodeId>>,
    events: Vec<GraphEvent>,
    churn: ChurnConfig,
    rng: StdRng,
}

impl GraphModel {
    pub fn new(churn: ChurnConfig, seed: u64) -> Self {
        Self {
            adjacency: BTreeMap::new(),
            events: Vec::new(),
            churn,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Registers `id`; returns `false` when it was already present.
    pub fn add_node(&mut self, id: NodeId) -> bool {
        if self.adjacency.contains_key(&id) {
            return false;
        }
        self.adjacency.insert(id, BTreeSet::new());
        true
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.adjacency.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.adjacency.keys()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Every edge once, as `(smaller, larger)`.
    pub fn edges(&self) -> impl Iterator<Item = (&NodeId, &NodeId)> {
        self.adjacency.iter().flat_map(|(node, neighbors)| {
            neighbors
                .iter()
                .filter(move |neighbor| node < *neighbor)
                .map(move |neighbor| (node, neighbor))
        })
    }

    pub fn has_edge(&self, a: &NodeId, b: &NodeId) -> bool {
        self.adjacency
            .get(a)
            .is_some_and(|neighbors| neighbors.contains(b))
    }

    pub fn neighbors(&self, id: &NodeId) -> Result<&BTreeSet<NodeId>> {
        self.adjacency
            .get(id)
            .ok_or_else(|| Error::UnknownNode(id.clone()))
    }

    pub fn degree(&self, id: &NodeId) -> Result<usize> {
        self.neighbors(id).map(BTreeSet::len)
    }

    pub fn add_edge(&mut self, a: &NodeId, b: &NodeId) -> Result<()> {
        self.check_endpoints(a, b)?;
        if self.has_edge(a, b) {
            return Err(Error::DuplicateEdge {
                a: a.clone(),
                b: b.clone(),
            });
        }

        self.link(a, b, true);
        self.push_pair(NeighborChange::Add, a, b);
        Ok(())
    }

    pub fn remove_edge(&mut self, a: &NodeId, b: &NodeId) -> Result<()> {
        self.check_endpoints(a, b)?;
        if !self.has_edge(a, b) {
            return Err(Error::MissingEdge {
                a: a.clone(),
                b: b.clone(),
            });
        }

        self.link(a, b, false);
        self.push_pair(NeighborChange::Remove, a, b);
        Ok(())
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, GraphEvent> {
        self.events.drain(..)
    }

    /// One randomized degree-balancing mutation.
    ///
    /// Picks a node uniformly; if it is under the degree floor or at/below the
    /// ideal ratio it gains an edge to a random non-neighbor, otherwise it
    /// loses a random edge as long as that keeps it above the floor.
    pub fn churn(&mut self) -> Result<ChurnOutcome> {
        let count = self.adjacency.len();
        if count < 3 {
            return Err(Error::InsufficientNodes { count });
        }

        let pick = self.rng.gen_range(0..count);
        let Some((node, neighbors)) = self.adjacency.iter().nth(pick) else {
            return Err(Error::InsufficientNodes { count });
        };
        let node = node.clone();
        let degree = neighbors.len();
        let ratio = degree as f64 / (count - 1) as f64;

        if degree < self.churn.min_degree || ratio <= self.churn.ideal_ratio {
            let candidates = self
                .adjacency
                .keys()
                .filter(|candidate| **candidate != node && !neighbors.contains(*candidate))
                .collect::<Vec<_>>();
            let Some(target) = candidates.choose(&mut self.rng).map(|id| (*id).clone()) else {
                return Ok(ChurnOutcome::Unchanged(node));
            };

            self.add_edge(&node, &target)?;
            tracing::trace!(%node, %target, degree, "churn added edge");
            Ok(ChurnOutcome::Added(node, target))
        } else {
            if degree <= self.churn.min_degree {
                return Ok(ChurnOutcome::Unchanged(node));
            }

            let current = neighbors.iter().collect::<Vec<_>>();
            let Some(target) = current.choose(&mut self.rng).map(|id| (*id).clone()) else {
                return Ok(ChurnOutcome::Unchanged(node));
            };

            self.remove_edge(&node, &target)?;
            tracing::trace!(%node, %target, degree, "churn removed edge");
            Ok(ChurnOutcome::Removed(node, target))
        }
    }

    fn check_endpoints(&self, a: &NodeId, b: &NodeId) -> Result<()> {
        if a == b {
            return Err(Error::SelfLoop(a.clone()));
        }
        for id in [a, b] {
            if !self.adjacency.contains_key(id) {
                return Err(Error::UnknownNode(id.clone()));
            }
        }
        Ok(())
    }

    fn link(&mut self, a: &NodeId, b: &NodeId, connect: bool) {
        for (from, to) in [(a, b), (b, a)] {
            if let Some(neighbors) = self.adjacency.get_mut(from) {
                if connect {
                    neighbors.insert(to.clone());
                } else {
                    neighbors.remove(to);
                }
            }
        }
    }

    fn push_pair(&mut self, change: NeighborChange, a: &NodeId, b: &NodeId) {
        self.events.push(GraphEvent {
            change,
            node: a.clone(),
            neighbor: b.clone(),
        });
        self.events.push(GraphEvent {
            change,
            node: b.clone(),
            neighbor: a.clone(),
        });
    }
}
