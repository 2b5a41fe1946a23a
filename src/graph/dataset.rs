use std::collections::{BTreeMap, BTreeSet};

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::error::{Error, Result};

use super::{GraphModel, NodeId, NodeKind};

#[derive(Clone, Debug)]
pub struct DatasetNode {
    pub title: String,
    pub kind: NodeKind,
    pub neighbors: BTreeSet<NodeId>,
}

/// Full reference adjacency, independent of what is currently wired.
///
/// Built once by [`super::GraphBuilder`]; read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct DatasetGraph {
    nodes: BTreeMap<NodeId, DatasetNode>,
    edge_count: usize,
}

impl DatasetGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn node(&self, id: &NodeId) -> Option<&DatasetNode> {
        self.nodes.get(id)
    }

    pub fn title(&self, id: &NodeId) -> Option<&str> {
        self.nodes.get(id).map(|node| node.title.as_str())
    }

    pub fn neighbors(&self, id: &NodeId) -> Result<&BTreeSet<NodeId>> {
        self.nodes
            .get(id)
            .map(|node| &node.neighbors)
            .ok_or_else(|| Error::UnknownNode(id.clone()))
    }

    /// Ranks nodes by fuzzy title match; an exact id match always comes first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<NodeId> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }

        let matcher = SkimMatcherV2::default();
        let mut ranked = self
            .nodes
            .iter()
            .filter_map(|(id, node)| {
                if id.as_str() == query {
                    return Some((i64::MAX, id));
                }
                fuzzy_match_score(&matcher, &node.title, query).map(|score| (score, id))
            })
            .collect::<Vec<_>>();

        ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        ranked.truncate(limit);
        ranked.into_iter().map(|(_, id)| id.clone()).collect()
    }

    pub(super) fn insert_node(&mut self, id: NodeId, title: String, kind: NodeKind) -> bool {
        if self.nodes.contains_key(&id) {
            return false;
        }
        self.nodes.insert(
            id,
            DatasetNode {
                title,
                kind,
                neighbors: BTreeSet::new(),
            },
        );
        true
    }

    /// Connects both directions; returns `false` for self-references, unknown
    /// endpoints and edges that already exist.
    pub(super) fn link(&mut self, a: &NodeId, b: &NodeId) -> bool {
        if a == b || !self.nodes.contains_key(a) || !self.nodes.contains_key(b) {
            return false;
        }

        let inserted = self
            .nodes
            .get_mut(a)
            .is_some_and(|node| node.neighbors.insert(b.clone()));
        if let Some(node) = self.nodes.get_mut(b) {
            node.neighbors.insert(a.clone());
        }
        if inserted {
            self.edge_count += 1;
        }
        inserted
    }

    /// Copies the nodes and edges of a live model, titling each node by its id.
    pub(super) fn from_model(model: &GraphModel, kind: NodeKind) -> Self {
        let mut dataset = Self::default();
        for id in model.nodes() {
            dataset.insert_node(id.clone(), id.to_string(), kind);
        }
        for (a, b) in model.edges() {
            dataset.link(a, b);
        }
        dataset
    }
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(entries: &[(&str, &str)]) -> DatasetGraph {
        let mut dataset = DatasetGraph::default();
        for (id, title) in entries {
            dataset.insert_node(NodeId::from(*id), (*title).to_owned(), NodeKind::Fact);
        }
        dataset
    }

    #[test]
    fn link_is_symmetric_and_deduplicated() {
        let mut dataset = titled(&[("a", "A"), ("b", "B")]);

        assert!(dataset.link(&"a".into(), &"b".into()));
        assert!(!dataset.link(&"b".into(), &"a".into()));
        assert!(!dataset.link(&"a".into(), &"a".into()));
        assert!(!dataset.link(&"a".into(), &"zz".into()));

        assert_eq!(dataset.edge_count(), 1);
        assert!(dataset.neighbors(&"b".into()).unwrap().contains(&"a".into()));
        assert_eq!(
            dataset.neighbors(&"zz".into()),
            Err(Error::UnknownNode("zz".into()))
        );
    }

    #[test]
    fn search_prefers_exact_id_then_fuzzy_title() {
        let dataset = titled(&[
            ("1", "Graph theory"),
            ("2", "Gravity"),
            ("graph", "Unrelated"),
        ]);

        let hits = dataset.search("graph", 5);
        assert_eq!(hits.first(), Some(&NodeId::from("graph")));
        assert!(hits.contains(&NodeId::from("1")));
        assert!(dataset.search("   ", 5).is_empty());
    }
}
