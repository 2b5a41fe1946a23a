use std::path::Path;

use anyhow::{Context, Result as AnyResult};

use crate::config::ChurnConfig;
use crate::error::Result;

use super::{DatasetGraph, GraphModel, NodeId, NodeKind};

/// A reference dataset plus a live model that knows every dataset node but
/// has no wired edges yet.
pub struct BuiltGraph {
    pub dataset: DatasetGraph,
    pub model: GraphModel,
}

pub struct GraphBuilder {
    churn: ChurnConfig,
    seed: u64,
}

impl GraphBuilder {
    pub fn new(churn: ChurnConfig, seed: u64) -> Self {
        Self { churn, seed }
    }

    pub fn load(&self, path: &Path) -> AnyResult<BuiltGraph> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dataset file {}", path.display()))?;
        let built = self.from_records(raw.lines());
        if built.dataset.node_count() == 0 {
            anyhow::bail!("dataset file {} contained no usable records", path.display());
        }
        Ok(built)
    }

    /// Parses `id/title[/childIdCsv[/unused[/typeTag]]]` records.
    ///
    /// Records with fewer than two fields, duplicate ids, and child ids that
    /// name no record are skipped.
    pub fn from_records<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> BuiltGraph {
        let records = lines
            .into_iter()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>();
        let mut dataset = DatasetGraph::default();

        for (line_number, record) in records.iter().enumerate() {
            let fields = record.split('/').collect::<Vec<_>>();
            if fields.len() < 2 || fields[0].trim().is_empty() {
                tracing::warn!(line_number, record, "skipping malformed dataset record");
                continue;
            }

            let id = NodeId::from(fields[0].trim());
            let kind = NodeKind::from_tag(fields.get(4).copied());
            if !dataset.insert_node(id.clone(), fields[1].to_owned(), kind) {
                tracing::warn!(line_number, %id, "skipping duplicate dataset record");
            }
        }

        for record in &records {
            let fields = record.split('/').collect::<Vec<_>>();
            let Some(children) = fields.get(2) else {
                continue;
            };

            let id = NodeId::from(fields[0].trim());
            if !dataset.contains(&id) {
                continue;
            }

            for child in children.split(',').map(str::trim) {
                if child.is_empty() {
                    continue;
                }
                let child = NodeId::from(child);
                if child == id {
                    tracing::warn!(%id, "skipping self-reference");
                    continue;
                }
                if !dataset.contains(&child) {
                    tracing::warn!(%id, %child, "child id names no record");
                    continue;
                }
                dataset.link(&id, &child);
            }
        }

        tracing::debug!(
            nodes = dataset.node_count(),
            edges = dataset.edge_count(),
            "built dataset from records"
        );
        self.finish(dataset)
    }

    /// Builds `3n` nodes joined as three stars, the second and third hanging
    /// off nodes `n - 1` and `2n - 1`, then applies `churn_steps` churn steps.
    pub fn synthetic(&self, n: usize, churn_steps: usize) -> Result<BuiltGraph> {
        let mut scratch = GraphModel::new(self.churn, self.seed);
        for index in 0..3 * n {
            scratch.add_node(NodeId::from(index));
        }

        let segments = [
            (0, 1..n),
            (n.saturating_sub(1), n..2 * n),
            ((2 * n).saturating_sub(1), 2 * n..3 * n),
        ];
        for (hub, spokes) in segments {
            let hub = NodeId::from(hub);
            for spoke in spokes {
                let spoke = NodeId::from(spoke);
                if hub != spoke && !scratch.has_edge(&hub, &spoke) {
                    scratch.add_edge(&hub, &spoke)?;
                }
            }
        }

        for _ in 0..churn_steps {
            scratch.churn()?;
        }

        Ok(self.finish(DatasetGraph::from_model(&scratch, NodeKind::Projection)))
    }

    /// Fully connected reference dataset over `n` nodes.
    pub fn complete(&self, n: usize) -> BuiltGraph {
        let mut dataset = DatasetGraph::default();
        let ids = (0..n).map(NodeId::from).collect::<Vec<_>>();
        for id in &ids {
            dataset.insert_node(id.clone(), id.to_string(), NodeKind::Projection);
        }
        for (index, a) in ids.iter().enumerate() {
            for b in &ids[index + 1..] {
                dataset.link(a, b);
            }
        }
        self.finish(dataset)
    }

    fn finish(&self, dataset: DatasetGraph) -> BuiltGraph {
        let mut model = GraphModel::new(self.churn, self.seed.wrapping_add(1));
        for id in dataset.ids() {
            model.add_node(id.clone());
        }
        BuiltGraph { dataset, model }
    }
}
