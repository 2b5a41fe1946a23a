use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::graph::{GraphModel, NodeId};

/// Stable identity of a drawn edge: survives ticks while both endpoints do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LineId(u64);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EdgeLine {
    pub id: LineId,
    pub a: NodeId,
    pub b: NodeId,
}

/// Wired edges whose endpoints are both live, non-fading bodies, keyed by
/// ordered endpoint pair.
#[derive(Debug, Default)]
pub(super) struct LineRegistry {
    lines: BTreeMap<(NodeId, NodeId), EdgeLine>,
    next_id: u64,
}

impl LineRegistry {
    /// Returns `true` when a line appeared or disappeared.
    pub(super) fn sync(&mut self, model: &GraphModel, live: &BTreeSet<&NodeId>) -> bool {
        let wanted = model
            .edges()
            .filter(|(a, b)| live.contains(a) && live.contains(b))
            .map(|(a, b)| (a.clone(), b.clone()))
            .collect::<BTreeSet<_>>();

        let before = self.lines.len();
        self.lines.retain(|key, _| wanted.contains(key));
        let mut changed = self.lines.len() != before;

        for key in wanted {
            if self.lines.contains_key(&key) {
                continue;
            }
            let line = EdgeLine {
                id: LineId(self.next_id),
                a: key.0.clone(),
                b: key.1.clone(),
            };
            self.next_id += 1;
            self.lines.insert(key, line);
            changed = true;
        }
        changed
    }

    pub(super) fn release(&mut self, id: &NodeId) {
        self.lines.retain(|(a, b), _| a != id && b != id);
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = &EdgeLine> {
        self.lines.values()
    }

    pub(super) fn len(&self) -> usize {
        self.lines.len()
    }
}
