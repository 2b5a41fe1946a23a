//! The active window: which dataset nodes are materialized around the center.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::graph::{DatasetGraph, GraphModel, NodeId};

/// Outcome of a recenter, handed to the layout engine for reconciliation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WindowDiff {
    pub center: Option<NodeId>,
    pub previous_center: Option<NodeId>,
    /// New active list: retained ids in their previous order, then newcomers.
    pub active: Vec<NodeId>,
    pub previous_active: Vec<NodeId>,
    pub retained: Vec<NodeId>,
    pub added: Vec<NodeId>,
    /// Previously active ids that leave the window (the new center excluded).
    pub departed: Vec<NodeId>,
}

impl WindowDiff {
    pub fn is_noop(&self) -> bool {
        self.center == self.previous_center && self.added.is_empty() && self.departed.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct NeighborWindow {
    center: Option<NodeId>,
    active: Vec<NodeId>,
}

impl NeighborWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn center(&self) -> Option<&NodeId> {
        self.center.as_ref()
    }

    pub fn active(&self) -> &[NodeId] {
        &self.active
    }

    pub fn is_active(&self, id: &NodeId) -> bool {
        self.active.contains(id)
    }

    /// Moves the window onto `new_center`.
    ///
    /// The target set is the center's dataset neighbors that the live model
    /// knows about. Departing neighbors lose their wired edge to the old
    /// center; every target neighbor ends up wired to the new center.
    pub fn recenter(
        &mut self,
        dataset: &DatasetGraph,
        model: &mut GraphModel,
        new_center: &NodeId,
    ) -> Result<WindowDiff> {
        if !model.contains(new_center) {
            return Err(Error::UnknownNode(new_center.clone()));
        }

        if self.center.as_ref() == Some(new_center) {
            return Ok(WindowDiff {
                center: self.center.clone(),
                previous_center: self.center.clone(),
                active: self.active.clone(),
                previous_active: self.active.clone(),
                retained: self.active.clone(),
                ..WindowDiff::default()
            });
        }

        let target = dataset
            .neighbors(new_center)?
            .iter()
            .filter(|id| *id != new_center && model.contains(id))
            .cloned()
            .collect::<BTreeSet<_>>();
        let previous = self.active.iter().cloned().collect::<BTreeSet<_>>();

        let retained = self
            .active
            .iter()
            .filter(|id| target.contains(*id))
            .cloned()
            .collect::<Vec<_>>();
        let added = target
            .iter()
            .filter(|id| !previous.contains(*id))
            .cloned()
            .collect::<Vec<_>>();
        let departed = self
            .active
            .iter()
            .filter(|id| !target.contains(*id) && *id != new_center)
            .cloned()
            .collect::<Vec<_>>();

        if let Some(old_center) = &self.center {
            for id in &departed {
                if model.has_edge(old_center, id) {
                    model.remove_edge(old_center, id)?;
                }
            }
        }

        for id in &target {
            if !model.has_edge(new_center, id) {
                model.add_edge(new_center, id)?;
            }
        }

        let mut active = retained.clone();
        active.extend(added.iter().cloned());

        let diff = WindowDiff {
            center: Some(new_center.clone()),
            previous_center: self.center.replace(new_center.clone()),
            previous_active: std::mem::replace(&mut self.active, active.clone()),
            active,
            retained,
            added,
            departed,
        };

        tracing::debug!(
            center = %new_center,
            retained = diff.retained.len(),
            added = diff.added.len(),
            departed = diff.departed.len(),
            "recentered window"
        );
        Ok(diff)
    }

    /// Drops `ids` from the active list without moving the center, unwiring
    /// their edge to it. A later recenter that targets them adds them again.
    pub fn release(&mut self, model: &mut GraphModel, ids: &[NodeId]) -> Result<()> {
        let before = self.active.len();
        self.active.retain(|id| !ids.contains(id));
        if let Some(center) = &self.center {
            for id in ids {
                if model.has_edge(center, id) {
                    model.remove_edge(center, id)?;
                }
            }
        }
        tracing::debug!(released = before - self.active.len(), "window released idle ids");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChurnConfig;
    use crate::graph::GraphBuilder;

    fn ids(values: &[usize]) -> Vec<NodeId> {
        values.iter().copied().map(NodeId::from).collect()
    }

    fn sorted(mut values: Vec<NodeId>) -> Vec<NodeId> {
        values.sort();
        values
    }

    #[test]
    fn first_recenter_activates_dataset_neighbors() {
        let mut built = GraphBuilder::new(ChurnConfig::default(), 1).synthetic(5, 0).unwrap();
        let mut window = NeighborWindow::new();

        let diff = window
            .recenter(&built.dataset, &mut built.model, &NodeId::from(0))
            .unwrap();

        assert_eq!(sorted(diff.active.clone()), sorted(ids(&[1, 2, 3, 4])));
        assert_eq!(diff.added, diff.active);
        assert!(diff.departed.is_empty());
        assert_eq!(diff.previous_center, None);
        for id in ids(&[1, 2, 3, 4]) {
            assert!(built.model.has_edge(&NodeId::from(0), &id));
        }
    }

    #[test]
    fn recenter_diffs_against_previous_window() {
        let mut built = GraphBuilder::new(ChurnConfig::default(), 1).synthetic(5, 0).unwrap();
        let mut window = NeighborWindow::new();
        window
            .recenter(&built.dataset, &mut built.model, &NodeId::from(0))
            .unwrap();

        let diff = window
            .recenter(&built.dataset, &mut built.model, &NodeId::from(4))
            .unwrap();

        assert_eq!(sorted(diff.departed.clone()), sorted(ids(&[1, 2, 3])));
        assert_eq!(sorted(diff.added.clone()), sorted(ids(&[0, 5, 6, 7, 8, 9])));
        assert!(diff.retained.is_empty());
        assert_eq!(diff.previous_center, Some(NodeId::from(0)));

        let unique = diff.active.iter().collect::<BTreeSet<_>>();
        assert_eq!(unique.len(), diff.active.len());

        for id in ids(&[1, 2, 3]) {
            assert!(!built.model.has_edge(&NodeId::from(0), &id));
        }
        assert!(built.model.has_edge(&NodeId::from(0), &NodeId::from(4)));
        for id in ids(&[5, 6, 7, 8, 9]) {
            assert!(built.model.has_edge(&NodeId::from(4), &id));
        }
    }

    #[test]
    fn shared_neighbors_are_retained() {
        let mut built = GraphBuilder::new(ChurnConfig::default(), 1).complete(5);
        let mut window = NeighborWindow::new();
        window
            .recenter(&built.dataset, &mut built.model, &NodeId::from(0))
            .unwrap();

        let diff = window
            .recenter(&built.dataset, &mut built.model, &NodeId::from(1))
            .unwrap();

        assert_eq!(diff.retained, ids(&[2, 3, 4]));
        assert_eq!(diff.added, ids(&[0]));
        assert!(diff.departed.is_empty());
        assert_eq!(diff.active, ids(&[2, 3, 4, 0]));
    }

    #[test]
    fn repeated_recenter_is_a_noop() {
        let mut built = GraphBuilder::new(ChurnConfig::default(), 1).synthetic(4, 0).unwrap();
        let mut window = NeighborWindow::new();
        window
            .recenter(&built.dataset, &mut built.model, &NodeId::from(3))
            .unwrap();
        built.model.drain_events().for_each(drop);
        let active = window.active().to_vec();

        let diff = window
            .recenter(&built.dataset, &mut built.model, &NodeId::from(3))
            .unwrap();

        assert!(diff.is_noop());
        assert_eq!(window.active(), active.as_slice());
        assert_eq!(built.model.drain_events().count(), 0);
    }

    #[test]
    fn released_ids_leave_the_window_until_targeted_again() {
        let mut built = GraphBuilder::new(ChurnConfig::default(), 1).synthetic(5, 0).unwrap();
        let mut window = NeighborWindow::new();
        window
            .recenter(&built.dataset, &mut built.model, &NodeId::from(0))
            .unwrap();

        window.release(&mut built.model, &ids(&[1, 3])).unwrap();

        assert_eq!(sorted(window.active().to_vec()), sorted(ids(&[2, 4])));
        assert_eq!(window.center(), Some(&NodeId::from(0)));
        assert!(!built.model.has_edge(&NodeId::from(0), &NodeId::from(1)));
        assert!(!built.model.has_edge(&NodeId::from(0), &NodeId::from(3)));
        assert!(built.model.has_edge(&NodeId::from(0), &NodeId::from(2)));

        window
            .recenter(&built.dataset, &mut built.model, &NodeId::from(4))
            .unwrap();
        let diff = window
            .recenter(&built.dataset, &mut built.model, &NodeId::from(0))
            .unwrap();

        assert_eq!(sorted(diff.active.clone()), sorted(ids(&[1, 2, 3, 4])));
        assert!(diff.added.contains(&NodeId::from(1)));
        assert!(diff.added.contains(&NodeId::from(3)));
        assert!(built.model.has_edge(&NodeId::from(0), &NodeId::from(1)));
    }

    #[test]
    fn unknown_center_is_rejected() {
        let mut built = GraphBuilder::new(ChurnConfig::default(), 1).synthetic(2, 0).unwrap();
        let mut window = NeighborWindow::new();

        let result = window.recenter(&built.dataset, &mut built.model, &NodeId::from("nope"));

        assert_eq!(result, Err(Error::UnknownNode(NodeId::from("nope"))));
        assert_eq!(window.center(), None);
    }
}
