//! Host-facing façade: one owner for the dataset, the live model, the window
//! and the layout engine, plus a lock-guarded handle for multi-context hosts.

use std::sync::{Arc, Mutex, PoisonError, TryLockError};
use std::time::Duration;

use eframe::egui::Vec2;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::engine::{Body, EdgeLine, EngineEvent, LayoutEngine, Lifecycle, TickReport};
use crate::error::Result;
use crate::graph::{BuiltGraph, ChurnOutcome, DatasetGraph, GraphEvent, GraphModel, NodeId, NodeKind};
use crate::window::{NeighborWindow, WindowDiff};

pub struct Session {
    dataset: DatasetGraph,
    model: GraphModel,
    window: NeighborWindow,
    engine: LayoutEngine,
    graph_events: Vec<GraphEvent>,
}

impl Session {
    pub fn new(built: BuiltGraph, config: EngineConfig, viewport: Vec2) -> Self {
        Self {
            dataset: built.dataset,
            model: built.model,
            window: NeighborWindow::new(),
            engine: LayoutEngine::new(config, viewport),
            graph_events: Vec::new(),
        }
    }

    pub fn dataset(&self) -> &DatasetGraph {
        &self.dataset
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn center(&self) -> Option<&NodeId> {
        self.window.center()
    }

    pub fn active(&self) -> &[NodeId] {
        self.window.active()
    }

    pub fn bodies(&self) -> &[Body] {
        self.engine.bodies()
    }

    pub fn body(&self, id: &NodeId) -> Option<&Body> {
        self.engine.body(id)
    }

    pub fn lines(&self) -> impl Iterator<Item = &EdgeLine> {
        self.engine.lines()
    }

    pub fn needs_tick(&self) -> bool {
        !self.engine.is_idle()
    }

    pub fn recenter(&mut self, id: &NodeId) -> Result<WindowDiff> {
        let diff = self.window.recenter(&self.dataset, &mut self.model, id)?;
        self.engine.reconcile(&diff, &self.model);
        self.collect_graph_events();
        Ok(diff)
    }

    /// Advances the layout. Bodies that expired from idleness leave the
    /// window and lose their edge to the center.
    pub fn tick(&mut self, elapsed: Duration) -> Result<TickReport> {
        let report = self.engine.step(&self.model, elapsed)?;
        let expired = self.engine.take_expired();
        if !expired.is_empty() {
            self.window.release(&mut self.model, &expired)?;
            self.collect_graph_events();
            self.engine.sync_lines(&self.model);
        }
        Ok(report)
    }

    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.engine.set_viewport_size(width, height);
    }

    pub fn begin_drag(&mut self, id: &NodeId) -> Result<()> {
        self.engine.begin_drag(id)
    }

    pub fn move_drag(&mut self, id: &NodeId, delta: Vec2) -> Result<()> {
        self.engine.move_drag(id, delta)
    }

    pub fn end_drag(&mut self, id: &NodeId) -> Result<()> {
        self.engine.end_drag(id)
    }

    pub fn touch(&mut self, id: &NodeId) -> Result<()> {
        self.engine.touch(id)
    }

    pub fn finish_fade(&mut self, id: &NodeId) -> Result<bool> {
        self.engine.finish_fade(id)
    }

    /// One degree-balancing mutation on the live model.
    pub fn churn(&mut self) -> Result<ChurnOutcome> {
        let outcome = self.model.churn()?;
        self.collect_graph_events();
        self.engine.notify_graph_changed(&self.model);
        Ok(outcome)
    }

    pub fn drain_engine_events(&mut self) -> std::vec::Drain<'_, EngineEvent> {
        self.engine.drain_events()
    }

    pub fn drain_graph_events(&mut self) -> std::vec::Drain<'_, GraphEvent> {
        self.graph_events.drain(..)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let center = self.engine.center();
        SessionSnapshot {
            tick: self.engine.tick_count(),
            center: center.cloned(),
            idle: self.engine.is_idle(),
            bodies: self
                .engine
                .bodies()
                .iter()
                .map(|body| {
                    let node = self.dataset.node(body.id());
                    BodySnapshot {
                        id: body.id().clone(),
                        title: node.map_or_else(|| body.id().to_string(), |node| node.title.clone()),
                        kind: node.map(|node| node.kind).unwrap_or_default(),
                        position: body.position().into(),
                        velocity: body.velocity().into(),
                        lifecycle: body.lifecycle(),
                        is_center: center == Some(body.id()),
                        was_center: body.was_center(),
                    }
                })
                .collect(),
            lines: self.engine.lines().cloned().collect(),
        }
    }

    fn collect_graph_events(&mut self) {
        self.graph_events.extend(self.model.drain_events());
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    pub tick: u64,
    pub center: Option<NodeId>,
    pub idle: bool,
    pub bodies: Vec<BodySnapshot>,
    pub lines: Vec<EdgeLine>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BodySnapshot {
    pub id: NodeId,
    pub title: String,
    pub kind: NodeKind,
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub lifecycle: Lifecycle,
    pub is_center: bool,
    /// Fading out after losing the center.
    pub was_center: bool,
}

/// A [`Session`] behind one mutex. Ticks that find the lock taken are dropped.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Returns `None` when another tick or mutation is still running.
    pub fn try_tick(&self, elapsed: Duration) -> Option<Result<TickReport>> {
        match self.inner.try_lock() {
            Ok(mut session) => Some(session.tick(elapsed)),
            Err(TryLockError::WouldBlock) => {
                tracing::trace!("overlapping tick dropped");
                None
            }
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner().tick(elapsed)),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut session)
    }
}
