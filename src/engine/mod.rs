//! Force-directed layout over the active window.
//!
//! Each tick sums pairwise repulsion, springs along wired edges, a saturating
//! pull toward the center body and viewport wall pushes, then integrates with
//! damping and a terminal velocity. The engine goes idle once nothing moves
//! (or the settle window runs out) and re-arms on any structural change.

mod body;
mod forces;
mod lines;

use std::collections::{BTreeSet, HashMap};
use std::f32::consts::TAU;
use std::time::Duration;

use eframe::egui::{Vec2, vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::EngineConfig;
use crate::error::{Error, Quantity, Result};
use crate::graph::{GraphModel, NodeId};
use crate::window::WindowDiff;

pub use body::{Body, Lifecycle};
pub use lines::{EdgeLine, LineId};

use body::Phase;
use forces::{
    RepulsionParams, WallParams, centering, direction_of, is_finite, repulsion, spring, wall,
};
use lines::LineRegistry;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    ActiveSetChanged { active: Vec<NodeId> },
    CenterChanged {
        previous: Option<NodeId>,
        current: Option<NodeId>,
    },
    SimulationQuiesced,
    SimulationResumed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    /// Something moved, spawned, faded out or was restructured this tick.
    pub changed: bool,
    pub moving: usize,
    pub idle: bool,
}

pub struct LayoutEngine {
    config: EngineConfig,
    rng: StdRng,
    bodies: Vec<Body>,
    index_by_id: HashMap<NodeId, usize>,
    center: Option<NodeId>,
    viewport: Vec2,
    tick: u64,
    last_structural_tick: u64,
    structural_pending: bool,
    idle: bool,
    lines: LineRegistry,
    events: Vec<EngineEvent>,
    expired: Vec<NodeId>,
    forces: Vec<Vec2>,
}

impl LayoutEngine {
    pub fn new(config: EngineConfig, viewport: Vec2) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            bodies: Vec::new(),
            index_by_id: HashMap::new(),
            center: None,
            viewport: vec2(viewport.x.max(1.0), viewport.y.max(1.0)),
            tick: 0,
            last_structural_tick: 0,
            structural_pending: false,
            idle: true,
            lines: LineRegistry::default(),
            events: Vec::new(),
            expired: Vec::new(),
            forces: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn center(&self) -> Option<&NodeId> {
        self.center.as_ref()
    }

    /// Center first, then the active window in order, then fading bodies.
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, id: &NodeId) -> Option<&Body> {
        self.index_by_id.get(id).map(|&index| &self.bodies[index])
    }

    pub fn lines(&self) -> impl Iterator<Item = &EdgeLine> {
        self.lines.iter()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn is_idle(&self) -> bool {
        self.idle
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, EngineEvent> {
        self.events.drain(..)
    }

    /// Ids faded out by idle expiry since the last call. The window owner
    /// should drop them from its active list.
    pub fn take_expired(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.expired)
    }

    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        let viewport = vec2(width.max(1.0), height.max(1.0));
        if viewport != self.viewport {
            self.viewport = viewport;
            self.rearm();
        }
    }

    /// Assigns bodies for a recenter: reuse what exists, spawn newcomers near
    /// the center, fade everything that left.
    pub fn reconcile(&mut self, diff: &WindowDiff, model: &GraphModel) {
        let tick = self.tick;
        if diff.is_noop() {
            if let Some(index) = diff.center.as_ref().and_then(|id| self.index_by_id.get(id)) {
                self.bodies[*index].last_touch = tick;
            }
            return;
        }

        let anchor = self.center_position();
        let mut prior = std::mem::take(&mut self.bodies)
            .into_iter()
            .map(|body| (body.id.clone(), body))
            .collect::<HashMap<_, _>>();
        let mut next = Vec::with_capacity(diff.active.len() + prior.len() + 1);

        let center_position = match &diff.center {
            Some(center) => {
                let body = match prior.remove(center) {
                    Some(mut body) => {
                        body.revive(tick);
                        body
                    }
                    None => Body::spawn(center.clone(), anchor, tick),
                };
                let position = body.position;
                next.push(body);
                position
            }
            None => anchor,
        };

        for id in &diff.active {
            let body = match prior.remove(id) {
                Some(mut body) => {
                    body.revive(tick);
                    body
                }
                None => {
                    let offset = self.spawn_offset();
                    Body::spawn(id.clone(), center_position + offset, tick)
                }
            };
            next.push(body);
        }

        let mut leaving = prior.into_values().collect::<Vec<_>>();
        leaving.sort_by(|a, b| a.id.cmp(&b.id));
        for mut body in leaving {
            if !body.is_fading() {
                let was_center = diff.previous_center.as_ref() == Some(&body.id);
                body.start_fading(tick, was_center);
                tracing::debug!(id = %body.id, was_center, "body fading out");
            }
            next.push(body);
        }

        self.bodies = next;
        self.reindex();

        if self.center != diff.center {
            self.events.push(EngineEvent::CenterChanged {
                previous: self.center.clone(),
                current: diff.center.clone(),
            });
            self.center = diff.center.clone();
        }
        self.events.push(EngineEvent::ActiveSetChanged {
            active: diff.active.clone(),
        });

        self.sync_lines(model);
        self.rearm();
    }

    /// Advances one frame. `elapsed` scales the integration step around a
    /// 60 Hz frame; timing windows are counted in ticks.
    pub fn step(&mut self, model: &GraphModel, elapsed: Duration) -> Result<TickReport> {
        self.tick += 1;
        let mut structural = std::mem::take(&mut self.structural_pending);

        if self.expire_idle_bodies() {
            self.rearm();
            structural = true;
        }
        let released = self.release_finished_fades();
        self.sync_lines(model);

        if self.idle {
            return Ok(TickReport {
                changed: released,
                moving: 0,
                idle: true,
            });
        }

        self.compute_forces()?;
        let moving = self.integrate(elapsed)?;
        self.structural_pending = false;

        let changed = structural || released || moving > 0;
        let settle_expired =
            self.tick.saturating_sub(self.last_structural_tick) > self.config.settle_ticks();
        if !changed || settle_expired {
            self.quiesce();
        }

        Ok(TickReport {
            changed,
            moving,
            idle: self.idle,
        })
    }

    /// Re-derives drawn lines from the wired graph; returns `true` when the
    /// set of lines changed.
    pub fn sync_lines(&mut self, model: &GraphModel) -> bool {
        let live = self
            .bodies
            .iter()
            .filter(|body| !body.is_fading())
            .map(|body| &body.id)
            .collect::<BTreeSet<_>>();
        self.lines.sync(model, &live)
    }

    pub fn notify_graph_changed(&mut self, model: &GraphModel) {
        if self.sync_lines(model) {
            self.rearm();
        }
    }

    pub fn touch(&mut self, id: &NodeId) -> Result<()> {
        let tick = self.tick;
        self.body_mut(id)?.last_touch = tick;
        Ok(())
    }

    pub fn begin_drag(&mut self, id: &NodeId) -> Result<()> {
        let tick = self.tick;
        let body = self.body_mut(id)?;
        body.dragged = true;
        body.velocity = Vec2::ZERO;
        body.last_touch = tick;
        self.rearm();
        Ok(())
    }

    /// Moves a dragged body by `delta`; ignored unless a drag is in progress.
    pub fn move_drag(&mut self, id: &NodeId, delta: Vec2) -> Result<()> {
        let tick = self.tick;
        let body = self.body_mut(id)?;
        if !body.dragged {
            return Ok(());
        }
        if !is_finite(delta) {
            tracing::warn!(%id, "ignoring non-finite drag delta");
            return Ok(());
        }
        body.position += delta;
        body.last_touch = tick;
        self.rearm();
        Ok(())
    }

    pub fn end_drag(&mut self, id: &NodeId) -> Result<()> {
        let body = self.body_mut(id)?;
        if body.dragged {
            body.dragged = false;
            self.rearm();
        }
        Ok(())
    }

    /// Releases a fading body once its fade-out effect has finished; returns
    /// `false` when the body is not fading.
    pub fn finish_fade(&mut self, id: &NodeId) -> Result<bool> {
        if !self.body_mut(id)?.is_fading() {
            return Ok(false);
        }
        self.remove_body(id);
        Ok(true)
    }

    fn body_mut(&mut self, id: &NodeId) -> Result<&mut Body> {
        match self.index_by_id.get(id) {
            Some(&index) => Ok(&mut self.bodies[index]),
            None => Err(Error::UnknownNode(id.clone())),
        }
    }

    fn center_position(&self) -> Vec2 {
        self.center
            .as_ref()
            .and_then(|id| self.body(id))
            .map_or(Vec2::ZERO, Body::position)
    }

    fn spawn_offset(&mut self) -> Vec2 {
        let angle = self.rng.gen_range(0.0..TAU);
        let radius = self.config.spawn_jitter.max(0.0) * self.rng.gen_range(0.5..=1.0);
        vec2(angle.cos(), angle.sin()) * radius
    }

    fn reindex(&mut self) {
        self.index_by_id.clear();
        for (index, body) in self.bodies.iter().enumerate() {
            self.index_by_id.insert(body.id.clone(), index);
        }
    }

    fn remove_body(&mut self, id: &NodeId) {
        self.bodies.retain(|body| &body.id != id);
        self.lines.release(id);
        self.reindex();
        tracing::debug!(%id, "body released");
    }

    fn rearm(&mut self) {
        self.last_structural_tick = self.tick;
        self.structural_pending = true;
        if self.idle {
            self.idle = false;
            self.events.push(EngineEvent::SimulationResumed);
            tracing::info!(tick = self.tick, "layout resumed");
        }
    }

    fn quiesce(&mut self) {
        if !self.idle {
            self.idle = true;
            self.events.push(EngineEvent::SimulationQuiesced);
            tracing::info!(tick = self.tick, "layout quiesced");
        }
    }

    /// Fades non-center bodies nobody touched within the idle hold.
    fn expire_idle_bodies(&mut self) -> bool {
        let idle_ticks = self.config.idle_ticks();
        let tick = self.tick;
        let center = self.center.clone();

        let mut expired = 0usize;
        for body in &mut self.bodies {
            if body.is_fading() || body.dragged || center.as_ref() == Some(&body.id) {
                continue;
            }
            if tick.saturating_sub(body.last_touch) > idle_ticks {
                body.start_fading(tick, false);
                self.expired.push(body.id.clone());
                expired += 1;
            }
        }
        if expired == 0 {
            return false;
        }

        tracing::debug!(expired, tick, "idle bodies expired");
        let active = self
            .bodies
            .iter()
            .filter(|body| !body.is_fading() && center.as_ref() != Some(&body.id))
            .map(|body| body.id.clone())
            .collect();
        self.events.push(EngineEvent::ActiveSetChanged { active });
        true
    }

    fn release_finished_fades(&mut self) -> bool {
        let timeout = self.config.fade_timeout_ticks;
        let tick = self.tick;
        let finished = self
            .bodies
            .iter()
            .filter(|body| match body.phase {
                Phase::Fading { since_tick, .. } => tick.saturating_sub(since_tick) >= timeout,
                _ => false,
            })
            .map(|body| body.id.clone())
            .collect::<Vec<_>>();

        for id in &finished {
            self.remove_body(id);
        }
        !finished.is_empty()
    }

    fn compute_forces(&mut self) -> Result<()> {
        let config = self.config;
        let count = self.bodies.len();
        self.forces.clear();
        self.forces.resize(count, Vec2::ZERO);

        let center_index = self
            .center
            .as_ref()
            .and_then(|id| self.index_by_id.get(id).copied());
        let anchor = center_index.map_or(Vec2::ZERO, |index| self.bodies[index].position);
        let repulsion_params = RepulsionParams {
            strength: config.repulsion_strength,
            clip: config.repulsion_clip,
            cohesion: config.cohesion,
        };
        let wall_params = WallParams {
            viewport: self.viewport,
            strength: config.wall_strength,
            margin: config.wall_margin,
        };

        let bodies = &self.bodies;
        let forces = &mut self.forces;
        let rng = &mut self.rng;

        for i in 0..count {
            if bodies[i].is_fading() {
                continue;
            }
            for j in (i + 1)..count {
                if bodies[j].is_fading() {
                    continue;
                }
                let (direction, distance) =
                    direction_of(bodies[i].position - bodies[j].position, rng);
                let push = repulsion(direction, distance, repulsion_params);
                forces[i] += push;
                forces[j] -= push;
            }
        }

        for line in self.lines.iter() {
            let (Some(&a), Some(&b)) = (self.index_by_id.get(&line.a), self.index_by_id.get(&line.b))
            else {
                continue;
            };
            let pull = spring(bodies[b].position - bodies[a].position, config.spring_strength);
            forces[a] += pull;
            forces[b] -= pull;
        }

        for (index, body) in bodies.iter().enumerate() {
            match body.phase {
                Phase::Fading { was_center, .. } => {
                    forces[index] = if was_center {
                        Vec2::ZERO
                    } else {
                        let (away, _) = direction_of(body.position - anchor, rng);
                        away * config.fading_push
                    };
                }
                _ if Some(index) == center_index => {
                    let (toward, distance) = direction_of(-body.position, rng);
                    forces[index] = centering(
                        toward,
                        distance,
                        config.centering_strength,
                        config.centering_range,
                    ) + wall(body.position, wall_params);
                }
                _ => {
                    let (toward, distance) = direction_of(anchor - body.position, rng);
                    forces[index] += centering(
                        toward,
                        distance,
                        config.centering_strength,
                        config.centering_range,
                    ) + wall(body.position, wall_params);
                }
            }
        }

        for (index, force) in forces.iter().enumerate() {
            if !is_finite(*force) {
                let id = bodies[index].id.clone();
                tracing::error!(%id, tick = self.tick, "non-finite force");
                return Err(Error::NumericInstability {
                    id,
                    quantity: Quantity::Force,
                });
            }
        }
        Ok(())
    }

    /// Applies the accumulated forces; nothing is written unless every body's
    /// new state is finite. Returns how many bodies changed.
    fn integrate(&mut self, elapsed: Duration) -> Result<usize> {
        let config = self.config;
        let time_step_scale = (elapsed.as_secs_f32() * 60.0).clamp(0.25, 3.0);
        let dt = config.time_step * time_step_scale;

        let mut updates = Vec::with_capacity(self.bodies.len());
        for (body, force) in self.bodies.iter().zip(self.forces.iter().copied()) {
            let update = match body.phase {
                Phase::Spawning => (Vec2::ZERO, body.position, true),
                _ if body.dragged => (Vec2::ZERO, body.position, false),
                _ => {
                    let mut velocity = (body.velocity + force * dt) * config.damping;
                    let speed = velocity.length();
                    if speed > config.terminal_velocity {
                        velocity *= config.terminal_velocity / speed;
                    }

                    if velocity.length() < config.min_velocity
                        && force.length() < config.min_velocity
                    {
                        (Vec2::ZERO, body.position, false)
                    } else {
                        (velocity, body.position + velocity * dt, true)
                    }
                }
            };

            let quantity = if !is_finite(update.0) {
                Some(Quantity::Velocity)
            } else if !is_finite(update.1) {
                Some(Quantity::Position)
            } else {
                None
            };
            if let Some(quantity) = quantity {
                tracing::error!(id = %body.id, %quantity, tick = self.tick, "numeric instability");
                return Err(Error::NumericInstability {
                    id: body.id.clone(),
                    quantity,
                });
            }
            updates.push(update);
        }

        let mut moving = 0usize;
        for (body, (velocity, position, is_moving)) in self.bodies.iter_mut().zip(updates) {
            if body.phase == Phase::Spawning {
                body.phase = Phase::Active;
            }
            body.velocity = velocity;
            body.position = position;
            body.moving = is_moving;
            if is_moving {
                moving += 1;
            }
        }
        Ok(moving)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChurnConfig;
    use crate::graph::{BuiltGraph, GraphBuilder};
    use crate::window::NeighborWindow;

    const FRAME: Duration = Duration::from_micros(16_667);

    struct Fixture {
        built: BuiltGraph,
        window: NeighborWindow,
        engine: LayoutEngine,
    }

    impl Fixture {
        fn synthetic(n: usize, config: EngineConfig) -> Self {
            Self {
                built: GraphBuilder::new(ChurnConfig::default(), 5)
                    .synthetic(n, 0)
                    .unwrap(),
                window: NeighborWindow::new(),
                engine: LayoutEngine::new(config, vec2(1280.0, 800.0)),
            }
        }

        fn recenter(&mut self, id: usize) -> WindowDiff {
            let diff = self
                .window
                .recenter(&self.built.dataset, &mut self.built.model, &NodeId::from(id))
                .unwrap();
            self.engine.reconcile(&diff, &self.built.model);
            diff
        }

        fn step(&mut self) -> Result<TickReport> {
            self.engine.step(&self.built.model, FRAME)
        }
    }

    fn ids(engine: &LayoutEngine) -> Vec<&str> {
        engine.bodies().iter().map(|body| body.id().as_str()).collect()
    }

    #[test]
    fn reconcile_spawns_center_then_window() {
        let mut fixture = Fixture::synthetic(5, EngineConfig::default());
        fixture.recenter(0);

        assert_eq!(ids(&fixture.engine), vec!["0", "1", "2", "3", "4"]);
        assert!(
            fixture
                .engine
                .bodies()
                .iter()
                .all(|body| body.lifecycle() == Lifecycle::Spawning)
        );
        assert_eq!(fixture.engine.line_count(), 4);

        let events = fixture.engine.drain_events().collect::<Vec<_>>();
        assert!(events.contains(&EngineEvent::SimulationResumed));
        assert!(events.contains(&EngineEvent::CenterChanged {
            previous: None,
            current: Some(NodeId::from(0)),
        }));
    }

    #[test]
    fn spawning_lasts_one_tick_without_force() {
        let mut fixture = Fixture::synthetic(5, EngineConfig::default());
        fixture.recenter(0);
        let spawned = fixture
            .engine
            .bodies()
            .iter()
            .map(Body::position)
            .collect::<Vec<_>>();

        let report = fixture.step().unwrap();

        assert!(report.changed);
        let after = fixture
            .engine
            .bodies()
            .iter()
            .map(Body::position)
            .collect::<Vec<_>>();
        assert_eq!(spawned, after);
        assert!(
            fixture
                .engine
                .bodies()
                .iter()
                .all(|body| body.lifecycle() != Lifecycle::Spawning)
        );

        fixture.step().unwrap();
        assert!(
            fixture
                .engine
                .bodies()
                .iter()
                .skip(1)
                .any(|body| body.position() != spawned[1])
        );
    }

    #[test]
    fn coincident_bodies_stay_finite() {
        let mut fixture = Fixture::synthetic(5, EngineConfig::default());
        fixture.recenter(0);
        fixture.step().unwrap();

        let shared = vec2(40.0, -25.0);
        for body in fixture.engine.bodies.iter_mut().skip(1) {
            body.position = shared;
            body.velocity = Vec2::ZERO;
        }

        fixture.step().unwrap();
        for body in fixture.engine.bodies() {
            assert!(is_finite(body.position()));
            assert!(is_finite(body.velocity()));
        }
        let first = fixture.engine.bodies()[1].position();
        assert!(
            fixture.engine.bodies()[2..]
                .iter()
                .any(|body| body.position() != first)
        );
    }

    #[test]
    fn lone_center_settles_immediately() {
        let mut built = GraphBuilder::new(ChurnConfig::default(), 1).from_records(["7/Alone"]);
        let mut window = NeighborWindow::new();
        let mut engine = LayoutEngine::new(EngineConfig::default(), vec2(800.0, 600.0));
        let diff = window
            .recenter(&built.dataset, &mut built.model, &NodeId::from("7"))
            .unwrap();
        engine.reconcile(&diff, &built.model);

        let spawn = engine.step(&built.model, FRAME).unwrap();
        assert!(spawn.changed && !spawn.idle);

        let settled = engine.step(&built.model, FRAME).unwrap();
        assert!(!settled.changed);
        assert!(settled.idle);
        assert_eq!(engine.bodies()[0].lifecycle(), Lifecycle::Settled);
        assert!(engine.drain_events().any(|event| event == EngineEvent::SimulationQuiesced));
    }

    #[test]
    fn settle_window_bounds_the_run() {
        let config = EngineConfig {
            settle_window: 2.0,
            ticks_per_unit: 10,
            ..EngineConfig::default()
        };
        let mut fixture = Fixture::synthetic(5, config);
        fixture.recenter(0);

        let mut ticks = 0;
        while !fixture.step().unwrap().idle {
            ticks += 1;
            assert!(ticks <= 21, "engine never went idle");
        }

        let idle = fixture.step().unwrap();
        assert_eq!(idle.moving, 0);

        fixture.recenter(4);
        assert!(!fixture.engine.is_idle());
    }

    #[test]
    fn departed_bodies_fade_then_release() {
        let config = EngineConfig {
            fade_timeout_ticks: 3,
            ..EngineConfig::default()
        };
        let mut fixture = Fixture::synthetic(5, config);
        fixture.recenter(0);
        fixture.step().unwrap();
        fixture.recenter(4);

        let fading = fixture
            .engine
            .bodies()
            .iter()
            .filter(|body| body.is_fading())
            .map(|body| body.id().as_str())
            .collect::<Vec<_>>();
        assert_eq!(fading, vec!["1", "2", "3"]);
        assert!(fixture.engine.lines().all(|line| line.a.as_str() != "1" && line.b.as_str() != "1"));

        assert_eq!(fixture.engine.finish_fade(&NodeId::from(1)), Ok(true));
        assert_eq!(fixture.engine.finish_fade(&NodeId::from(4)), Ok(false));
        assert!(fixture.engine.body(&NodeId::from(1)).is_none());

        for _ in 0..3 {
            fixture.step().unwrap();
        }
        assert!(fixture.engine.bodies().iter().all(|body| !body.is_fading()));
        assert_eq!(fixture.engine.bodies().len(), 7);
    }

    #[test]
    fn fading_body_revives_when_it_returns() {
        let mut fixture = Fixture::synthetic(5, EngineConfig::default());
        fixture.recenter(0);
        fixture.step().unwrap();
        fixture.recenter(4);
        let departed = fixture.engine.body(&NodeId::from(1)).unwrap();
        assert!(departed.is_fading());
        let before = Some(departed.position());

        fixture.recenter(0);

        let revived = fixture.engine.body(&NodeId::from(1)).unwrap();
        assert!(!revived.is_fading());
        assert_eq!(Some(revived.position()), before);
        let count = fixture
            .engine
            .bodies()
            .iter()
            .filter(|body| body.id().as_str() == "1")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn untouched_bodies_expire() {
        let config = EngineConfig {
            idle_hold: 3.0,
            ticks_per_unit: 1,
            ..EngineConfig::default()
        };
        let mut fixture = Fixture::synthetic(5, config);
        fixture.recenter(0);

        for _ in 0..3 {
            fixture.step().unwrap();
            fixture.engine.touch(&NodeId::from(2)).unwrap();
        }
        fixture.step().unwrap();

        let fading = fixture
            .engine
            .bodies()
            .iter()
            .filter(|body| body.is_fading())
            .map(|body| body.id().as_str())
            .collect::<Vec<_>>();
        assert_eq!(fading, vec!["1", "3", "4"]);
        assert!(!fixture.engine.body(&NodeId::from(0)).unwrap().is_fading());
        assert_eq!(
            fixture.engine.take_expired(),
            vec![NodeId::from(1), NodeId::from(3), NodeId::from(4)]
        );
        assert!(fixture.engine.take_expired().is_empty());
    }

    #[test]
    fn departed_bodies_drift_away_from_the_new_center() {
        let mut fixture = Fixture::synthetic(5, EngineConfig::default());
        fixture.recenter(0);
        for _ in 0..3 {
            fixture.step().unwrap();
        }
        fixture.recenter(4);
        for body in &mut fixture.engine.bodies {
            body.velocity = Vec2::ZERO;
        }

        let departed = [1, 2, 3].map(NodeId::from);
        let distance = |engine: &LayoutEngine, id: &NodeId| {
            let center = engine.body(&NodeId::from(4)).unwrap().position();
            (engine.body(id).unwrap().position() - center).length()
        };
        let mut previous = departed
            .iter()
            .map(|id| distance(&fixture.engine, id))
            .collect::<Vec<_>>();

        for _ in 0..4 {
            fixture.step().unwrap();
            for (index, id) in departed.iter().enumerate() {
                let body = fixture.engine.body(id).unwrap();
                assert!(body.is_fading());
                assert!(!body.was_center());
                let current = distance(&fixture.engine, id);
                assert!(current > previous[index], "{id} moved from {} to {current}", previous[index]);
                previous[index] = current;
            }
            assert!(
                fixture
                    .engine
                    .lines()
                    .all(|line| !departed.contains(&line.a) && !departed.contains(&line.b))
            );
        }
    }

    #[test]
    fn former_center_coasts_to_a_stop() {
        let mut fixture = Fixture::synthetic(5, EngineConfig::default());
        fixture.recenter(0);
        fixture.step().unwrap();
        fixture.recenter(9);

        let former = NodeId::from(0);
        assert!(fixture.engine.body(&former).unwrap().was_center());
        for id in [1, 2, 3].map(NodeId::from) {
            let body = fixture.engine.body(&id).unwrap();
            assert!(body.is_fading());
            assert!(!body.was_center());
        }

        let index = fixture.engine.index_by_id[&former];
        fixture.engine.bodies[index].velocity = vec2(30.0, 0.0);
        let start = fixture.engine.bodies[index].position;
        let mut speed = 30.0;

        for _ in 0..5 {
            fixture.step().unwrap();
            let body = fixture.engine.body(&former).unwrap();
            assert!(body.is_fading() && body.was_center());
            let velocity = body.velocity();
            assert!(velocity.length() < speed);
            assert!((velocity.length() - speed * 0.79).abs() < 1e-3);
            assert!(velocity.x > 0.0);
            assert_eq!(velocity.y, 0.0);
            speed = velocity.length();
        }
        let end = fixture.engine.body(&former).unwrap().position();
        assert!(end.x > start.x);
        assert_eq!(end.y, start.y);
        assert!(fixture.engine.lines().all(|line| line.a != former && line.b != former));
    }

    #[test]
    fn dragged_body_ignores_forces() {
        let mut fixture = Fixture::synthetic(5, EngineConfig::default());
        fixture.recenter(0);
        fixture.step().unwrap();

        let id = NodeId::from(3);
        fixture.engine.begin_drag(&id).unwrap();
        fixture.engine.move_drag(&id, vec2(15.0, 5.0)).unwrap();
        let held = fixture.engine.body(&id).unwrap().position();

        for _ in 0..5 {
            fixture.step().unwrap();
        }
        assert_eq!(fixture.engine.body(&id).unwrap().position(), held);

        fixture.engine.end_drag(&id).unwrap();
        fixture.step().unwrap();
        assert_ne!(fixture.engine.body(&id).unwrap().position(), held);
        assert_eq!(
            fixture.engine.begin_drag(&NodeId::from(12)),
            Err(Error::UnknownNode(NodeId::from(12)))
        );
    }

    #[test]
    fn non_finite_state_is_a_fault() {
        let mut fixture = Fixture::synthetic(5, EngineConfig::default());
        fixture.recenter(0);
        fixture.step().unwrap();
        fixture.engine.bodies[2].velocity = vec2(f32::NAN, 0.0);
        let positions = fixture
            .engine
            .bodies()
            .iter()
            .map(Body::position)
            .collect::<Vec<_>>();

        let error = fixture.step().unwrap_err();

        assert!(matches!(error, Error::NumericInstability { .. }));
        assert!(!error.is_recoverable());
        let after = fixture
            .engine
            .bodies()
            .iter()
            .map(Body::position)
            .collect::<Vec<_>>();
        assert_eq!(positions, after);
    }
}
