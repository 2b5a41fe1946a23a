use eframe::egui::Vec2;
use serde::Serialize;

use crate::graph::NodeId;

/// Stored lifecycle phase. `Settled` is derived, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Phase {
    Spawning,
    Active,
    Fading { since_tick: u64, was_center: bool },
}

/// Lifecycle as reported to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Lifecycle {
    Spawning,
    Active,
    Settled,
    Fading,
}

/// Per-node simulation record.
#[derive(Clone, Debug)]
pub struct Body {
    pub(super) id: NodeId,
    pub(super) position: Vec2,
    pub(super) velocity: Vec2,
    pub(super) phase: Phase,
    pub(super) moving: bool,
    pub(super) dragged: bool,
    pub(super) last_touch: u64,
}

impl Body {
    pub(super) fn spawn(id: NodeId, position: Vec2, tick: u64) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            phase: Phase::Spawning,
            moving: true,
            dragged: false,
            last_touch: tick,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn is_dragged(&self) -> bool {
        self.dragged
    }

    pub fn is_fading(&self) -> bool {
        matches!(self.phase, Phase::Fading { .. })
    }

    pub fn was_center(&self) -> bool {
        matches!(self.phase, Phase::Fading { was_center: true, .. })
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match self.phase {
            Phase::Spawning => Lifecycle::Spawning,
            Phase::Fading { .. } => Lifecycle::Fading,
            Phase::Active if self.moving || self.dragged => Lifecycle::Active,
            Phase::Active => Lifecycle::Settled,
        }
    }

    pub(super) fn start_fading(&mut self, tick: u64, was_center: bool) {
        self.phase = Phase::Fading {
            since_tick: tick,
            was_center,
        };
        self.dragged = false;
        self.moving = true;
    }

    /// Brings a fading body back in place instead of respawning it.
    pub(super) fn revive(&mut self, tick: u64) {
        if self.is_fading() {
            self.phase = Phase::Active;
            self.moving = true;
        }
        self.last_touch = tick;
    }
}
