//! Tunable constants for churn and the layout engine.
//!
//! Defaults reproduce the behavior the engine was calibrated against; a JSON
//! file may override any subset of fields.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub engine: EngineConfig,
    pub churn: ChurnConfig,
}

impl OrbitConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid config JSON in {}", path.display()))
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ChurnConfig {
    /// Degree floor: below it churn always adds, and removal never crosses it.
    pub min_degree: usize,
    /// Target `degree / (N - 1)` ratio churn oscillates around.
    pub ideal_ratio: f64,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            min_degree: 2,
            ideal_ratio: 0.4,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub time_step: f32,
    pub damping: f32,
    pub terminal_velocity: f32,
    pub min_velocity: f32,
    pub repulsion_strength: f32,
    pub repulsion_clip: f32,
    pub cohesion: f32,
    pub spring_strength: f32,
    pub centering_strength: f32,
    pub centering_range: f32,
    pub wall_strength: f32,
    pub wall_margin: f32,
    pub fading_push: f32,
    pub spawn_jitter: f32,
    /// In time units; converted with `ticks_per_unit`.
    pub settle_window: f32,
    /// In time units; converted with `ticks_per_unit`.
    pub idle_hold: f32,
    pub ticks_per_unit: u32,
    pub fade_timeout_ticks: u64,
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_step: 0.3,
            damping: 0.79,
            terminal_velocity: 150.0,
            min_velocity: 0.05,
            repulsion_strength: 100_000.0,
            repulsion_clip: 250.0,
            cohesion: 0.000_06,
            spring_strength: 0.05,
            centering_strength: 20.0,
            centering_range: 400.0,
            wall_strength: 1000.0,
            wall_margin: 100.0,
            fading_push: 20.0,
            spawn_jitter: 30.0,
            settle_window: 8.0,
            idle_hold: 60.0,
            ticks_per_unit: 60,
            fade_timeout_ticks: 24,
            seed: 0x5eed_0f_0b17,
        }
    }
}

impl EngineConfig {
    pub fn settle_ticks(&self) -> u64 {
        units_to_ticks(self.settle_window, self.ticks_per_unit)
    }

    pub fn idle_ticks(&self) -> u64 {
        units_to_ticks(self.idle_hold, self.ticks_per_unit)
    }
}

fn units_to_ticks(units: f32, ticks_per_unit: u32) -> u64 {
    (units.max(0.0) * ticks_per_unit.max(1) as f32).round() as u64
}
