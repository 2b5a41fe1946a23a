use std::f32::consts::{PI, TAU};

use eframe::egui::{Vec2, vec2};
use rand::Rng;

#[derive(Clone, Copy)]
pub(super) struct RepulsionParams {
    pub(super) strength: f32,
    pub(super) clip: f32,
    pub(super) cohesion: f32,
}

#[derive(Clone, Copy)]
pub(super) struct WallParams {
    pub(super) viewport: Vec2,
    pub(super) strength: f32,
    pub(super) margin: f32,
}

/// Smooth step: 0 for `x <= 0`, 1 for `x >= 1`, sinusoidal in between.
pub(super) fn s_curve(x: f32) -> f32 {
    0.5 - (x.clamp(0.0, 1.0) * PI).cos() / 2.0
}

/// Unit direction and length of `delta`; a zero-length delta yields a random
/// unit direction and a length of zero.
pub(super) fn direction_of(delta: Vec2, rng: &mut impl Rng) -> (Vec2, f32) {
    let distance = delta.length();
    if distance > f32::EPSILON {
        (delta / distance, distance)
    } else {
        let angle = rng.gen_range(0.0..TAU);
        (vec2(angle.cos(), angle.sin()), 0.0)
    }
}

/// Force on the body at `delta` away from another body: inverse-square push
/// minus a weak linear pull, clipped from above.
pub(super) fn repulsion(direction: Vec2, distance: f32, params: RepulsionParams) -> Vec2 {
    let magnitude = params.strength / (distance * distance) - params.cohesion * distance;
    direction * magnitude.min(params.clip)
}

/// Linear spring pulling toward a neighbor `delta` away.
pub(super) fn spring(delta: Vec2, strength: f32) -> Vec2 {
    delta * strength
}

/// Saturating pull toward an anchor `distance` away along `direction`.
pub(super) fn centering(direction: Vec2, distance: f32, strength: f32, range: f32) -> Vec2 {
    direction * (strength * s_curve(distance / range.max(f32::EPSILON)))
}

/// Push back from the four viewport edges; zero deeper than `margin` inside.
pub(super) fn wall(position: Vec2, params: WallParams) -> Vec2 {
    let half = params.viewport * 0.5;
    let margin = params.margin.max(1.0);
    let push = |overshoot: f32| s_curve((overshoot + margin) / (2.0 * margin));

    vec2(
        push(-position.x - half.x) - push(position.x - half.x),
        push(-position.y - half.y) - push(position.y - half.y),
    ) * params.strength
}

pub(super) fn is_finite(value: Vec2) -> bool {
    value.x.is_finite() && value.y.is_finite()
}
