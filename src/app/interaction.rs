use eframe::egui::{PointerButton, Pos2, Rect, Response, Ui};

use super::OrbitApp;

impl OrbitApp {
    /// Wheel or pinch zooms around the pointer. Secondary or middle drag
    /// pans, as does a primary drag that did not grab a body.
    pub(super) fn steer_camera(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        if let Some(pointer) = response.hover_pos() {
            let factor = ui.input(|input| {
                input.zoom_delta() * (input.smooth_scroll_delta.y * 0.002).exp()
            });
            if (factor - 1.0).abs() > f32::EPSILON {
                self.camera.zoom_about(rect, pointer, factor);
            }
        }

        let panning = [PointerButton::Secondary, PointerButton::Middle]
            .into_iter()
            .any(|button| response.dragged_by(button))
            || (self.dragging.is_none() && self.panning_with_primary);
        if panning {
            self.camera.pan += response.drag_delta();
        }
    }
}

/// Index of the closest body whose circle contains `pointer`.
pub(super) fn body_at(screen_positions: &[Pos2], radius: f32, pointer: Option<Pos2>) -> Option<usize> {
    let pointer = pointer?;
    screen_positions
        .iter()
        .enumerate()
        .filter_map(|(index, position)| {
            let distance = position.distance(pointer);
            (distance <= radius).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}
