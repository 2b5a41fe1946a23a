use eframe::egui::{Color32, Painter, Pos2, Rect, Vec2, pos2};
use orbit_graph::NodeKind;

const MIN_ZOOM: f32 = 0.2;
const MAX_ZOOM: f32 = 4.0;
const HOVER_LIGHTEN: f32 = 0.35;

/// Maps layout coordinates (origin at the viewport center) onto the panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Camera {
    pub pan: Vec2,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub fn to_screen(self, rect: Rect, world: Vec2) -> Pos2 {
        rect.center() + self.pan + world * self.zoom
    }

    pub fn to_world(self, rect: Rect, screen: Pos2) -> Vec2 {
        (screen - rect.center() - self.pan) / self.zoom
    }

    /// Scales by `factor`, keeping the layout point under `anchor` in place.
    pub fn zoom_about(&mut self, rect: Rect, anchor: Pos2, factor: f32) {
        let fixed = self.to_world(rect, anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = anchor - rect.center() - fixed * self.zoom;
    }

    pub fn body_radius(self, base: f32) -> f32 {
        (base * self.zoom.powf(0.4)).clamp(3.0, 40.0)
    }
}

pub(super) fn body_color(kind: NodeKind, is_center: bool, hovered: bool) -> Color32 {
    let color = match kind {
        _ if is_center => Color32::from_rgb(245, 206, 93),
        NodeKind::Fact => Color32::from_rgb(103, 196, 255),
        NodeKind::Projection => Color32::from_rgb(246, 137, 92),
    };
    if hovered {
        color.lerp_to_gamma(Color32::WHITE, HOVER_LIGHTEN)
    } else {
        color
    }
}

/// Dot lattice anchored at the layout origin, so panning and zooming read
/// as camera motion even when no body is on screen.
pub(super) fn draw_backdrop(painter: &Painter, rect: Rect, camera: Camera) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let spacing = 64.0 * camera.zoom;
    if spacing < 12.0 {
        return;
    }
    let origin = camera.to_screen(rect, Vec2::ZERO);
    let first = pos2(
        rect.left() + (origin.x - rect.left()).rem_euclid(spacing),
        rect.top() + (origin.y - rect.top()).rem_euclid(spacing),
    );
    let dot = Color32::from_rgba_unmultiplied(70, 80, 92, 110);

    let mut y = first.y;
    while y < rect.bottom() {
        let mut x = first.x;
        while x < rect.right() {
            painter.circle_filled(pos2(x, y), 1.2, dot);
            x += spacing;
        }
        y += spacing;
    }
}

pub(super) fn on_screen(rect: Rect, position: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(position)
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    fn panel() -> Rect {
        Rect::from_min_size(pos2(0.0, 40.0), vec2(800.0, 600.0))
    }

    #[test]
    fn zoom_keeps_the_anchored_point_still() {
        let mut camera = Camera {
            pan: vec2(35.0, -20.0),
            zoom: 1.3,
        };
        let anchor = pos2(610.0, 122.0);
        let before = camera.to_world(panel(), anchor);

        camera.zoom_about(panel(), anchor, 1.5);

        assert!((camera.zoom - 1.95).abs() < 1e-5);
        assert!((camera.to_world(panel(), anchor) - before).length() < 1e-3);
        assert!((camera.to_screen(panel(), before) - anchor).length() < 1e-3);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = Camera::default();
        camera.zoom_about(panel(), panel().center(), 100.0);
        assert_eq!(camera.zoom, MAX_ZOOM);
        camera.zoom_about(panel(), panel().center(), 1e-4);
        assert_eq!(camera.zoom, MIN_ZOOM);
        assert_eq!(camera.pan, Vec2::ZERO);
    }

    #[test]
    fn partially_visible_bodies_are_drawn() {
        let rect = panel();
        assert!(on_screen(rect, pos2(-5.0, 300.0), 8.0));
        assert!(!on_screen(rect, pos2(-9.0, 300.0), 8.0));
        assert!(on_screen(rect, rect.center(), 0.0));
    }

    #[test]
    fn hover_lightens_without_changing_the_center_tint() {
        let plain = body_color(NodeKind::Fact, false, false);
        let hovered = body_color(NodeKind::Fact, false, true);
        assert!(hovered.r() > plain.r() && hovered.g() > plain.g());
        assert_eq!(
            body_color(NodeKind::Projection, true, false),
            body_color(NodeKind::Fact, true, false)
        );
    }
}
