use std::collections::HashMap;
use std::time::Duration;

use eframe::egui::{self, Align2, Color32, FontId, Painter, Rect, Response, Sense, Stroke, Ui, vec2};
use orbit_graph::{Lifecycle, NodeId, Session};

use super::OrbitApp;
use super::interaction::body_at;
use super::render_utils::{body_color, draw_backdrop, on_screen};

const BODY_RADIUS: f32 = 11.0;
const FADE_SECONDS: f32 = 0.35;

impl OrbitApp {
    pub(super) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.steer_camera(ui, rect, &response);
        draw_backdrop(&painter, rect, self.camera);

        let frame_delta_seconds = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);
        let shared = self.session.clone();
        let zoom = self.camera.zoom;
        shared.with(|session| session.set_viewport_size(rect.width() / zoom, rect.height() / zoom));

        if self.fault.is_none() {
            if self.churn_per_tick {
                shared.with(|session| {
                    if let Err(error) = session.churn() {
                        tracing::warn!(%error, "churn step failed");
                    }
                });
            }

            match shared.try_tick(Duration::from_secs_f32(frame_delta_seconds)) {
                Some(Ok(report)) => self.last_report = Some(report),
                Some(Err(error)) => {
                    tracing::error!(%error, "layout halted");
                    self.fault = Some(error.to_string());
                }
                None => tracing::trace!("frame skipped a busy session"),
            }
        }

        let animating =
            shared.with(|session| self.paint_session(ui, rect, &response, &painter, session));
        if animating || self.churn_per_tick {
            ui.ctx().request_repaint();
        }
    }

    /// Draws lines and bodies, then applies pointer input. Returns `true`
    /// while another frame is needed.
    fn paint_session(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &Response,
        painter: &Painter,
        session: &mut Session,
    ) -> bool {
        for event in session.drain_engine_events() {
            tracing::debug!(?event, "engine event");
        }
        let graph_events = session.drain_graph_events().count();
        if graph_events > 0 {
            tracing::trace!(graph_events, "live graph changed");
        }

        let camera = self.camera;
        let radius = camera.body_radius(BODY_RADIUS);
        let screen_positions = session
            .bodies()
            .iter()
            .map(|body| camera.to_screen(rect, body.position()))
            .collect::<Vec<_>>();
        let index_by_id = session
            .bodies()
            .iter()
            .enumerate()
            .map(|(index, body)| (body.id(), index))
            .collect::<HashMap<_, _>>();

        let hovered = body_at(
            &screen_positions,
            radius,
            ui.input(|input| input.pointer.hover_pos()),
        );
        let pressed = body_at(
            &screen_positions,
            radius,
            ui.input(|input| input.pointer.press_origin()),
        );

        let line_stroke = Stroke::new(
            (1.2 * camera.zoom.sqrt()).clamp(0.6, 3.0),
            Color32::from_rgba_unmultiplied(150, 156, 166, 170),
        );
        for line in session.lines() {
            let (Some(&a), Some(&b)) = (index_by_id.get(&line.a), index_by_id.get(&line.b)) else {
                continue;
            };
            painter.line_segment([screen_positions[a], screen_positions[b]], line_stroke);
        }

        let mut animating = false;
        let mut faded_out = Vec::new();
        for (index, body) in session.bodies().iter().enumerate().rev() {
            let opacity = ui.ctx().animate_bool_with_time(
                ui.make_persistent_id(("body-fade", body.id().as_str())),
                !body.is_fading(),
                FADE_SECONDS,
            );
            if body.is_fading() && opacity <= 0.0 {
                faded_out.push(body.id().clone());
                continue;
            }
            if opacity < 1.0 {
                animating = true;
            }

            let position = screen_positions[index];
            if !on_screen(rect, position, radius) {
                continue;
            }

            let is_center = session.center() == Some(body.id());
            let kind = session
                .dataset()
                .node(body.id())
                .map(|node| node.kind)
                .unwrap_or_default();
            let color = body_color(kind, is_center, hovered == Some(index));

            painter.circle_filled(position, radius, color.gamma_multiply(opacity));
            let stroke_width = if body.is_dragged() { 2.2 } else { 1.0 };
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(stroke_width, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            );

            if is_center || hovered == Some(index) || camera.zoom > 1.35 {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    session.dataset().title(body.id()).unwrap_or(body.id().as_str()),
                    FontId::proportional(12.0),
                    Color32::from_gray(238).gamma_multiply(opacity),
                );
            }
        }

        if let Some(index) = hovered {
            let body = &session.bodies()[index];
            let node = session.dataset().node(body.id());
            let panel_text = format!(
                "{}  |  {}  |  {}  |  links {}",
                node.map_or(body.id().as_str(), |node| node.title.as_str()),
                node.map_or("?", |node| node.kind.label()),
                lifecycle_label(body.lifecycle()),
                session.model().degree(body.id()).unwrap_or(0),
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                panel_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        let hovered_id = hovered.map(|index| session.bodies()[index].id().clone());
        let pressed_id = pressed.map(|index| session.bodies()[index].id().clone());
        let released = !faded_out.is_empty();
        for id in faded_out {
            if let Err(error) = session.finish_fade(&id) {
                tracing::debug!(%error, "fade finished for a released body");
            }
        }

        self.apply_pointer(response, session, hovered_id, pressed_id);

        animating || released || self.dragging.is_some() || session.needs_tick()
    }

    fn apply_pointer(
        &mut self,
        response: &Response,
        session: &mut Session,
        hovered: Option<NodeId>,
        pressed: Option<NodeId>,
    ) {
        if let Some(id) = &hovered
            && let Err(error) = session.touch(id)
        {
            tracing::debug!(%error, "hovered body vanished");
        }

        if response.drag_started_by(egui::PointerButton::Primary) {
            match pressed {
                Some(id) => match session.begin_drag(&id) {
                    Ok(()) => self.dragging = Some(id),
                    Err(error) => tracing::debug!(%error, "drag rejected"),
                },
                None => self.panning_with_primary = true,
            }
        }
        if response.drag_stopped() {
            self.panning_with_primary = false;
        }

        if let Some(id) = self.dragging.clone() {
            let moved = if response.dragged_by(egui::PointerButton::Primary) {
                session.move_drag(&id, response.drag_delta() / self.camera.zoom)
            } else {
                Ok(())
            };
            if moved.is_err() || response.drag_stopped() {
                if let Err(error) = session.end_drag(&id) {
                    tracing::debug!(%error, "dragged body vanished");
                }
                self.dragging = None;
            }
        }

        if response.clicked_by(egui::PointerButton::Primary)
            && let Some(id) = hovered
        {
            self.recenter(session, &id);
        }
    }
}

fn lifecycle_label(lifecycle: Lifecycle) -> &'static str {
    match lifecycle {
        Lifecycle::Spawning => "spawning",
        Lifecycle::Active => "moving",
        Lifecycle::Settled => "settled",
        Lifecycle::Fading => "fading",
    }
}
