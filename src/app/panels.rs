use eframe::egui::{self, Color32, Context};

use super::OrbitApp;
use super::render_utils::Camera;

const SEARCH_LIMIT: usize = 8;

impl OrbitApp {
    pub(super) fn show_top_panel(&mut self, ctx: &Context) {
        let shared = self.session.clone();
        let (center_title, body_count, line_count, moving) = shared.with(|session| {
            let title = session
                .center()
                .map(|id| session.dataset().title(id).unwrap_or(id.as_str()).to_owned())
                .unwrap_or_else(|| "-".to_owned());
            (
                title,
                session.bodies().len(),
                session.lines().count(),
                session.needs_tick(),
            )
        });

        let mut picked = None;
        egui::TopBottomPanel::top("orbit-top-panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Search");
                if ui.text_edit_singleline(&mut self.search).changed() {
                    self.search_results =
                        shared.with(|session| session.dataset().search(&self.search, SEARCH_LIMIT));
                }

                ui.separator();
                ui.checkbox(&mut self.churn_per_tick, "Churn every frame");
                if ui.button("Reset view").clicked() {
                    self.camera = Camera::default();
                }

                ui.separator();
                ui.label(format!("center: {center_title}"));
                ui.label(format!("{body_count} bodies, {line_count} lines"));
                let status = match self.last_report {
                    _ if moving => format!(
                        "moving ({})",
                        self.last_report.map_or(0, |report| report.moving)
                    ),
                    Some(_) => "settled".to_owned(),
                    None => "waiting".to_owned(),
                };
                ui.label(status);
            });

            if !self.search_results.is_empty() {
                ui.horizontal_wrapped(|ui| {
                    shared.with(|session| {
                        for id in &self.search_results {
                            let title = session.dataset().title(id).unwrap_or(id.as_str());
                            if ui.small_button(title).clicked() {
                                picked = Some(id.clone());
                            }
                        }
                    });
                });
            }

            if let Some(fault) = &self.fault {
                ui.colored_label(
                    Color32::from_rgb(235, 110, 96),
                    format!("Layout halted: {fault}"),
                );
            }
        });

        if let Some(id) = picked {
            shared.with(|session| self.recenter(session, &id));
            self.search.clear();
            self.search_results.clear();
        }
    }
}
